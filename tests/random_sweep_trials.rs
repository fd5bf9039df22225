use metadrift::model::network::NetworkDescription;
use metadrift::model::Model;
use metadrift::sensitivity::RandomSweep;
use metadrift::solver::{SolverError, SteadyState, SteadyStateSolver};

const NETWORK: &str = r#"
[[species]]
id = "A"
initial = 1.0

[[species]]
id = "B"
initial = 3.0

[[parameters]]
id = "k1"
value = 0.5

[[parameters]]
id = "k2"
value = 2.0

[[reactions]]
id = "v1"
"#;

fn model() -> Model {
    let network: NetworkDescription = toml::from_str(NETWORK).unwrap();
    Model::from_description(network).unwrap()
}

struct IdentitySolver;

impl SteadyStateSolver for IdentitySolver {
    fn solve(&mut self, network: &NetworkDescription) -> Result<SteadyState, SolverError> {
        Ok(SteadyState {
            species: network
                .species
                .iter()
                .map(|s| (s.id.clone(), s.initial))
                .collect(),
            fluxes: network
                .reactions
                .iter()
                .map(|r| (r.id.clone(), 1.0))
                .collect(),
        })
    }
}

#[test]
fn writes_one_record_per_trial_and_resets_between_them() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("random_sensitivity.txt");
    let mut model = model();
    let sweep = RandomSweep::new(0.05, 20, 99).unwrap();
    sweep.run(&mut model, &mut IdentitySolver, &path).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    // Header, baseline, then one row per trial.
    assert_eq!(text.lines().count(), 2 + 20);

    // Trials never accumulate: the model ends back at the wild state.
    for p in &model.parameters {
        assert_eq!(p.mutant_value, p.wild_value, "parameter {}", p.key);
    }
    for sp in &model.species {
        assert_eq!(sp.mutant_value, sp.wild_value, "species {}", sp.id);
    }
}

#[test]
fn seeded_sweeps_are_reproducible() {
    let dir = tempfile::tempdir().unwrap();
    let path_a = dir.path().join("a.txt");
    let path_b = dir.path().join("b.txt");

    let mut model_a = model();
    RandomSweep::new(0.1, 15, 4321)
        .unwrap()
        .run(&mut model_a, &mut IdentitySolver, &path_a)
        .unwrap();
    let mut model_b = model();
    RandomSweep::new(0.1, 15, 4321)
        .unwrap()
        .run(&mut model_b, &mut IdentitySolver, &path_b)
        .unwrap();

    let a = std::fs::read_to_string(&path_a).unwrap();
    let b = std::fs::read_to_string(&path_b).unwrap();
    assert_eq!(a, b, "same seed, same trial sequence");

    let mut model_c = model();
    let path_c = dir.path().join("c.txt");
    RandomSweep::new(0.1, 15, 1)
        .unwrap()
        .run(&mut model_c, &mut IdentitySolver, &path_c)
        .unwrap();
    let c = std::fs::read_to_string(&path_c).unwrap();
    assert_ne!(a, c, "different seed, different trials");
}
