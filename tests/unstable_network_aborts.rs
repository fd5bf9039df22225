use metadrift::evolve::mcmc::{EngineSettings, Mcmc, StepOutcome};
use metadrift::evolve::SelectionScheme;
use metadrift::model::network::NetworkDescription;
use metadrift::model::objective::ObjectiveFunction;
use metadrift::model::Model;
use metadrift::solver::{SolverError, SteadyState, SteadyStateSolver};
use metadrift::SimError;

const NETWORK: &str = r#"
[[species]]
id = "A"
initial = 1.0

[[parameters]]
id = "k1"
value = 0.5

[[reactions]]
id = "v1"
"#;

fn model() -> Model {
    let network: NetworkDescription = toml::from_str(NETWORK).unwrap();
    let mut model = Model::from_description(network).unwrap();
    model.objective = ObjectiveFunction {
        targets: vec![(0, 1.0)],
    };
    model
}

/// Succeeds for the two baseline solves, then never finds an equilibrium.
struct CollapsingSolver {
    successes_left: u32,
}

impl SteadyStateSolver for CollapsingSolver {
    fn solve(&mut self, network: &NetworkDescription) -> Result<SteadyState, SolverError> {
        if self.successes_left == 0 {
            return Err(SolverError::NoEquilibrium);
        }
        self.successes_left -= 1;
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
fn eleventh_consecutive_failure_aborts_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let settings = EngineSettings {
        scheme: SelectionScheme::MutationAccumulation,
        threshold: 0.0,
        iterations: 100,
        sigma: 0.1,
        seed: 5,
    };
    let mut engine = Mcmc::new(model(), settings, dir.path()).unwrap();
    let mut solver = CollapsingSolver { successes_left: 2 };

    let err = engine.run(&mut solver).unwrap_err();
    assert!(
        matches!(err, SimError::UnstableNetwork { failures: 11 }),
        "unexpected error: {err}"
    );
    assert_eq!(engine.nb_accepted(), 0);
    assert_eq!(engine.nb_rejected(), 0);
    assert_eq!(engine.nb_unstable(), 11);

    // Rows written before the abort survive: the initial row plus one row per
    // tolerated unstable trial, the last showing ten consecutive failures.
    let text = std::fs::read_to_string(dir.path().join("iterations.txt")).unwrap();
    let rows: Vec<&str> = text.lines().skip(1).collect();
    assert_eq!(rows.len(), 11);
    let unstable_counts: Vec<u32> = rows
        .iter()
        .map(|row| row.split('\t').nth(3).unwrap().parse().unwrap())
        .collect();
    assert_eq!(unstable_counts[0], 0, "initial row");
    assert_eq!(
        &unstable_counts[1..],
        &[1, 2, 3, 4, 5, 6, 7, 8, 9, 10],
        "one row per tolerated failure"
    );
    // Discarded trials leave no mutation record.
    assert!(rows[1..]
        .iter()
        .all(|row| row.split('\t').nth(4).unwrap() == "_"));
}

#[test]
fn a_success_resets_the_consecutive_failure_count() {
    let dir = tempfile::tempdir().unwrap();
    let settings = EngineSettings {
        scheme: SelectionScheme::MutationAccumulation,
        threshold: 0.0,
        iterations: 100,
        sigma: 0.1,
        seed: 5,
    };
    let mut engine = Mcmc::new(model(), settings, dir.path()).unwrap();

    // Baseline solves, then alternating failure and success.
    let mut solver = CollapsingSolver { successes_left: 2 };
    engine.initialize(&mut solver).unwrap();

    for _ in 0..3 {
        let mut failing = CollapsingSolver { successes_left: 0 };
        assert_eq!(
            engine.iterate(&mut failing).unwrap(),
            StepOutcome::Unstable
        );
        assert_eq!(engine.nb_unstable(), 1);

        let mut fine = CollapsingSolver { successes_left: 1 };
        assert_eq!(engine.iterate(&mut fine).unwrap(), StepOutcome::Accepted);
        assert_eq!(engine.nb_unstable(), 0, "success clears the streak");
    }
}
