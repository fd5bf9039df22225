//! Paired wild-type/mutant view of a kinetic reaction network.
//!
//! The model owns arena tables built once at load (file order, plus
//! name→index maps) and keeps two value columns per table: the wild-type
//! reference and the evolving mutant. Every score the selection schemes use
//! is computed here from those columns.

pub mod network;
pub mod objective;

use std::collections::HashMap;
use std::path::Path;

use tracing::debug;

use crate::solver::{SteadyState, SteadyStateSolver};
use crate::SimError;

use network::NetworkDescription;
use objective::ObjectiveFunction;

/// Magnitude floor for every division by a wild/reference value. Terms below
/// the floor are excluded from relative sums, distances, and statistics.
pub const ZERO_GUARD: f64 = 1e-10;

/// Which value column an operation addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instance {
    Wild,
    Mutant,
}

#[derive(Debug, Clone)]
pub struct Species {
    pub id: String,
    pub name: String,
    pub constant: bool,
    pub wild_value: f64,
    pub mutant_value: f64,
}

#[derive(Debug, Clone)]
pub struct Parameter {
    pub key: String,
    pub id: String,
    pub reaction: Option<String>,
    pub wild_value: f64,
    pub mutant_value: f64,
}

#[derive(Debug, Clone)]
pub struct Reaction {
    pub id: String,
    pub name: String,
    pub wild_flux: f64,
    pub mutant_flux: f64,
}

/// All scalar scores derived from one wild/mutant state pair.
#[derive(Debug, Clone, Copy, Default)]
pub struct Scores {
    pub wild_sum: f64,
    pub mutant_sum: f64,
    pub sum_dist_abs: f64,
    pub sum_dist_rel: f64,
    pub moma_abs: f64,
    pub moma_rel: f64,
    pub moma_all_abs: f64,
    pub moma_all_rel: f64,
}

/// Rollback snapshot of the full mutant state.
#[derive(Debug, Clone)]
pub struct MutantState {
    species: Vec<f64>,
    fluxes: Vec<f64>,
    abs_sum: f64,
    rel_sum: f64,
}

#[derive(Debug)]
pub struct Model {
    description: NetworkDescription,
    pub species: Vec<Species>,
    pub parameters: Vec<Parameter>,
    pub reactions: Vec<Reaction>,
    species_index: HashMap<String, usize>,
    parameter_index: HashMap<String, usize>,
    reaction_index: HashMap<String, usize>,
    /// Arena indices of parameters eligible for mutation (non-zero at load).
    mutable: Vec<usize>,
    pub objective: ObjectiveFunction,
    wild_abs_sum: f64,
    wild_rel_sum: f64,
    mutant_abs_sum: f64,
    mutant_rel_sum: f64,
}

impl Model {
    pub fn from_files(network_path: &Path, objective_path: Option<&Path>) -> Result<Self, SimError> {
        let description = NetworkDescription::from_file(network_path)?;
        let mut model = Self::from_description(description)?;
        if let Some(path) = objective_path {
            model.objective = ObjectiveFunction::from_file(path, &model.reaction_index)?;
        }
        Ok(model)
    }

    pub fn from_description(description: NetworkDescription) -> Result<Self, SimError> {
        let mut species = Vec::with_capacity(description.species.len());
        let mut species_index = HashMap::new();
        for (i, def) in description.species.iter().enumerate() {
            species.push(Species {
                id: def.id.clone(),
                name: def.name.clone(),
                constant: def.constant,
                wild_value: def.initial,
                mutant_value: def.initial,
            });
            species_index.insert(def.id.clone(), i);
            if def.name != def.id {
                species_index.insert(def.name.clone(), i);
            }
        }

        let mut parameters = Vec::with_capacity(description.parameters.len());
        let mut parameter_index = HashMap::new();
        let mut mutable = Vec::new();
        for (i, def) in description.parameters.iter().enumerate() {
            let key = def.key();
            parameters.push(Parameter {
                key: key.clone(),
                id: def.id.clone(),
                reaction: def.reaction.clone(),
                wild_value: def.value,
                mutant_value: def.value,
            });
            parameter_index.insert(key, i);
            if def.value != 0.0 {
                mutable.push(i);
            }
        }
        if mutable.is_empty() {
            return Err(SimError::Config(
                "network has no mutable (non-zero) parameters".into(),
            ));
        }

        let mut reactions = Vec::with_capacity(description.reactions.len());
        let mut reaction_index = HashMap::new();
        for (i, def) in description.reactions.iter().enumerate() {
            reactions.push(Reaction {
                id: def.id.clone(),
                name: def.name.clone(),
                wild_flux: 0.0,
                mutant_flux: 0.0,
            });
            reaction_index.insert(def.id.clone(), i);
            if def.name != def.id {
                reaction_index.insert(def.name.clone(), i);
            }
        }

        Ok(Self {
            description,
            species,
            parameters,
            reactions,
            species_index,
            parameter_index,
            reaction_index,
            mutable,
            objective: ObjectiveFunction::default(),
            wild_abs_sum: 0.0,
            wild_rel_sum: 0.0,
            mutant_abs_sum: 0.0,
            mutant_rel_sum: 0.0,
        })
    }

    // --- parameter access -------------------------------------------------

    pub fn parameter_count(&self) -> usize {
        self.parameters.len()
    }

    pub fn mutable_parameters(&self) -> &[usize] {
        &self.mutable
    }

    pub fn parameter_value(&self, key: &str, instance: Instance) -> Result<f64, SimError> {
        let i = self.parameter_id(key)?;
        Ok(match instance {
            Instance::Wild => self.parameters[i].wild_value,
            Instance::Mutant => self.parameters[i].mutant_value,
        })
    }

    pub fn set_parameter_value(
        &mut self,
        key: &str,
        instance: Instance,
        value: f64,
    ) -> Result<(), SimError> {
        let i = self.parameter_id(key)?;
        match instance {
            Instance::Wild => self.parameters[i].wild_value = value,
            Instance::Mutant => self.parameters[i].mutant_value = value,
        }
        Ok(())
    }

    fn parameter_id(&self, key: &str) -> Result<usize, SimError> {
        self.parameter_index
            .get(key)
            .copied()
            .ok_or_else(|| SimError::Consistency(format!("unknown parameter '{key}'")))
    }

    /// Multiply the mutant value of the parameter at `index` by `10^factor`.
    /// Returns `(previous, new)`.
    pub fn scale_mutant_parameter(&mut self, index: usize, factor: f64) -> (f64, f64) {
        let previous = self.parameters[index].mutant_value;
        let value = previous * 10f64.powf(factor);
        self.parameters[index].mutant_value = value;
        (previous, value)
    }

    /// Set the mutant value to `wild * 10^factor`. Sensitivity sweeps only.
    pub fn deterministic_parameter_mutation(&mut self, index: usize, factor: f64) -> (f64, f64) {
        let previous = self.parameters[index].mutant_value;
        let value = self.parameters[index].wild_value * 10f64.powf(factor);
        self.parameters[index].mutant_value = value;
        (previous, value)
    }

    pub fn set_mutant_parameter(&mut self, index: usize, value: f64) {
        self.parameters[index].mutant_value = value;
    }

    // --- steady states ----------------------------------------------------

    /// Solve the wild-type instance. Seeds the mutant columns with the result.
    /// Fatal if the solver fails: nothing can evolve without a baseline.
    pub fn compute_wild_steady_state(
        &mut self,
        solver: &mut dyn SteadyStateSolver,
    ) -> Result<(), SimError> {
        self.refresh_description(Instance::Wild);
        let state = solver
            .solve(&self.description)
            .map_err(|e| if e.is_recoverable() { SimError::BaselineUnstable } else { e.into() })?;
        self.apply_state(&state, Instance::Wild)?;
        for sp in &mut self.species {
            sp.mutant_value = sp.wild_value;
        }
        for rx in &mut self.reactions {
            rx.mutant_flux = rx.wild_flux;
        }
        self.recompute_sums(Instance::Wild);
        self.recompute_sums(Instance::Mutant);
        debug!(abs = self.wild_abs_sum, rel = self.wild_rel_sum, "wild steady state");
        Ok(())
    }

    /// Solve the mutant instance. On recoverable failure every tracked value
    /// is left untouched and the error is returned for the caller to absorb.
    pub fn compute_mutant_steady_state(
        &mut self,
        solver: &mut dyn SteadyStateSolver,
    ) -> Result<(), SimError> {
        self.refresh_description(Instance::Mutant);
        let state = solver.solve(&self.description)?;
        self.apply_state(&state, Instance::Mutant)?;
        self.recompute_sums(Instance::Mutant);
        Ok(())
    }

    fn refresh_description(&mut self, instance: Instance) {
        for (def, sp) in self.description.species.iter_mut().zip(&self.species) {
            def.initial = match instance {
                Instance::Wild => sp.wild_value,
                Instance::Mutant => sp.mutant_value,
            };
        }
        for (def, p) in self.description.parameters.iter_mut().zip(&self.parameters) {
            def.value = match instance {
                Instance::Wild => p.wild_value,
                Instance::Mutant => p.mutant_value,
            };
        }
    }

    /// Names are resolved first; an unknown name is a fatal consistency error
    /// and no value is applied.
    fn apply_state(&mut self, state: &SteadyState, instance: Instance) -> Result<(), SimError> {
        let mut species_updates = Vec::with_capacity(state.species.len());
        for (name, value) in &state.species {
            let i = *self.species_index.get(name).ok_or_else(|| {
                SimError::Consistency(format!("solver reported unknown species '{name}'"))
            })?;
            species_updates.push((i, *value));
        }
        let mut flux_updates = Vec::with_capacity(state.fluxes.len());
        for (name, value) in &state.fluxes {
            let i = *self.reaction_index.get(name).ok_or_else(|| {
                SimError::Consistency(format!("solver reported unknown reaction '{name}'"))
            })?;
            flux_updates.push((i, *value));
        }

        for (i, value) in species_updates {
            if self.species[i].constant {
                continue;
            }
            match instance {
                Instance::Wild => self.species[i].wild_value = value,
                Instance::Mutant => self.species[i].mutant_value = value,
            }
        }
        for (i, value) in flux_updates {
            match instance {
                Instance::Wild => self.reactions[i].wild_flux = value,
                Instance::Mutant => self.reactions[i].mutant_flux = value,
            }
        }
        Ok(())
    }

    fn recompute_sums(&mut self, instance: Instance) {
        let mut abs = 0.0;
        let mut rel = 0.0;
        for sp in &self.species {
            if sp.constant {
                continue;
            }
            let value = match instance {
                Instance::Wild => sp.wild_value,
                Instance::Mutant => sp.mutant_value,
            };
            abs += value;
            if sp.wild_value.abs() > ZERO_GUARD {
                rel += value / sp.wild_value;
            }
        }
        match instance {
            Instance::Wild => {
                self.wild_abs_sum = abs;
                self.wild_rel_sum = rel;
            }
            Instance::Mutant => {
                self.mutant_abs_sum = abs;
                self.mutant_rel_sum = rel;
            }
        }
    }

    // --- scores -----------------------------------------------------------

    pub fn wild_sums(&self) -> (f64, f64) {
        (self.wild_abs_sum, self.wild_rel_sum)
    }

    pub fn mutant_sums(&self) -> (f64, f64) {
        (self.mutant_abs_sum, self.mutant_rel_sum)
    }

    pub fn compute_sum_distance(&self) -> (f64, f64) {
        (
            (self.wild_abs_sum - self.mutant_abs_sum).abs(),
            (self.wild_rel_sum - self.mutant_rel_sum).abs(),
        )
    }

    /// Euclidean distance over the objective reactions.
    pub fn compute_moma_distance(&self) -> (f64, f64) {
        let mut abs = 0.0;
        let mut rel = 0.0;
        for &(i, _weight) in &self.objective.targets {
            let rx = &self.reactions[i];
            let d = rx.wild_flux - rx.mutant_flux;
            abs += d * d;
            if rx.wild_flux.abs() > ZERO_GUARD {
                let r = d / rx.wild_flux;
                rel += r * r;
            }
        }
        (abs.sqrt(), rel.sqrt())
    }

    /// Euclidean distance over every reaction with a non-negligible wild flux.
    pub fn compute_moma_all_fluxes(&self) -> (f64, f64) {
        let mut abs = 0.0;
        let mut rel = 0.0;
        for rx in &self.reactions {
            if rx.wild_flux.abs() <= ZERO_GUARD {
                continue;
            }
            let d = rx.wild_flux - rx.mutant_flux;
            abs += d * d;
            let r = d / rx.wild_flux;
            rel += r * r;
        }
        (abs.sqrt(), rel.sqrt())
    }

    pub fn compute_scores(&self) -> Scores {
        let (sum_dist_abs, sum_dist_rel) = self.compute_sum_distance();
        let (moma_abs, moma_rel) = self.compute_moma_distance();
        let (moma_all_abs, moma_all_rel) = self.compute_moma_all_fluxes();
        Scores {
            wild_sum: self.wild_abs_sum,
            mutant_sum: self.mutant_abs_sum,
            sum_dist_abs,
            sum_dist_rel,
            moma_abs,
            moma_rel,
            moma_all_abs,
            moma_all_rel,
        }
    }

    // --- snapshots & resets ----------------------------------------------

    pub fn mutant_snapshot(&self) -> MutantState {
        MutantState {
            species: self.species.iter().map(|s| s.mutant_value).collect(),
            fluxes: self.reactions.iter().map(|r| r.mutant_flux).collect(),
            abs_sum: self.mutant_abs_sum,
            rel_sum: self.mutant_rel_sum,
        }
    }

    pub fn restore_mutant(&mut self, state: &MutantState) {
        for (sp, value) in self.species.iter_mut().zip(&state.species) {
            sp.mutant_value = *value;
        }
        for (rx, value) in self.reactions.iter_mut().zip(&state.fluxes) {
            rx.mutant_flux = *value;
        }
        self.mutant_abs_sum = state.abs_sum;
        self.mutant_rel_sum = state.rel_sum;
    }

    /// Full reset: mutant columns become copies of the wild columns.
    pub fn reset_mutant_to_wild(&mut self) {
        for p in &mut self.parameters {
            p.mutant_value = p.wild_value;
        }
        for sp in &mut self.species {
            sp.mutant_value = sp.wild_value;
        }
        for rx in &mut self.reactions {
            rx.mutant_flux = rx.wild_flux;
        }
        self.mutant_abs_sum = self.wild_abs_sum;
        self.mutant_rel_sum = self.wild_rel_sum;
    }

    // --- iteration helpers -------------------------------------------------

    /// Non-constant species, arena order.
    pub fn variable_species(&self) -> impl Iterator<Item = &Species> {
        self.species.iter().filter(|s| !s.constant)
    }

    pub fn variable_species_count(&self) -> usize {
        self.species.iter().filter(|s| !s.constant).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::{SolverError, SteadyState};

    fn two_species_network() -> NetworkDescription {
        toml::from_str(
            r#"
[[species]]
id = "A"
initial = 1.0

[[species]]
id = "B"
initial = 2.0

[[species]]
id = "Ext"
constant = true
initial = 10.0

[[parameters]]
id = "k1"
reaction = "v1"
value = 0.5

[[parameters]]
id = "kZero"
value = 0.0

[[reactions]]
id = "v1"

[[reactions]]
id = "v2"
"#,
        )
        .unwrap()
    }

    struct FixedSolver(SteadyState);

    impl SteadyStateSolver for FixedSolver {
        fn solve(&mut self, _: &NetworkDescription) -> Result<SteadyState, SolverError> {
            Ok(self.0.clone())
        }
    }

    fn fixed_state() -> SteadyState {
        SteadyState {
            species: vec![
                ("A".into(), 3.0),
                ("B".into(), 4.0),
                ("Ext".into(), 99.0),
            ],
            fluxes: vec![("v1".into(), 1.5), ("v2".into(), -0.5)],
        }
    }

    #[test]
    fn zero_valued_parameters_are_not_mutable() {
        let model = Model::from_description(two_species_network()).unwrap();
        assert_eq!(model.mutable_parameters(), &[0]);
    }

    #[test]
    fn wild_solve_seeds_both_instances_and_skips_constants() {
        let mut model = Model::from_description(two_species_network()).unwrap();
        let mut solver = FixedSolver(fixed_state());
        model.compute_wild_steady_state(&mut solver).unwrap();

        assert_eq!(model.species[0].wild_value, 3.0);
        assert_eq!(model.species[0].mutant_value, 3.0);
        // Constant species keep their declared value.
        assert_eq!(model.species[2].wild_value, 10.0);
        assert_eq!(model.reactions[1].mutant_flux, -0.5);

        let (abs, rel) = model.wild_sums();
        assert_eq!(abs, 7.0);
        // Relative wild sum equals the variable-species count.
        assert_eq!(rel, 2.0);
        assert_eq!(model.compute_sum_distance(), (0.0, 0.0));
    }

    #[test]
    fn failed_mutant_solve_leaves_state_untouched() {
        let mut model = Model::from_description(two_species_network()).unwrap();
        let mut solver = FixedSolver(fixed_state());
        model.compute_wild_steady_state(&mut solver).unwrap();

        struct Failing;
        impl SteadyStateSolver for Failing {
            fn solve(&mut self, _: &NetworkDescription) -> Result<SteadyState, SolverError> {
                Err(SolverError::NoEquilibrium)
            }
        }
        let before = model.mutant_snapshot();
        let err = model.compute_mutant_steady_state(&mut Failing).unwrap_err();
        assert!(err.is_unstable_trial());
        let after = model.mutant_snapshot();
        assert_eq!(before.species, after.species);
        assert_eq!(before.fluxes, after.fluxes);
    }

    #[test]
    fn unknown_report_name_is_fatal_consistency_error() {
        let mut model = Model::from_description(two_species_network()).unwrap();
        let mut solver = FixedSolver(SteadyState {
            species: vec![("Ghost".into(), 1.0)],
            fluxes: vec![],
        });
        let err = model.compute_mutant_steady_state(&mut solver).unwrap_err();
        assert!(matches!(err, SimError::Consistency(_)));
    }

    #[test]
    fn moma_all_skips_negligible_wild_fluxes() {
        let mut model = Model::from_description(two_species_network()).unwrap();
        let mut solver = FixedSolver(SteadyState {
            species: vec![("A".into(), 1.0), ("B".into(), 2.0)],
            fluxes: vec![("v1".into(), 2.0), ("v2".into(), 0.0)],
        });
        model.compute_wild_steady_state(&mut solver).unwrap();
        model.reactions[0].mutant_flux = 1.0;
        model.reactions[1].mutant_flux = 5.0;

        let (abs, rel) = model.compute_moma_all_fluxes();
        // v2 has zero wild flux and contributes nothing.
        assert_eq!(abs, 1.0);
        assert_eq!(rel, 0.5);
    }

    #[test]
    fn parameter_access_is_keyed_and_instance_aware() {
        let mut model = Model::from_description(two_species_network()).unwrap();
        assert_eq!(model.parameter_value("v1.k1", Instance::Wild).unwrap(), 0.5);
        model
            .set_parameter_value("v1.k1", Instance::Mutant, 0.9)
            .unwrap();
        assert_eq!(
            model.parameter_value("v1.k1", Instance::Mutant).unwrap(),
            0.9
        );
        assert_eq!(model.parameter_value("v1.k1", Instance::Wild).unwrap(), 0.5);

        let err = model.parameter_value("nope", Instance::Wild).unwrap_err();
        assert!(matches!(err, SimError::Consistency(_)));
    }

    #[test]
    fn deterministic_mutation_is_relative_to_wild() {
        let mut model = Model::from_description(two_species_network()).unwrap();
        model.scale_mutant_parameter(0, 1.0); // mutant drifts to 5.0
        let (_, new) = model.deterministic_parameter_mutation(0, 2.0);
        assert!((new - 50.0).abs() < 1e-12); // wild 0.5 * 10^2
    }

    #[test]
    fn reset_restores_parameters_and_arrays() {
        let mut model = Model::from_description(two_species_network()).unwrap();
        let mut solver = FixedSolver(fixed_state());
        model.compute_wild_steady_state(&mut solver).unwrap();

        model.scale_mutant_parameter(0, 0.3);
        model.species[0].mutant_value = 42.0;
        model.reset_mutant_to_wild();

        assert_eq!(model.parameters[0].mutant_value, model.parameters[0].wild_value);
        assert_eq!(model.species[0].mutant_value, model.species[0].wild_value);
        assert_eq!(model.mutant_sums(), model.wild_sums());
    }
}
