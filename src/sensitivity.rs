//! Sensitivity explorers.
//!
//! Both explorers perturb the mutant instance relative to the wild type and
//! fully reset it between trials, so trials never accumulate. The one-at-a-time
//! sweep walks a deterministic factor grid per parameter; the random sweep
//! draws independent single-parameter perturbations.

use std::path::Path;

use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::Normal;
use tracing::{info, warn};

use crate::evolve::mutation::random_reference_mutation;
use crate::model::Model;
use crate::output::SensitivityLog;
use crate::solver::SteadyStateSolver;
use crate::SimError;

/// One-at-a-time sweep: for each mutable parameter, factors
/// `0, +step, …, +range`, a full reset, then `-step, …, -range`, a full
/// reset. The bound carries a half-step tolerance against accumulation error.
pub struct OatSweep {
    range: f64,
    step: f64,
}

impl OatSweep {
    pub fn new(range: f64, step: f64) -> Result<Self, SimError> {
        if range <= 0.0 {
            return Err(SimError::Config(format!(
                "sweep range must be positive, got {range}"
            )));
        }
        if step <= 0.0 {
            return Err(SimError::Config(format!(
                "sweep step must be positive, got {step}"
            )));
        }
        Ok(Self { range, step })
    }

    pub fn run(
        &self,
        model: &mut Model,
        solver: &mut dyn SteadyStateSolver,
        output_path: &Path,
    ) -> Result<(), SimError> {
        model.compute_wild_steady_state(solver)?;
        model.reset_mutant_to_wild();
        let mut log = SensitivityLog::create(output_path, model)?;
        let mutable = model.mutable_parameters().to_vec();
        info!(parameters = mutable.len(), "starting one-at-a-time sweep");
        for param in mutable {
            self.explore_parameter(model, solver, &mut log, param)?;
        }
        Ok(())
    }

    fn explore_parameter(
        &self,
        model: &mut Model,
        solver: &mut dyn SteadyStateSolver,
        log: &mut SensitivityLog,
        param: usize,
    ) -> Result<(), SimError> {
        let bound = self.range + self.step / 2.0;
        let mut factor = 0.0;
        while factor <= bound {
            self.trial(model, solver, log, param, factor)?;
            factor += self.step;
        }
        model.reset_mutant_to_wild();

        let mut factor = -self.step;
        while factor >= -bound {
            self.trial(model, solver, log, param, factor)?;
            factor -= self.step;
        }
        model.reset_mutant_to_wild();
        Ok(())
    }

    fn trial(
        &self,
        model: &mut Model,
        solver: &mut dyn SteadyStateSolver,
        log: &mut SensitivityLog,
        param: usize,
        factor: f64,
    ) -> Result<(), SimError> {
        let (_, value) = model.deterministic_parameter_mutation(param, factor);
        match model.compute_mutant_steady_state(solver) {
            Ok(()) => {
                log.write_trial(model, &model.parameters[param].key, factor, value)?;
            }
            Err(e) if e.is_unstable_trial() => {
                warn!(
                    param = %model.parameters[param].key,
                    factor,
                    "no equilibrium for this perturbation, trial skipped"
                );
                model.reset_mutant_to_wild();
            }
            Err(e) => return Err(e),
        }
        Ok(())
    }
}

/// Random multivariate sweep: independent trials, each a single
/// `Normal(0, sigma)` log-perturbation of one uniformly drawn parameter
/// relative to its wild value.
pub struct RandomSweep {
    sigma: f64,
    iterations: u64,
    seed: u64,
}

impl RandomSweep {
    pub fn new(sigma: f64, iterations: u64, seed: u64) -> Result<Self, SimError> {
        if sigma <= 0.0 {
            return Err(SimError::Config(format!(
                "sigma must be positive, got {sigma}"
            )));
        }
        if iterations == 0 {
            return Err(SimError::Config("iterations must be positive".into()));
        }
        Ok(Self {
            sigma,
            iterations,
            seed,
        })
    }

    pub fn run(
        &self,
        model: &mut Model,
        solver: &mut dyn SteadyStateSolver,
        output_path: &Path,
    ) -> Result<(), SimError> {
        model.compute_wild_steady_state(solver)?;
        model.reset_mutant_to_wild();
        let mut log = SensitivityLog::create(output_path, model)?;
        let normal = Normal::new(0.0, self.sigma)
            .map_err(|e| SimError::Config(format!("invalid perturbation distribution: {e}")))?;
        let mut rng = StdRng::seed_from_u64(self.seed);
        info!(iterations = self.iterations, "starting random sweep");

        for _ in 0..self.iterations {
            let (mutation, factor) = random_reference_mutation(model, &normal, &mut rng);
            match model.compute_mutant_steady_state(solver) {
                Ok(()) => {
                    log.write_trial(
                        model,
                        &model.parameters[mutation.param].key,
                        factor,
                        mutation.value,
                    )?;
                }
                Err(e) if e.is_unstable_trial() => {
                    warn!(
                        param = %model.parameters[mutation.param].key,
                        factor,
                        "no equilibrium for this perturbation, trial skipped"
                    );
                }
                Err(e) => return Err(e),
            }
            model.reset_mutant_to_wild();
        }
        Ok(())
    }
}
