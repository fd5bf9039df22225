//! Evolution engine.
//!
//! Drives the MUTATE → EVALUATE → {ACCEPT | REJECT | UNSTABLE} loop over the
//! paired model. Rejected and unstable trials restore the exact previous
//! mutant state from a snapshot taken before the mutation, so a trial either
//! commits completely or leaves no trace.

use std::path::{Path, PathBuf};

use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::Normal;
use tracing::{debug, info, warn};

use crate::model::Model;
use crate::output::{
    write_statistics, IterationLog, LoggedMutation, ITERATIONS_FILE, STATISTICS_FILE,
};
use crate::solver::SteadyStateSolver;
use crate::SimError;

use super::mutation::random_parameter_mutation;
use super::scheme::SelectionScheme;
use super::stats::RunningStats;

/// Maximum tolerated consecutive failed equilibrium computations.
pub const UNSTABLE_CAP: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Accepted,
    Rejected,
    /// Solver failure, rolled back; does not count toward the iteration total.
    Unstable,
}

#[derive(Debug, Clone, Copy)]
pub struct EngineSettings {
    pub scheme: SelectionScheme,
    pub threshold: f64,
    pub iterations: u64,
    pub sigma: f64,
    pub seed: u64,
}

#[derive(Debug)]
pub struct Mcmc {
    model: Model,
    scheme: SelectionScheme,
    threshold: f64,
    total_iterations: u64,
    normal: Normal<f64>,
    rng: StdRng,
    nb_accepted: u64,
    nb_rejected: u64,
    nb_unstable: u32,
    species_stats: Vec<RunningStats>,
    flux_stats: Vec<RunningStats>,
    log: IterationLog,
    statistics_path: PathBuf,
}

impl Mcmc {
    pub fn new(model: Model, settings: EngineSettings, output_dir: &Path) -> Result<Self, SimError> {
        if settings.sigma <= 0.0 {
            return Err(SimError::Config(format!(
                "sigma must be positive, got {}",
                settings.sigma
            )));
        }
        if settings.iterations == 0 {
            return Err(SimError::Config("iterations must be positive".into()));
        }
        if model.objective.is_empty() {
            return Err(SimError::Config(
                "the evolution engine requires a non-empty objective function".into(),
            ));
        }
        let normal = Normal::new(0.0, settings.sigma)
            .map_err(|e| SimError::Config(format!("invalid mutation distribution: {e}")))?;

        std::fs::create_dir_all(output_dir)?;
        let log = IterationLog::create(&output_dir.join(ITERATIONS_FILE), &model)?;
        let species_stats = vec![RunningStats::default(); model.variable_species_count()];
        let flux_stats = vec![RunningStats::default(); model.reactions.len()];

        Ok(Self {
            model,
            scheme: settings.scheme,
            threshold: settings.threshold,
            total_iterations: settings.iterations,
            normal,
            rng: StdRng::seed_from_u64(settings.seed),
            nb_accepted: 0,
            nb_rejected: 0,
            nb_unstable: 0,
            species_stats,
            flux_stats,
            log,
            statistics_path: output_dir.join(STATISTICS_FILE),
        })
    }

    /// Solve the baseline, seed the mutant, and write the initial log row.
    pub fn initialize(&mut self, solver: &mut dyn SteadyStateSolver) -> Result<(), SimError> {
        self.model.compute_wild_steady_state(solver)?;
        self.model
            .compute_mutant_steady_state(solver)
            .map_err(|e| {
                if e.is_unstable_trial() {
                    SimError::BaselineUnstable
                } else {
                    e
                }
            })?;
        let scores = self.model.compute_scores();
        let baseline = LoggedMutation {
            key: "wild".into(),
            previous: 0.0,
            value: 0.0,
        };
        self.log
            .write_row(0, 0, 0, 0, Some(&baseline), &self.model, &scores)?;
        info!(
            scheme = self.scheme.as_str(),
            iterations = self.total_iterations,
            "engine initialized"
        );
        Ok(())
    }

    /// One trial. Unstable trials return `Ok(Unstable)` without advancing the
    /// iteration count, until the consecutive-failure cap aborts the run.
    pub fn iterate(&mut self, solver: &mut dyn SteadyStateSolver) -> Result<StepOutcome, SimError> {
        let snapshot = self.model.mutant_snapshot();
        let mutation = random_parameter_mutation(&mut self.model, &self.normal, &mut self.rng);

        match self.model.compute_mutant_steady_state(solver) {
            Ok(()) => self.nb_unstable = 0,
            Err(e) if e.is_unstable_trial() => {
                self.model
                    .set_mutant_parameter(mutation.param, mutation.previous);
                self.model.restore_mutant(&snapshot);
                self.nb_unstable += 1;
                if self.nb_unstable > UNSTABLE_CAP {
                    return Err(SimError::UnstableNetwork {
                        failures: self.nb_unstable,
                    });
                }
                warn!(
                    consecutive = self.nb_unstable,
                    param = %self.model.parameters[mutation.param].key,
                    "unstable trial discarded"
                );
                let scores = self.model.compute_scores();
                let counted = self.counted_iterations();
                self.log.write_row(
                    counted,
                    self.nb_accepted,
                    self.nb_rejected,
                    self.nb_unstable,
                    None,
                    &self.model,
                    &scores,
                )?;
                return Ok(StepOutcome::Unstable);
            }
            Err(e) => return Err(e),
        }

        let scores = self.model.compute_scores();
        if self.scheme.accepts(&scores, self.threshold) {
            self.nb_accepted += 1;
            for (sp, stats) in self.model.variable_species().zip(self.species_stats.iter_mut()) {
                stats.fold(sp.mutant_value, sp.wild_value);
            }
            for (rx, stats) in self.model.reactions.iter().zip(self.flux_stats.iter_mut()) {
                stats.fold(rx.mutant_flux, rx.wild_flux);
            }
            let record = LoggedMutation {
                key: self.model.parameters[mutation.param].key.clone(),
                previous: mutation.previous,
                value: mutation.value,
            };
            debug!(param = %record.key, distance = ?self.scheme.distance(&scores), "accepted");
            let counted = self.counted_iterations();
            self.log.write_row(
                counted,
                self.nb_accepted,
                self.nb_rejected,
                self.nb_unstable,
                Some(&record),
                &self.model,
                &scores,
            )?;
            Ok(StepOutcome::Accepted)
        } else {
            self.nb_rejected += 1;
            self.model
                .set_mutant_parameter(mutation.param, mutation.previous);
            self.model.restore_mutant(&snapshot);
            // Log the restored state; the discarded trial leaves no trace.
            let scores = self.model.compute_scores();
            let counted = self.counted_iterations();
            self.log.write_row(
                counted,
                self.nb_accepted,
                self.nb_rejected,
                self.nb_unstable,
                None,
                &self.model,
                &scores,
            )?;
            Ok(StepOutcome::Rejected)
        }
    }

    /// Run to the iteration total and write the final statistics file.
    pub fn run(&mut self, solver: &mut dyn SteadyStateSolver) -> Result<(), SimError> {
        self.initialize(solver)?;
        while self.counted_iterations() < self.total_iterations {
            self.iterate(solver)?;
        }
        self.write_statistics()?;
        info!(
            accepted = self.nb_accepted,
            rejected = self.nb_rejected,
            "run complete"
        );
        Ok(())
    }

    pub fn write_statistics(&self) -> Result<(), SimError> {
        write_statistics(
            &self.statistics_path,
            &self.model,
            &self.species_stats,
            &self.flux_stats,
            self.nb_accepted,
        )?;
        Ok(())
    }

    pub fn counted_iterations(&self) -> u64 {
        self.nb_accepted + self.nb_rejected
    }

    pub fn nb_accepted(&self) -> u64 {
        self.nb_accepted
    }

    pub fn nb_rejected(&self) -> u64 {
        self.nb_rejected
    }

    pub fn nb_unstable(&self) -> u32 {
        self.nb_unstable
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn species_stats(&self) -> &[RunningStats] {
        &self.species_stats
    }

    pub fn flux_stats(&self) -> &[RunningStats] {
        &self.flux_stats
    }
}
