//! metadrift simulates the long-run evolutionary drift of a kinetic reaction
//! network: molecular abundances and reaction fluxes wander under repeated
//! random perturbation of kinetic parameters, filtered by a selection rule.
//!
//! The crate keeps two instances of the same network side by side: a fixed
//! wild-type reference and an evolving mutant. An external batch solver turns
//! a parameterization into steady-state concentrations and fluxes; the core
//! only drives it through the [`solver::SteadyStateSolver`] port and consumes
//! its report deterministically.

pub mod cli;
pub mod config;
pub mod evolve;
pub mod model;
pub mod output;
pub mod sensitivity;
pub mod solver;
pub mod status;

use thiserror::Error;

use crate::solver::SolverError;

/// Crate-wide error taxonomy.
///
/// Configuration and consistency errors abort a run; solver instability is
/// absorbed locally by rollback until the consecutive-failure cap is hit.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Solver(#[from] SolverError),

    /// The unperturbed network has no stable equilibrium; nothing can evolve.
    #[error("the wild-type network has no stable equilibrium")]
    BaselineUnstable,

    /// Too many consecutive failed equilibrium computations.
    #[error("network is unstable: {failures} consecutive failed equilibrium computations")]
    UnstableNetwork { failures: u32 },

    /// A tracked value no longer mirrors the live instance. Programming
    /// invariant violation, never silently corrected.
    #[error("data consistency violation: {0}")]
    Consistency(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl SimError {
    /// True for failures that a caller absorbs via rollback instead of
    /// aborting the run.
    pub fn is_unstable_trial(&self) -> bool {
        matches!(self, SimError::Solver(e) if e.is_recoverable())
    }
}
