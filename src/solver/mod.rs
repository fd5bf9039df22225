//! Port to the external equilibrium solver.
//!
//! The core never computes a steady state itself: it hands a network
//! description to an implementation of [`SteadyStateSolver`] and consumes the
//! resulting report. The production adapter ([`batch::BatchSolver`]) drives an
//! opaque executable over files; tests substitute in-memory stubs.

pub mod batch;

use thiserror::Error;

use crate::model::network::NetworkDescription;

/// Sentinel line the solver emits when the network has no stable equilibrium.
pub const NO_EQUILIBRIUM_SENTINEL: &str = "No steady-state found";

/// Solver report: ordered `(name, value)` rows, species first, then reaction
/// fluxes. Order follows the report, not the network arenas; the model
/// resolves names before applying any value.
#[derive(Debug, Clone, Default)]
pub struct SteadyState {
    pub species: Vec<(String, f64)>,
    pub fluxes: Vec<(String, f64)>,
}

#[derive(Debug, Error)]
pub enum SolverError {
    /// The solver ran but found no stable equilibrium for this
    /// parameterization. Recoverable: the caller rolls back and retries.
    #[error("no steady-state found")]
    NoEquilibrium,

    /// The report exists but cannot be parsed. Treated like instability:
    /// the trial is discarded and the previous state restored.
    #[error("malformed solver report: {0}")]
    Report(String),

    /// The solver executable could not be started.
    #[error("failed to launch solver '{executable}': {source}")]
    Launch {
        executable: String,
        source: std::io::Error,
    },

    /// The solver process exited with a failure status.
    #[error("solver exited with {status}")]
    Failed { status: std::process::ExitStatus },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl SolverError {
    /// Recoverable failures are absorbed by rollback; the rest abort the run.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, SolverError::NoEquilibrium | SolverError::Report(_))
    }
}

/// Narrow synchronous port to an equilibrium solver.
pub trait SteadyStateSolver {
    /// Compute the steady state of `network` as currently parameterized.
    fn solve(&mut self, network: &NetworkDescription) -> Result<SteadyState, SolverError>;
}

/// Parse a two-section solver report: species rows, a blank line, reaction
/// rows. Each row is `name<TAB>value` (semicolons accepted as a fallback
/// delimiter). A sentinel line anywhere means no equilibrium exists.
pub fn parse_report(text: &str) -> Result<SteadyState, SolverError> {
    let mut state = SteadyState::default();
    let mut in_fluxes = false;
    let mut saw_row = false;

    for (lineno, raw) in text.lines().enumerate() {
        let line = raw.trim_end_matches('\r');
        if line.contains(NO_EQUILIBRIUM_SENTINEL) {
            return Err(SolverError::NoEquilibrium);
        }
        if line.trim().is_empty() {
            if saw_row {
                in_fluxes = true;
            }
            continue;
        }
        let (name, value) = split_row(line)
            .ok_or_else(|| SolverError::Report(format!("line {}: '{line}'", lineno + 1)))?;
        let value: f64 = value.trim().parse().map_err(|_| {
            SolverError::Report(format!("line {}: bad value '{value}'", lineno + 1))
        })?;
        saw_row = true;
        let row = (name.trim().to_string(), value);
        if in_fluxes {
            state.fluxes.push(row);
        } else {
            state.species.push(row);
        }
    }

    if state.species.is_empty() {
        return Err(SolverError::Report("report contains no species rows".into()));
    }
    Ok(state)
}

fn split_row(line: &str) -> Option<(&str, &str)> {
    line.split_once('\t').or_else(|| line.split_once(';'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_two_section_report() {
        let text = "Glc\t1.25\nAtp\t0.5\n\nvHk\t0.75\nvPk\t-0.1\n";
        let state = parse_report(text).unwrap();
        assert_eq!(state.species.len(), 2);
        assert_eq!(state.fluxes.len(), 2);
        assert_eq!(state.species[0], ("Glc".to_string(), 1.25));
        assert_eq!(state.fluxes[1], ("vPk".to_string(), -0.1));
    }

    #[test]
    fn semicolon_delimiter_accepted() {
        let state = parse_report("A;2.0\n\nv1;3.0\n").unwrap();
        assert_eq!(state.species[0].1, 2.0);
        assert_eq!(state.fluxes[0].1, 3.0);
    }

    #[test]
    fn sentinel_maps_to_no_equilibrium() {
        let err = parse_report("A\t1.0\nNo steady-state found\n").unwrap_err();
        assert!(matches!(err, SolverError::NoEquilibrium));
        assert!(err.is_recoverable());
    }

    #[test]
    fn malformed_row_is_recoverable_report_error() {
        let err = parse_report("A\t1.0\n\nnot a row\n").unwrap_err();
        assert!(matches!(err, SolverError::Report(_)));
        assert!(err.is_recoverable());
    }

    #[test]
    fn empty_report_rejected() {
        assert!(matches!(parse_report(""), Err(SolverError::Report(_))));
    }
}
