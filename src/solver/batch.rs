//! Subprocess adapter for the equilibrium solver.
//!
//! File-in/file-out contract: the current network description and a generated
//! task file are written into a working directory, the executable is invoked
//! on the task file, and its report is parsed back. The executable is opaque;
//! only the file formats are part of the contract.

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::debug;

use crate::model::network::NetworkDescription;
use crate::SimError;

use super::{parse_report, SolverError, SteadyState, SteadyStateSolver};

const NETWORK_FILE: &str = "network.toml";
const TASK_FILE: &str = "task.toml";
const REPORT_FILE: &str = "report.txt";

pub struct BatchSolver {
    executable: PathBuf,
    work_dir: PathBuf,
}

impl BatchSolver {
    pub fn new(executable: impl Into<PathBuf>, work_dir: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            work_dir: work_dir.into(),
        }
    }

    fn write_task_file(&self, path: &Path) -> Result<(), SolverError> {
        let task = format!(
            "task = \"steady-state\"\nnetwork = {:?}\nreport = {:?}\n",
            NETWORK_FILE, REPORT_FILE
        );
        std::fs::write(path, task)?;
        Ok(())
    }
}

impl SteadyStateSolver for BatchSolver {
    fn solve(&mut self, network: &NetworkDescription) -> Result<SteadyState, SolverError> {
        std::fs::create_dir_all(&self.work_dir)?;
        let network_path = self.work_dir.join(NETWORK_FILE);
        let task_path = self.work_dir.join(TASK_FILE);
        let report_path = self.work_dir.join(REPORT_FILE);

        let text = network.to_toml().map_err(|e| match e {
            SimError::Consistency(msg) => SolverError::Report(msg),
            other => SolverError::Report(other.to_string()),
        })?;
        std::fs::write(&network_path, text)?;
        self.write_task_file(&task_path)?;
        // Stale reports must never be parsed as fresh results.
        let _ = std::fs::remove_file(&report_path);

        debug!(executable = %self.executable.display(), "invoking solver");
        let status = Command::new(&self.executable)
            .arg(&task_path)
            .current_dir(&self.work_dir)
            .status()
            .map_err(|source| SolverError::Launch {
                executable: self.executable.display().to_string(),
                source,
            })?;
        if !status.success() {
            return Err(SolverError::Failed { status });
        }

        let report = std::fs::read_to_string(&report_path)?;
        parse_report(&report)
    }
}
