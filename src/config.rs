use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::evolve::SelectionScheme;
use crate::SimError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "EngineConfig::default_iterations")]
    pub iterations: u64,
    #[serde(default = "EngineConfig::default_sigma")]
    pub sigma: f64,
    #[serde(default = "EngineConfig::default_scheme")]
    pub scheme: SelectionScheme,
    #[serde(default = "EngineConfig::default_threshold")]
    pub threshold: f64,
    #[serde(default = "EngineConfig::default_seed")]
    pub seed: u64,
}

impl EngineConfig {
    fn default_iterations() -> u64 {
        10_000
    }
    fn default_sigma() -> f64 {
        0.01
    }
    fn default_scheme() -> SelectionScheme {
        SelectionScheme::MutationAccumulation
    }
    fn default_threshold() -> f64 {
        0.0
    }
    fn default_seed() -> u64 {
        1234
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            iterations: Self::default_iterations(),
            sigma: Self::default_sigma(),
            scheme: Self::default_scheme(),
            threshold: Self::default_threshold(),
            seed: Self::default_seed(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepConfig {
    /// Largest log10 factor explored in each direction.
    #[serde(default = "SweepConfig::default_range")]
    pub range: f64,
    #[serde(default = "SweepConfig::default_step")]
    pub step: f64,
}

impl SweepConfig {
    fn default_range() -> f64 {
        1.0
    }
    fn default_step() -> f64 {
        0.1
    }
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            range: Self::default_range(),
            step: Self::default_step(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomSweepConfig {
    #[serde(default = "RandomSweepConfig::default_sigma")]
    pub sigma: f64,
    #[serde(default = "RandomSweepConfig::default_iterations")]
    pub iterations: u64,
    #[serde(default = "EngineConfig::default_seed")]
    pub seed: u64,
}

impl RandomSweepConfig {
    fn default_sigma() -> f64 {
        0.01
    }
    fn default_iterations() -> u64 {
        1_000
    }
}

impl Default for RandomSweepConfig {
    fn default() -> Self {
        Self {
            sigma: Self::default_sigma(),
            iterations: Self::default_iterations(),
            seed: EngineConfig::default_seed(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverConfig {
    #[serde(default = "SolverConfig::default_executable")]
    pub executable: String,
    #[serde(default = "SolverConfig::default_work_dir")]
    pub work_dir: String,
}

impl SolverConfig {
    fn default_executable() -> String {
        "equisolve".to_string()
    }
    fn default_work_dir() -> String {
        "solver_work".to_string()
    }
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            executable: Self::default_executable(),
            work_dir: Self::default_work_dir(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RunConfig {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub sweep: SweepConfig,
    #[serde(default)]
    pub random: RandomSweepConfig,
    #[serde(default)]
    pub solver: SolverConfig,
}

impl RunConfig {
    pub fn load_or_default(path: &str) -> Self {
        let path_obj = Path::new(path);
        if path_obj.exists() {
            match fs::read_to_string(path_obj) {
                Ok(contents) => match toml::from_str(&contents) {
                    Ok(cfg) => return cfg,
                    Err(err) => {
                        eprintln!("Failed to parse config {path}: {err}. Using defaults.");
                    }
                },
                Err(err) => {
                    eprintln!("Failed to read config {path}: {err}. Using defaults.");
                }
            }
            return Self::default();
        }

        // File does not exist: write commented defaults and return them.
        let default_cfg = Self::default();
        if let Ok(text) = toml::to_string_pretty(&default_cfg) {
            let mut commented = String::new();
            for line in text.lines() {
                let trimmed = line.trim();
                if trimmed.is_empty() || (trimmed.starts_with('[') && trimmed.ends_with(']')) {
                    commented.push_str(line);
                } else {
                    commented.push_str("# ");
                    commented.push_str(line);
                }
                commented.push('\n');
            }
            if let Err(err) = fs::write(path_obj, commented) {
                eprintln!("Failed to write default config to {path}: {err}");
            }
        }
        default_cfg
    }

    /// Every argument is checked before any simulation work starts; the
    /// diagnostic names the offending argument.
    pub fn validate(&self) -> Result<(), SimError> {
        if self.engine.iterations == 0 {
            return Err(SimError::Config("engine.iterations must be positive".into()));
        }
        if self.engine.sigma <= 0.0 {
            return Err(SimError::Config(format!(
                "engine.sigma must be positive, got {}",
                self.engine.sigma
            )));
        }
        if self.engine.threshold < 0.0 {
            return Err(SimError::Config(format!(
                "engine.threshold must be non-negative, got {}",
                self.engine.threshold
            )));
        }
        if self.sweep.range <= 0.0 {
            return Err(SimError::Config(format!(
                "sweep.range must be positive, got {}",
                self.sweep.range
            )));
        }
        if self.sweep.step <= 0.0 {
            return Err(SimError::Config(format!(
                "sweep.step must be positive, got {}",
                self.sweep.step
            )));
        }
        if self.random.sigma <= 0.0 {
            return Err(SimError::Config(format!(
                "random.sigma must be positive, got {}",
                self.random.sigma
            )));
        }
        if self.random.iterations == 0 {
            return Err(SimError::Config("random.iterations must be positive".into()));
        }
        if self.solver.executable.is_empty() {
            return Err(SimError::Config("solver.executable must not be empty".into()));
        }
        // Bare command names are resolved on PATH at launch; an explicit path
        // must exist before any simulation work starts.
        let executable = Path::new(&self.solver.executable);
        if executable.components().count() > 1 && !executable.exists() {
            return Err(SimError::Config(format!(
                "solver executable '{}' does not exist",
                self.solver.executable
            )));
        }
        Ok(())
    }

    /// Dump the fully resolved configuration next to the run outputs.
    pub fn dump(&self, path: &Path) -> Result<(), SimError> {
        let text = toml::to_string_pretty(self)
            .map_err(|e| SimError::Config(format!("cannot serialize configuration: {e}")))?;
        fs::write(path, text)?;
        Ok(())
    }
}
