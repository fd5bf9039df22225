use clap::{Parser, Subcommand};

use crate::evolve::SelectionScheme;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about)]
pub struct Args {
    /// Path to config TOML
    #[arg(long, global = true, default_value = "metadrift.toml")]
    pub config: String,

    /// Output directory
    #[arg(long, global = true, default_value = "output")]
    pub output_dir: String,

    /// Solver executable (overrides config)
    #[arg(long, global = true)]
    pub solver: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run the evolution engine
    Evolve {
        /// Network description TOML
        #[arg(value_name = "NETWORK_PATH")]
        network: String,

        /// Objective-function file (target reactions and weights)
        #[arg(long, value_name = "OBJECTIVE_PATH")]
        objective: String,

        /// Number of counted iterations (overrides config)
        #[arg(long)]
        iterations: Option<u64>,

        /// Mutation size in log10 space (overrides config)
        #[arg(long)]
        sigma: Option<f64>,

        /// Selection scheme (overrides config)
        #[arg(long, value_enum)]
        scheme: Option<SelectionScheme>,

        /// Selection threshold (overrides config)
        #[arg(long)]
        threshold: Option<f64>,

        /// RNG seed (overrides config)
        #[arg(long)]
        seed: Option<u64>,
    },

    /// One-at-a-time parameter sensitivity sweep
    OatSweep {
        /// Network description TOML
        #[arg(value_name = "NETWORK_PATH")]
        network: String,

        /// Largest log10 factor in each direction (overrides config)
        #[arg(long)]
        range: Option<f64>,

        /// Factor grid step (overrides config)
        #[arg(long)]
        step: Option<f64>,
    },

    /// Random multivariate sensitivity sweep
    RandomSweep {
        /// Network description TOML
        #[arg(value_name = "NETWORK_PATH")]
        network: String,

        /// Perturbation size in log10 space (overrides config)
        #[arg(long)]
        sigma: Option<f64>,

        /// Number of independent trials (overrides config)
        #[arg(long)]
        iterations: Option<u64>,

        /// RNG seed (overrides config)
        #[arg(long)]
        seed: Option<u64>,
    },
}
