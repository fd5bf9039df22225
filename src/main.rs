// Entry point: parses the command line, resolves the run configuration, and
// dispatches to the evolution engine or one of the sensitivity explorers.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use metadrift::cli::{Args, Command};
use metadrift::config::RunConfig;
use metadrift::evolve::mcmc::{EngineSettings, Mcmc};
use metadrift::model::Model;
use metadrift::output::{OAT_SENSITIVITY_FILE, RANDOM_SENSITIVITY_FILE};
use metadrift::sensitivity::{OatSweep, RandomSweep};
use metadrift::solver::batch::BatchSolver;
use metadrift::status::{RunStatus, StatusFile, STATUS_FILE};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let mut config = RunConfig::load_or_default(&args.config);
    apply_overrides(&mut config, &args);
    config.validate()?;

    let output_dir = PathBuf::from(&args.output_dir);
    std::fs::create_dir_all(&output_dir)
        .with_context(|| format!("cannot create output directory '{}'", output_dir.display()))?;
    config.dump(&output_dir.join("run_config.toml"))?;

    // The status file flips to DONE even when the run aborts, so the
    // orchestrating layer never waits on a dead run.
    let status = StatusFile::new(output_dir.join(STATUS_FILE));
    status.write(RunStatus::Waiting)?;
    let result = dispatch(&args, &config, &output_dir);
    status.write(RunStatus::Done)?;

    if let Err(err) = &result {
        error!("run aborted: {err:#}");
    }
    result
}

fn dispatch(args: &Args, config: &RunConfig, output_dir: &Path) -> anyhow::Result<()> {
    let mut solver = BatchSolver::new(
        config.solver.executable.clone(),
        output_dir.join(&config.solver.work_dir),
    );

    match &args.command {
        Command::Evolve {
            network, objective, ..
        } => {
            let model = Model::from_files(Path::new(network), Some(Path::new(objective)))?;
            let settings = EngineSettings {
                scheme: config.engine.scheme,
                threshold: config.engine.threshold,
                iterations: config.engine.iterations,
                sigma: config.engine.sigma,
                seed: config.engine.seed,
            };
            let mut engine = Mcmc::new(model, settings, output_dir)?;
            engine.run(&mut solver)?;
        }
        Command::OatSweep { network, .. } => {
            let mut model = Model::from_files(Path::new(network), None)?;
            let sweep = OatSweep::new(config.sweep.range, config.sweep.step)?;
            sweep.run(
                &mut model,
                &mut solver,
                &output_dir.join(OAT_SENSITIVITY_FILE),
            )?;
        }
        Command::RandomSweep { network, .. } => {
            let mut model = Model::from_files(Path::new(network), None)?;
            let sweep = RandomSweep::new(
                config.random.sigma,
                config.random.iterations,
                config.random.seed,
            )?;
            sweep.run(
                &mut model,
                &mut solver,
                &output_dir.join(RANDOM_SENSITIVITY_FILE),
            )?;
        }
    }
    Ok(())
}

fn apply_overrides(config: &mut RunConfig, args: &Args) {
    if let Some(v) = &args.solver {
        config.solver.executable = v.clone();
    }
    match &args.command {
        Command::Evolve {
            iterations,
            sigma,
            scheme,
            threshold,
            seed,
            ..
        } => {
            if let Some(v) = iterations {
                config.engine.iterations = *v;
            }
            if let Some(v) = sigma {
                config.engine.sigma = *v;
            }
            if let Some(v) = scheme {
                config.engine.scheme = *v;
            }
            if let Some(v) = threshold {
                config.engine.threshold = *v;
            }
            if let Some(v) = seed {
                config.engine.seed = *v;
            }
        }
        Command::OatSweep { range, step, .. } => {
            if let Some(v) = range {
                config.sweep.range = *v;
            }
            if let Some(v) = step {
                config.sweep.step = *v;
            }
        }
        Command::RandomSweep {
            sigma,
            iterations,
            seed,
            ..
        } => {
            if let Some(v) = sigma {
                config.random.sigma = *v;
            }
            if let Some(v) = iterations {
                config.random.iterations = *v;
            }
            if let Some(v) = seed {
                config.random.seed = *v;
            }
        }
    }
}
