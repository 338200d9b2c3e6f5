use std::fs;
use std::path::PathBuf;

use anyhow::{Result, anyhow};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;

use crate::config::{ConfigError, LoggingConfig, RunConfig, load_config};
use crate::kernel::{Simulation, SimulationConfig};

const TEMPLATE: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/sim.yaml"));

/// Initializes the global tracing subscriber, a text formatter by default or
/// JSON lines when `json` is set, filtered by `config.level` (or `RUST_LOG`
/// when set, since `EnvFilter` checks the environment first).
pub fn init_tracing(config: &LoggingConfig, json: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let base = fmt().with_target(true).with_level(true);

    if json || config.json {
        base.json()
            .with_env_filter(filter)
            .try_init()
            .map_err(|err| anyhow!(err.to_string()))?;
    } else {
        base.event_format(fmt::format().compact())
            .with_env_filter(filter)
            .try_init()
            .map_err(|err| anyhow!(err.to_string()))?;
    }
    Ok(())
}

pub fn load_configuration(path: Option<PathBuf>) -> Result<RunConfig, ConfigError> {
    load_config(path)
}

/// Builds a fresh `Simulation` from a `RunConfig`, wiring up the configured
/// policy and every configured agent. The simulation is not yet run.
pub fn build_simulation(config: &RunConfig) -> Simulation {
    let mut sim = Simulation::new(
        SimulationConfig {
            total_ips: config.total_ips,
            time_delta: config.time_delta,
            max_time: config.max_time,
            stat_collection_interval: config.stat_collection_interval,
            latent_conf_probability: config.latent_conf_probability,
            allocation_sampling_rate: config.allocation_sampling_rate,
            seed: config.seed,
        },
        config.policy.build(),
    );
    for agent_config in &config.agents {
        sim.add_agent(agent_config.build());
    }
    sim
}

pub fn init_configs(args: crate::cli::args::InitCmd) -> Result<()> {
    let output_dir = match args.output {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };
    fs::create_dir_all(&output_dir)?;

    let target_path = output_dir.join("sim.yaml");
    if target_path.exists() && !args.force {
        println!(
            "skipping {} (already exists, pass --force to overwrite)",
            target_path.display()
        );
        return Ok(());
    }

    fs::write(&target_path, TEMPLATE)?;
    println!("wrote {}", target_path.display());
    Ok(())
}
