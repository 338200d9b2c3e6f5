use std::fs;

use anyhow::{Context, Result};
use clap::Parser;
use rayon::prelude::*;
use tracing::info;

use crate::cli::args::{BatchCmd, Cli, Command, RunCmd};
use crate::cli::context::{build_simulation, init_configs, init_tracing, load_configuration};
use crate::config::{RunConfig, load_batch_config};
use crate::result::RunResult;

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Init(args) => init_configs(args),
        Command::Run(args) => {
            let config = load_configuration(cli.config.clone())
                .with_context(|| "loading run config")?;
            init_tracing(&config.logging, cli.json_logs)?;
            run_one(&config, args)
        }
        Command::Batch(args) => {
            let batch =
                load_batch_config(cli.config.clone()).with_context(|| "loading batch config")?;
            let first_logging = batch.runs.values().next().map(|c| c.logging.clone());
            init_tracing(&first_logging.unwrap_or_default(), cli.json_logs)?;
            run_batch(batch, args)
        }
    }
}

fn run_one(config: &RunConfig, args: RunCmd) -> Result<()> {
    info!(total_ips = config.total_ips, policy = ?config.policy, "starting run");
    let mut sim = build_simulation(config);
    sim.run();
    let result = RunResult::from_run(config, &sim);
    let json = serde_json::to_string_pretty(&result)?;

    match args.out {
        Some(path) => {
            fs::write(&path, json).with_context(|| format!("writing result to {}", path.display()))?;
            info!(path = %path.display(), "wrote result");
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn run_batch(batch: crate::config::BatchConfig, args: BatchCmd) -> Result<()> {
    fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("creating output directory {}", args.out_dir.display()))?;

    let results: Vec<(String, Result<()>)> = batch
        .runs
        .into_par_iter()
        .map(|(name, config)| {
            info!(run = %name, "starting batch run");
            let mut sim = build_simulation(&config);
            sim.run();
            let result = RunResult::from_run(&config, &sim);
            let outcome = serde_json::to_string_pretty(&result)
                .context("serializing result")
                .and_then(|json| {
                    let path = args.out_dir.join(format!("{name}.json"));
                    fs::write(&path, json)
                        .with_context(|| format!("writing result to {}", path.display()))
                });
            (name, outcome)
        })
        .collect();

    let mut failed = false;
    for (name, outcome) in results {
        if let Err(err) = outcome {
            failed = true;
            eprintln!("run {name} failed: {err:#}");
        } else {
            info!(run = %name, "finished batch run");
        }
    }

    if failed {
        anyhow::bail!("one or more batch runs failed");
    }
    Ok(())
}
