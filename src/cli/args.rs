use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "elastic-ip-pool-sim", version, about = "Elastic-IP allocation pool simulator")]
pub struct Cli {
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "Config file path (defaults to sim.yaml or config/sim.yaml)"
    )]
    pub config: Option<PathBuf>,

    #[arg(long, help = "Switch log output to JSON lines")]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a single configuration to completion and print its result as JSON
    Run(RunCmd),
    /// Run every configuration in a batch file, in parallel, one result file per run
    Batch(BatchCmd),
    /// Write a template config file
    Init(InitCmd),
}

#[derive(Args, Debug)]
pub struct RunCmd {
    #[arg(long, value_name = "FILE", help = "Where to write the result JSON (default: stdout)")]
    pub out: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct BatchCmd {
    #[arg(long, value_name = "DIR", help = "Directory to write one result file per run")]
    pub out_dir: PathBuf,
}

#[derive(Args, Debug)]
pub struct InitCmd {
    #[arg(long, value_name = "DIR", help = "Output directory (default: current directory)")]
    pub output: Option<PathBuf>,
    #[arg(long, help = "Overwrite an existing file")]
    pub force: bool,
}
