use anyhow::Result;

mod agent;
mod cli;
mod config;
mod csv_trace;
mod fourier;
mod hll;
mod ids;
mod ip_info;
mod kernel;
mod policy;
mod result;
mod rng;
mod stats;
mod time;

fn main() -> Result<()> {
    cli::run()
}
