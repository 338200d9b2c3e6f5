use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::agent::AgentConfig;
use crate::policy::PolicyConfig;
use crate::time::Duration;

pub(crate) fn default_logging_level() -> String {
    "info".to_string()
}

fn default_stat_collection_interval() -> Duration {
    Duration::HOUR
}

fn default_allocation_sampling_rate() -> u64 {
    1
}

fn default_seed() -> u64 {
    0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: default_logging_level(),
            json: false,
        }
    }
}

/// One complete simulation: pool size, clock, the policy under test, and the
/// agents that generate and absorb IP churn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    pub total_ips: u32,
    pub time_delta: Duration,
    #[serde(default)]
    pub max_time: Duration,
    #[serde(default = "default_stat_collection_interval")]
    pub stat_collection_interval: Duration,
    #[serde(default)]
    pub latent_conf_probability: f64,
    #[serde(default = "default_allocation_sampling_rate")]
    pub allocation_sampling_rate: u64,
    #[serde(default = "default_seed")]
    pub seed: u64,
    pub policy: PolicyConfig,
    pub agents: Vec<AgentConfig>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// A named collection of runs executed independently by the `batch` subcommand.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    pub runs: BTreeMap<String, RunConfig>,
}
