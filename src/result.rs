//! The serializable result of one completed run.

use serde::Serialize;
use serde_json::{Map as JsonMap, Value};

use crate::config::RunConfig;
use crate::kernel::Simulation;
use crate::policy::PolicyConfig;
use crate::time::Duration;

#[derive(Debug, Serialize)]
pub struct RunResult {
    pub total_ips: u32,
    pub time_delta: Duration,
    pub max_time: Duration,
    pub policy: PolicyConfig,
    pub agents: Vec<crate::agent::AgentConfig>,
    pub latent_conf_probability: f64,
    pub max_used_ips: u32,
    pub time_series_stats: JsonMap<String, Value>,
    pub overall_stats: JsonMap<String, Value>,
}

impl RunResult {
    pub fn from_run(config: &RunConfig, sim: &Simulation) -> Self {
        let time_series_stats = sim
            .time_series_stats()
            .iter()
            .map(|(t, v)| (t.0.to_string(), Value::Object(v.clone())))
            .collect();

        RunResult {
            total_ips: config.total_ips,
            time_delta: config.time_delta,
            max_time: config.max_time,
            policy: config.policy.clone(),
            agents: config.agents.clone(),
            latent_conf_probability: config.latent_conf_probability,
            max_used_ips: sim.max_used_ips(),
            time_series_stats,
            overall_stats: sim.overall_stats().clone(),
        }
    }
}
