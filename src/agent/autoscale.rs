use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::fourier::Fourier;
use crate::ids::{IPAddress, TenantId};
use crate::kernel::{Agent, Simulation};
use crate::time::Duration;

const DAILY_TERMS: usize = 24 * 2;

struct AutoscaleConfig {
    id: TenantId,
    n_max: f64,
    n_min: f64,
    targets: [f64; DAILY_TERMS],
    expires: Duration,
    ips: BTreeSet<IPAddress>,
}

/// Simulates a tenant whose IP demand follows a random diurnal curve: it grows
/// and shrinks its held-IP count over the day, and every `tenant_churn`
/// (mean, exponentially distributed) retires entirely and is replaced by a
/// freshly generated tenant with a new curve.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutoscaleAgentConfig {
    pub num_tenants: usize,
    /// Kept for config-file compatibility with the reference implementation;
    /// unread by the scheduling logic there too.
    #[serde(default)]
    pub max_wait: i64,
    pub n_max: u32,
    pub n_min: u32,
    #[serde(default)]
    pub tenant_churn: Duration,
}

pub struct AutoscaleAgent {
    config: AutoscaleAgentConfig,
    tenant_autoscales: HashMap<Duration, Vec<AutoscaleConfig>>,
    max_tenant_id: u32,
    min_id: TenantId,
}

impl AutoscaleAgent {
    pub fn new(config: AutoscaleAgentConfig) -> Self {
        AutoscaleAgent {
            config,
            tenant_autoscales: HashMap::new(),
            max_tenant_id: 0,
            min_id: TenantId::NIL,
        }
    }

    fn new_config(&mut self, sim: &mut Simulation) -> AutoscaleConfig {
        let id = self.min_id + self.max_tenant_id;
        self.max_tenant_id += 1;

        let scale = (self.config.n_max as f64 / self.config.n_min as f64).ln();
        let n_max = self.config.n_min as f64 * (sim.rand().uniform_f64() * scale).exp();
        let n_min = sim.rand().uniform_u64(n_max as u64) as f64;

        let fourier = Fourier::random(sim.rand());
        let mut targets = [0.0; DAILY_TERMS];
        for (i, target) in targets.iter_mut().enumerate() {
            *target = fourier.compute(i as f64 / DAILY_TERMS as f64);
        }

        let lambda = if self.config.tenant_churn > Duration::ZERO {
            1.0 / self.config.tenant_churn.as_secs_f64()
        } else {
            0.0
        };
        let expires = sim.get_time() + sim.rand().exponential_duration(lambda);

        AutoscaleConfig {
            id,
            n_max,
            n_min,
            targets,
            expires,
            ips: BTreeSet::new(),
        }
    }
}

impl Agent for AutoscaleAgent {
    fn init(&mut self, sim: &mut Simulation, min_id: TenantId, _max_id: TenantId) {
        self.min_id = min_id;
        let t = sim.get_time();
        for _ in 0..self.config.num_tenants {
            let config = self.new_config(sim);
            self.tenant_autoscales.entry(t).or_default().push(config);
        }
    }

    fn process(&mut self, sim: &mut Simulation) {
        let t = sim.get_time();
        let mut to_process: Vec<Option<AutoscaleConfig>> = self
            .tenant_autoscales
            .remove(&t)
            .unwrap_or_default()
            .into_iter()
            .map(Some)
            .collect();
        let next_timestep = Duration(
            (t.0 * DAILY_TERMS as i64 / Duration::DAY.0 + 1) * Duration::DAY.0 / DAILY_TERMS as i64,
        );

        let mut i = 0;
        while i < to_process.len() {
            let mut config = to_process[i].take().expect("slot populated exactly once");

            if config.expires < t {
                for ip in config.ips.drain() {
                    sim.release_ip(ip, config.id, true);
                }
                let fresh = self.new_config(sim);
                to_process.push(Some(fresh));
                i += 1;
                continue;
            }

            let target_index = (t.0 * DAILY_TERMS as i64 / Duration::DAY.0) as usize % DAILY_TERMS;
            let target_ips =
                (config.n_min + (config.n_max - config.n_min) * config.targets[target_index]) as usize;

            while config.ips.len() < target_ips {
                let ip = sim.get_ip(config.id);
                config.ips.insert(ip);
            }
            while config.ips.len() > target_ips {
                let ip = *config.ips.iter().next().unwrap();
                config.ips.remove(&ip);
                sim.release_ip(ip, config.id, true);
            }

            let next_process = next_timestep
                + Duration(sim.rand().uniform_u64((Duration::DAY.0 / DAILY_TERMS as i64) as u64) as i64);
            self.tenant_autoscales
                .entry(next_process)
                .or_default()
                .push(config);
            i += 1;
        }
    }

    fn kind(&self) -> &'static str {
        "autoscale"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::SimulationConfig;
    use crate::policy::FifoPool;

    fn sim(total_ips: u32) -> Simulation {
        let mut s = Simulation::new(
            SimulationConfig {
                total_ips,
                time_delta: Duration::SECOND,
                max_time: Duration::ZERO,
                stat_collection_interval: Duration::ZERO,
                latent_conf_probability: 0.0,
                allocation_sampling_rate: 0,
                seed: 0,
            },
            Box::new(FifoPool::new()),
        );
        s.add_agent(Box::new(AutoscaleAgent::new(AutoscaleAgentConfig {
            num_tenants: 2,
            max_wait: 0,
            n_max: 10,
            n_min: 1,
            tenant_churn: Duration::DAY,
        })));
        s.init_agents();
        s
    }

    #[test]
    fn ticking_never_panics_and_stays_within_pool_size() {
        let mut s = sim(50);
        for _ in 0..10_000 {
            if !s.process() {
                break;
            }
        }
        assert!(s.free_count() <= 50);
    }
}
