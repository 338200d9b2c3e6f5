use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ids::{IPAddress, TenantId};
use crate::kernel::{Agent, Simulation};
use crate::time::Duration;

/// A workload whose total IP count random-walks between `min_ips` and
/// `max_ips`, re-rolling its target every `max_change_interval` at most, and
/// spreading its allocations across `num_tenants` rotating tenant ids.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MultiTenantAgentConfig {
    pub max_ips: usize,
    pub min_ips: usize,
    pub max_change_interval: Duration,
    pub max_per_cycle: usize,
    pub num_tenants: u32,
}

pub struct MultiTenantAgent {
    config: MultiTenantAgentConfig,
    active_ips: BTreeMap<IPAddress, TenantId>,
    current_ips: usize,
    next_change: Duration,
    min_id: TenantId,
}

impl MultiTenantAgent {
    pub fn new(config: MultiTenantAgentConfig) -> Self {
        MultiTenantAgent {
            config,
            active_ips: BTreeMap::new(),
            current_ips: 0,
            next_change: Duration::ZERO,
            min_id: TenantId::NIL,
        }
    }

    fn set_ips(&mut self, sim: &mut Simulation) {
        if sim.get_time() > self.next_change {
            let span = self.config.max_ips - self.config.min_ips;
            self.current_ips = if span == 0 {
                self.config.min_ips
            } else {
                sim.rand().uniform_usize(span) + self.config.min_ips
            };
            self.next_change = sim.get_time()
                + Duration(sim.rand().uniform_u64(self.config.max_change_interval.0 as u64) as i64);
        }
    }
}

impl Agent for MultiTenantAgent {
    fn init(&mut self, _sim: &mut Simulation, min_id: TenantId, _max_id: TenantId) {
        self.min_id = min_id;
    }

    fn process(&mut self, sim: &mut Simulation) {
        self.set_ips(sim);

        let mut i = 0;
        while self.active_ips.len() < self.current_ips && i < self.config.max_per_cycle {
            let id = self.min_id + sim.rand().uniform_u64(self.config.num_tenants as u64) as u32;
            let ip = sim.get_ip(id);
            self.active_ips.insert(ip, id);
            i += 1;
        }

        let mut i = 0;
        while self.active_ips.len() > self.current_ips && i < self.config.max_per_cycle {
            let ip = *self.active_ips.keys().next().unwrap();
            let id = self.active_ips.remove(&ip).unwrap();
            sim.release_ip(ip, id, true);
            i += 1;
        }
    }

    fn kind(&self) -> &'static str {
        "multi"
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
        s.add_agent(Box::new(MultiTenantAgent::new(MultiTenantAgentConfig {
            max_ips: 10,
            min_ips: 1,
            max_change_interval: Duration::HOUR,
            max_per_cycle: 4,
            num_tenants: 5,
        })));
        s.init_agents();
        s
    }

    #[test]
    fn stays_within_pool_capacity_over_many_ticks() {
        let mut s = sim(20);
        for _ in 0..5_000 {
            s.process();
        }
        assert!(s.free_count() <= 20);
    }

    #[test]
    fn fixed_demand_does_not_panic_on_zero_span() {
        let mut s = Simulation::new(
            SimulationConfig {
                total_ips: 5,
                time_delta: Duration::SECOND,
                max_time: Duration::ZERO,
                stat_collection_interval: Duration::ZERO,
                latent_conf_probability: 0.0,
                allocation_sampling_rate: 0,
                seed: 0,
            },
            Box::new(FifoPool::new()),
        );
        s.add_agent(Box::new(MultiTenantAgent::new(MultiTenantAgentConfig {
            max_ips: 2,
            min_ips: 2,
            max_change_interval: Duration::HOUR,
            max_per_cycle: 4,
            num_tenants: 3,
        })));
        s.init_agents();
        for _ in 0..1_000 {
            s.process();
        }
        assert!(s.free_count() <= 5);
    }
}
