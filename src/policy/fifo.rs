use std::collections::VecDeque;

use crate::ids::{IPAddress, TenantId};
use crate::kernel::{PoolPolicy, Simulation};

/// Plain FIFO free list: oldest release wins the next allocation.
#[derive(Default)]
pub struct FifoPool {
    ips: VecDeque<IPAddress>,
}

impl FifoPool {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PoolPolicy for FifoPool {
    fn init(&mut self, _sim: &mut Simulation) {}

    fn seed(&mut self, _sim: &mut Simulation, ip: IPAddress) {
        self.ips.push_back(ip);
    }

    fn get_ip(&mut self, _sim: &mut Simulation, _tenant: TenantId) -> IPAddress {
        self.ips
            .pop_front()
            .unwrap_or_else(|| crate::kernel::error::KernelError::PoolExhausted.abort())
    }

    fn release_ip(&mut self, _sim: &mut Simulation, ip: IPAddress, _tenant: TenantId) {
        self.ips.push_back(ip);
    }

    fn kind(&self) -> &'static str {
        "fifo"
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::SimulationConfig;
    use crate::time::Duration;

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
        s.init_agents();
        s
    }

    #[test]
    fn never_returns_the_most_recent_release_while_others_are_free() {
        let mut s = sim(3);
        let a = s.get_ip(TenantId(1));
        let _b = s.get_ip(TenantId(1));
        s.release_ip(a, TenantId(1), true);
        let next = s.get_ip(TenantId(1));
        assert_ne!(next, a);
    }
}
