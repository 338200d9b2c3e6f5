use std::collections::{HashMap, VecDeque};

use crate::ids::{IPAddress, TenantId};
use crate::kernel::{PoolPolicy, Simulation};
use crate::policy::entry::{Entry, EntryArena, EntryId};
use crate::time::Duration;

const COOLDOWN: Duration = Duration(30 * 60);

/// Per-tenant affinity on top of a shared FIFO. A released IP is queued both
/// on its former owner's private list and on the shared list; `GetIP` prefers
/// handing a tenant back an IP it has held before, but only once that IP has
/// sat for the same 30-minute cooldown the shared list enforces, so a tenant
/// can't immediately reacquire its own just-released address.
///
/// Both queues hold the same `EntryId`; consuming it from either side
/// invalidates it everywhere, so the shared list is self-cleaning of entries
/// already claimed through tenant affinity.
#[derive(Default)]
pub struct TaggedPool {
    arena: EntryArena,
    all_ips: VecDeque<EntryId>,
    owner_pools: HashMap<TenantId, VecDeque<EntryId>>,
}

impl TaggedPool {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PoolPolicy for TaggedPool {
    fn init(&mut self, _sim: &mut Simulation) {}

    fn seed(&mut self, _sim: &mut Simulation, ip: IPAddress) {
        let id = self.arena.push(Entry {
            ip,
            owner: TenantId::NIL,
            valid: true,
            added: Duration::MIN,
        });
        self.all_ips.push_back(id);
    }

    fn get_ip(&mut self, sim: &mut Simulation, tenant: TenantId) -> IPAddress {
        let now = sim.get_time();

        let owner_queue = self.owner_pools.entry(tenant).or_default();
        while let Some(&id) = owner_queue.front() {
            if !self.arena.is_valid(id) {
                owner_queue.pop_front();
                continue;
            }
            if now - self.arena.added_of(id) < COOLDOWN {
                break;
            }
            owner_queue.pop_front();
            self.arena.invalidate(id);
            return self.arena.ip_of(id);
        }

        loop {
            let id = self
                .all_ips
                .pop_front()
                .unwrap_or_else(|| crate::kernel::error::KernelError::PoolExhausted.abort());
            if !self.arena.is_valid(id) {
                continue;
            }
            self.arena.invalidate(id);
            return self.arena.ip_of(id);
        }
    }

    fn release_ip(&mut self, sim: &mut Simulation, ip: IPAddress, tenant: TenantId) {
        let now = sim.get_time();
        let id = self.arena.push(Entry {
            ip,
            owner: tenant,
            valid: true,
            added: now,
        });
        self.owner_pools.entry(tenant).or_default().push_back(id);
        self.all_ips.push_back(id);
    }

    fn kind(&self) -> &'static str {
        "tagged"
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::SimulationConfig;

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
            Box::new(TaggedPool::new()),
        );
        s.init_agents();
        s
    }

    #[test]
    fn fresh_release_is_not_handed_back_to_its_own_tenant_immediately() {
        let mut s = sim(2);
        let a = s.get_ip(TenantId(1));
        let _b = s.get_ip(TenantId(2));
        s.release_ip(a, TenantId(1), true);
        // Only `a` is free; tenant 1 must still get it back via the shared
        // queue (the affinity branch is skipped because it's within cooldown).
        let next = s.get_ip(TenantId(1));
        assert_eq!(next, a);
    }

    #[test]
    fn affinity_wins_once_cooldown_has_elapsed() {
        let mut s = sim(2);
        let a = s.get_ip(TenantId(1));
        let b = s.get_ip(TenantId(2));
        s.release_ip(a, TenantId(1), true);
        s.release_ip(b, TenantId(2), true);
        for _ in 0..(31 * 60) {
            s.process();
        }
        let next = s.get_ip(TenantId(1));
        assert_eq!(next, a);
    }
}
