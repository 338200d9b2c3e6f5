use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map as JsonMap, Value, json};

use crate::ids::{IPAddress, TenantId};
use crate::kernel::{Agent, Simulation};
use crate::policy::SegmentedPool;
use crate::time::Duration;

struct AllocMeta {
    created_at: Duration,
    tenant: TenantId,
    ip: IPAddress,

    prev_tenant_count: u64,
    time_since_reuse: Duration,
    new_ip: bool,
    has_latent_conf: bool,
    segment_timer: Duration,
}

/// The workload under study: repeatedly allocates and releases IPs under a
/// rotating cast of tenant ids, hoping a newly allocated address still
/// carries a prior benign tenant's latent configuration. Tracks how often
/// that happens and, when running against the Segmented pool, how close each
/// received IP's timer was to expiry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdversaryAgentConfig {
    #[serde(default)]
    pub max_created: u64,
    pub max_ips: usize,
    pub hold_duration: Duration,
    pub max_per_cycle: i64,
    #[serde(default)]
    pub allocations_per_tenant: i64,
    #[serde(default)]
    pub max_tenants: i64,
    #[serde(default)]
    pub start_time: Duration,
}

pub struct AdversaryAgent {
    config: AdversaryAgentConfig,
    all_allocs: Vec<AllocMeta>,
    oldest_active_alloc: usize,
    stats_index: usize,
    benign_allocs: u64,
    benign_exploited_allocs: u64,
    uniques: HashSet<IPAddress>,
    min_id: TenantId,
    max_id: TenantId,
    final_stats: JsonMap<String, Value>,
}

impl AdversaryAgent {
    pub fn new(config: AdversaryAgentConfig) -> Self {
        let allocations_per_tenant = if config.allocations_per_tenant <= 0 {
            i64::MAX
        } else {
            config.allocations_per_tenant
        };
        let max_tenants = if config.max_tenants <= 0 {
            i64::MAX
        } else {
            config.max_tenants
        };
        AdversaryAgent {
            config: AdversaryAgentConfig {
                allocations_per_tenant,
                max_tenants,
                ..config
            },
            all_allocs: Vec::new(),
            oldest_active_alloc: 0,
            stats_index: 0,
            benign_allocs: 0,
            benign_exploited_allocs: 0,
            uniques: HashSet::new(),
            min_id: TenantId::NIL,
            max_id: TenantId::NIL,
            final_stats: JsonMap::new(),
        }
    }

    fn collect_stats(&mut self, stats: &mut JsonMap<String, Value>) {
        if self.stats_index == self.all_allocs.len() {
            stats.insert("adversary".into(), Value::Null);
            return;
        }
        let num_entries = self.all_allocs.len() - self.stats_index;
        let mut sum_count: u64 = 0;
        let mut sum_seconds: i64 = 0;
        let mut num_new_ips: u64 = 0;
        let mut num_new_lcs: u64 = 0;
        for meta in &self.all_allocs[self.stats_index..] {
            sum_seconds += meta.time_since_reuse.0;
            sum_count += meta.prev_tenant_count;
            if meta.new_ip {
                num_new_ips += 1;
                if meta.has_latent_conf {
                    num_new_lcs += 1;
                }
            }
        }

        let mut adv = JsonMap::new();
        adv.insert("created".into(), json!(num_entries));
        adv.insert("totalCreated".into(), json!(self.all_allocs.len()));
        adv.insert(
            "avgTimeSinceReuse".into(),
            json!(sum_seconds / num_entries as i64),
        );
        adv.insert(
            "avgPrevTenants".into(),
            json!(sum_count / num_entries as u64),
        );
        adv.insert("totalUniques".into(), json!(self.uniques.len()));
        adv.insert("newUniques".into(), json!(num_new_ips));
        adv.insert("newLatentConfs".into(), json!(num_new_lcs));
        adv.insert("adversaryBenignAllocs".into(), json!(self.benign_allocs));
        adv.insert(
            "adversaryBenignExploitedAllocs".into(),
            json!(self.benign_exploited_allocs),
        );
        stats.insert("adversary".into(), Value::Object(adv));

        self.stats_index = self.all_allocs.len();
    }
}

impl Agent for AdversaryAgent {
    fn init(&mut self, _sim: &mut Simulation, min_id: TenantId, max_id: TenantId) {
        self.min_id = min_id;
        self.max_id = max_id;
    }

    fn process(&mut self, sim: &mut Simulation) {
        let t = sim.get_time();
        if t < self.config.start_time {
            return;
        }

        let draw = sim.rand().uniform_u64(self.config.max_per_cycle.max(1) as u64) as i64;
        let mut i = 0;
        while (self.all_allocs.len() - self.oldest_active_alloc) < self.config.max_ips && i < draw {
            if self.config.max_created != 0 && self.all_allocs.len() as u64 >= self.config.max_created {
                sim.done();
                break;
            }

            let tenant = self.min_id
                + ((self.all_allocs.len() as i64 / self.config.allocations_per_tenant)
                    % self.config.max_tenants) as u32;
            let ip = sim.get_ip(tenant);

            let segment_timer = sim
                .policy_as::<SegmentedPool>()
                .map(|p| p.get_ip_timer(ip, t))
                .unwrap_or(Duration::ZERO);

            let new_ip = !self.uniques.contains(&ip);
            self.uniques.insert(ip);

            let prev_tenant_count = sim.get_info(ip).unique_owners();
            let time_since_reuse = sim.get_info(ip).released_benign;
            // `has_config` purges expired entries as a side effect, so it goes
            // through the dedicated kernel accessor rather than `get_info`.
            let has_latent_conf = sim.has_config(ip, t, self.min_id);

            self.all_allocs.push(AllocMeta {
                created_at: t,
                tenant,
                ip,
                prev_tenant_count,
                time_since_reuse,
                new_ip,
                has_latent_conf,
                segment_timer,
            });

            i += 1;
        }

        while self.oldest_active_alloc < self.all_allocs.len() {
            let meta = &self.all_allocs[self.oldest_active_alloc];
            if t > meta.created_at + self.config.hold_duration {
                sim.release_ip(meta.ip, meta.tenant, false);
                self.oldest_active_alloc += 1;
            } else {
                break;
            }
        }
    }

    /// Mirrors the reference implementation's ordering: the kernel runs every
    /// agent's `cleanup` before it assembles the final overall-stats map, so
    /// anything computed here is cached and merged in via
    /// `collect_overall_stats` rather than written to the run's stats
    /// directly.
    fn cleanup(&mut self, sim: &mut Simulation) {
        self.stats_index = 0;
        if self.all_allocs.is_empty() {
            return;
        }

        let mut final_stats = JsonMap::new();
        self.collect_stats(&mut final_stats);
        self.final_stats = final_stats;

        let mut cdf: Vec<i64> = (0..1000)
            .map(|_| {
                let idx = sim.rand().uniform_usize(self.all_allocs.len());
                self.all_allocs[idx].segment_timer.0
            })
            .collect();
        cdf.sort_unstable();
        self.final_stats
            .insert("adversarySegmentCDF".into(), json!(cdf));
    }

    fn collect_periodic_stats(&mut self, _sim: &Simulation, stats: &mut JsonMap<String, Value>) {
        self.collect_stats(stats);
    }

    fn collect_overall_stats(&mut self, _sim: &Simulation, stats: &mut JsonMap<String, Value>) {
        for (k, v) in std::mem::take(&mut self.final_stats) {
            stats.insert(k, v);
        }
    }

    fn on_release(&mut self, sim: &Simulation, ip: IPAddress, tenant: TenantId) {
        if tenant >= self.min_id && tenant < self.max_id {
            return;
        }
        if sim.get_time() < self.config.start_time {
            return;
        }
        let was_adversarial = self.uniques.contains(&ip);
        self.benign_allocs += 1;
        if was_adversarial {
            self.benign_exploited_allocs += 1;
        }
    }

    fn kind(&self) -> &'static str {
        "adversary"
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
                max_time: Duration(1000),
                stat_collection_interval: Duration::ZERO,
                latent_conf_probability: 1.0,
                allocation_sampling_rate: 0,
                seed: 0,
            },
            Box::new(FifoPool::new()),
        );
        s.add_agent(Box::new(AdversaryAgent::new(AdversaryAgentConfig {
            max_created: 0,
            max_ips: 5,
            hold_duration: Duration(10),
            max_per_cycle: 3,
            allocations_per_tenant: 1,
            max_tenants: 1,
            start_time: Duration::ZERO,
        })));
        s.init_agents();
        s
    }

    #[test]
    fn run_completes_and_produces_overall_stats() {
        let mut s = sim(10);
        while s.process() {}
        s.cleanup_agents();
        assert!(s.total_allocated() > 0);
        assert!(s.overall_stats().contains_key("adversary"));
        assert!(s.overall_stats().contains_key("adversarySegmentCDF"));
    }
}
