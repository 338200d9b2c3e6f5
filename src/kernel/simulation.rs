use std::collections::{BTreeMap, HashSet};

use serde_json::{Map as JsonMap, Value, json};

use super::{Agent, PoolPolicy};
use crate::ids::{IPAddress, TenantId, tenant_range};
use crate::ip_info::IPInfo;
use crate::rng::SimRng;
use crate::stats::{self, AllocationRecord};
use crate::time::Duration;

pub struct Simulation {
    total_ips: u32,
    time_delta: Duration,
    max_time: Duration,
    stat_collection_interval: Duration,
    latent_conf_probability: f64,
    allocation_sampling_rate: u64,

    t: Duration,
    rng: SimRng,
    done: bool,

    ip_infos: Vec<IPInfo>,
    free_set: HashSet<IPAddress>,

    policy: Option<Box<dyn PoolPolicy>>,
    agents: Vec<Box<dyn Agent>>,

    window_allocated: u64,
    window_conf: u64,
    total_allocated: u64,
    total_conf: u64,
    total_time_held: Duration,
    max_used_ips: u32,

    all_allocations: Vec<AllocationRecord>,

    time_series_stats: BTreeMap<Duration, JsonMap<String, Value>>,
    overall_stats: JsonMap<String, Value>,
}

pub struct SimulationConfig {
    pub total_ips: u32,
    pub time_delta: Duration,
    pub max_time: Duration,
    pub stat_collection_interval: Duration,
    pub latent_conf_probability: f64,
    pub allocation_sampling_rate: u64,
    pub seed: u64,
}

impl Simulation {
    pub fn new(config: SimulationConfig, policy: Box<dyn PoolPolicy>) -> Self {
        Simulation {
            total_ips: config.total_ips,
            time_delta: config.time_delta,
            max_time: config.max_time,
            stat_collection_interval: config.stat_collection_interval,
            latent_conf_probability: config.latent_conf_probability,
            allocation_sampling_rate: config.allocation_sampling_rate,

            t: Duration::ZERO,
            rng: SimRng::seeded(config.seed),
            done: false,

            ip_infos: Vec::with_capacity(config.total_ips as usize),
            free_set: HashSet::with_capacity(config.total_ips as usize),

            policy: Some(policy),
            agents: Vec::new(),

            window_allocated: 0,
            window_conf: 0,
            total_allocated: 0,
            total_conf: 0,
            total_time_held: Duration::ZERO,
            max_used_ips: 0,

            all_allocations: Vec::new(),

            time_series_stats: BTreeMap::new(),
            overall_stats: JsonMap::new(),
        }
    }

    pub fn add_agent(&mut self, agent: Box<dyn Agent>) {
        self.agents.push(agent);
    }

    pub fn get_time(&self) -> Duration {
        self.t
    }

    pub fn get_time_delta(&self) -> Duration {
        self.time_delta
    }

    pub fn get_info(&self, ip: IPAddress) -> &IPInfo {
        &self.ip_infos[ip.0 as usize]
    }

    /// Purges expired latent configurations on `ip` as of now, then reports
    /// whether a remaining entry belongs to a tenant other than `tenant`.
    pub fn has_config(&mut self, ip: IPAddress, now: Duration, tenant: TenantId) -> bool {
        self.ip_infos[ip.0 as usize].has_config(now, tenant)
    }

    pub fn rand(&mut self) -> &mut SimRng {
        &mut self.rng
    }

    pub fn done(&mut self) {
        self.done = true;
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn total_ips(&self) -> u32 {
        self.total_ips
    }

    pub fn free_count(&self) -> usize {
        self.free_set.len()
    }

    pub fn max_used_ips(&self) -> u32 {
        self.max_used_ips
    }

    pub fn total_allocated(&self) -> u64 {
        self.total_allocated
    }

    pub fn total_conf(&self) -> u64 {
        self.total_conf
    }

    pub fn policy_kind(&self) -> &'static str {
        self.policy.as_ref().expect("policy present").kind()
    }

    /// Downcasts the live policy to a concrete type, for the Adversary agent's
    /// optional Segmented-pool timer telemetry.
    pub fn policy_as<P: 'static>(&self) -> Option<&P> {
        self.policy
            .as_ref()
            .and_then(|p| p.as_any().downcast_ref::<P>())
    }

    pub fn time_series_stats(&self) -> &BTreeMap<Duration, JsonMap<String, Value>> {
        &self.time_series_stats
    }

    pub fn overall_stats(&self) -> &JsonMap<String, Value> {
        &self.overall_stats
    }

    /// Delegates to the policy, applies the kernel-side bookkeeping described
    /// in the kernel's `get_ip` contract, and panics if the policy handed back
    /// an IP the kernel does not believe is free.
    pub fn get_ip(&mut self, tenant: TenantId) -> IPAddress {
        let mut policy = self.policy.take().expect("policy present");
        let ip = policy.get_ip(self, tenant);
        self.policy = Some(policy);

        if !self.free_set.remove(&ip) {
            super::error::KernelError::PolicyReturnedOwnedIp(ip).abort();
        }

        let now = self.t;
        let has_conf = {
            let info = &mut self.ip_infos[ip.0 as usize];
            info.owner = tenant;
            info.allocated_at = now;
            info.has_config(now, tenant)
        };

        self.window_allocated += 1;
        self.total_allocated += 1;
        if has_conf {
            self.window_conf += 1;
            self.total_conf += 1;
        }

        let used = self.total_ips - self.free_set.len() as u32;
        if used > self.max_used_ips {
            self.max_used_ips = used;
        }

        ip
    }

    /// Delegates to the policy, applies the kernel-side bookkeeping described
    /// in the kernel's `release_ip` contract. Panics on ownership violations.
    pub fn release_ip(&mut self, ip: IPAddress, tenant: TenantId, benign: bool) {
        {
            let info = &self.ip_infos[ip.0 as usize];
            if info.owner.is_nil() {
                super::error::KernelError::ReleaseAlreadyFree(tenant, ip).abort();
            }
            if info.owner != tenant {
                super::error::KernelError::ReleaseNotOwner {
                    ip,
                    requested: tenant,
                    actual: info.owner,
                }
                .abort();
            }
        }

        let now = self.t;
        let (allocated_at, prev_released) = {
            let info = &self.ip_infos[ip.0 as usize];
            (info.allocated_at, info.released)
        };
        let held_duration = now - allocated_at;
        let free_for = if prev_released == Duration::ZERO {
            Duration::ZERO
        } else {
            allocated_at - prev_released
        };

        {
            let info = &mut self.ip_infos[ip.0 as usize];
            info.released = now;
            if benign {
                info.released_benign = now;
                info.owners.add(tenant.0);
                if self.rng.uniform_f64() < self.latent_conf_probability {
                    let u = self.rng.uniform_f64();
                    let sample_secs = -(1.0 - u).ln() * held_duration.as_secs_f64();
                    info.configurations
                        .insert(tenant, now + Duration(sample_secs as i64));
                }
            }
            info.owner = TenantId::NIL;
        }
        self.total_time_held += held_duration;

        {
            let mut policy = self.policy.take().expect("policy present");
            policy.release_ip(self, ip, tenant);
            self.policy = Some(policy);
        }
        self.free_set.insert(ip);

        {
            let mut agents = std::mem::take(&mut self.agents);
            for agent in agents.iter_mut() {
                agent.on_release(self, ip, tenant);
            }
            self.agents = agents;
        }

        let sample = self.allocation_sampling_rate == 0
            || self.rng.uniform_u64(self.allocation_sampling_rate) == 0;
        if sample {
            self.all_allocations.push(AllocationRecord {
                allocated_at,
                tenant,
                held_for: held_duration,
                free_for,
            });
        }
    }

    pub(crate) fn init_agents(&mut self) {
        for i in 0..self.total_ips {
            self.ip_infos.push(IPInfo::new(IPAddress(i)));
        }

        {
            let mut policy = self.policy.take().expect("policy present");
            policy.init(self);
            for i in 0..self.total_ips {
                policy.seed(self, IPAddress(i));
            }
            self.policy = Some(policy);
        }

        for i in 0..self.total_ips {
            self.free_set.insert(IPAddress(i));
        }

        let agent_count = self.agents.len();
        let mut agents = std::mem::take(&mut self.agents);
        for (index, agent) in agents.iter_mut().enumerate() {
            let (min_id, max_id) = tenant_range(index, agent_count);
            agent.init(self, min_id, max_id);
        }
        self.agents = agents;
    }

    pub(crate) fn process(&mut self) -> bool {
        if (self.max_time != Duration::ZERO && self.t >= self.max_time) || self.done {
            return false;
        }

        let mut agents = std::mem::take(&mut self.agents);
        for agent in agents.iter_mut() {
            agent.process(self);
        }
        self.agents = agents;

        self.t += self.time_delta;

        if self.stat_collection_interval != Duration::ZERO
            && self.t.0 % self.stat_collection_interval.0 == 0
        {
            self.collect_periodic_stats();
        }

        true
    }

    pub(crate) fn cleanup_agents(&mut self) {
        let mut agents = std::mem::take(&mut self.agents);
        for agent in agents.iter_mut() {
            agent.cleanup(self);
        }
        self.agents = agents;

        self.collect_overall_stats();
    }

    fn collect_periodic_stats(&mut self) {
        let mut values = JsonMap::new();
        values.insert("availableIPs".into(), json!(self.free_set.len()));
        values.insert("allocated".into(), json!(self.window_allocated));
        values.insert("latentConf".into(), json!(self.window_conf));
        self.window_allocated = 0;
        self.window_conf = 0;

        let mut agents = std::mem::take(&mut self.agents);
        for agent in agents.iter_mut() {
            agent.collect_periodic_stats(self, &mut values);
        }
        self.agents = agents;

        self.time_series_stats.insert(self.t, values);
    }

    fn collect_overall_stats(&mut self) {
        let mut values = JsonMap::new();
        values.insert("maxUsedIPs".into(), json!(self.max_used_ips));
        values.insert("allocated".into(), json!(self.total_allocated));
        values.insert("latentConf".into(), json!(self.total_conf));

        if let Some(cdf) = stats::allocation_duration_cdf(&self.all_allocations) {
            values.insert("allocationDurationCDF".into(), json!(cdf_to_json(&cdf)));
        }
        if let Some(cdf) = stats::free_duration_cdf(&self.all_allocations) {
            values.insert("freeDurationCDF".into(), json!(cdf_to_json(&cdf)));
        }

        let mut agents = std::mem::take(&mut self.agents);
        for agent in agents.iter_mut() {
            agent.collect_overall_stats(self, &mut values);
        }
        self.agents = agents;

        self.overall_stats = values;
    }

    /// Runs the whole simulation: `init_agents`, then `process` until it
    /// returns `false`, then `cleanup_agents`.
    pub fn run(&mut self) {
        self.init_agents();
        while self.process() {}
        self.cleanup_agents();
    }
}

fn cdf_to_json(cdf: &[Duration]) -> Vec<i64> {
    cdf.iter().map(|d| d.0).collect()
}
