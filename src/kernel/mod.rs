//! The simulation kernel: clock, IP state, free set, RNG, and the two trait
//! contracts (`PoolPolicy`, `Agent`) that policies and workload generators
//! implement against.

mod simulation;

pub mod error;

pub use simulation::{Simulation, SimulationConfig};

use std::any::Any;

use serde_json::Map as JsonMap;
use serde_json::Value;

use crate::ids::{IPAddress, TenantId};

/// Contract shared by all four IP-recycling strategies. `init`/`seed` run once
/// at startup; `get_ip`/`release_ip` run for the life of the simulation. The
/// kernel, not the policy, owns all mutation of IP ownership and timestamps;
/// `&mut Simulation` is passed through only so a policy can read the clock,
/// query `IPInfo`, and draw from the shared RNG (e.g. the Random policy's
/// uniform pick).
pub trait PoolPolicy: Any {
    fn init(&mut self, sim: &mut Simulation);
    fn seed(&mut self, sim: &mut Simulation, ip: IPAddress);
    fn get_ip(&mut self, sim: &mut Simulation, tenant: TenantId) -> IPAddress;
    fn release_ip(&mut self, sim: &mut Simulation, ip: IPAddress, tenant: TenantId);
    fn kind(&self) -> &'static str;

    /// Lets the Adversary agent downcast to `SegmentedPool` for timer telemetry
    /// without the kernel exposing a typed optional handle for every policy.
    fn as_any(&self) -> &dyn Any;
}

/// Contract shared by all workload generators. `init` receives the disjoint
/// tenant-id range carved out for this agent at kernel startup, plus a
/// `&mut Simulation` handle for agents that need to seed initial state (e.g.
/// Autoscale drawing its tenants' diurnal curves).
pub trait Agent {
    fn init(&mut self, sim: &mut Simulation, min_id: TenantId, max_id: TenantId);
    fn process(&mut self, sim: &mut Simulation);

    /// Optional end-of-run hook (e.g. the Adversary samples its segment CDF here).
    fn cleanup(&mut self, _sim: &mut Simulation) {}

    /// Optional contribution to the periodic (per-window) stats map.
    fn collect_periodic_stats(&mut self, _sim: &Simulation, _stats: &mut JsonMap<String, Value>) {}

    /// Optional contribution to the overall (end-of-run) stats map.
    fn collect_overall_stats(&mut self, _sim: &Simulation, _stats: &mut JsonMap<String, Value>) {}

    /// Notified whenever any IP is released, including releases by other
    /// agents. The reference implementation lets an agent subscribe a
    /// closure bound to its own instance to the kernel; Rust's ownership
    /// model makes a boxed closure aliasing a concurrently-owned agent
    /// impossible, so the kernel instead fans this out to every agent
    /// directly (the Adversary is the only one that currently cares).
    fn on_release(&mut self, _sim: &Simulation, _ip: IPAddress, _tenant: TenantId) {}

    fn kind(&self) -> &'static str;
}
