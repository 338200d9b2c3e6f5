//! Per-IP metadata owned exclusively by the kernel.

use std::collections::HashMap;

use crate::hll::HyperLogLog;
use crate::ids::{IPAddress, TenantId};
use crate::time::Duration;

pub struct IPInfo {
    pub address: IPAddress,
    pub owner: TenantId,
    pub allocated_at: Duration,
    pub released: Duration,
    pub released_benign: Duration,
    pub owners: HyperLogLog,
    pub configurations: HashMap<TenantId, Duration>,
}

impl IPInfo {
    pub fn new(address: IPAddress) -> Self {
        IPInfo {
            address,
            owner: TenantId::NIL,
            allocated_at: Duration::ZERO,
            released: Duration::ZERO,
            released_benign: Duration::ZERO,
            owners: HyperLogLog::new(),
            configurations: HashMap::new(),
        }
    }

    /// Purges configurations that have expired as of `now`, then reports whether
    /// a *remaining* entry belongs to a tenant other than `tenant`.
    ///
    /// The purge happens strictly before the membership check: an entry found
    /// expired in this call can never itself cause a positive result, even for
    /// its own tenant.
    pub fn has_config(&mut self, now: Duration, tenant: TenantId) -> bool {
        self.configurations.retain(|_, expiration| *expiration > now);
        self.configurations.keys().any(|&owner| owner != tenant)
    }

    pub fn unique_owners(&self) -> u64 {
        self.owners.count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expired_entries_never_count_even_for_own_tenant() {
        let mut info = IPInfo::new(IPAddress(0));
        info.configurations.insert(TenantId(7), Duration(10));
        assert!(!info.has_config(Duration(10), TenantId(7)));
        assert!(info.configurations.is_empty());
    }

    #[test]
    fn other_tenants_unexpired_config_is_visible() {
        let mut info = IPInfo::new(IPAddress(0));
        info.configurations.insert(TenantId(7), Duration(100));
        assert!(info.has_config(Duration(10), TenantId(3)));
        assert!(!info.has_config(Duration(10), TenantId(7)));
    }
}
