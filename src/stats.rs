//! Allocation trace sampling and the empirical CDF helpers built on top of it.

use crate::ids::TenantId;
use crate::time::Duration;

/// One sampled allocation/release cycle, recorded by the kernel in `release_ip`.
#[derive(Debug, Clone)]
pub struct AllocationRecord {
    pub allocated_at: Duration,
    pub tenant: TenantId,
    pub held_for: Duration,
    pub free_for: Duration,
}

/// 1000-quantile empirical CDF: `sorted[floor(n * i / 1000)]` for `i` in `0..1000`.
/// `sorted` must be non-empty and already sorted ascending.
pub fn quantiles(sorted: &[Duration]) -> Vec<Duration> {
    let n = sorted.len();
    (0..1000u64)
        .map(|i| sorted[((n as u64 * i) / 1000) as usize])
        .collect()
}

/// Allocation-duration CDF: all sampled records, sorted by `held_for`.
/// `None` if no allocations were sampled.
pub fn allocation_duration_cdf(records: &[AllocationRecord]) -> Option<Vec<Duration>> {
    if records.is_empty() {
        return None;
    }
    let mut durations: Vec<Duration> = records.iter().map(|r| r.held_for).collect();
    durations.sort();
    Some(quantiles(&durations))
}

/// Free-duration CDF: sampled records with a nonzero `free_for` (i.e. not a
/// first-time allocation), sorted by `free_for`. `None` if none qualify.
pub fn free_duration_cdf(records: &[AllocationRecord]) -> Option<Vec<Duration>> {
    let mut free_fors: Vec<Duration> = records
        .iter()
        .map(|r| r.free_for)
        .filter(|d| *d != Duration::ZERO)
        .collect();
    if free_fors.is_empty() {
        return None;
    }
    free_fors.sort();
    Some(quantiles(&free_fors))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(held_for: i64, free_for: i64) -> AllocationRecord {
        AllocationRecord {
            allocated_at: Duration::ZERO,
            tenant: TenantId(1),
            held_for: Duration(held_for),
            free_for: Duration(free_for),
        }
    }

    #[test]
    fn empty_input_omits_the_stat() {
        assert!(allocation_duration_cdf(&[]).is_none());
        assert!(free_duration_cdf(&[]).is_none());
    }

    #[test]
    fn quantiles_are_monotonic_and_sized_1000() {
        let records: Vec<_> = (0..50).map(|i| record(i, i)).collect();
        let cdf = allocation_duration_cdf(&records).unwrap();
        assert_eq!(cdf.len(), 1000);
        assert!(cdf.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(cdf[0], Duration(0));
        assert_eq!(*cdf.last().unwrap(), Duration(49));
    }

    #[test]
    fn free_duration_filters_zero_entries() {
        let records = vec![record(1, 0), record(2, 0)];
        assert!(free_duration_cdf(&records).is_none());
    }
}
