//! Fatal invariant violations raised by the simulation kernel.
//!
//! These all indicate a programming error in a policy, agent, or trace input,
//! not a recoverable runtime condition. The reference implementation panics
//! at the same points, and this crate does too (see `KernelError::abort`).

use thiserror::Error;

use crate::ids::{IPAddress, TenantId};

#[derive(Debug, Error)]
pub enum KernelError {
    #[error("pool policy returned ip {0} which the kernel does not believe is free")]
    PolicyReturnedOwnedIp(IPAddress),

    #[error("tenant {requested} attempted to release ip {ip} owned by {actual}")]
    ReleaseNotOwner {
        ip: IPAddress,
        requested: TenantId,
        actual: TenantId,
    },

    #[error("tenant {0} attempted to release ip {1} which is already free")]
    ReleaseAlreadyFree(TenantId, IPAddress),

    #[error("pool policy exhausted: no free ip available")]
    PoolExhausted,

    #[error("segmented pool: ip {0} was in the free set but its entry was already invalidated")]
    SegmentedInvalidEntry(IPAddress),

    #[error("csv trace record out of order: record at {record_time} read after {current_time}")]
    CsvOutOfOrder {
        record_time: crate::time::Duration,
        current_time: crate::time::Duration,
    },

    #[error("malformed csv trace line: {0:?}")]
    CsvMalformed(String),

    #[error("csv trace released unknown instance id {0}")]
    CsvUnknownInstance(u64),
}

impl KernelError {
    /// Kernel invariant violations are fatal by contract (see ERROR HANDLING
    /// DESIGN): there is nothing to recover, so the run aborts immediately.
    pub fn abort(self) -> ! {
        panic!("{self}")
    }
}
