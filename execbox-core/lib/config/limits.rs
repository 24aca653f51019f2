//! Resource limits applied to every execution unit.

use std::time::Duration;

use execbox_utils::{
    DEFAULT_MAX_OUTPUT_BYTES, DEFAULT_MEMORY_MIB, DEFAULT_PIDS_LIMIT, DEFAULT_TIMEOUT_SECS,
};
use getset::CopyGetters;

use crate::{ExecboxError, ExecboxResult};

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

const MIB: u64 = 1024 * 1024;

/// Docker refuses memory limits below 6 MiB
const MIN_MEMORY_BYTES: u64 = 6 * MIB;

/// The Engine API carries memory limits as signed 64-bit integers
const MAX_MEMORY_BYTES: u64 = i64::MAX as u64;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// The fixed ceilings every execution unit runs under.
///
/// Network access and persistent volumes are not part of the limits: every unit is created
/// without a network and without mounts, and that cannot be configured away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, CopyGetters)]
#[getset(get_copy = "pub with_prefix")]
pub struct ResourceLimits {
    /// Memory ceiling in bytes; swap is capped to the same value
    memory_bytes: u64,

    /// Wall-clock time the unit may run before it is killed
    timeout: Duration,

    /// Maximum number of processes inside the unit
    pids_limit: i64,

    /// Number of output bytes kept from the unit
    max_output_bytes: usize,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl ResourceLimits {
    /// Creates a new set of limits, rejecting values no container runtime would accept.
    pub fn new(
        memory_bytes: u64,
        timeout: Duration,
        pids_limit: i64,
        max_output_bytes: usize,
    ) -> ExecboxResult<Self> {
        if memory_bytes < MIN_MEMORY_BYTES {
            return Err(ExecboxError::InvalidLimits(format!(
                "memory ceiling must be at least {} bytes, got {}",
                MIN_MEMORY_BYTES, memory_bytes
            )));
        }

        if memory_bytes > MAX_MEMORY_BYTES {
            return Err(ExecboxError::InvalidLimits(format!(
                "memory ceiling must be at most {} bytes, got {}",
                MAX_MEMORY_BYTES, memory_bytes
            )));
        }

        if timeout.is_zero() {
            return Err(ExecboxError::InvalidLimits(
                "timeout must be greater than zero".to_string(),
            ));
        }

        if pids_limit <= 0 {
            return Err(ExecboxError::InvalidLimits(format!(
                "pids limit must be positive, got {}",
                pids_limit
            )));
        }

        if max_output_bytes == 0 {
            return Err(ExecboxError::InvalidLimits(
                "output limit must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            memory_bytes,
            timeout,
            pids_limit,
            max_output_bytes,
        })
    }

    /// Returns a copy with a different timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        if !timeout.is_zero() {
            self.timeout = timeout;
        }
        self
    }

    /// Renders the timeout the way it is reported to users, e.g. `5s` or `1.5s`.
    pub fn timeout_label(&self) -> String {
        let millis = self.timeout.as_millis();
        if millis % 1000 == 0 {
            format!("{}s", millis / 1000)
        } else {
            format!("{}s", self.timeout.as_secs_f64())
        }
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl Default for ResourceLimits {
    fn default() -> Self {
        Self {
            memory_bytes: DEFAULT_MEMORY_MIB * MIB,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            pids_limit: DEFAULT_PIDS_LIMIT,
            max_output_bytes: DEFAULT_MAX_OUTPUT_BYTES,
        }
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
