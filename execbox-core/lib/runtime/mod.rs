//! The container runtime boundary.
//!
//! The orchestrator only talks to a [`SandboxRuntime`]. Any engine that can create an isolated
//! unit from an image, start it, wait for it, kill it, read its logs and force-remove it can be
//! plugged in. [`DockerRuntime`] is the production implementation.

mod docker;
#[cfg(any(test, feature = "testing"))]
mod mock;
mod types;

use async_trait::async_trait;

//--------------------------------------------------------------------------------------------------
// Exports
//--------------------------------------------------------------------------------------------------

pub use docker::*;
#[cfg(any(test, feature = "testing"))]
pub use mock::*;
pub use types::*;

//--------------------------------------------------------------------------------------------------
// Traits
//--------------------------------------------------------------------------------------------------

/// A container or process-isolation engine able to host execution units.
///
/// Implementations must be safe to share between concurrent requests. Every method operates on
/// a single unit and never on state belonging to another unit.
#[async_trait]
pub trait SandboxRuntime: Send + Sync {
    /// Creates a unit without starting it. Resource ceilings and network isolation are applied
    /// here, before the workload can ever run.
    async fn create(&self, spec: &UnitSpec) -> RuntimeResult<UnitHandle>;

    /// Starts a created unit.
    async fn start(&self, handle: &UnitHandle) -> RuntimeResult<()>;

    /// Waits until the unit stops and returns its exit code.
    ///
    /// This future may never resolve on its own; callers bound it with a timeout and drop it to
    /// stop waiting.
    async fn wait(&self, handle: &UnitHandle) -> RuntimeResult<i64>;

    /// Kills a running unit.
    async fn kill(&self, handle: &UnitHandle) -> RuntimeResult<()>;

    /// Returns the unit's combined stdout and stderr.
    async fn logs(&self, handle: &UnitHandle) -> RuntimeResult<Vec<u8>>;

    /// Force-removes the unit and everything attached to it, running or not.
    async fn remove(&self, handle: &UnitHandle) -> RuntimeResult<()>;
}
