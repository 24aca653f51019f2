//! Scoped ownership of a live execution unit.

use std::sync::Arc;

use crate::runtime::{RuntimeResult, SandboxRuntime, UnitHandle};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Owns a created execution unit until it is removed.
///
/// [`UnitGuard::release`] force-removes the unit exactly once. If the guard is dropped without
/// being released (the owning future was cancelled or panicked), removal is spawned onto the
/// current tokio runtime instead, so no path leaves a unit behind.
pub struct UnitGuard {
    runtime: Arc<dyn SandboxRuntime>,
    handle: UnitHandle,
    released: bool,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl UnitGuard {
    /// Takes ownership of a freshly created unit.
    pub fn new(runtime: Arc<dyn SandboxRuntime>, handle: UnitHandle) -> Self {
        Self {
            runtime,
            handle,
            released: false,
        }
    }

    /// The guarded unit.
    pub fn handle(&self) -> &UnitHandle {
        &self.handle
    }

    /// Force-removes the unit. If this future is dropped before removal finishes, the guard's
    /// `Drop` still removes it.
    pub async fn release(mut self) -> RuntimeResult<()> {
        let result = self.runtime.remove(&self.handle).await;
        self.released = true;
        result
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl Drop for UnitGuard {
    fn drop(&mut self) {
        if self.released {
            return;
        }

        let runtime = Arc::clone(&self.runtime);
        let handle = self.handle.clone();
        match tokio::runtime::Handle::try_current() {
            Ok(tokio_handle) => {
                tracing::warn!("unit {} dropped before release, removing it", handle.get_name());
                tokio_handle.spawn(async move {
                    if let Err(e) = runtime.remove(&handle).await {
                        tracing::warn!("failed to remove unit {}: {}", handle.get_name(), e);
                    }
                });
            }
            Err(_) => {
                tracing::error!(
                    "unit {} dropped outside a tokio runtime and was not removed",
                    handle.get_name()
                );
            }
        }
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::runtime::{MockRuntime, MockScript, UnitSpec};

    fn spec() -> UnitSpec {
        UnitSpec::builder()
            .name("execbox-guard")
            .image("python:3.12-slim")
            .command(vec!["sh".to_string()])
            .working_dir("/sandbox")
            .memory_bytes(128 * 1024 * 1024)
            .pids_limit(64)
            .build()
    }

    #[tokio::test]
    async fn test_release_removes_exactly_once() {
        let runtime = Arc::new(MockRuntime::default());
        let handle = runtime.create(&spec()).await.unwrap();

        let guard = UnitGuard::new(runtime.clone(), handle);
        guard.release().await.unwrap();

        tokio::task::yield_now().await;
        assert_eq!(runtime.removes(), 1);
        assert_eq!(runtime.live_units(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_release_cancelled_mid_remove_still_removes_unit() {
        let runtime = Arc::new(MockRuntime::new(MockScript {
            remove_delay: Duration::from_millis(100),
            ..Default::default()
        }));
        let handle = runtime.create(&spec()).await.unwrap();

        let guard = UnitGuard::new(runtime.clone(), handle);
        let released = tokio::time::timeout(Duration::from_millis(10), guard.release()).await;
        assert!(released.is_err());

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(runtime.live_units(), 0);
    }

    #[tokio::test]
    async fn test_dropped_guard_still_removes_unit() {
        let runtime = Arc::new(MockRuntime::default());
        let handle = runtime.create(&spec()).await.unwrap();

        drop(UnitGuard::new(runtime.clone(), handle));

        for _ in 0..10 {
            if runtime.removes() == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(runtime.removes(), 1);
        assert_eq!(runtime.live_units(), 0);
    }
}
