//! The sandbox orchestrator.
//!
//! One call to [`Orchestrator::execute`] owns one execution unit from creation to removal:
//!
//! 1. create the unit from the profile's image with the snippet in `$CODE`, the memory ceiling
//!    and no network
//! 2. start it
//! 3. wait for it, bounded by the timeout
//! 4. on timeout, kill it
//! 5. collect its output
//! 6. force-remove it
//!
//! Removal happens before the result is returned on every path. A failed removal is logged
//! and never changes the result.

use std::{collections::HashMap, sync::Arc};

use execbox_utils::{
    CODE_ENV_VAR, MANAGED_LABEL, TIMEOUT_EXIT_CODE, UNIT_NAME_PREFIX, UNIT_WORKDIR,
};
use tokio::time::Instant;
use tracing::Instrument;

use crate::{
    config::ResourceLimits,
    registry::{ExecutionProfile, LanguageRegistry},
    runtime::{RuntimeError, SandboxRuntime, UnitHandle, UnitSpec},
    ExecboxError, ExecboxResult,
};

use super::{collector, ExecutionRequest, ExecutionResult, ExecutionStatus, UnitGuard};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Runs snippets in single-use execution units.
///
/// The orchestrator holds no per-request state; one instance is shared by every concurrent
/// request and each call provisions its own private unit.
#[derive(Clone)]
pub struct Orchestrator {
    runtime: Arc<dyn SandboxRuntime>,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl Orchestrator {
    /// Creates an orchestrator on top of a runtime.
    pub fn new(runtime: Arc<dyn SandboxRuntime>) -> Self {
        Self { runtime }
    }

    /// Resolves the request's language and runs it.
    ///
    /// An unsupported language is rejected before anything is provisioned.
    pub async fn execute_request(
        &self,
        registry: &LanguageRegistry,
        request: &ExecutionRequest,
        limits: &ResourceLimits,
    ) -> ExecboxResult<ExecutionResult> {
        let profile = registry
            .resolve(&request.language_id)
            .ok_or_else(|| ExecboxError::UnsupportedLanguage(request.language_id.clone()))?;

        Ok(self.execute(profile, &request.source_code, limits).await)
    }

    /// Runs a snippet in a fresh execution unit and returns its outcome.
    ///
    /// Never fails: provisioning and runtime faults are reported through
    /// [`ExecutionResult::status`].
    ///
    /// The unit's lifecycle runs on its own task. Dropping the returned future (a client that
    /// disconnects, an outer timeout) does not interrupt it, so the unit is still removed.
    pub async fn execute(
        &self,
        profile: &ExecutionProfile,
        source_code: &str,
        limits: &ResourceLimits,
    ) -> ExecutionResult {
        let spec = unit_spec(profile, source_code, limits);
        let span = tracing::info_span!(
            "execute",
            unit = %spec.get_name(),
            language = %profile.get_language_id(),
        );

        let orchestrator = self.clone();
        let limits = *limits;
        let lifecycle = tokio::spawn(
            async move { orchestrator.execute_spec(spec, &limits).await }.instrument(span),
        );

        match lifecycle.await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!("execution task failed: {}", e);
                ExecutionResult::failed(format!("Execution failed: {}", e))
            }
        }
    }

    async fn execute_spec(&self, spec: UnitSpec, limits: &ResourceLimits) -> ExecutionResult {
        let handle = match self.runtime.create(&spec).await {
            Ok(handle) => handle,
            Err(RuntimeError::ImageNotFound(image)) => {
                tracing::error!("image {} is not available", image);
                return ExecutionResult::image_unavailable(spec.get_image());
            }
            Err(e) => {
                tracing::error!("failed to create unit: {}", e);
                return ExecutionResult::failed(format!("Execution failed: {}", e));
            }
        };

        let guard = UnitGuard::new(Arc::clone(&self.runtime), handle);
        let result = self.run(guard.handle(), limits).await;

        if let Err(e) = guard.release().await {
            tracing::warn!("failed to remove unit {}: {}", spec.get_name(), e);
        }

        tracing::info!(
            status = %result.status,
            exit_code = result.exit_code,
            duration_ms = result.duration_ms,
            "execution finished"
        );

        result
    }

    async fn run(&self, handle: &UnitHandle, limits: &ResourceLimits) -> ExecutionResult {
        if let Err(e) = self.runtime.start(handle).await {
            tracing::error!("failed to start unit: {}", e);
            return ExecutionResult::failed(format!("Execution failed: {}", e));
        }

        let started = Instant::now();
        let outcome = tokio::time::timeout(limits.get_timeout(), self.runtime.wait(handle)).await;
        let duration_ms = started.elapsed().as_millis() as u64;

        match outcome {
            Ok(Ok(exit_code)) => {
                let collected =
                    collector::collect(self.runtime.as_ref(), handle, limits.get_max_output_bytes())
                        .await;

                ExecutionResult {
                    output: collected.output,
                    exit_code,
                    status: ExecutionStatus::Completed,
                    truncated: collected.truncated,
                    duration_ms,
                }
            }
            Ok(Err(e)) => {
                tracing::error!("failed to wait for unit: {}", e);
                ExecutionResult {
                    duration_ms,
                    ..ExecutionResult::failed(format!("Execution failed: {}", e))
                }
            }
            Err(_) => {
                tracing::info!("unit exceeded its {} timeout, killing it", limits.timeout_label());
                if let Err(e) = self.runtime.kill(handle).await {
                    tracing::warn!("failed to kill unit: {}", e);
                }

                let collected =
                    collector::collect(self.runtime.as_ref(), handle, limits.get_max_output_bytes())
                        .await;

                let mut output = if collected.produced_output {
                    let mut partial = collected.output;
                    if !partial.ends_with('\n') {
                        partial.push('\n');
                    }
                    partial
                } else {
                    String::new()
                };
                output.push_str(&timeout_message(limits));

                ExecutionResult {
                    output,
                    exit_code: TIMEOUT_EXIT_CODE,
                    status: ExecutionStatus::TimedOut,
                    truncated: collected.truncated,
                    duration_ms,
                }
            }
        }
    }
}

//--------------------------------------------------------------------------------------------------
// Functions: Helpers
//--------------------------------------------------------------------------------------------------

/// The message reported for a unit killed at the timeout.
pub fn timeout_message(limits: &ResourceLimits) -> String {
    format!("Error: Execution Timed Out (Limit: {})", limits.timeout_label())
}

/// Describes the unit for one execution. The snippet is placed in the environment only; the
/// command comes from the profile and never contains request data.
fn unit_spec(profile: &ExecutionProfile, source_code: &str, limits: &ResourceLimits) -> UnitSpec {
    let mut labels = HashMap::new();
    labels.insert(MANAGED_LABEL.to_string(), "true".to_string());
    labels.insert(
        format!("{}.language", UNIT_NAME_PREFIX),
        profile.get_language_id().clone(),
    );

    UnitSpec::builder()
        .name(format!("{}-{}", UNIT_NAME_PREFIX, uuid::Uuid::new_v4()))
        .image(profile.get_image_reference().clone())
        .command(profile.render_command())
        .env(vec![(CODE_ENV_VAR.to_string(), source_code.to_string())])
        .working_dir(UNIT_WORKDIR)
        .labels(labels)
        .memory_bytes(limits.get_memory_bytes())
        .pids_limit(limits.get_pids_limit())
        .network_disabled(true)
        .build()
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
