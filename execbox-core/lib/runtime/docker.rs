//! Docker implementation of the runtime boundary.
//!
//! Units are plain containers. Every isolation setting (memory and swap ceiling, no network,
//! process limit, dropped capabilities) is part of the create call, so a unit is never reachable
//! from the network, not even between create and start.

use std::collections::HashMap;

use async_trait::async_trait;
use bollard::{
    container::{
        Config, CreateContainerOptions, KillContainerOptions, ListContainersOptions, LogsOptions,
        RemoveContainerOptions, StartContainerOptions, WaitContainerOptions,
    },
    errors::Error as BollardError,
    image::CreateImageOptions,
    models::HostConfig,
    Docker,
};
use execbox_utils::MANAGED_LABEL;
use futures::StreamExt;

use super::{RuntimeError, RuntimeResult, SandboxRuntime, UnitHandle, UnitSpec};

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

const NETWORK_MODE_NONE: &str = "none";

const NO_NEW_PRIVILEGES: &str = "no-new-privileges";

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// A [`SandboxRuntime`] backed by the local Docker daemon.
///
/// The client is a stateless dispatcher to the daemon; one instance is created at startup and
/// shared by every request.
#[derive(Debug, Clone)]
pub struct DockerRuntime {
    docker: Docker,
    pull_missing: bool,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl DockerRuntime {
    /// Connects to the local Docker daemon using the platform defaults (`DOCKER_HOST` or the
    /// local socket).
    ///
    /// With `pull_missing` set, an image that is not present locally is pulled once before the
    /// unit is created, the way `docker run` behaves.
    pub fn connect(pull_missing: bool) -> RuntimeResult<Self> {
        let docker = Docker::connect_with_local_defaults()
            .map_err(|e| RuntimeError::Connection(e.to_string()))?;

        Ok(Self {
            docker,
            pull_missing,
        })
    }

    /// Checks that the daemon answers.
    pub async fn ping(&self) -> RuntimeResult<()> {
        self.docker.ping().await.map_err(runtime_error)?;
        Ok(())
    }

    /// Checks whether an image is present locally.
    pub async fn has_image(&self, image: &str) -> RuntimeResult<bool> {
        match self.docker.inspect_image(image).await {
            Ok(_) => Ok(true),
            Err(e) if is_not_found(&e) => Ok(false),
            Err(e) => Err(runtime_error(e)),
        }
    }

    /// Pulls an image from its registry.
    pub async fn pull_image(&self, image: &str) -> RuntimeResult<()> {
        let options = Some(CreateImageOptions {
            from_image: image,
            ..Default::default()
        });

        let mut progress = self.docker.create_image(options, None, None);
        while let Some(update) = progress.next().await {
            update.map_err(|e| RuntimeError::ImageNotFound(format!("{}: {}", image, e)))?;
        }

        tracing::info!("pulled image {}", image);
        Ok(())
    }

    /// Force-removes every unit carrying the execbox label, running or not.
    ///
    /// Returns the number of units removed. Used at startup to reap units orphaned by a process
    /// that died before it could clean up.
    pub async fn prune(&self) -> RuntimeResult<usize> {
        let mut filters = HashMap::new();
        filters.insert("label".to_string(), vec![format!("{}=true", MANAGED_LABEL)]);

        let containers = self
            .docker
            .list_containers(Some(ListContainersOptions {
                all: true,
                filters,
                ..Default::default()
            }))
            .await
            .map_err(runtime_error)?;

        let mut removed = 0;
        for id in containers.into_iter().filter_map(|container| container.id) {
            match self.remove_container(&id).await {
                Ok(()) => removed += 1,
                Err(e) => tracing::warn!("failed to prune unit {}: {}", id, e),
            }
        }

        Ok(removed)
    }

    async fn create_container(&self, spec: &UnitSpec) -> Result<String, BollardError> {
        // A negative value would lift the ceiling entirely
        let memory = i64::try_from(spec.get_memory_bytes()).unwrap_or(i64::MAX);
        let host_config = HostConfig {
            memory: Some(memory),
            memory_swap: Some(memory),
            pids_limit: Some(spec.get_pids_limit()),
            network_mode: spec
                .get_network_disabled()
                .then(|| NETWORK_MODE_NONE.to_string()),
            cap_drop: Some(vec!["ALL".to_string()]),
            security_opt: Some(vec![NO_NEW_PRIVILEGES.to_string()]),
            auto_remove: Some(false),
            ..Default::default()
        };

        let config = Config {
            image: Some(spec.get_image().clone()),
            cmd: Some(spec.get_command().clone()),
            env: Some(spec.env_strings()),
            working_dir: Some(spec.get_working_dir().clone()),
            labels: Some(spec.get_labels().clone()),
            network_disabled: Some(spec.get_network_disabled()),
            tty: Some(false),
            attach_stdin: Some(false),
            open_stdin: Some(false),
            host_config: Some(host_config),
            ..Default::default()
        };

        let options = CreateContainerOptions {
            name: spec.get_name().clone(),
            platform: None,
        };

        let response = self.docker.create_container(Some(options), config).await?;
        for warning in &response.warnings {
            tracing::warn!("docker warning for unit {}: {}", spec.get_name(), warning);
        }

        Ok(response.id)
    }

    async fn remove_container(&self, id: &str) -> RuntimeResult<()> {
        let options = RemoveContainerOptions {
            force: true,
            v: true,
            ..Default::default()
        };

        match self.docker.remove_container(id, Some(options)).await {
            Ok(()) => Ok(()),
            Err(e) if is_not_found(&e) => Ok(()),
            Err(e) => Err(runtime_error(e)),
        }
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

#[async_trait]
impl SandboxRuntime for DockerRuntime {
    async fn create(&self, spec: &UnitSpec) -> RuntimeResult<UnitHandle> {
        let id = match self.create_container(spec).await {
            Ok(id) => id,
            Err(e) if is_not_found(&e) => {
                if !self.pull_missing {
                    return Err(RuntimeError::ImageNotFound(spec.get_image().clone()));
                }

                tracing::info!("image {} not present locally, pulling", spec.get_image());
                self.pull_image(spec.get_image()).await?;
                self.create_container(spec).await.map_err(|e| {
                    if is_not_found(&e) {
                        RuntimeError::ImageNotFound(spec.get_image().clone())
                    } else {
                        runtime_error(e)
                    }
                })?
            }
            Err(e) => return Err(runtime_error(e)),
        };

        Ok(UnitHandle::new(id, spec))
    }

    async fn start(&self, handle: &UnitHandle) -> RuntimeResult<()> {
        self.docker
            .start_container(handle.get_id(), None::<StartContainerOptions<String>>)
            .await
            .map_err(runtime_error)
    }

    async fn wait(&self, handle: &UnitHandle) -> RuntimeResult<i64> {
        let options = WaitContainerOptions {
            condition: "not-running",
        };

        let mut stream = self.docker.wait_container(handle.get_id(), Some(options));
        match stream.next().await {
            Some(Ok(response)) => Ok(response.status_code),
            // Non-zero exits arrive as errors with an empty message
            Some(Err(BollardError::DockerContainerWaitError { error, code })) if error.is_empty() => {
                Ok(code)
            }
            Some(Err(e)) => Err(RuntimeError::Wait(e.to_string())),
            None => Err(RuntimeError::Wait(
                "wait stream ended without an exit status".to_string(),
            )),
        }
    }

    async fn kill(&self, handle: &UnitHandle) -> RuntimeResult<()> {
        match self
            .docker
            .kill_container(handle.get_id(), None::<KillContainerOptions<String>>)
            .await
        {
            Ok(()) => Ok(()),
            // Already stopped or already gone
            Err(BollardError::DockerResponseServerError {
                status_code: 404 | 409,
                ..
            }) => Ok(()),
            Err(e) => Err(runtime_error(e)),
        }
    }

    async fn logs(&self, handle: &UnitHandle) -> RuntimeResult<Vec<u8>> {
        let options = LogsOptions::<String> {
            stdout: true,
            stderr: true,
            follow: false,
            tail: "all".to_string(),
            ..Default::default()
        };

        let mut stream = self.docker.logs(handle.get_id(), Some(options));
        let mut output = Vec::new();
        while let Some(chunk) = stream.next().await {
            match chunk {
                Ok(chunk) => output.extend_from_slice(&chunk.into_bytes()),
                Err(e) if output.is_empty() => return Err(runtime_error(e)),
                Err(e) => {
                    tracing::warn!(
                        "log stream of unit {} broke after {} bytes: {}",
                        handle.get_name(),
                        output.len(),
                        e
                    );
                    break;
                }
            }
        }

        Ok(output)
    }

    async fn remove(&self, handle: &UnitHandle) -> RuntimeResult<()> {
        self.remove_container(handle.get_id()).await
    }
}

//--------------------------------------------------------------------------------------------------
// Functions: Helpers
//--------------------------------------------------------------------------------------------------

fn is_not_found(error: &BollardError) -> bool {
    matches!(
        error,
        BollardError::DockerResponseServerError {
            status_code: 404,
            ..
        }
    )
}

fn runtime_error(error: BollardError) -> RuntimeError {
    match error {
        BollardError::IOError { .. } | BollardError::SocketNotFoundError(_) => {
            RuntimeError::Connection(error.to_string())
        }
        error => RuntimeError::Api(error.to_string()),
    }
}
