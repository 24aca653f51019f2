use std::collections::HashMap;

use chrono::{DateTime, Utc};
use getset::{CopyGetters, Getters};
use thiserror::Error;
use typed_builder::TypedBuilder;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// The result of a runtime operation.
pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// An error reported by a container runtime.
#[derive(Debug, Clone, Error)]
pub enum RuntimeError {
    /// The image the unit should be created from cannot be found or pulled.
    #[error("image not found: {0}")]
    ImageNotFound(String),

    /// The runtime could not be reached.
    #[error("runtime connection error: {0}")]
    Connection(String),

    /// The runtime rejected or failed an operation.
    #[error("runtime error: {0}")]
    Api(String),

    /// Waiting for the unit failed.
    #[error("wait failed: {0}")]
    Wait(String),
}

/// Everything a runtime needs to provision one execution unit.
///
/// The untrusted snippet only ever travels inside `env`; `command` is fixed per language.
#[derive(Debug, Clone, PartialEq, Eq, TypedBuilder, Getters, CopyGetters)]
pub struct UnitSpec {
    /// Unique unit name
    #[builder(setter(into))]
    #[getset(get = "pub with_prefix")]
    name: String,

    /// Image the unit is created from
    #[builder(setter(into))]
    #[getset(get = "pub with_prefix")]
    image: String,

    /// Entry command of the unit
    #[getset(get = "pub with_prefix")]
    command: Vec<String>,

    /// Environment variables as `(name, value)` pairs
    #[builder(default)]
    #[getset(get = "pub with_prefix")]
    env: Vec<(String, String)>,

    /// Working directory inside the unit
    #[builder(setter(into))]
    #[getset(get = "pub with_prefix")]
    working_dir: String,

    /// Labels attached to the unit
    #[builder(default)]
    #[getset(get = "pub with_prefix")]
    labels: HashMap<String, String>,

    /// Memory ceiling in bytes
    #[getset(get_copy = "pub with_prefix")]
    memory_bytes: u64,

    /// Maximum number of processes
    #[getset(get_copy = "pub with_prefix")]
    pids_limit: i64,

    /// Whether the unit is created without any network
    #[builder(default = true)]
    #[getset(get_copy = "pub with_prefix")]
    network_disabled: bool,
}

/// A live execution unit as known to the runtime.
#[derive(Debug, Clone, PartialEq, Eq, Getters, CopyGetters)]
pub struct UnitHandle {
    /// Runtime-assigned identifier
    #[getset(get = "pub with_prefix")]
    id: String,

    /// The name the unit was created with
    #[getset(get = "pub with_prefix")]
    name: String,

    /// Memory ceiling the unit was created with
    #[getset(get_copy = "pub with_prefix")]
    memory_bytes: u64,

    /// Whether the unit was created without a network
    #[getset(get_copy = "pub with_prefix")]
    network_disabled: bool,

    /// When the unit was created
    #[getset(get_copy = "pub with_prefix")]
    created_at: DateTime<Utc>,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl UnitSpec {
    /// Returns the value of an environment variable set for the unit.
    pub fn env_value(&self, name: &str) -> Option<&str> {
        self.env
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Renders the environment as `NAME=value` strings.
    pub fn env_strings(&self) -> Vec<String> {
        self.env
            .iter()
            .map(|(key, value)| format!("{}={}", key, value))
            .collect()
    }
}

impl UnitHandle {
    /// Creates a handle for a unit that was just created from `spec`.
    pub fn new(id: impl Into<String>, spec: &UnitSpec) -> Self {
        Self {
            id: id.into(),
            name: spec.name.clone(),
            memory_bytes: spec.memory_bytes,
            network_disabled: spec.network_disabled,
            created_at: Utc::now(),
        }
    }
}
