use std::fmt;

use serde::{Deserialize, Serialize};

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

/// Exit code reported for units that never ran
pub const NOT_RUN_EXIT_CODE: i64 = -1;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// A snippet to run and the language it is written in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionRequest {
    /// Language identifier or alias
    pub language_id: String,

    /// The untrusted snippet
    pub source_code: String,
}

/// How an execution ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    /// The workload exited on its own within the timeout
    Completed,

    /// The workload was killed when the timeout fired
    TimedOut,

    /// The image of the language could not be resolved; nothing ran
    ImageUnavailable,

    /// The runtime failed to provision or run the unit
    Failed,
}

/// The outcome of one execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Combined stdout and stderr, or a message describing why nothing ran
    pub output: String,

    /// The workload's exit code, `124` on timeout, `-1` if it never ran
    pub exit_code: i64,

    /// How the execution ended
    pub status: ExecutionStatus,

    /// Whether output was cut at the configured limit
    #[serde(default)]
    pub truncated: bool,

    /// Wall-clock milliseconds between start and the end of the wait
    #[serde(default)]
    pub duration_ms: u64,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl ExecutionRequest {
    /// Creates a new request.
    pub fn new(language_id: impl Into<String>, source_code: impl Into<String>) -> Self {
        Self {
            language_id: language_id.into(),
            source_code: source_code.into(),
        }
    }
}

impl ExecutionStatus {
    /// Returns the string representation of the status
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::TimedOut => "timed_out",
            Self::ImageUnavailable => "image_unavailable",
            Self::Failed => "failed",
        }
    }

    /// Whether the workload actually ran. Timeouts count: they are an observed program outcome,
    /// not a service fault.
    pub fn is_program_outcome(&self) -> bool {
        matches!(self, Self::Completed | Self::TimedOut)
    }
}

impl ExecutionResult {
    /// A result for a provisioning attempt whose image could not be resolved.
    pub fn image_unavailable(image: &str) -> Self {
        Self::not_run(
            format!("Image '{}' is not available", image),
            ExecutionStatus::ImageUnavailable,
        )
    }

    /// A result for a runtime fault unrelated to the workload's own output.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::not_run(message.into(), ExecutionStatus::Failed)
    }

    fn not_run(output: String, status: ExecutionStatus) -> Self {
        Self {
            output,
            exit_code: NOT_RUN_EXIT_CODE,
            status,
            truncated: false,
            duration_ms: 0,
        }
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
