use thiserror::Error;

use crate::runtime::RuntimeError;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// The result of an execbox-core operation.
pub type ExecboxResult<T> = Result<T, ExecboxError>;

/// An error that occurred in execbox-core.
#[derive(Debug, Error)]
pub enum ExecboxError {
    /// An I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A language profile document could not be parsed.
    #[error("failed to parse language profiles: {0}")]
    ProfileParse(#[from] serde_yaml::Error),

    /// A language profile failed validation.
    #[error("invalid language profile '{language}': {reason}")]
    InvalidProfile {
        /// The offending language identifier
        language: String,

        /// Why the profile was rejected
        reason: String,
    },

    /// Two profiles claim the same identifier or alias.
    #[error("duplicate language identifier: {0}")]
    DuplicateLanguage(String),

    /// The requested language has no execution profile.
    #[error("Language '{0}' is not supported for server-side execution.")]
    UnsupportedLanguage(String),

    /// The resource limits are unusable.
    #[error("invalid resource limits: {0}")]
    InvalidLimits(String),

    /// An error from the container runtime.
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}
