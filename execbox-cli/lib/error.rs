use execbox_core::{runtime::RuntimeError, ExecboxError};
use execbox_server::ServerError;
use thiserror::Error;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// The result of a CLI operation.
pub type ExecboxCliResult<T> = Result<T, ExecboxCliError>;

/// An error that occurred during a CLI operation.
#[derive(pretty_error_debug::Debug, Error)]
pub enum ExecboxCliError {
    /// An I/O error.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// A registry, limits or execution error from the core.
    #[error(transparent)]
    Core(#[from] ExecboxError),

    /// The container runtime could not be reached or refused a request.
    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    /// A server configuration or token error.
    #[error(transparent)]
    Server(#[from] ServerError),

    /// The snippet could not be run.
    #[error("{0}")]
    ExecutionFailed(String),

    /// An argument was rejected.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}
