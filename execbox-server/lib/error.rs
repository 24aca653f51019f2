//! Error types for the execbox server.
//!
//! Only request validation, authentication and provisioning failures ever reach the caller as
//! errors. Timeouts and collection or cleanup faults are part of a successful response.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::payload::ErrorResponse;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// The result of a server operation.
pub type ServerResult<T> = Result<T, ServerError>;

/// An error returned by the execbox server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The request was rejected before anything was provisioned.
    #[error(transparent)]
    ValidationError(#[from] ValidationError),

    /// The caller is not authenticated.
    #[error("{0}")]
    AuthenticationError(String),

    /// The image of the requested language is not available.
    #[error("Docker image for {0} not found. Please contact admin.")]
    ImageUnavailable(String),

    /// The runtime failed to provision or run the unit.
    #[error("{0}")]
    ExecutionFailed(String),

    /// The server configuration is invalid.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Something unexpected went wrong.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// A request that cannot be served as sent.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A field is missing, empty or malformed.
    #[error("{0}")]
    InvalidInput(String),

    /// The requested language has no execution profile.
    #[error("Language '{0}' is not supported for server-side execution.")]
    UnsupportedLanguage(String),
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl ServerError {
    /// The HTTP status the error is reported with.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::ValidationError(_) => StatusCode::BAD_REQUEST,
            Self::AuthenticationError(_) => StatusCode::UNAUTHORIZED,
            Self::ImageUnavailable(_)
            | Self::ExecutionFailed(_)
            | Self::ConfigError(_)
            | Self::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("{}", self);
        } else {
            tracing::debug!("rejected request: {}", self);
        }

        (
            status,
            Json(ErrorResponse {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}
