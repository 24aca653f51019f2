//! Request handlers for the execbox server.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use execbox_core::sandbox::ExecutionStatus;

use crate::{
    error::{ServerError, ValidationError},
    payload::{
        ExecuteRequest, ExecuteResponse, LanguageInfo, LanguagesResponse, RegularMessageResponse,
    },
    state::AppState,
    ServerResult,
};

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

const MISSING_FIELDS_MESSAGE: &str = "Missing 'language' or 'code' field";

//--------------------------------------------------------------------------------------------------
// Functions: Handlers
//--------------------------------------------------------------------------------------------------

/// Handler for health check
pub async fn health() -> ServerResult<impl IntoResponse> {
    Ok((
        StatusCode::OK,
        Json(RegularMessageResponse {
            message: "Service is healthy".to_string(),
        }),
    ))
}

/// Lists the languages the server can run.
pub async fn languages(State(state): State<AppState>) -> ServerResult<impl IntoResponse> {
    let languages = state
        .get_registry()
        .profiles()
        .map(|profile| LanguageInfo {
            language: profile.get_language_id().clone(),
            aliases: profile.get_aliases().clone(),
            image: profile.get_image_reference().clone(),
            entry: profile.get_entry_filename().clone(),
        })
        .collect();

    Ok((StatusCode::OK, Json(LanguagesResponse { languages })))
}

/// Runs a snippet in a fresh execution unit.
///
/// A snippet that ran, including one killed at the timeout, is reported with `200`. Only
/// rejected requests and provisioning failures are errors.
pub async fn execute(
    State(state): State<AppState>,
    payload: Result<Json<ExecuteRequest>, JsonRejection>,
) -> ServerResult<impl IntoResponse> {
    let Json(request) = payload.map_err(|e| {
        tracing::debug!("unreadable execute payload: {}", e);
        ValidationError::InvalidInput(MISSING_FIELDS_MESSAGE.to_string())
    })?;

    let (language, code) = match (request.language, request.code) {
        (Some(language), Some(code)) if !language.trim().is_empty() && !code.is_empty() => {
            (language, code)
        }
        _ => {
            return Err(
                ValidationError::InvalidInput(MISSING_FIELDS_MESSAGE.to_string()).into(),
            )
        }
    };

    let max_code_bytes = *state.get_config().get_max_code_bytes();
    if code.len() > max_code_bytes {
        return Err(ValidationError::InvalidInput(format!(
            "Code exceeds the maximum size of {} bytes",
            max_code_bytes
        ))
        .into());
    }

    let profile = state
        .get_registry()
        .resolve(&language)
        .ok_or_else(|| ValidationError::UnsupportedLanguage(language.clone()))?;

    let _permit = state
        .get_permits()
        .clone()
        .acquire_owned()
        .await
        .map_err(|e| ServerError::InternalError(format!("Execution slots closed: {}", e)))?;

    let result = state
        .get_orchestrator()
        .execute(profile, &code, state.get_config().get_limits())
        .await;

    match result.status {
        ExecutionStatus::Completed | ExecutionStatus::TimedOut => Ok((
            StatusCode::OK,
            Json(ExecuteResponse {
                output: result.output,
                exit_code: result.exit_code,
            }),
        )),
        ExecutionStatus::ImageUnavailable => Err(ServerError::ImageUnavailable(
            profile.get_language_id().clone(),
        )),
        ExecutionStatus::Failed => Err(ServerError::ExecutionFailed(result.output)),
    }
}
