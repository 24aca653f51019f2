//! Middleware components for the execbox server.
//!
//! The module provides:
//! - Bearer token authentication for the execution API
//! - Request and response logging

use axum::{
    body::Body,
    extract::State,
    http::{header::AUTHORIZATION, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::{auth, state::AppState, ServerError};

//--------------------------------------------------------------------------------------------------
// Middleware Functions
//--------------------------------------------------------------------------------------------------

/// Rejects requests without a valid bearer token when the server has a key.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let Some(key) = state.get_config().get_key() else {
        return next.run(req).await;
    };

    let token = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim);

    let Some(token) = token else {
        return ServerError::AuthenticationError("Missing bearer token".to_string())
            .into_response();
    };

    match auth::validate_token(key, token) {
        Ok(claims) => {
            tracing::debug!("authenticated subject {}", claims.sub);
            req.extensions_mut().insert(claims);
            next.run(req).await
        }
        Err(e) => e.into_response(),
    }
}

/// Log incoming requests
pub async fn logging_middleware(
    req: Request<Body>,
    next: Next,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let method = req.method().clone();
    let uri = req.uri().clone();

    tracing::info!("Request: {} {}", method, uri);

    let response = next.run(req).await;

    tracing::info!("Response: {} {}: {}", method, uri, response.status());

    Ok(response)
}
