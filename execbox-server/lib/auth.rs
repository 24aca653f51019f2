//! Bearer token issuance and validation.
//!
//! The server does not manage identities. It only checks that a caller presents an HS256 JWT
//! signed with the configured key, unexpired and naming a subject.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::{ServerError, ServerResult};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Claims carried by an execbox bearer token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// The authenticated identity
    pub sub: String,

    /// Expiry as a unix timestamp
    pub exp: u64,

    /// Issue time as a unix timestamp
    pub iat: u64,
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Issues a token for `subject` that expires after `expire`.
pub fn issue_token(key: &str, subject: &str, expire: Duration) -> ServerResult<String> {
    let now = Utc::now();
    let claims = Claims {
        sub: subject.to_string(),
        exp: (now + expire).timestamp().max(0) as u64,
        iat: now.timestamp().max(0) as u64,
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(key.as_bytes()),
    )
    .map_err(|e| ServerError::InternalError(format!("Failed to generate token: {}", e)))
}

/// Validates a token and returns its claims.
pub fn validate_token(key: &str, token: &str) -> ServerResult<Claims> {
    let validation = Validation::new(Algorithm::HS256);
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(key.as_bytes()),
        &validation,
    )
    .map_err(|e| ServerError::AuthenticationError(format!("Invalid token: {}", e)))?;

    if data.claims.sub.trim().is_empty() {
        return Err(ServerError::AuthenticationError(
            "Invalid token: missing subject".to_string(),
        ));
    }

    Ok(data.claims)
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
