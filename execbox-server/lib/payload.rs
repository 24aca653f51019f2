//! Request and response payload definitions for the execbox server.

use serde::{Deserialize, Serialize};

//--------------------------------------------------------------------------------------------------
// Types: Requests
//--------------------------------------------------------------------------------------------------

/// Request payload for running a snippet.
///
/// Both fields are optional at the type level so that a missing field is reported with the
/// service's own message instead of a deserializer error.
#[derive(Debug, Default, Deserialize)]
pub struct ExecuteRequest {
    /// Language identifier or alias
    pub language: Option<String>,

    /// The snippet to run
    pub code: Option<String>,
}

//--------------------------------------------------------------------------------------------------
// Types: Responses
//--------------------------------------------------------------------------------------------------

/// Response payload of a snippet that ran, including one that timed out.
#[derive(Debug, Serialize, Deserialize)]
pub struct ExecuteResponse {
    /// Combined stdout and stderr
    pub output: String,

    /// The workload's exit code, `124` on timeout
    pub exit_code: i64,
}

/// Error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// What went wrong
    pub error: String,
}

/// Response type for regular message responses
#[derive(Debug, Serialize, Deserialize)]
pub struct RegularMessageResponse {
    /// Message describing the outcome
    pub message: String,
}

/// A supported language.
#[derive(Debug, Serialize, Deserialize)]
pub struct LanguageInfo {
    /// Canonical language identifier
    pub language: String,

    /// Other identifiers accepted for the language
    pub aliases: Vec<String>,

    /// Image snippets run in
    pub image: String,

    /// File the snippet is written to
    pub entry: String,
}

/// Response payload listing supported languages.
#[derive(Debug, Serialize, Deserialize)]
pub struct LanguagesResponse {
    /// Every supported language, sorted by identifier
    pub languages: Vec<LanguageInfo>,
}
