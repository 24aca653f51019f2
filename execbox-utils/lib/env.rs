//! Environment variables read by the execbox binaries.

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

/// Environment variable for the JWT signing key
pub const EXECBOX_KEY_ENV_VAR: &str = "EXECBOX_KEY";

/// Environment variable for the host to bind to
pub const EXECBOX_HOST_ENV_VAR: &str = "EXECBOX_HOST";

/// Environment variable for the port to listen on
pub const EXECBOX_PORT_ENV_VAR: &str = "EXECBOX_PORT";

/// Environment variable for a language profile file that replaces the built-in table
pub const EXECBOX_LANGUAGES_FILE_ENV_VAR: &str = "EXECBOX_LANGUAGES_FILE";

/// Environment variable for an extra allowed CORS origin
pub const CORS_ORIGIN_ENV_VAR: &str = "CORS_ORIGIN";

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Returns the extra CORS origin from the environment, if one is set and non-empty.
pub fn get_cors_origin() -> Option<String> {
    std::env::var(CORS_ORIGIN_ENV_VAR)
        .ok()
        .map(|origin| origin.trim().to_string())
        .filter(|origin| !origin.is_empty())
}
