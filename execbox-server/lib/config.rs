//! Configuration module for the execbox server.
//!
//! The configuration is assembled once at startup from command line arguments and environment
//! variables and shared read-only by every request.

use std::{
    net::{IpAddr, SocketAddr},
    path::PathBuf,
};

use execbox_core::config::ResourceLimits;
use execbox_utils::{
    env, DEFAULT_ALLOWED_ORIGINS, DEFAULT_MAX_CODE_BYTES, DEFAULT_MAX_CONCURRENT,
};
use getset::Getters;

use crate::{ServerError, ServerResult};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Configuration structure that holds all the server settings
#[derive(Debug, Clone, Getters)]
#[getset(get = "pub with_prefix")]
pub struct Config {
    /// Secret key used for JWT validation
    key: Option<String>,

    /// Whether to run the server in development mode
    dev_mode: bool,

    /// Address to listen on
    addr: SocketAddr,

    /// Limits applied to every execution unit
    limits: ResourceLimits,

    /// Largest snippet accepted, in bytes
    max_code_bytes: usize,

    /// Number of execution units that may run at once
    max_concurrent: usize,

    /// Origins allowed by CORS
    allowed_origins: Vec<String>,

    /// Profile file replacing the built-in language table
    languages_file: Option<PathBuf>,

    /// Whether missing images are pulled on first use
    pull_missing: bool,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl Config {
    /// Create a new configuration
    pub fn new(key: Option<String>, host: &str, port: u16, dev_mode: bool) -> ServerResult<Self> {
        // Check key requirement based on dev mode
        let key = match key.filter(|k| !k.trim().is_empty()) {
            Some(k) => Some(k),
            None if dev_mode => None,
            None => {
                return Err(ServerError::ConfigError(
                    "No key provided. A key is required when not in dev mode".to_string(),
                ));
            }
        };

        let host: IpAddr = host
            .parse()
            .map_err(|e| ServerError::ConfigError(format!("Invalid host '{}': {}", host, e)))?;

        let mut allowed_origins: Vec<String> = DEFAULT_ALLOWED_ORIGINS
            .iter()
            .map(|origin| origin.to_string())
            .collect();
        allowed_origins.extend(env::get_cors_origin());

        Ok(Self {
            key,
            dev_mode,
            addr: SocketAddr::new(host, port),
            limits: ResourceLimits::default(),
            max_code_bytes: DEFAULT_MAX_CODE_BYTES,
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            allowed_origins,
            languages_file: None,
            pull_missing: true,
        })
    }

    /// Replace the limits applied to execution units
    pub fn with_limits(mut self, limits: ResourceLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Replace the largest accepted snippet size
    pub fn with_max_code_bytes(mut self, max_code_bytes: usize) -> ServerResult<Self> {
        if max_code_bytes == 0 {
            return Err(ServerError::ConfigError(
                "Maximum code size must be greater than zero".to_string(),
            ));
        }

        self.max_code_bytes = max_code_bytes;
        Ok(self)
    }

    /// Replace the number of execution units that may run at once
    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> ServerResult<Self> {
        if max_concurrent == 0 {
            return Err(ServerError::ConfigError(
                "Maximum concurrency must be greater than zero".to_string(),
            ));
        }

        self.max_concurrent = max_concurrent;
        Ok(self)
    }

    /// Replace the origins allowed by CORS
    pub fn with_allowed_origins(mut self, allowed_origins: Vec<String>) -> Self {
        if !allowed_origins.is_empty() {
            self.allowed_origins = allowed_origins;
        }
        self
    }

    /// Load language profiles from a file instead of the built-in table
    pub fn with_languages_file(mut self, languages_file: Option<PathBuf>) -> Self {
        self.languages_file = languages_file;
        self
    }

    /// Set whether missing images are pulled on first use
    pub fn with_pull_missing(mut self, pull_missing: bool) -> Self {
        self.pull_missing = pull_missing;
        self
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_is_required_outside_dev_mode() {
        assert!(matches!(
            Config::new(None, "127.0.0.1", 5001, false),
            Err(ServerError::ConfigError(_))
        ));
        assert!(Config::new(Some(" ".to_string()), "127.0.0.1", 5001, false).is_err());
        assert!(Config::new(None, "127.0.0.1", 5001, true).is_ok());
        assert!(Config::new(Some("secret".to_string()), "127.0.0.1", 5001, false).is_ok());
    }

    #[test]
    fn test_invalid_host_is_rejected() {
        assert!(Config::new(None, "localhost:5001", 5001, true).is_err());
    }

    #[test]
    fn test_defaults() {
        let config = Config::new(None, "0.0.0.0", 5001, true).unwrap();
        assert_eq!(config.get_addr().port(), 5001);
        assert_eq!(config.get_limits(), &ResourceLimits::default());
        assert_eq!(*config.get_max_code_bytes(), 64 * 1024);
        assert!(config
            .get_allowed_origins()
            .contains(&"http://localhost:5173".to_string()));
        assert!(config.get_languages_file().is_none());
        assert!(*config.get_pull_missing());
    }

    #[test]
    fn test_zero_ceilings_are_rejected() {
        let config = Config::new(None, "127.0.0.1", 5001, true).unwrap();
        assert!(config.clone().with_max_code_bytes(0).is_err());
        assert!(config.with_max_concurrent(0).is_err());
    }
}
