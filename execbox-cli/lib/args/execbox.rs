use std::path::PathBuf;

use clap::{Parser, Subcommand};
use execbox_utils::{
    env::{
        EXECBOX_HOST_ENV_VAR, EXECBOX_KEY_ENV_VAR, EXECBOX_LANGUAGES_FILE_ENV_VAR,
        EXECBOX_PORT_ENV_VAR,
    },
    DEFAULT_MAX_CODE_BYTES, DEFAULT_MAX_CONCURRENT, DEFAULT_MAX_OUTPUT_BYTES, DEFAULT_MEMORY_MIB,
    DEFAULT_SERVER_HOST, DEFAULT_SERVER_PORT, DEFAULT_TIMEOUT_SECS,
};

use crate::styles;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Run untrusted code snippets in throwaway, resource-capped containers
#[derive(Debug, Parser)]
#[command(name = "execbox", author, styles=styles::styles())]
pub struct ExecboxArgs {
    /// The subcommand to run
    #[command(subcommand)]
    pub subcommand: Option<ExecboxSubcommand>,

    /// Show version
    #[arg(short = 'V', long, default_value_t = false)]
    pub version: bool,

    /// Show logs with error level
    #[arg(long, default_value_t = false)]
    pub error: bool,

    /// Show logs with warn level
    #[arg(long, default_value_t = false)]
    pub warn: bool,

    /// Show logs with info level
    #[arg(long, default_value_t = false)]
    pub info: bool,

    /// Show logs with debug level
    #[arg(long, default_value_t = false)]
    pub debug: bool,

    /// Show logs with trace level
    #[arg(long, default_value_t = false)]
    pub trace: bool,
}

/// Available subcommands for the `execbox` binary
#[derive(Debug, Subcommand)]
pub enum ExecboxSubcommand {
    /// Start the HTTP execution server
    #[command(name = "serve")]
    Serve {
        /// Secret key used for JWT validation
        #[arg(short = 'k', long, env = EXECBOX_KEY_ENV_VAR, hide_env_values = true)]
        key: Option<String>,

        /// Host to bind to
        #[arg(long, env = EXECBOX_HOST_ENV_VAR, default_value = DEFAULT_SERVER_HOST)]
        host: String,

        /// Port number to listen on
        #[arg(long, env = EXECBOX_PORT_ENV_VAR, default_value_t = DEFAULT_SERVER_PORT)]
        port: u16,

        /// Run in development mode, without authentication
        #[arg(long = "dev", default_value_t = false)]
        dev_mode: bool,

        #[command(flatten)]
        limits: LimitArgs,

        /// Largest snippet accepted, in bytes
        #[arg(long, default_value_t = DEFAULT_MAX_CODE_BYTES)]
        max_code: usize,

        /// Number of snippets that may run at once
        #[arg(long, default_value_t = DEFAULT_MAX_CONCURRENT)]
        max_concurrent: usize,

        /// Origin allowed by CORS. Replaces the default origins when given
        #[arg(long = "allow-origin")]
        allowed_origins: Vec<String>,

        #[command(flatten)]
        languages: LanguageArgs,

        /// Do not pull missing images on first use
        #[arg(long, default_value_t = false)]
        no_pull: bool,
    },

    /// Run a snippet once and print its output
    #[command(name = "run")]
    Run {
        /// Language identifier or alias
        language: String,

        /// File holding the snippet. Reads stdin when omitted
        file: Option<PathBuf>,

        /// The snippet itself, instead of a file
        #[arg(short = 'c', long, conflicts_with = "file")]
        code: Option<String>,

        #[command(flatten)]
        limits: LimitArgs,

        #[command(flatten)]
        languages: LanguageArgs,

        /// Do not pull a missing image
        #[arg(long, default_value_t = false)]
        no_pull: bool,
    },

    /// List supported languages
    #[command(name = "languages")]
    Languages {
        #[command(flatten)]
        languages: LanguageArgs,
    },

    /// Pull the images of supported languages
    #[command(name = "pull")]
    Pull {
        /// Languages to pull. Pulls every language when omitted
        names: Vec<String>,

        #[command(flatten)]
        languages: LanguageArgs,
    },

    /// Remove execution units left behind by a previous process
    #[command(name = "prune")]
    Prune,

    /// Generate a bearer token for the server
    #[command(name = "keygen")]
    Keygen {
        /// Secret key the server validates tokens with
        #[arg(short = 'k', long, env = EXECBOX_KEY_ENV_VAR, hide_env_values = true)]
        key: String,

        /// Identity the token is issued to
        #[arg(short, long, default_value = "execbox")]
        subject: String,

        /// Token lifetime, e.g. 30m, 12h or 7d
        #[arg(short, long, default_value = "24h")]
        expire: String,
    },
}

/// Resource limits applied to execution units
#[derive(Debug, Clone, clap::Args)]
pub struct LimitArgs {
    /// Memory ceiling in MiB
    #[arg(long, default_value_t = DEFAULT_MEMORY_MIB)]
    pub memory: u64,

    /// Wall-clock timeout in seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout: u64,

    /// Output bytes kept per execution
    #[arg(long, default_value_t = DEFAULT_MAX_OUTPUT_BYTES)]
    pub max_output: usize,
}

/// Where language profiles come from
#[derive(Debug, Clone, clap::Args)]
pub struct LanguageArgs {
    /// Profile file replacing the built-in language table
    #[arg(id = "languages_file", long = "languages-file", env = EXECBOX_LANGUAGES_FILE_ENV_VAR)]
    pub file: Option<PathBuf>,
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
