//! Default values shared by the execbox crates.

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

/// The default port the execbox server listens on
pub const DEFAULT_SERVER_PORT: u16 = 5001;

/// The default host the execbox server binds to
pub const DEFAULT_SERVER_HOST: &str = "127.0.0.1";

/// The default memory ceiling for an execution unit in MiB
pub const DEFAULT_MEMORY_MIB: u64 = 128;

/// The default wall-clock timeout for an execution unit in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 5;

/// The default maximum number of tasks inside an execution unit. The cgroup counts threads, and
/// toolchains such as `go run` fan out parallel multi-threaded compiler processes.
pub const DEFAULT_PIDS_LIMIT: i64 = 256;

/// The default number of output bytes kept from an execution unit
pub const DEFAULT_MAX_OUTPUT_BYTES: usize = 64 * 1024;

/// The default maximum size of a submitted snippet in bytes
pub const DEFAULT_MAX_CODE_BYTES: usize = 64 * 1024;

/// The default number of execution units the server runs at once
pub const DEFAULT_MAX_CONCURRENT: usize = 16;

/// Exit code reported when an execution unit is killed for exceeding its timeout
pub const TIMEOUT_EXIT_CODE: i64 = 124;

/// Prefix of every execution unit name
pub const UNIT_NAME_PREFIX: &str = "execbox";

/// Label attached to every execution unit so orphans can be found and reaped
pub const MANAGED_LABEL: &str = "execbox.managed";

/// Working directory inside every execution unit
pub const UNIT_WORKDIR: &str = "/sandbox";

/// The environment variable that carries the snippet into the execution unit
pub const CODE_ENV_VAR: &str = "CODE";

/// Placeholder in a run command argument that is replaced with the entry filename
pub const ENTRY_PLACEHOLDER: &str = "{entry}";

/// Origins allowed to call the server when no origins are configured
pub const DEFAULT_ALLOWED_ORIGINS: &[&str] = &[
    "http://localhost",
    "http://localhost:5173",
    "http://127.0.0.1",
    "http://127.0.0.1:5173",
];
