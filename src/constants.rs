// src/constants.rs

/// Fixed tool identifier used as the namespace of every lock key.
pub const TOOL_NAMESPACE: &str = "ttbuild";

/// Seconds to wait for another instance before giving up.
pub const DEFAULT_LOCK_TIMEOUT_SECS: u64 = 60;

/// Output extension used when a template does not declare one.
pub const DEFAULT_OUTPUT_EXTENSION: &str = "txt";

/// Name of the directory (inside the system temp dir) holding lock files.
pub const DEFAULT_LOCK_DIRNAME: &str = "ttbuild-locks";

/// Name of the project configuration file looked up in the current directory.
pub const PROJECT_CONFIG_FILENAME: &str = "ttbuild.toml";

/// Name of the user-level configuration file (in `~/.config/ttbuild/`).
pub const GLOBAL_CONFIG_FILENAME: &str = "config.toml";

/// Environment variable overriding the lock directory.
pub const LOCK_DIR_ENV: &str = "TTBUILD_LOCK_DIR";

/// Environment variable holding the log filter.
pub const LOG_ENV: &str = "TTBUILD_LOG";

/// Opening and closing text of a variable placeholder, e.g. `$(Configuration)`.
pub const PLACEHOLDER_PREFIX: &str = "$(";
pub const PLACEHOLDER_SUFFIX: &str = ")";

pub const STARTING_BACKOFF_DELAY_MS: u64 = 10;
pub const MAX_BACKOFF_DELAY_MS: u64 = 500;

/// Maximum include nesting followed by the directive engine.
pub const MAX_INCLUDE_DEPTH: u32 = 32;

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;
