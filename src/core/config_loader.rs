//! # Config Loader
//!
//! Finds and reads the optional `ttbuild` TOML configuration. Lookup order,
//! first found wins:
//!
//! 1. the file given with `--config`,
//! 2. `ttbuild.toml` in the current directory,
//! 3. `<user config dir>/ttbuild/config.toml`.
//!
//! Every key is optional. Values here only fill in what the command line and
//! the environment leave unset; see [`Settings`].

use crate::{
    constants::{DEFAULT_LOCK_TIMEOUT_SECS, PROJECT_CONFIG_FILENAME},
    core::paths,
};
use log::debug;
use serde::Deserialize;
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
    time::Duration,
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not read config file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid config file '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// The on-disk configuration.
#[derive(Deserialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub lock_timeout: Option<u64>,
    pub parallel: Option<bool>,
    /// 0 means "host default".
    pub max_parallelism: Option<usize>,
    pub skip_up_to_date: Option<bool>,
    pub lock_dir: Option<String>,
    pub engine: Option<String>,
    pub color: Option<bool>,
    #[serde(default)]
    pub variables: BTreeMap<String, String>,
}

impl FileConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Picks the configuration file to use, if any.
///
/// An explicit path must exist; the implicit candidates are simply skipped
/// when absent.
pub fn discover(
    explicit: Option<&Path>,
    cwd: &Path,
    global: Option<PathBuf>,
) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    std::iter::once(cwd.join(PROJECT_CONFIG_FILENAME))
        .chain(global)
        .find(|candidate| candidate.is_file())
}

/// Loads the first configuration found, or the empty configuration.
pub fn load(explicit: Option<&Path>, cwd: &Path) -> Result<FileConfig, ConfigError> {
    match discover(explicit, cwd, paths::global_config_path()) {
        Some(path) => {
            debug!("Loading configuration from '{}'", path.display());
            FileConfig::from_file(&path)
        }
        None => {
            debug!("No configuration file found");
            Ok(FileConfig::default())
        }
    }
}

/// Command-line values that override the configuration file.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub lock_timeout: Option<u64>,
    /// `--parallel` is a presence flag, so it can only switch parallelism on.
    pub parallel: bool,
    pub max_parallelism: Option<usize>,
    pub skip_up_to_date: bool,
}

/// Effective settings for one run after merging every layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub lock_timeout: Duration,
    pub parallel: bool,
    pub max_parallelism: Option<usize>,
    pub skip_up_to_date: bool,
    pub lock_dir: Option<String>,
    pub engine: Option<String>,
    pub color: bool,
    pub variables: BTreeMap<String, String>,
}

impl Settings {
    /// Merges `overrides` on top of `file`, falling back to built-in defaults.
    pub fn resolve(file: FileConfig, overrides: &CliOverrides) -> Self {
        let lock_timeout = overrides
            .lock_timeout
            .or(file.lock_timeout)
            .unwrap_or(DEFAULT_LOCK_TIMEOUT_SECS);

        Self {
            lock_timeout: Duration::from_secs(lock_timeout),
            parallel: overrides.parallel || file.parallel.unwrap_or(false),
            max_parallelism: overrides.max_parallelism.or(file.max_parallelism),
            skip_up_to_date: overrides.skip_up_to_date || file.skip_up_to_date.unwrap_or(false),
            lock_dir: file.lock_dir,
            engine: file.engine,
            color: file.color.unwrap_or(true),
            variables: file.variables,
        }
    }
}
