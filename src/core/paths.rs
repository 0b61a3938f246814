// src/core/paths.rs

use crate::constants::{
    DEFAULT_LOCK_DIRNAME, GLOBAL_CONFIG_FILENAME, LOCK_DIR_ENV, TOOL_NAMESPACE,
};
use lazy_static::lazy_static;
use log::debug;
use std::path::{Path, PathBuf};
use thiserror::Error;

lazy_static! {
    static ref DEFAULT_LOCK_DIR: PathBuf = std::env::temp_dir().join(DEFAULT_LOCK_DIRNAME);
}

#[derive(Error, Debug)]
pub enum PathError {
    #[error("Failed to expand lock directory '{template}': {message}")]
    Expansion { template: String, message: String },
}

/// Expands `~` and environment variables (`$VAR`, `${VAR}`) in a path.
pub fn expand_path(template: &str) -> Result<PathBuf, PathError> {
    let expanded = shellexpand::full(template).map_err(|e| PathError::Expansion {
        template: template.to_string(),
        message: e.to_string(),
    })?;
    Ok(PathBuf::from(expanded.into_owned()))
}

/// Resolves the directory holding lock files.
///
/// `TTBUILD_LOCK_DIR` wins over the configured value, which wins over
/// `<temp>/ttbuild-locks`.
pub fn resolve_lock_dir(configured: Option<&str>) -> Result<PathBuf, PathError> {
    let from_env = std::env::var(LOCK_DIR_ENV).ok().filter(|v| !v.trim().is_empty());

    let dir = match from_env.as_deref().or(configured) {
        Some(template) => expand_path(template)?,
        None => DEFAULT_LOCK_DIR.clone(),
    };
    debug!("Using lock directory '{}'", dir.display());
    Ok(dir)
}

/// `<user config dir>/ttbuild/config.toml`, if the platform has a config dir.
pub fn global_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(TOOL_NAMESPACE).join(GLOBAL_CONFIG_FILENAME))
}

/// Name shown in the success summary: the last segment of `cwd`.
pub fn project_name(cwd: &Path) -> String {
    cwd.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| cwd.display().to_string())
}
