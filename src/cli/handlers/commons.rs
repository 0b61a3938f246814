// src/cli/handlers/commons.rs

// Setup shared by the transform and clean handlers.

use anyhow::{Context, Result, anyhow};
use log::debug;
use std::{
    env,
    io::IsTerminal,
    path::PathBuf,
};

use crate::{
    cli::GlobalArgs,
    core::{
        config_loader::{self, CliOverrides, Settings},
        fingerprint::fingerprint,
        lock::RunLock,
        paths,
    },
    models::{LockKey, Operation},
};

/// Everything a handler needs before taking the lock.
#[derive(Debug)]
pub struct Invocation {
    pub cwd: PathBuf,
    pub settings: Settings,
    pub templates: Vec<PathBuf>,
}

/// Loads configuration, merges it with the command line and resolves the
/// template arguments.
pub fn prepare(
    globals: &GlobalArgs,
    mut overrides: CliOverrides,
    templates: &[PathBuf],
) -> Result<Invocation> {
    let cwd = env::current_dir().context("Could not determine the current directory")?;
    let file_config = config_loader::load(globals.config.as_deref(), &cwd)?;
    overrides.lock_timeout = globals.lock_timeout;
    let settings = Settings::resolve(file_config, &overrides);
    debug!("Effective settings: {:?}", settings);

    configure_colors(settings.color);
    let templates = resolve_templates(templates)?;
    Ok(Invocation {
        cwd,
        settings,
        templates,
    })
}

/// Turns colour off when disabled in config or when stderr is not a terminal.
pub fn configure_colors(enabled: bool) {
    if !enabled || !std::io::stderr().is_terminal() {
        colored::control::set_override(false);
    }
}

/// Canonicalizes every template argument; all of them must exist.
pub fn resolve_templates(templates: &[PathBuf]) -> Result<Vec<PathBuf>> {
    templates
        .iter()
        .map(|template| {
            if !template.is_file() {
                return Err(anyhow!("Template file '{}' does not exist.", template.display()));
            }
            dunce::canonicalize(template)
                .with_context(|| format!("Could not resolve template '{}'", template.display()))
        })
        .collect()
}

/// Takes the run-wide lock for `operation` over `templates`.
pub fn acquire_lock(
    operation: Operation,
    templates: &[PathBuf],
    settings: &Settings,
) -> Result<RunLock> {
    let lock_dir = paths::resolve_lock_dir(settings.lock_dir.as_deref())?;
    let key = LockKey::new(operation, fingerprint(templates));
    let lock = RunLock::acquire(&lock_dir, &key, settings.lock_timeout)?;
    debug!("Holding lock '{}'", lock.path().display());
    Ok(lock)
}
