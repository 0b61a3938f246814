// src/engine/registry.rs

use crate::engine::{TemplateEngine, directive::DirectiveEngine};
use log::debug;
use std::sync::{Arc, OnceLock};
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum EngineSelectionError {
    #[error("Unknown template engine '{name}'. Available engines: {available}.")]
    UnknownBackend { name: String, available: String },
    #[error("No template engine is available on this host.")]
    NoneAvailable,
}

/// Describes one engine backend the binary knows how to build.
#[derive(Debug, Clone, Copy)]
pub struct BackendDescriptor {
    pub name: &'static str,
    pub version: (u32, u32, u32),
    /// Whether the backend can run on this host (toolchain present, etc.).
    pub is_available: fn() -> bool,
    pub build: fn() -> Arc<dyn TemplateEngine>,
}

fn always_available() -> bool {
    true
}

fn build_directive() -> Arc<dyn TemplateEngine> {
    Arc::new(DirectiveEngine::new())
}

/// Every backend compiled into this binary.
static BACKENDS: &[BackendDescriptor] = &[BackendDescriptor {
    name: DirectiveEngine::NAME,
    version: (1, 0, 0),
    is_available: always_available,
    build: build_directive,
}];

static SHARED_ENGINE: OnceLock<Arc<dyn TemplateEngine>> = OnceLock::new();

/// Picks the backend to use from `candidates`.
///
/// With a requested name, the highest-versioned available backend of that name
/// wins; otherwise the highest-versioned available backend overall.
pub fn select_backend(
    candidates: &[BackendDescriptor],
    requested: Option<&str>,
) -> Result<BackendDescriptor, EngineSelectionError> {
    let matching = candidates
        .iter()
        .filter(|b| requested.is_none_or(|name| b.name.eq_ignore_ascii_case(name)));

    let mut saw_any = false;
    let best = matching
        .inspect(|_| saw_any = true)
        .filter(|b| (b.is_available)())
        .max_by_key(|b| b.version)
        .copied();

    match (best, requested) {
        (Some(backend), _) => Ok(backend),
        (None, Some(name)) if !saw_any => Err(EngineSelectionError::UnknownBackend {
            name: name.to_string(),
            available: candidates
                .iter()
                .map(|b| b.name)
                .collect::<Vec<_>>()
                .join(", "),
        }),
        (None, _) => Err(EngineSelectionError::NoneAvailable),
    }
}

/// Returns the process-wide engine, building it on first use.
///
/// The backend is chosen once per process; later calls ignore `requested` and
/// return the engine selected by the first call.
pub fn shared_engine(
    requested: Option<&str>,
) -> Result<Arc<dyn TemplateEngine>, EngineSelectionError> {
    if let Some(engine) = SHARED_ENGINE.get() {
        return Ok(Arc::clone(engine));
    }
    let backend = select_backend(BACKENDS, requested)?;
    debug!(
        "Selected template engine '{}' v{}.{}.{}",
        backend.name, backend.version.0, backend.version.1, backend.version.2
    );
    let engine = SHARED_ENGINE.get_or_init(|| (backend.build)());
    Ok(Arc::clone(engine))
}
