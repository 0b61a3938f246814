//! # Templating Engine Boundary
//!
//! The orchestrator never interprets template bodies itself. Everything that
//! depends on the template language (directive parsing, include resolution,
//! code generation and execution) sits behind the [`TemplateEngine`] trait.
//!
//! ## Modules
//!
//! - **`directive`**: the built-in backend. It understands `output` and
//!   `include` directives and emits literal text; it does not run code blocks.
//! - **`registry`**: selects a backend at startup and hands out the single,
//!   process-wide engine handle.

use crate::models::Diagnostic;
use std::path::{Path, PathBuf};

pub mod directive;
pub mod registry;

/// What an engine learned from parsing a template.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseOutcome {
    /// Extension declared by the template's output directive, if any.
    pub output_extension: Option<String>,
    pub diagnostics: Vec<Diagnostic>,
}

/// What an engine produced when running a template.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecuteOutcome {
    /// Generated text. `None` when the template could not be run.
    pub generated: Option<String>,
    pub diagnostics: Vec<Diagnostic>,
}

/// An external templating engine.
///
/// Implementations are shared across worker threads and must not keep
/// per-template state between calls.
pub trait TemplateEngine: Send + Sync {
    /// Short backend name, used in logs and configuration.
    fn name(&self) -> &str;

    /// Parses `text` (the content of `template`), resolving includes.
    ///
    /// `on_include` must be called once per resolved include with its
    /// absolute location.
    fn parse(&self, template: &Path, text: &str, on_include: &mut dyn FnMut(&Path))
    -> ParseOutcome;

    /// Parses and runs `text`, producing the generated output.
    fn execute(&self, template: &Path, text: &str) -> ExecuteOutcome;

    /// Root of the scratch area where the engine keeps intermediate artifacts.
    /// Diagnostics pointing below it are reported relative to it.
    fn scratch_root(&self) -> Option<PathBuf> {
        Some(std::env::temp_dir())
    }
}
