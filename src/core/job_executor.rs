//! # Job Executor
//!
//! Runs one template end to end as an explicit state machine:
//!
//! ```text
//! Created -> Parsed -> Skipped
//!                   -> Preprocessing -> Executing -> Written | WriteFailed
//! Created -> Failed          (template unreadable)
//! Parsed  -> Failed          (parse or compile errors)
//! ```
//!
//! A job owns its data exclusively. Failures are recorded as diagnostics on
//! the job and never escape it.

use crate::{
    constants::DEFAULT_OUTPUT_EXTENSION,
    core::{freshness, parameters::ParameterTable},
    engine::TemplateEngine,
    models::{Diagnostic, JobOutcome, JobState},
};
use log::{debug, trace};
use std::{
    fs,
    path::{Path, PathBuf},
};

const BYTE_ORDER_MARK: char = '\u{feff}';

/// One unit of work: a single template and everything learned about it.
#[derive(Debug)]
pub struct TemplateJob {
    primary_path: PathBuf,
    included_paths: Vec<PathBuf>,
    output_path: Option<PathBuf>,
    diagnostics: Vec<Diagnostic>,
    state: JobState,
    /// Raw template text, kept between parsing and preprocessing.
    source: Option<String>,
}

impl TemplateJob {
    pub fn new(primary_path: impl Into<PathBuf>) -> Self {
        Self {
            primary_path: primary_path.into(),
            included_paths: Vec::new(),
            output_path: None,
            diagnostics: Vec::new(),
            state: JobState::Created,
            source: None,
        }
    }

    pub fn primary_path(&self) -> &Path {
        &self.primary_path
    }

    pub fn included_paths(&self) -> &[PathBuf] {
        &self.included_paths
    }

    pub fn output_path(&self) -> Option<&Path> {
        self.output_path.as_deref()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    fn transition(&mut self, next: JobState) {
        trace!(
            "'{}': {:?} -> {:?}",
            self.primary_path.display(),
            self.state,
            next
        );
        self.state = next;
    }

    fn fail_with(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
        self.transition(JobState::Failed);
    }

    /// `Created -> Parsed | Failed`. Calling it in any other state is a no-op,
    /// so includes are discovered exactly once.
    pub fn parse(&mut self, engine: &dyn TemplateEngine) -> JobState {
        if self.state != JobState::Created {
            return self.state;
        }

        let text = match fs::read_to_string(&self.primary_path) {
            Ok(text) => match text.strip_prefix(BYTE_ORDER_MARK) {
                Some(stripped) => stripped.to_string(),
                None => text,
            },
            Err(e) => {
                self.diagnostics.clear();
                self.fail_with(
                    Diagnostic::error(format!(
                        "Could not read template '{}': {}",
                        self.primary_path.display(),
                        e
                    ))
                    .in_file(&self.primary_path),
                );
                return self.state;
            }
        };

        let includes = &mut self.included_paths;
        let parsed = engine.parse(&self.primary_path, &text, &mut |p: &Path| {
            includes.push(p.to_path_buf());
        });
        self.diagnostics.extend(parsed.diagnostics);

        if self.has_errors() {
            self.transition(JobState::Failed);
            return self.state;
        }

        self.output_path = Some(output_path_for(
            &self.primary_path,
            parsed.output_extension.as_deref(),
        ));
        self.source = Some(text);
        self.transition(JobState::Parsed);
        self.state
    }

    /// Drives the job to a terminal state.
    pub fn run(
        &mut self,
        engine: &dyn TemplateEngine,
        parameters: &ParameterTable,
        skip_up_to_date: bool,
    ) -> JobState {
        if self.parse(engine) != JobState::Parsed {
            return self.state;
        }

        if freshness::should_skip(self, skip_up_to_date) {
            // Skipped jobs report no diagnostics, not even parse warnings.
            self.diagnostics.clear();
            self.transition(JobState::Skipped);
            return self.state;
        }

        self.transition(JobState::Preprocessing);
        let source = self.source.take().unwrap_or_default();
        let text = parameters.preprocess(&source);

        self.transition(JobState::Executing);
        let executed = engine.execute(&self.primary_path, &text);
        self.diagnostics.extend(executed.diagnostics);

        let generated = match executed.generated {
            Some(generated) if !self.has_errors() => generated,
            Some(_) => {
                self.transition(JobState::Failed);
                return self.state;
            }
            None => {
                if !self.has_errors() {
                    self.diagnostics.push(
                        Diagnostic::error(format!("Engine '{}' produced no output.", engine.name()))
                            .in_file(&self.primary_path),
                    );
                }
                self.transition(JobState::Failed);
                return self.state;
            }
        };

        let Some(output) = self.output_path.clone() else {
            self.fail_with(
                Diagnostic::error("No output path was resolved.").in_file(&self.primary_path),
            );
            return self.state;
        };

        let content = generated.strip_prefix(BYTE_ORDER_MARK).unwrap_or(&generated);
        match fs::write(&output, content.as_bytes()) {
            Ok(()) => {
                debug!("Wrote '{}'", output.display());
                self.transition(JobState::Written);
            }
            Err(e) => {
                self.diagnostics.push(
                    Diagnostic::error(format!(
                        "Could not write output file '{}': {}",
                        output.display(),
                        e
                    ))
                    .in_file(&output),
                );
                self.transition(JobState::WriteFailed);
            }
        }
        self.state
    }

    pub fn into_outcome(self) -> JobOutcome {
        JobOutcome {
            template: self.primary_path,
            state: self.state,
            output_path: self.output_path,
            diagnostics: self.diagnostics,
        }
    }
}

/// Replaces the template's extension with the declared one (leading dot
/// optional), falling back to the default extension.
pub fn output_path_for(template: &Path, declared_extension: Option<&str>) -> PathBuf {
    let extension = declared_extension
        .map(|ext| ext.trim().trim_start_matches('.'))
        .filter(|ext| !ext.is_empty())
        .unwrap_or(DEFAULT_OUTPUT_EXTENSION);
    template.with_extension(extension)
}
