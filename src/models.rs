// src/models.rs

use std::fmt;
use std::path::{Path, PathBuf};

use crate::constants::TOOL_NAMESPACE;

// --- DIAGNOSTICS ---

/// Severity of a diagnostic. Only `Error` fails a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Warning,
    Error,
}

/// A single message produced by the engine or by the executor on I/O failure.
///
/// Line and column are 1-based; a zero coming from an engine is normalized to
/// "absent" by [`Diagnostic::at`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub file_name: Option<PathBuf>,
    pub line: Option<u32>,
    pub column: Option<u32>,
    pub severity: Severity,
    pub text: String,
}

impl Diagnostic {
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            file_name: None,
            line: None,
            column: None,
            severity: Severity::Error,
            text: text.into(),
        }
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            ..Self::error(text)
        }
    }

    /// Attaches a file to the diagnostic.
    pub fn in_file(mut self, file: impl Into<PathBuf>) -> Self {
        self.file_name = Some(file.into());
        self
    }

    /// Attaches a position. Zero means "unknown" and is dropped.
    pub fn at(mut self, line: u32, column: u32) -> Self {
        self.line = (line > 0).then_some(line);
        self.column = (line > 0 && column > 0).then_some(column);
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

/// Renders `<file>(<line>,<col>): WARNING|ERROR: <text>`, leaving out the
/// parts that are unknown.
impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let has_file = match &self.file_name {
            Some(file) if !file.as_os_str().is_empty() => {
                write!(f, "{}", file.display())?;
                true
            }
            _ => false,
        };
        if let Some(line) = self.line {
            write!(f, "({line}")?;
            if let Some(column) = self.column {
                write!(f, ",{column}")?;
            }
            write!(f, ")")?;
        }
        if has_file || self.line.is_some() {
            write!(f, ": ")?;
        }
        let level = match self.severity {
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
        };
        write!(f, "{level}: {}", self.text)
    }
}

/// The diagnostics of one job, tagged with the template they belong to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobDiagnostics {
    pub template: PathBuf,
    pub diagnostics: Vec<Diagnostic>,
}

impl JobDiagnostics {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }
}

// --- LOCKING ---

/// The two operations that take a run-wide lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Transform,
    Clean,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Transform => "transform",
            Self::Clean => "clean",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifies one lock: a run of one operation over one input set.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LockKey {
    pub namespace: &'static str,
    pub operation: Operation,
    pub fingerprint: String,
}

impl LockKey {
    pub fn new(operation: Operation, fingerprint: impl Into<String>) -> Self {
        Self {
            namespace: TOOL_NAMESPACE,
            operation,
            fingerprint: fingerprint.into(),
        }
    }

    /// File name of the lock backing this key.
    pub fn file_name(&self) -> String {
        format!("{}.{}.{}.lock", self.namespace, self.operation, self.fingerprint)
    }
}

// --- JOBS ---

/// States of a template job. `Skipped`, `Written`, `WriteFailed` and `Failed`
/// are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Created,
    Parsed,
    Skipped,
    Preprocessing,
    Executing,
    Written,
    WriteFailed,
    Failed,
}

impl JobState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Skipped | Self::Written | Self::WriteFailed | Self::Failed
        )
    }
}

/// Outcome of one job once it reached a terminal state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobOutcome {
    pub template: PathBuf,
    pub state: JobState,
    pub output_path: Option<PathBuf>,
    pub diagnostics: Vec<Diagnostic>,
}

impl JobOutcome {
    /// The output path, if this job produced one on this run.
    pub fn written_output(&self) -> Option<&Path> {
        match self.state {
            JobState::Written => self.output_path.as_deref(),
            _ => None,
        }
    }
}
