// src/engine/directive.rs

use crate::{
    constants::MAX_INCLUDE_DEPTH,
    engine::{ExecuteOutcome, ParseOutcome, TemplateEngine},
    models::Diagnostic,
};
use lazy_static::lazy_static;
use log::trace;
use regex::Regex;
use std::{
    fs,
    path::{Path, PathBuf},
};

lazy_static! {
    static ref ATTRIBUTE_RE: Regex =
        Regex::new(r#"([A-Za-z_][A-Za-z0-9_]*)\s*=\s*"([^"]*)""#).unwrap();
}

const BLOCK_OPEN: &str = "<#";
const BLOCK_CLOSE: &str = "#>";

/// The built-in backend: directives only, no code execution.
///
/// Supported:
/// - `<#@ output extension="cs" #>`
/// - `<#@ include file="Shared.ttinclude" #>` (relative to the including file)
///
/// Other directives are accepted and ignored. Control blocks are reported as
/// errors since running them needs a code-executing backend.
#[derive(Debug, Default, Clone, Copy)]
pub struct DirectiveEngine;

impl DirectiveEngine {
    pub const NAME: &'static str = "directive";

    pub fn new() -> Self {
        Self
    }
}

/// Accumulated state of one expansion (template plus its includes).
struct Expansion<'cb> {
    output_extension: Option<String>,
    generated: String,
    diagnostics: Vec<Diagnostic>,
    /// Files currently being expanded, outermost first.
    stack: Vec<PathBuf>,
    on_include: &'cb mut dyn FnMut(&Path),
}

impl Expansion<'_> {
    fn expand(&mut self, file: &Path, text: &str) {
        if self.stack.len() > MAX_INCLUDE_DEPTH as usize {
            self.diagnostics.push(
                Diagnostic::error(format!(
                    "Maximum include depth ({MAX_INCLUDE_DEPTH}) exceeded."
                ))
                .in_file(file),
            );
            return;
        }
        self.stack.push(file.to_path_buf());

        let mut rest = text;
        let mut offset = 0usize;
        while let Some(start) = rest.find(BLOCK_OPEN) {
            let (literal, block) = rest.split_at(start);
            self.generated.push_str(literal);
            let block_offset = offset + start;
            let (line, column) = position_of(text, block_offset);

            let close = block
                .get(BLOCK_OPEN.len()..)
                .and_then(|after_open| after_open.find(BLOCK_CLOSE));
            let Some(end) = close.map(|i| i + BLOCK_OPEN.len()) else {
                self.diagnostics.push(
                    Diagnostic::error("Unterminated block: missing '#>'.")
                        .in_file(file)
                        .at(line, column),
                );
                rest = "";
                break;
            };
            let inner = block.get(BLOCK_OPEN.len()..end).unwrap_or("");
            let mut consumed = end + BLOCK_CLOSE.len();

            if let Some(directive) = inner.strip_prefix('@') {
                self.directive(file, directive, line, column);
                let after = block.get(consumed..).unwrap_or("");
                if after.starts_with("\r\n") {
                    consumed += 2;
                } else if after.starts_with('\n') {
                    consumed += 1;
                }
            } else {
                self.diagnostics.push(
                    Diagnostic::error(format!(
                        "Control blocks are not supported by the '{}' engine.",
                        DirectiveEngine::NAME
                    ))
                    .in_file(file)
                    .at(line, column),
                );
            }

            rest = block.get(consumed..).unwrap_or("");
            offset = block_offset + consumed;
        }
        self.generated.push_str(rest);
        self.stack.pop();
    }

    fn directive(&mut self, file: &Path, body: &str, line: u32, column: u32) {
        let body = body.trim();
        let name = body.split_whitespace().next().unwrap_or("");
        let attribute = |key: &str| {
            ATTRIBUTE_RE
                .captures_iter(body)
                .find(|c| c.get(1).is_some_and(|m| m.as_str().eq_ignore_ascii_case(key)))
                .and_then(|c| c.get(2).map(|m| m.as_str().to_string()))
        };

        match name.to_ascii_lowercase().as_str() {
            "output" => {
                if let Some(ext) = attribute("extension") {
                    self.output_extension = Some(ext);
                }
            }
            "include" => match attribute("file") {
                Some(request) => self.include(file, &request, line, column),
                None => self.diagnostics.push(
                    Diagnostic::error("Include directive is missing the 'file' attribute.")
                        .in_file(file)
                        .at(line, column),
                ),
            },
            "" => self.diagnostics.push(
                Diagnostic::error("Empty directive.")
                    .in_file(file)
                    .at(line, column),
            ),
            other => trace!("Ignoring '{}' directive in '{}'", other, file.display()),
        }
    }

    fn include(&mut self, from: &Path, request: &str, line: u32, column: u32) {
        let requested = Path::new(request);
        let candidate = if requested.is_absolute() {
            requested.to_path_buf()
        } else {
            from.parent().unwrap_or(Path::new("")).join(requested)
        };

        let resolved = match dunce::canonicalize(&candidate) {
            Ok(path) => path,
            Err(_) => {
                self.diagnostics.push(
                    Diagnostic::error(format!("Could not find include file '{request}'."))
                        .in_file(from)
                        .at(line, column),
                );
                return;
            }
        };

        if self.stack.contains(&resolved) {
            let chain = self
                .stack
                .iter()
                .chain(std::iter::once(&resolved))
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(" -> ");
            self.diagnostics.push(
                Diagnostic::error(format!("Include cycle detected: {chain}"))
                    .in_file(from)
                    .at(line, column),
            );
            return;
        }

        (self.on_include)(&resolved);

        match fs::read_to_string(&resolved) {
            Ok(content) => {
                let content = content.strip_prefix('\u{feff}').unwrap_or(&content).to_string();
                self.expand(&resolved, &content);
            }
            Err(e) => self.diagnostics.push(
                Diagnostic::error(format!("Could not read include file '{request}': {e}"))
                    .in_file(from)
                    .at(line, column),
            ),
        }
    }
}

/// 1-based line and column (in characters) of a byte offset.
fn position_of(text: &str, offset: usize) -> (u32, u32) {
    let before = text.get(..offset).unwrap_or(text);
    let line = before.matches('\n').count() + 1;
    let line_start = before.rfind('\n').map_or(0, |i| i + 1);
    let column = before.get(line_start..).map_or(0, |s| s.chars().count()) + 1;
    (
        u32::try_from(line).unwrap_or(u32::MAX),
        u32::try_from(column).unwrap_or(u32::MAX),
    )
}

impl DirectiveEngine {
    fn run<'cb>(
        &self,
        template: &Path,
        text: &str,
        on_include: &'cb mut dyn FnMut(&Path),
    ) -> Expansion<'cb> {
        let mut expansion = Expansion {
            output_extension: None,
            generated: String::with_capacity(text.len()),
            diagnostics: Vec::new(),
            stack: Vec::new(),
            on_include,
        };
        expansion.expand(template, text);
        expansion
    }
}

impl TemplateEngine for DirectiveEngine {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn parse(
        &self,
        template: &Path,
        text: &str,
        on_include: &mut dyn FnMut(&Path),
    ) -> ParseOutcome {
        let expansion = self.run(template, text, on_include);
        ParseOutcome {
            output_extension: expansion.output_extension,
            diagnostics: expansion.diagnostics,
        }
    }

    fn execute(&self, template: &Path, text: &str) -> ExecuteOutcome {
        let mut ignore = |_: &Path| {};
        let expansion = self.run(template, text, &mut ignore);
        let failed = expansion.diagnostics.iter().any(Diagnostic::is_error);
        ExecuteOutcome {
            generated: (!failed).then_some(expansion.generated),
            diagnostics: expansion.diagnostics,
        }
    }

    /// Nothing is staged outside the template's own directory.
    fn scratch_root(&self) -> Option<PathBuf> {
        None
    }
}
