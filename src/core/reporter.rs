// src/core/reporter.rs

use crate::models::{Diagnostic, JobDiagnostics};
use colored::Colorize;
use std::{
    io::{self, Write},
    path::{Component, Path, PathBuf},
    time::Duration,
};

/// Rewrites a path under the engine's scratch area as a logical location.
///
/// The scratch root and the first segment below it (the per-run directory)
/// are stripped. Paths outside the root, or that would become empty, are
/// returned unchanged.
pub fn normalize_file_name(path: &Path, scratch_root: Option<&Path>) -> PathBuf {
    let Some(rest) = scratch_root.and_then(|root| path.strip_prefix(root).ok()) else {
        return path.to_path_buf();
    };

    let logical: PathBuf = rest
        .components()
        .skip_while(|c| matches!(c, Component::CurDir))
        .skip(1)
        .collect();

    if logical.as_os_str().is_empty() {
        path.to_path_buf()
    } else {
        logical
    }
}

/// Renders one diagnostic with its file location normalized.
pub fn format_diagnostic(diagnostic: &Diagnostic, scratch_root: Option<&Path>) -> String {
    match &diagnostic.file_name {
        Some(file) => Diagnostic {
            file_name: Some(normalize_file_name(file, scratch_root)),
            ..diagnostic.clone()
        }
        .to_string(),
        None => diagnostic.to_string(),
    }
}

/// Prints every diagnostic, warnings in yellow and errors in red.
pub fn write_diagnostics(
    out: &mut impl Write,
    collections: &[JobDiagnostics],
    scratch_root: Option<&Path>,
) -> io::Result<()> {
    for diagnostic in collections.iter().flat_map(|c| &c.diagnostics) {
        let line = format_diagnostic(diagnostic, scratch_root);
        if diagnostic.is_error() {
            writeln!(out, "{}", line.red())?;
        } else {
            writeln!(out, "{}", line.yellow())?;
        }
    }
    Ok(())
}

/// Prints one output path per line.
pub fn write_outputs(out: &mut impl Write, outputs: &[PathBuf]) -> io::Result<()> {
    for output in outputs {
        writeln!(out, "{}", output.display())?;
    }
    Ok(())
}

pub fn summary_line(project_name: &str, elapsed: Duration) -> String {
    format!(
        "Templates transformed for {} (in {:.2} sec).",
        project_name,
        elapsed.as_secs_f64()
    )
}

pub fn no_work_line(project_name: &str) -> String {
    format!("No templates needed transforming for {project_name}.")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_root_and_first_segment() {
        let root = Path::new("/tmp/scratch");
        let path = Path::new("/tmp/scratch/run-1234/Templates/A.tt");
        assert_eq!(
            normalize_file_name(path, Some(root)),
            PathBuf::from("Templates/A.tt")
        );
    }

    #[test]
    fn test_normalize_keeps_paths_outside_root() {
        let root = Path::new("/tmp/scratch");
        let path = Path::new("/work/project/A.tt");
        assert_eq!(normalize_file_name(path, Some(root)), path);
        assert_eq!(normalize_file_name(path, None), path);
    }

    #[test]
    fn test_normalize_keeps_original_when_nothing_remains() {
        let root = Path::new("/tmp/scratch");
        let path = Path::new("/tmp/scratch/run-1234");
        assert_eq!(normalize_file_name(path, Some(root)), path);
    }

    #[test]
    fn test_format_diagnostic_variants() {
        let root = Some(Path::new("/tmp/scratch"));

        let full = Diagnostic::error("Missing semicolon")
            .in_file("/tmp/scratch/abc/Gen/B.cs")
            .at(12, 4);
        assert_eq!(
            format_diagnostic(&full, root),
            "Gen/B.cs(12,4): ERROR: Missing semicolon"
        );

        let no_column = Diagnostic::warning("Unused").in_file("/work/A.tt").at(3, 0);
        assert_eq!(format_diagnostic(&no_column, root), "/work/A.tt(3): WARNING: Unused");

        let no_line = Diagnostic::error("Cannot read").in_file("/work/A.tt");
        assert_eq!(format_diagnostic(&no_line, root), "/work/A.tt: ERROR: Cannot read");

        let bare = Diagnostic::warning("Heads up");
        assert_eq!(format_diagnostic(&bare, root), "WARNING: Heads up");
    }

    #[test]
    fn test_write_outputs_and_diagnostics() {
        colored::control::set_override(false);

        let mut buffer = Vec::new();
        write_outputs(
            &mut buffer,
            &[PathBuf::from("/p/A.cs"), PathBuf::from("/p/B.cs")],
        )
        .unwrap();
        assert_eq!(String::from_utf8(buffer).unwrap(), "/p/A.cs\n/p/B.cs\n");

        let mut buffer = Vec::new();
        let collections = [JobDiagnostics {
            template: PathBuf::from("/p/A.tt"),
            diagnostics: vec![
                Diagnostic::warning("first").in_file("/p/A.tt").at(1, 1),
                Diagnostic::error("second"),
            ],
        }];
        write_diagnostics(&mut buffer, &collections, None).unwrap();
        assert_eq!(
            String::from_utf8(buffer).unwrap(),
            "/p/A.tt(1,1): WARNING: first\nERROR: second\n"
        );
    }

    #[test]
    fn test_no_work_line() {
        assert_eq!(no_work_line("Demo"), "No templates needed transforming for Demo.");
    }

    #[test]
    fn test_summary_line() {
        assert_eq!(
            summary_line("Demo", Duration::from_millis(1500)),
            "Templates transformed for Demo (in 1.50 sec)."
        );
    }
}
