// src/cli/handlers/clean.rs

use anyhow::Result;
use colored::Colorize;
use log::debug;
use std::fs;

use crate::{
    cli::{GlobalArgs, args::CleanArgs, handlers::commons},
    constants::{EXIT_FAILURE, EXIT_SUCCESS},
    core::{config_loader::CliOverrides, job_executor::TemplateJob},
    engine::registry,
    models::{JobState, Operation},
};

/// Runs `clean` and returns the process exit code.
///
/// Templates are handled one at a time, in argument order. A template whose
/// output cannot be resolved is skipped.
pub fn handle(args: CleanArgs, globals: &GlobalArgs) -> Result<i32> {
    let invocation = commons::prepare(globals, CliOverrides::default(), &args.templates)?;
    let engine = registry::shared_engine(invocation.settings.engine.as_deref())?;
    let _lock =
        commons::acquire_lock(Operation::Clean, &invocation.templates, &invocation.settings)?;

    let mut failed = false;
    for template in invocation.templates {
        let mut job = TemplateJob::new(template);
        if job.parse(engine.as_ref()) != JobState::Parsed {
            debug!("Skipping '{}': output not resolvable", job.primary_path().display());
            continue;
        }
        let Some(output) = job.output_path() else {
            continue;
        };
        if !output.exists() {
            continue;
        }

        println!("Deleting file \"{}\"", output.display());
        if let Err(e) = fs::remove_file(output) {
            eprintln!(
                "{}",
                format!("Could not delete file '{}': {}", output.display(), e).red()
            );
            failed = true;
        }
    }

    Ok(if failed { EXIT_FAILURE } else { EXIT_SUCCESS })
}
