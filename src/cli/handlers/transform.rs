// src/cli/handlers/transform.rs

use anyhow::{Context, Result};
use colored::Colorize;
use log::{debug, info};
use std::io::{self, Write};

use crate::{
    cli::{GlobalArgs, args::TransformArgs, handlers::commons},
    constants::{EXIT_FAILURE, EXIT_SUCCESS},
    core::{
        aggregator::{ResultCollector, RunOutcome},
        config_loader::CliOverrides,
        parameters::ParameterTable,
        paths, reporter,
        scheduler::{self, Concurrency, RunContext},
        timer::PhaseTimer,
    },
    engine::registry,
    models::Operation,
};

/// Runs `transform` and returns the process exit code.
pub fn handle(args: TransformArgs, globals: &GlobalArgs) -> Result<i32> {
    let timer = PhaseTimer::new("transform");

    let overrides = CliOverrides {
        parallel: args.parallel,
        max_parallelism: args.jobs,
        skip_up_to_date: args.skip_up_to_date,
        ..CliOverrides::default()
    };
    let invocation = commons::prepare(globals, overrides, &args.templates)?;
    let settings = &invocation.settings;

    // Bad variables abort the run before any lock is taken.
    let parameters = ParameterTable::from_sources(&settings.variables, &args.variables)?;
    let engine = registry::shared_engine(settings.engine.as_deref())?;

    let _lock = commons::acquire_lock(Operation::Transform, &invocation.templates, settings)?;

    let context = RunContext {
        engine: engine.as_ref(),
        parameters: &parameters,
        skip_up_to_date: settings.skip_up_to_date,
    };
    let concurrency = Concurrency::from_options(settings.parallel, settings.max_parallelism);
    let collector = ResultCollector::new();
    scheduler::run_all(invocation.templates, concurrency, &context, &collector)?;
    let report = collector.finish();
    debug!(
        "{} regenerated, {} skipped, {} failed",
        report.regenerated, report.skipped, report.failed
    );

    let mut stdout = io::stdout().lock();
    reporter::write_outputs(&mut stdout, &report.outputs).context("Could not write to stdout")?;
    stdout.flush().context("Could not write to stdout")?;

    let mut stderr = io::stderr().lock();
    match report.outcome() {
        RunOutcome::Success => {
            let summary =
                reporter::summary_line(&paths::project_name(&invocation.cwd), timer.elapsed());
            writeln!(stderr, "{}", summary.green()).context("Could not write to stderr")?;
        }
        RunOutcome::NoWork => {
            info!("{} template(s) up to date", report.skipped);
            let line = reporter::no_work_line(&paths::project_name(&invocation.cwd));
            writeln!(stderr, "{}", line.dimmed()).context("Could not write to stderr")?;
        }
        RunOutcome::Failure => debug!("Transformation finished with errors"),
    }
    let scratch_root = engine.scratch_root();
    reporter::write_diagnostics(&mut stderr, &report.diagnostics, scratch_root.as_deref())
        .context("Could not write to stderr")?;

    Ok(if report.has_errors() {
        EXIT_FAILURE
    } else {
        EXIT_SUCCESS
    })
}
