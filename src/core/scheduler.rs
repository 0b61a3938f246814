//! # Parallel Scheduler
//!
//! Fans the job list out, either strictly sequentially on the calling thread
//! or on a dedicated `rayon` pool. Jobs never wait on each other; their only
//! shared state is the [`ResultCollector`] they append to.

use crate::{
    core::{aggregator::ResultCollector, job_executor::TemplateJob, parameters::ParameterTable},
    engine::TemplateEngine,
    models::{Diagnostic, JobOutcome, JobState},
};
use anyhow::{Context, Result};
use log::{debug, trace};
use rayon::prelude::*;
use std::{
    any::Any,
    num::NonZeroUsize,
    panic::{self, AssertUnwindSafe},
    path::PathBuf,
};

/// How many jobs may run at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Concurrency {
    /// One job at a time, in input order, on the calling thread.
    Serial,
    /// At most this many jobs at once.
    Bounded(NonZeroUsize),
    /// As many as the host's parallelism allows.
    HostDefault,
}

impl Concurrency {
    /// Resolves the effective degree from the `--parallel` flag and an
    /// optional bound (0 meaning "no bound").
    pub fn from_options(parallel: bool, max_parallelism: Option<usize>) -> Self {
        if !parallel {
            return Self::Serial;
        }
        match max_parallelism.and_then(NonZeroUsize::new) {
            Some(n) if n.get() == 1 => Self::Serial,
            Some(n) => Self::Bounded(n),
            None => Self::HostDefault,
        }
    }
}

/// Read-only context shared by every job of a run.
#[derive(Clone, Copy)]
pub struct RunContext<'a> {
    pub engine: &'a dyn TemplateEngine,
    pub parameters: &'a ParameterTable,
    pub skip_up_to_date: bool,
}

impl std::fmt::Debug for RunContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunContext")
            .field("engine", &self.engine.name())
            .field("parameters", &self.parameters.len())
            .field("skip_up_to_date", &self.skip_up_to_date)
            .finish()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

/// Runs one template to completion. A panic inside the job is turned into an
/// error diagnostic on that job only.
pub fn execute_one(template: PathBuf, context: &RunContext<'_>) -> JobOutcome {
    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        let mut job = TemplateJob::new(template.clone());
        let state = job.run(context.engine, context.parameters, context.skip_up_to_date);
        debug_assert!(state.is_terminal(), "job stopped in {state:?}");
        job.into_outcome()
    }));

    match result {
        Ok(outcome) => outcome,
        Err(payload) => JobOutcome {
            diagnostics: vec![Diagnostic::error(format!(
                "Could not process template '{}': {}",
                template.display(),
                panic_message(payload.as_ref())
            ))],
            template,
            state: JobState::Failed,
            output_path: None,
        },
    }
}

/// Executes every template and records its outcome in `collector`.
///
/// # Errors
///
/// Fails only if a worker pool cannot be created; job failures are reported
/// through the collector.
pub fn run_all(
    templates: Vec<PathBuf>,
    concurrency: Concurrency,
    context: &RunContext<'_>,
    collector: &ResultCollector,
) -> Result<()> {
    debug!("Scheduling {} job(s) with {:?}", templates.len(), concurrency);

    let threads = match concurrency {
        Concurrency::Serial => {
            for template in templates {
                collector.record(execute_one(template, context));
            }
            return Ok(());
        }
        Concurrency::Bounded(n) => n.get(),
        Concurrency::HostDefault => 0,
    };

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(|i| format!("ttbuild-worker-{i}"))
        .build()
        .context("Failed to create the worker pool")?;

    pool.install(|| {
        templates.into_par_iter().for_each(|template| {
            trace!("Dispatching '{}'", template.display());
            collector.record(execute_one(template, context));
        });
    });
    Ok(())
}
