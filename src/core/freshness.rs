// src/core/freshness.rs

use crate::core::job_executor::TemplateJob;
use crate::models::JobState;
use log::{debug, trace};
use std::{fs, path::Path, time::SystemTime};

fn modified(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}

/// Whether `output` exists and is strictly newer than `primary` and every
/// file in `includes`. Any missing file or unreadable timestamp counts as
/// stale.
pub fn is_up_to_date(output: &Path, primary: &Path, includes: &[impl AsRef<Path>]) -> bool {
    let Some(output_time) = modified(output) else {
        trace!("'{}' has no readable timestamp", output.display());
        return false;
    };

    std::iter::once(primary)
        .chain(includes.iter().map(AsRef::as_ref))
        .all(|input| match modified(input) {
            Some(input_time) if input_time < output_time => true,
            Some(_) => {
                trace!("'{}' is not older than '{}'", input.display(), output.display());
                false
            }
            None => {
                trace!("'{}' has no readable timestamp", input.display());
                false
            }
        })
}

/// Decides whether a parsed job may skip regeneration.
///
/// Only jobs in the `Parsed` state are eligible: includes are discovered by
/// parsing, so an unparsed job is never judged fresh.
pub fn should_skip(job: &TemplateJob, skip_requested: bool) -> bool {
    if !skip_requested || job.state() != JobState::Parsed {
        return false;
    }
    let Some(output) = job.output_path() else {
        return false;
    };

    let fresh = is_up_to_date(output, job.primary_path(), job.included_paths());
    debug!(
        "'{}' is {}",
        job.primary_path().display(),
        if fresh { "up to date" } else { "stale" }
    );
    fresh
}
