// src/core/timer.rs

use log::debug;
use std::time::{Duration, Instant};

/// RAII timer for a named phase of a run.
///
/// Logs the elapsed time at debug level when dropped; [`PhaseTimer::elapsed`]
/// gives the running time to callers that report it themselves.
#[derive(Debug)]
pub struct PhaseTimer {
    name: String,
    start: Instant,
}

impl PhaseTimer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Drop for PhaseTimer {
    fn drop(&mut self) {
        debug!("{} took {} ms", self.name, self.start.elapsed().as_millis());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_elapsed_is_monotonic() {
        let timer = PhaseTimer::new("test");
        let first = timer.elapsed();
        std::thread::sleep(Duration::from_millis(5));
        assert!(timer.elapsed() > first);
    }
}
