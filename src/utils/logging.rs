use log::{log_enabled, warn, Level};
use std::time::{Duration, Instant};

/// Scoped timer bracketing one phase of a step with trace records.
pub struct ScopedTimer<'a> {
    label: &'a str,
    start: Instant,
}

impl<'a> ScopedTimer<'a> {
    pub fn new(label: &'a str) -> Self {
        if log_enabled!(Level::Trace) {
            log::trace!("start {label}");
        }
        Self {
            label,
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl<'a> Drop for ScopedTimer<'a> {
    fn drop(&mut self) {
        if log_enabled!(Level::Trace) {
            log::trace!("end {} ({} µs)", self.label, self.start.elapsed().as_micros());
        }
    }
}

/// Warns when one physics step took longer than the thread's tick budget.
///
/// Returns `true` when the budget was exceeded.
pub fn warn_if_step_budget_exceeded(duration: Duration, budget: Duration) -> bool {
    if duration > budget {
        warn!(
            "physics step exceeded budget: {:.2} ms > {:.2} ms",
            duration.as_secs_f64() * 1000.0,
            budget.as_secs_f64() * 1000.0
        );
        return true;
    }
    false
}
