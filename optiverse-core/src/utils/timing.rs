#[cfg(test)]
#[path = "../../tests/unit/utils/timing_test.rs"]
mod timing_test;

use crate::utils::Float;
use std::time::{Duration, Instant};

/// Implements performance timer functionality.
#[derive(Clone, Debug)]
pub struct Timer {
    start: Instant,
}

impl Timer {
    /// Starts a new timer.
    pub fn start() -> Self {
        Self { start: Instant::now() }
    }

    /// Returns elapsed time in whole seconds.
    pub fn elapsed_secs(&self) -> u64 {
        self.start.elapsed().as_secs()
    }

    /// Returns elapsed time in seconds as float.
    pub fn elapsed_secs_as_float(&self) -> Float {
        self.start.elapsed().as_secs_f64()
    }

    /// Returns elapsed time in milliseconds.
    pub fn elapsed_millis(&self) -> u128 {
        self.start.elapsed().as_millis()
    }

    /// Returns elapsed time.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

/// Specifies a computational quota for the optimization run.
/// The main purpose is to allow to stop the run in reaction to external events such
/// as user cancellation.
pub trait Quota {
    /// Returns true when computation should be stopped.
    fn is_reached(&self) -> bool;
}

/// A global wall-clock deadline of the run. The only thing which advances it is time itself:
/// everything else just queries how much is left.
#[derive(Clone, Debug)]
pub struct Deadline {
    timer: Timer,
    limit: Option<Duration>,
}

impl Deadline {
    /// Creates a deadline which expires `limit` after now, or never when limit is not set.
    pub fn new(limit: Option<Duration>) -> Self {
        Self { timer: Timer::start(), limit }
    }

    /// Creates a deadline which never expires.
    pub fn unbounded() -> Self {
        Self::new(None)
    }

    /// Returns time elapsed since the deadline was started.
    pub fn elapsed(&self) -> Duration {
        self.timer.elapsed()
    }

    /// Returns remaining time or `None` when the deadline is unbounded.
    pub fn remaining(&self) -> Option<Duration> {
        self.limit.map(|limit| limit.saturating_sub(self.timer.elapsed()))
    }

    /// Returns a budget which never exceeds the remaining time and, optionally, the given cap.
    pub fn budget(&self, cap: Option<Duration>) -> Option<Duration> {
        match (self.remaining(), cap) {
            (Some(remaining), Some(cap)) => Some(remaining.min(cap)),
            (Some(remaining), None) => Some(remaining),
            (None, cap) => cap,
        }
    }

    /// Returns an estimate till expiration in `[0, 1]` range; zero for an unbounded deadline.
    pub fn estimate(&self) -> Float {
        self.limit
            .filter(|limit| !limit.is_zero())
            .map(|limit| (self.timer.elapsed_secs_as_float() / limit.as_secs_f64()).min(1.))
            .unwrap_or(0.)
    }
}

impl Quota for Deadline {
    fn is_reached(&self) -> bool {
        self.remaining().is_some_and(|remaining| remaining.is_zero())
    }
}
