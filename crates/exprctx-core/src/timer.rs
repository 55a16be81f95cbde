//! # Timer
//!
//! Instrumentation handle carried by an expression context.
//!
//! A timer records checkpoints as `debug` events. The context hands it to
//! collaborators so their own work shows up in the same timeline, and
//! replaces it on every `reset`.

use std::cell::Cell;
use std::time::{Duration, Instant};

/// Named stopwatch with checkpoints.
#[derive(Debug, Clone)]
pub struct Timer {
    name: String,
    start: Instant,
    last: Cell<Instant>,
}

impl Timer {
    /// Start a new timer.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let now = Instant::now();
        Self {
            name: name.into(),
            start: now,
            last: Cell::new(now),
        }
    }

    /// The timer's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Time since the timer started.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Record a checkpoint. Returns the time since the previous checkpoint.
    pub fn checkpoint(&self, label: &str) -> Duration {
        let now = Instant::now();
        let split = now.saturating_duration_since(self.last.replace(now));
        tracing::debug!(
            timer = %self.name,
            checkpoint = label,
            split_ms = split.as_millis() as u64,
            "timer checkpoint"
        );
        split
    }

    /// Record the total running time.
    pub fn finish(&self) -> Duration {
        let total = self.elapsed();
        tracing::debug!(
            timer = %self.name,
            total_ms = total.as_millis() as u64,
            "timer finished"
        );
        total
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new("expression")
    }
}
