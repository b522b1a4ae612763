//! Backoff-gated holding area for jobs that hit a transient failure.

use std::time::Instant;

use afd_core::JobDescriptor;

/// A job waiting for its backoff delay to elapse before re-entering the queue.
#[derive(Debug)]
struct Entry {
    ready_at: Instant,
    job: JobDescriptor,
}

/// Jobs retried with `retry_interval * backoff(attempt)` delay, per host.
///
/// Plain `Vec` scan rather than a binary heap: the number of jobs in backoff
/// at once is bounded by the number of hosts times their slot count, which is
/// small, and `tick` needs to pull out every entry whose time has come, not
/// just the earliest.
#[derive(Debug, Default)]
pub struct RetryQueue {
    entries: Vec<Entry>,
}

impl RetryQueue {
    #[must_use]
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Schedules `job` to become eligible again at `ready_at`.
    pub fn schedule(&mut self, job: JobDescriptor, ready_at: Instant) {
        self.entries.push(Entry { ready_at, job });
    }

    /// Removes and returns every job whose delay has elapsed by `now`.
    pub fn drain_due(&mut self, now: Instant) -> Vec<JobDescriptor> {
        let (still_waiting, ready): (Vec<Entry>, Vec<Entry>) =
            std::mem::take(&mut self.entries).into_iter().partition(|e| e.ready_at > now);
        self.entries = still_waiting;
        ready.into_iter().map(|e| e.job).collect()
    }

    /// Number of jobs currently waiting out their backoff.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
