#![deny(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! The job dispatcher (FD) owns the global FIFO of pending Job Descriptors
//! and a bounded pool of worker slots per host. It enforces per-host
//! concurrency and retry/backoff, reacts to worker exit outcomes, and
//! amortizes connection cost across jobs to the same host via the burst
//! coordinator (C6).
//!
//! # Design
//!
//! [`dispatcher::Dispatcher`] is deliberately free of any process-spawning
//! or pipe I/O: [`dispatcher::Dispatcher::tick`] decides which jobs are
//! ready to run and returns them to the caller, which does the actual
//! `fork`/`exec` and tells the dispatcher the resulting slot is `Running`.
//! [`retry::RetryQueue`] holds jobs whose next attempt is gated by
//! `retry_interval * backoff(attempt)`. [`guard::duplicate_file_guard`] is
//! the pure check the dispatcher runs before spawning, so a second worker
//! never starts uploading a file a sibling slot already has in flight.
//! [`burst::check_burst`] answers whether a worker that just finished its
//! batch should continue with another job on the live connection.
//!
//! # Invariants
//!
//! - A host's `slots` vector never has more entries than
//!   `Host::allowed_transfers`; [`dispatcher::Dispatcher::tick`] never
//!   spawns into a host with no `Idle` slot.
//! - A job removed from the main queue either ends up `Running` in some
//!   slot, back in the queue, in the retry queue, or reported as dropped;
//!   it is never silently discarded.

pub mod burst;
pub mod dispatcher;
pub mod error;
pub mod guard;
pub mod retry;

pub use burst::{check_burst, BurstDecision};
pub use dispatcher::{Dispatcher, ExitAction, HostEntry, ReadyJob};
pub use error::FdError;
pub use guard::{delete_log_line, duplicate_file_guard, WithheldFile};
pub use retry::RetryQueue;
