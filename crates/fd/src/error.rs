//! Dispatcher-level error kinds.

use thiserror::Error;

/// Failures raised by the dispatcher's bookkeeping, as opposed to a worker's
/// own [`afd_core::outcome::WorkerOutcome`].
#[derive(Debug, Error)]
pub enum FdError {
    /// A job named a host alias the dispatcher has no entry for.
    #[error("job references unknown host alias {0:?}")]
    UnknownHost(String),

    /// `on_worker_exit` was called for a slot index out of range for the host.
    #[error("host {host:?} has no slot {slot}")]
    NoSuchSlot { host: String, slot: usize },

    /// `on_worker_exit` was called for a slot that was not `Running`.
    #[error("host {host:?} slot {slot} was not running")]
    SlotNotRunning { host: String, slot: usize },
}
