#![deny(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `afd-core` holds the data model shared by every process in the AFD file
//! distribution engine: the directory scanner (AMG), the job dispatcher (FD),
//! transfer workers, the shared status area, and the log search tools all
//! depend on these types instead of redefining them locally.
//!
//! # Design
//!
//! The model follows the shape described by the file distribution
//! specification: [`host::Host`] and [`directory::Directory`] are configured
//! once and live for the process lifetime; [`job::JobDescriptor`] is the
//! short-lived contract handed from the scanner to the dispatcher; the error
//! kinds in [`outcome`] classify every way a transfer attempt can end.
//!
//! # Invariants
//!
//! - A [`job::JobDescriptor`] is immutable after construction; retries build a
//!   new descriptor rather than mutating one in place.
//! - [`outcome::WorkerOutcome`] is exhaustive: every transfer worker exit maps
//!   to exactly one variant, which is what the dispatcher switches on.

pub mod delete_reason;
pub mod directory;
pub mod host;
pub mod job;
pub mod outcome;

pub use delete_reason::DeleteReason;
pub use directory::{DeleteFlags, Directory};
pub use host::{ErrorHistory, Host, HostOptions, HostStatus, JobSlotStatus};
pub use job::{ConnectStatus, FileEntry, JobDescriptor, LockPolicy, Scheme, TransferMode};
pub use outcome::{FatalKind, TransientKind, WorkerOutcome};
