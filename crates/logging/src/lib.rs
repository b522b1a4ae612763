#![deny(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! Every producer in the AFD core (AMG, FD, transfer workers) emits one
//! ASCII line per event into one of seven log categories: system, transfer,
//! transfer-debug, receive, input, output, delete. This crate owns the
//! shape of those lines and the file-rotation, flush-batching, and
//! duplicate-coalescing policy a writer applies to them. It does not own
//! the pipe producers use to reach a writer process; that transport detail
//! is left to the binaries that wire a [`category::LogCategory`] to an
//! actual file descriptor.
//!
//! # Design
//!
//! [`record::LogLine`] builds the fixed hex-timestamp-prefixed,
//! `SEPARATOR`-delimited line shared by every category.
//! [`rotation::RotatingLog`] owns one category's numbered file set and
//! performs the `file.0 -> file.1 -> ... -> file.N-1` shift at each
//! `SWITCH_FILE_TIME` boundary. [`dedup::DuplicateCoalescer`] sits in front
//! of a writer for the transfer and receive categories, suppressing runs of
//! byte-identical records. [`history::LogHistoryRing`] tracks, per
//! one-hour bucket, the highest severity seen by the receive-log writer;
//! callers own the 48-byte shared-memory slice this ring reads and writes.
//!
//! # Invariants
//!
//! - Every emitted line's first 10 bytes are a lowercase hex Unix
//!   timestamp; [`record::LogLine::timestamp_prefix`] is the only place
//!   that formats it, so every category stays searchable by the same
//!   binary-search routine.
//! - A writer never blocks a producer: [`error::LoggingError`] models
//!   writer-side failure as something to log and move past, not propagate
//!   to the caller that generated the event.

pub mod category;
pub mod dedup;
pub mod error;
pub mod history;
pub mod record;
pub mod rotation;
pub mod severity;

pub use category::LogCategory;
pub use dedup::DuplicateCoalescer;
pub use error::LoggingError;
pub use history::LogHistoryRing;
pub use record::LogLine;
pub use rotation::RotatingLog;
pub use severity::Severity;

/// Default `SWITCH_FILE_TIME`: one day, in seconds.
pub const DEFAULT_SWITCH_FILE_TIME: u64 = 86_400;

/// Field separator used between category-specific columns, after the
/// leading hex timestamp and its single space.
pub const SEPARATOR: char = '|';
