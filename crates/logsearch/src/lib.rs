#![deny(clippy::undocumented_unsafe_blocks)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! An operator searching or replaying AFD history does not want to grep
//! through gigabytes of rotated log files one byte at a time. This crate
//! answers a `[start, end]` time-window query, with optional name, size,
//! recipient, and directory filters, against one of the seven
//! [`logging::LogCategory`] rotation sets, by memory-mapping only the
//! files the window can possibly intersect and binary-searching into each
//! for the first candidate record.
//!
//! # Design
//!
//! [`window::select_files`] narrows a query to the rotated file numbers
//! whose mtime brackets the window, the same `SWITCH_FILE_TIME`-driven
//! rotation boundary [`logging::RotatingLog`] itself rotates on.
//! [`index::LineIndex`] builds a flat offset table over a mapped file's
//! lines; [`timeline::search_time`] binary-searches that table for the
//! first record at or after the window start, relying on a rotated file's
//! timestamps being non-decreasing. [`record::ParsedRecord`] splits a
//! line back into its fields; [`predicate::Predicates`] combines the
//! optional name/size/recipient/directory filters into one short-circuit
//! evaluation. [`engine::search`] ties these together: select files, map
//! each in turn, probe to the window start, walk forward applying
//! predicates, and emit matches in bounded batches so a caller streaming
//! to a terminal or pipe never buffers an entire window's worth of
//! matches at once.
//!
//! # Invariants
//!
//! - A search only ever opens files read-only; replay (re-emitting
//!   historical transfer records to recreate host state) is a read of
//!   the same log stream, not a separate write path.
//! - [`engine::search`] checks its cancellation flag at file boundaries
//!   and every [`engine`]-internal interval of records, so an operator
//!   can abort a search over an unexpectedly large window.

pub mod engine;
pub mod error;
pub mod glob;
pub mod index;
pub mod predicate;
pub mod record;
pub mod timeline;
pub mod window;

pub use engine::{search, MatchBatch, DEFAULT_BATCH_SIZE};
pub use error::LogSearchError;
pub use predicate::{Predicates, SizeComparison, SizeFilter};
pub use record::ParsedRecord;
pub use window::TimeWindow;
