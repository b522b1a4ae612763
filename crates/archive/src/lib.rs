#![deny(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! When a transfer worker finishes sending a file and the job's
//! `archive_time` is non-zero, the file is moved into an archive
//! directory instead of being unlinked. This crate owns that directory's
//! naming, on-demand creation, and the background sweep that deletes
//! archive directories whose retention window has elapsed.
//!
//! # Design
//!
//! [`path::archive_dir`] builds the `<root>/<host>/<scheme>/<bucket>/<job_id>`
//! layout; [`path::epoch_bucket`] floors a timestamp to the `archive_time`
//! window it falls in, the same bucketing [`manager::ArchiveManager`]
//! uses to decide whether a fresh directory is needed for a job it hasn't
//! seen yet. [`manager::ArchiveManager::archive`] is the exact shape a
//! transfer worker calls: given a pool directory, a file name, and a job
//! descriptor, move the file in and return its archived path, caching the
//! directory for the job's remaining files. [`cleaner::sweep`] walks an
//! archive root and removes any bucket directory old enough to fall
//! outside its retention window.
//!
//! # Invariants
//!
//! - A job's archive directory is created at most once; every later file
//!   in the same job reuses the cached path rather than re-resolving it.
//! - The cleaner never removes a directory whose bucket is still within
//!   the retention window, even if sweeping runs more often than the
//!   window rotates.

pub mod cleaner;
pub mod error;
pub mod manager;
pub mod path;

pub use cleaner::sweep;
pub use error::ArchiveError;
pub use manager::ArchiveManager;
pub use path::{archive_dir, epoch_bucket, scheme_segment};
