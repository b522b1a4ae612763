#![deny(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! The directory scanner (AMG) turns filesystem state into Job Descriptors.
//! Each configured directory is scanned on a fixed period: entries are
//! classified, aged-out entries are deleted and logged, the remaining
//! candidates are batched by count and size, atomically moved into a fresh
//! pool directory, and published as one [`afd_core::JobDescriptor`].
//!
//! # Design
//!
//! [`classify::classify_entry`] and [`age::classify_for_deletion`] are pure
//! functions over already-stat'd entries, kept separate from
//! [`scan::DirectoryScanner`] so the admission policy can be unit tested
//! without touching a filesystem. [`pool_dir::PoolDirName`] owns the
//! `<host>_<hex_time>_<hex_split>_<hex_unique>` naming scheme; the unique
//! component comes from a process-wide monotonic counter, the split
//! component from how many batches one scan produced for a directory.
//!
//! # Invariants
//!
//! - A file is never left in two places at once: [`scan::DirectoryScanner`]
//!   renames into the pool directory one file at a time and treats a
//!   failed rename as skipping only that file, never the batch.
//! - `now` is sampled once per directory scan so every age comparison
//!   within that scan is internally consistent.

pub mod admission;
pub mod age;
pub mod classify;
pub mod error;
pub mod pool_dir;
pub mod scan;

pub use admission::select_batch;
pub use classify::{classify_entry, EntryClass};
pub use error::AmgError;
pub use pool_dir::PoolDirName;
pub use scan::{DirectoryScanner, ScanOutcome};
