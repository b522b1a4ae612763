#![deny(rustdoc::broken_intra_doc_links)]
#![deny(clippy::undocumented_unsafe_blocks)]

//! # Overview
//!
//! The Shared Status Area (FSA) is a single memory-mapped file holding a
//! packed array of per-host records. Every AFD process — AMG, FD, transfer
//! workers, and the log tools — maps the same file and mutates it under
//! advisory byte-range locks instead of talking to each other directly for
//! status. This crate is the only place that understands the on-disk layout.
//!
//! # Design
//!
//! [`area::SharedStatusArea::attach`] maps the file and validates its header.
//! [`area::SharedStatusArea::lookup_host`] resolves a stable alias to the
//! current record index; that index is invalidated by [`area::SharedStatusArea::check_stale`]
//! whenever the array is grown, at which point callers must re-resolve it.
//! [`lock::Region`] names the four well-known lock scopes from the
//! specification (`LOCK_CON`, `LOCK_EC`, `LOCK_HS`, `LOCK_FIU`); acquiring one
//! returns a RAII guard that releases the advisory lock on drop even if the
//! holder panics.
//!
//! # Invariants
//!
//! - The header's `generation` counter only ever increases; a mapping whose
//!   cached generation differs from the file's current generation is stale.
//! - `total_file_counter == 0` implies `total_file_size == 0` for every host
//!   record; [`area::SharedStatusArea::self_heal`] restores this after a crash.
//! - Byte-range locks are always released through a guard's `Drop`, even on an
//!   early return or panic, so a crashed mutator cannot wedge a region forever
//!   once its file descriptor is closed by the OS.

pub mod area;
pub mod error;
pub mod header;
pub mod lock;
pub mod record;

pub use area::SharedStatusArea;
pub use error::FsaError;
pub use lock::{LockGuard, Region};
pub use record::HostRecord;
