#![deny(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! The Transfer Worker (C5) is the per-job state machine that owns one
//! connection to one host: connect and login (directly or through a proxy
//! script), optional mode negotiation and `CWD`, per-file upload with
//! optional append/resume and header injection, atomic rename with
//! trans-rename and busy-retry, archive-or-delete dispatch, and burst
//! chaining back through [`fd::check_burst`].
//!
//! # Design
//!
//! [`worker::TransferWorker::run`] is generic over [`transport::RemoteTransport`]
//! so the state machine itself never depends on a concrete wire codec; the
//! caller supplies closures for archiving, burst continuation, and the
//! clock, keeping every side effect explicit and injectable for tests.

pub mod append;
pub mod error;
pub mod header;
pub mod lock_name;
pub mod proxy;
pub mod trans_rename;
pub mod worker;

pub use error::WorkerError;
pub use worker::{
    FileDisposition, FileTransferReport, RunReport, TransferWorker, KEEP_ALIVE_INTERVAL, MAX_SEND_BEFORE_APPEND,
};
