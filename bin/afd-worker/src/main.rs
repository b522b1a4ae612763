#![deny(unsafe_code)]

//! Transfer worker process: reads one assignment (a host alias paired with a
//! Job Descriptor, the same shape `afd-fd` emits) from stdin, runs it to
//! completion against a transport, and writes one JSON outcome line to
//! stdout.
//!
//! The real system spawns a worker per in-flight transfer and hands it a
//! slot-count guard shared with the dispatcher and the other workers on the
//! same host, so only one of them creates or removes a [`LockPolicy::LockFile`]
//! lock file. A single CLI invocation has no such guard to share, so this
//! process assumes it is the only worker on the host for the lifetime of the
//! job: `is_first_on_host` is always `true` and `is_last_on_host` always
//! returns `true`.
//!
//! `RemoteTransport` has no real FTP/FTPS/SCP implementation in this crate
//! (that wire work is out of scope), so the only transport available to wire
//! up here is [`transport::mock::MockTransport`], standing in for a live
//! connection.

mod config;

use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::SystemTime;

use afd_core::JobDescriptor;
use archive::ArchiveManager;
use clap::Parser;
use config::WorkerConfig;
use serde::Serialize;
use tracing::warn;
use worker::TransferWorker;

#[derive(Parser, Debug)]
#[command(name = "afd-worker", about = "AFD transfer worker")]
struct Cli {
    /// Path to the worker's TOML configuration (one host).
    #[arg(long)]
    config: PathBuf,
}

#[derive(serde::Deserialize)]
struct Assignment {
    #[allow(dead_code)]
    host_alias: String,
    job: JobDescriptor,
}

#[derive(Serialize)]
struct Outcome {
    job_id: u64,
    result: &'static str,
    detail: Option<String>,
    files_sent: usize,
    jobs_completed: u32,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt::init();
    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout().lock();
    run_with(std::env::args_os(), stdin.lock(), &mut stdout)
}

fn run_with<I>(args: I, mut input: impl BufRead, stdout: &mut impl Write) -> ExitCode
where
    I: IntoIterator,
    I::Item: Into<std::ffi::OsString> + Clone,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
            return ExitCode::from(err.exit_code() as u8);
        }
    };

    let config = match WorkerConfig::load(&cli.config) {
        Ok(config) => config,
        Err(err) => {
            warn!(%err, "could not load configuration");
            return ExitCode::FAILURE;
        }
    };

    let mut line = String::new();
    if input.read_line(&mut line).unwrap_or(0) == 0 {
        warn!("no assignment line on stdin");
        return ExitCode::FAILURE;
    }
    let assignment: Assignment = match serde_json::from_str(line.trim_end()) {
        Ok(assignment) => assignment,
        Err(err) => {
            warn!(%err, "could not parse assignment line");
            return ExitCode::FAILURE;
        }
    };

    let host = config.to_host();
    let mut archive_manager = config.archive_root.as_ref().map(ArchiveManager::new);
    let job_id = assignment.job.job_id;

    let mut worker = TransferWorker::new(transport::mock::MockTransport::new());
    let (outcome, report) = worker.run(
        &host,
        &config.password,
        assignment.job,
        &config.append_dir,
        &config.lock_suffix,
        true,
        || true,
        || None,
        |pool_dir, file_name, job| archive_for(archive_manager.as_mut(), pool_dir, file_name, job),
        SystemTime::now,
    );

    let (result, detail) = describe(&outcome);
    let summary = Outcome {
        job_id,
        result,
        detail,
        files_sent: report.files.len(),
        jobs_completed: report.jobs_completed,
    };
    if let Ok(line) = serde_json::to_string(&summary) {
        let _ = writeln!(stdout, "{line}");
    }

    if matches!(outcome, afd_core::WorkerOutcome::Success | afd_core::WorkerOutcome::StillFilesToSend) {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn archive_for(manager: Option<&mut ArchiveManager>, pool_dir: &Path, file_name: &str, job: &JobDescriptor) -> std::io::Result<PathBuf> {
    match manager {
        Some(manager) => manager.archive(pool_dir, file_name, job, SystemTime::now()),
        None => Err(std::io::Error::other("no archive_root configured for this worker")),
    }
}

fn describe(outcome: &afd_core::WorkerOutcome) -> (&'static str, Option<String>) {
    use afd_core::WorkerOutcome::{FatalFailure, StillFilesToSend, Success, TransientFailure};
    match outcome {
        Success => ("success", None),
        StillFilesToSend => ("still_files_to_send", None),
        TransientFailure(kind) => ("transient_failure", Some(kind.to_string())),
        FatalFailure(kind) => ("fatal_failure", Some(kind.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn config_path(dir: &std::path::Path, append_dir: &std::path::Path) -> PathBuf {
        let path = dir.join("afd-worker.toml");
        std::fs::write(
            &path,
            format!(
                r#"
                alias = "h1"
                hostname = "h1.example.test"
                user = "afd"
                password = "secret"
                append_dir = {append_dir:?}
                "#
            ),
        )
        .unwrap();
        path
    }

    #[test]
    fn a_missing_config_file_fails_cleanly() {
        let mut stdout = Vec::new();
        let exit = run_with(["afd-worker", "--config", "/nonexistent/afd-worker.toml"], Cursor::new(""), &mut stdout);
        assert_eq!(exit, ExitCode::FAILURE);
    }

    #[test]
    fn a_missing_assignment_line_fails_cleanly() {
        let dir = tempfile::tempdir().unwrap();
        let append_dir = tempfile::tempdir().unwrap();
        let config = config_path(dir.path(), append_dir.path());
        let mut stdout = Vec::new();
        let exit = run_with(["afd-worker", "--config", config.to_str().unwrap()], Cursor::new(""), &mut stdout);
        assert_eq!(exit, ExitCode::FAILURE);
    }

    #[test]
    fn a_well_formed_assignment_runs_the_job_to_completion() {
        let dir = tempfile::tempdir().unwrap();
        let append_dir = tempfile::tempdir().unwrap();
        let pool_dir = tempfile::tempdir().unwrap();
        std::fs::write(pool_dir.path().join("a.txt"), b"hello").unwrap();
        let config = config_path(dir.path(), append_dir.path());

        let job = afd_core::JobDescriptor {
            job_id: 1,
            directory_id: 1,
            host_alias: "h1".into(),
            scheme: afd_core::job::Scheme::Ftp,
            target_path: "in".into(),
            created_at: std::time::SystemTime::UNIX_EPOCH,
            split_job_counter: 0,
            unique_number: 1,
            lock_policy: afd_core::job::LockPolicy::Dot,
            transfer_mode: afd_core::job::TransferMode::Image,
            chmod: None,
            trans_rename: None,
            archive_time: 0,
            header_injection: false,
            files: vec![afd_core::job::FileEntry { name: "a.txt".into(), size: 5, mtime: std::time::SystemTime::UNIX_EPOCH }],
            restart_names: vec![],
            pool_dir: pool_dir.path().to_path_buf(),
            attempt: 0,
            toggle_host: false,
        };
        let line = serde_json::to_string(&serde_json::json!({ "host_alias": "h1", "job": job })).unwrap();

        let mut stdout = Vec::new();
        let exit = run_with(["afd-worker", "--config", config.to_str().unwrap()], Cursor::new(line), &mut stdout);
        assert_eq!(exit, ExitCode::SUCCESS);
        let output = String::from_utf8(stdout).unwrap();
        assert!(output.contains("\"result\":\"success\""));
        assert!(!pool_dir.path().join("a.txt").exists());
    }
}
