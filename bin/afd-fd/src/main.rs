#![deny(unsafe_code)]

//! Job dispatcher process: reads Job Descriptors (one JSON object per
//! line) from stdin, assigns them to idle host slots, and writes one JSON
//! assignment per line to stdout for a process supervisor to spawn an
//! `afd-worker` against.

mod config;

use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use afd_core::JobDescriptor;
use clap::Parser;
use config::FdConfig;
use fd::Dispatcher;
use tracing::warn;

#[derive(Parser, Debug)]
#[command(name = "afd-fd", about = "AFD job dispatcher")]
struct Cli {
    /// Path to the dispatcher's TOML configuration.
    #[arg(long)]
    config: PathBuf,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt::init();
    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout().lock();
    run_with(std::env::args_os(), stdin.lock(), &mut stdout)
}

fn run_with<I>(args: I, input: impl BufRead, stdout: &mut impl Write) -> ExitCode
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

    let config = match FdConfig::load(&cli.config) {
        Ok(config) => config,
        Err(err) => {
            warn!(%err, "could not load configuration");
            return ExitCode::FAILURE;
        }
    };

    let hosts: Vec<_> = config.hosts.into_iter().map(config::HostConfig::into_host).collect();
    let mut dispatcher = Dispatcher::new(hosts);

    for line in input.lines() {
        let Ok(line) = line else { break };
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<JobDescriptor>(&line) {
            Ok(job) => dispatcher.submit(job),
            Err(err) => warn!(%err, "could not parse job descriptor line"),
        }
    }

    let ready = dispatcher.tick(Instant::now(), |_job_id: u64| -> Option<String> { None }, |job, name| {
        warn!(job_id = job.job_id, file = name, "file withheld by duplicate-file guard");
    });

    for assignment in &ready {
        if let Ok(line) = serde_json::to_string(&Assignment::from(assignment)) {
            let _ = writeln!(stdout, "{line}");
        }
    }

    ExitCode::SUCCESS
}

#[derive(serde::Serialize)]
struct Assignment {
    host_alias: String,
    slot: usize,
    job: JobDescriptor,
}

impl From<&fd::ReadyJob> for Assignment {
    fn from(ready: &fd::ReadyJob) -> Self {
        Self { host_alias: ready.host_alias.clone(), slot: ready.slot, job: ready.job.clone() }
    }
}
