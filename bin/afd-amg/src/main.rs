#![deny(unsafe_code)]

//! Directory scanner process: periodically scans configured directories,
//! admits or ages out candidate files, and emits one Job Descriptor per
//! recipient batch as a JSON line on stdout for the dispatcher process to
//! pick up.

mod config;

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime};

use amg::DirectoryScanner;
use clap::Parser;
use config::AmgConfig;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "afd-amg", about = "AFD directory scanner")]
struct Cli {
    /// Path to the scanner's TOML configuration.
    #[arg(long)]
    config: PathBuf,
    /// Run a single scan pass over every directory and exit, instead of
    /// looping on `scan_interval_secs`.
    #[arg(long)]
    once: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt::init();
    let mut stdout = std::io::stdout().lock();
    run_with(std::env::args_os(), &mut stdout)
}

fn run_with<I>(args: I, stdout: &mut impl Write) -> ExitCode
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

    let config = match AmgConfig::load(&cli.config) {
        Ok(config) => config,
        Err(err) => {
            warn!(%err, "could not load configuration");
            return ExitCode::FAILURE;
        }
    };

    let scanner = DirectoryScanner::new();
    let directories: Vec<_> = config.directories.into_iter().map(config::DirectoryConfig::into_directory).collect();
    let job_ids = AtomicU64::new(1);
    let interval = Duration::from_secs(config.scan_interval_secs);

    loop {
        for directory in &directories {
            let outcome = match scanner.scan_once(directory, SystemTime::now(), &config.pool_root, |_alias| true, || job_ids.fetch_add(1, Ordering::Relaxed)) {
                Ok(outcome) => outcome,
                Err(err) => {
                    warn!(%err, directory_id = directory.id, "scan failed");
                    continue;
                }
            };
            info!(directory_id = directory.id, jobs = outcome.jobs.len(), deletions = outcome.deletions.len(), "scan complete");
            for job in &outcome.jobs {
                if let Ok(line) = serde_json::to_string(job) {
                    let _ = writeln!(stdout, "{line}");
                }
            }
        }
        if cli.once {
            return ExitCode::SUCCESS;
        }
        std::thread::sleep(interval);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a_missing_config_file_fails_cleanly() {
        let mut stdout = Vec::new();
        let exit = run_with(["afd-amg", "--config", "/nonexistent/afd-amg.toml", "--once"], &mut stdout);
        assert_eq!(exit, ExitCode::FAILURE);
    }

    #[test]
    fn a_single_pass_over_one_directory_emits_one_job_line() {
        let pool_root = tempfile::tempdir().unwrap();
        let source = tempfile::tempdir().unwrap();
        std::fs::write(source.path().join("a.txt"), b"hello").unwrap();

        let pool_dir = pool_root.path().join("pool");
        let config_path = pool_root.path().join("afd-amg.toml");
        let contents = format!(
            "pool_root = {pool_dir:?}\n\n[[directories]]\nid = 1\npath = {source_dir:?}\n\n[[directories.recipients]]\nhost_alias = \"h1\"\ntarget_path = \"/incoming\"\n",
            pool_dir = pool_dir.to_str().unwrap(),
            source_dir = source.path().to_str().unwrap(),
        );
        std::fs::write(&config_path, contents).unwrap();

        let mut stdout = Vec::new();
        let exit = run_with(["afd-amg", "--config", config_path.to_str().unwrap(), "--once"], &mut stdout);
        assert_eq!(exit, ExitCode::SUCCESS);
        let output = String::from_utf8(stdout).unwrap();
        assert!(output.contains("\"host_alias\":\"h1\""));
    }
}
