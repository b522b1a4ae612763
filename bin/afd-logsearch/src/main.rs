#![deny(unsafe_code)]

//! Log search CLI: selects the rotated files of one category a time window
//! can intersect, filters by the optional predicates, and writes matching
//! lines to stdout.

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use clap::Parser;
use logging::LogCategory;
use logsearch::{Predicates, SizeComparison, SizeFilter, TimeWindow};

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
enum CategoryArg {
    System,
    Transfer,
    TransferDebug,
    Receive,
    Input,
    Output,
    Delete,
}

impl From<CategoryArg> for LogCategory {
    fn from(value: CategoryArg) -> Self {
        match value {
            CategoryArg::System => Self::System,
            CategoryArg::Transfer => Self::Transfer,
            CategoryArg::TransferDebug => Self::TransferDebug,
            CategoryArg::Receive => Self::Receive,
            CategoryArg::Input => Self::Input,
            CategoryArg::Output => Self::Output,
            CategoryArg::Delete => Self::Delete,
        }
    }
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
enum SizeComparisonArg {
    Exactly,
    AtLeast,
    AtMost,
}

impl From<SizeComparisonArg> for SizeComparison {
    fn from(value: SizeComparisonArg) -> Self {
        match value {
            SizeComparisonArg::Exactly => Self::Exactly,
            SizeComparisonArg::AtLeast => Self::AtLeast,
            SizeComparisonArg::AtMost => Self::AtMost,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "afd-logsearch", about = "Search AFD's rotated log files by time window")]
struct Cli {
    /// Directory the rotated log files live in.
    #[arg(long)]
    log_dir: PathBuf,
    /// Which of the seven log categories to search.
    #[arg(long, value_enum)]
    category: CategoryArg,
    /// Highest numbered rotated file to consider, exclusive.
    #[arg(long, default_value_t = 14)]
    max_files: u32,
    /// How long a rotated file stays open before the writer switches files.
    #[arg(long, default_value_t = 86400)]
    switch_file_time_secs: u64,
    /// Start of the inclusive search window, Unix seconds.
    #[arg(long)]
    start: u64,
    /// End of the inclusive search window, Unix seconds.
    #[arg(long)]
    end: u64,
    /// Only records whose file name matches this `*`/`?` glob.
    #[arg(long)]
    name_glob: Option<String>,
    /// How `--size` compares against a record's byte count.
    #[arg(long, value_enum, requires = "size")]
    size_comparison: Option<SizeComparisonArg>,
    /// Byte count to compare a record's size against.
    #[arg(long)]
    size: Option<u64>,
    /// Only records addressed to this recipient.
    #[arg(long)]
    recipient: Option<String>,
    /// Only records in this source directory.
    #[arg(long)]
    directory: Option<String>,
    /// Maximum number of matched lines emitted per batch.
    #[arg(long, default_value_t = logsearch::DEFAULT_BATCH_SIZE)]
    batch_size: usize,
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

    let predicates = Predicates {
        name_glob: cli.name_glob,
        size: cli.size.map(|bytes| SizeFilter { comparison: cli.size_comparison.map_or(SizeComparison::Exactly, Into::into), bytes }),
        recipient: cli.recipient,
        directory: cli.directory,
    };
    let window = TimeWindow { start: cli.start, end: cli.end };
    let cancel = AtomicBool::new(false);

    let result = logsearch::search(
        &cli.log_dir,
        cli.category.into(),
        cli.max_files,
        Duration::from_secs(cli.switch_file_time_secs),
        window,
        &predicates,
        &cancel,
        cli.batch_size,
        |batch| {
            for line in &batch.lines {
                let _ = writeln!(stdout, "{line}");
            }
        },
    );

    match result {
        Ok(_count) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::warn!(%err, "log search failed");
            ExitCode::FAILURE
        }
    }
}
