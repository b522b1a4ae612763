//! Archive directory layout: `<root>/<host>/<scheme>/<epoch_bucket>/<job_id>`.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use afd_core::job::Scheme;

/// Filesystem-safe path segment for a wire scheme, mirroring the naming
/// [`afd_core::job::Scheme`] itself uses in its variant doc comments.
#[must_use]
pub const fn scheme_segment(scheme: Scheme) -> &'static str {
    match scheme {
        Scheme::Ftp => "ftp",
        Scheme::FtpsControl => "ftps_control",
        Scheme::FtpsBoth => "ftps_both",
        Scheme::Scp => "scp",
    }
}

/// The time bucket a file archived at `archived_at` with `archive_time`
/// retention falls into: the Unix-second start of the `archive_time`-wide
/// window containing `archived_at`. A `0` `archive_time` never reaches
/// this function; the worker deletes rather than archives in that case.
#[must_use]
pub fn epoch_bucket(archived_at: SystemTime, archive_time: u64) -> u64 {
    let secs = archived_at.duration_since(UNIX_EPOCH).unwrap_or(Duration::ZERO).as_secs();
    if archive_time == 0 {
        return secs;
    }
    (secs / archive_time) * archive_time
}

/// Builds the archive directory path for one job, not yet created on disk.
#[must_use]
pub fn archive_dir(root: &Path, host_alias: &str, scheme: Scheme, bucket: u64, job_id: u64) -> PathBuf {
    root.join(host_alias).join(scheme_segment(scheme)).join(bucket.to_string()).join(job_id.to_string())
}

/// Parses the `(bucket, job_id)` suffix of an archive directory previously
/// built by [`archive_dir`], used by the cleaner task to decide staleness
/// without needing the host/scheme components.
#[must_use]
pub fn parse_bucket_and_job(dir: &Path) -> Option<(u64, u64)> {
    let job_id: u64 = dir.file_name()?.to_str()?.parse().ok()?;
    let bucket: u64 = dir.parent()?.file_name()?.to_str()?.parse().ok()?;
    Some((bucket, job_id))
}
