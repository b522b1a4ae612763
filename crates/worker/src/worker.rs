//! The transfer worker state machine (specification §4.5): connect, login,
//! optional mode negotiation and `CWD`, per-file upload with optional
//! append/resume and header injection, atomic rename, archive-or-delete,
//! and burst chaining back through [`fd::check_burst`].

use std::fs;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use afd_core::host::{FileSizeOffset, HostOptions};
use afd_core::outcome::{FatalKind, TransientKind};
use afd_core::{FileEntry, Host, JobDescriptor, LockPolicy, TransferMode, WorkerOutcome};
use bandwidth::BandwidthLimiter;
use fd::{check_burst, BurstDecision};
use tracing::{debug, info, warn};
use transport::{ConnectMode, RemoteTransport, TransferDirection, TransferTypeCode, TransportError, WriteMode};

use crate::append::AppendList;
use crate::{header, lock_name, proxy, trans_rename};

/// How large a read-then-write chunk may grow before it is flushed,
/// independent of the host's configured block size, to bound worst-case
/// buffering.
const MAX_BLOCK_SIZE: usize = 1 << 20;

/// Minimum bytes sent before an interrupted upload is worth persisting to
/// the append list; smaller transfers are simply restarted from zero.
pub const MAX_SEND_BEFORE_APPEND: u64 = 64 * 1024;

/// How often a keep-alive no-op is sent on the control channel during a
/// long upload, when the host option enables it.
pub const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(60);

/// What became of one file after a successful close.
#[derive(Clone, Debug)]
pub enum FileDisposition {
    Archived(PathBuf),
    Deleted,
}

/// Per-file outcome reported back for logging (output-log / receive-log).
#[derive(Clone, Debug)]
pub struct FileTransferReport {
    pub file_name: String,
    pub bytes_sent: u64,
    pub append_offset: u64,
    pub size_mismatch: Option<(u64, u64)>,
    pub disposition: FileDisposition,
}

/// Everything [`TransferWorker::run`] produced: the terminal outcome plus a
/// report per file that reached at least `close_data`.
#[derive(Debug, Default)]
pub struct RunReport {
    pub files: Vec<FileTransferReport>,
    pub jobs_completed: u32,
}

fn resolve_type_code(mode: TransferMode, ignore_bin: bool) -> TransferTypeCode {
    match mode {
        TransferMode::Image => TransferTypeCode::Image,
        TransferMode::Ascii => TransferTypeCode::Ascii,
        TransferMode::Dos => {
            if ignore_bin {
                TransferTypeCode::Image
            } else {
                TransferTypeCode::Ascii
            }
        }
    }
}

fn write_mode(mode: TransferMode, ignore_bin: bool) -> WriteMode {
    match resolve_type_code(mode, ignore_bin) {
        TransferTypeCode::Ascii => WriteMode::ascii(),
        TransferTypeCode::Image | TransferTypeCode::NoOp => WriteMode::binary(),
    }
}

/// Whether a server's `OpenRemote` reply text indicates the target is busy
/// with another writer, the signal that triggers the `rename_file_busy`
/// retry rather than a plain transient failure.
fn is_busy_reply(message: &str) -> bool {
    let lower = message.to_ascii_lowercase();
    lower.contains("busy") || lower.contains("cannot stor")
}

/// Parses the whitespace-delimited token starting at byte `column` of the
/// `LIST` line naming `file_name`, per a host's configured
/// [`afd_core::host::FileSizeOffset::Column`].
fn parse_list_size(lines: &[String], file_name: &str, column: u16) -> Option<u64> {
    lines.iter().find(|line| line.ends_with(file_name)).and_then(|line| {
        let start = column as usize;
        let tail = line.get(start..)?;
        let token: String = tail.chars().take_while(|c| !c.is_whitespace()).collect();
        token.parse().ok()
    })
}

/// A transfer worker bound to one live [`RemoteTransport`] connection.
pub struct TransferWorker<T: RemoteTransport> {
    transport: T,
    burst_counter: u32,
}

impl<T: RemoteTransport> TransferWorker<T> {
    #[must_use]
    pub fn new(transport: T) -> Self {
        Self { transport, burst_counter: 0 }
    }

    /// Runs `job` to completion, chaining further jobs for the same host via
    /// `next_job_for_host` per the burst coordinator's decision, until
    /// [`BurstDecision::Disconnect`] or [`BurstDecision::Neither`].
    ///
    /// `is_first_on_host` and `is_last_on_host` resolve the
    /// [`LockPolicy::LockFile`] lifecycle: the caller holds the host-scoped
    /// slot-count guard, so only it can say whether this worker is the one
    /// that should create the lock file on connect, or DELE it on quit.
    ///
    /// `clock` supplies the current time for mtime preservation and
    /// archive-bucket computation, so tests stay deterministic.
    #[allow(clippy::too_many_arguments)]
    pub fn run(
        &mut self,
        host: &Host,
        password: &str,
        mut job: JobDescriptor,
        append_dir: &Path,
        lock_suffix: &str,
        is_first_on_host: bool,
        is_last_on_host: impl FnOnce() -> bool,
        mut next_job_for_host: impl FnMut() -> Option<JobDescriptor>,
        mut archive: impl FnMut(&Path, &str, &JobDescriptor) -> std::io::Result<PathBuf>,
        clock: impl Fn() -> SystemTime,
    ) -> (WorkerOutcome, RunReport) {
        let mut report = RunReport::default();

        if let Err(kind) = self.connect_and_login(host, password) {
            return (WorkerOutcome::TransientFailure(kind), report);
        }

        if is_first_on_host && job.lock_policy == LockPolicy::LockFile {
            if let Some(kind) = self.create_lock_file(host, &job) {
                return (WorkerOutcome::TransientFailure(kind), report);
            }
        }

        loop {
            match self.run_one_job(host, &job, append_dir, lock_suffix, &mut archive, &clock) {
                Ok(files) => report.files.extend(files),
                Err(WorkerOutcome::Success | WorkerOutcome::StillFilesToSend) => unreachable!("run_one_job never returns a terminal outcome as an error"),
                Err(outcome) => return (outcome, report),
            }
            report.jobs_completed += 1;

            let decision = check_burst(host, self.burst_counter, &job, next_job_for_host());
            match decision {
                BurstDecision::Continue(next) => {
                    self.burst_counter += 1;
                    job = *next;
                }
                BurstDecision::Disconnect | BurstDecision::Neither => {
                    if job.lock_policy == LockPolicy::LockFile && is_last_on_host() {
                        if let Some(name) = &host.lock_file_name {
                            let path = format!("{}/{name}", job.target_path);
                            let _ = self.transport.dele(&path);
                        }
                    }
                    let _ = self.transport.quit();
                    return (WorkerOutcome::Success, report);
                }
            }
        }
    }

    /// Creates the zero-byte lock file for [`LockPolicy::LockFile`] via a
    /// dedicated data-channel `STOR`.
    fn create_lock_file(&mut self, host: &Host, job: &JobDescriptor) -> Option<TransientKind> {
        let Some(name) = host.lock_file_name.as_deref() else {
            return None;
        };
        let path = format!("{}/{name}", job.target_path);
        if let Err(err) = self.transport.open_data(&path, 0, TransferDirection::Write) {
            return Some(err.transient_kind().unwrap_or(TransientKind::OpenRemoteError));
        }
        match self.transport.close_data() {
            Ok(()) | Err(TransportError::ZeroLengthFile) => None,
            Err(err) => Some(err.transient_kind().unwrap_or(TransientKind::CloseRemoteError)),
        }
    }

    fn connect_and_login(&mut self, host: &Host, password: &str) -> Result<(), TransientKind> {
        let mode = if host.options.contains(HostOptions::PASSIVE_MODE) {
            ConnectMode::Passive
        } else {
            ConnectMode::Active
        };
        self.transport
            .connect(host.active_hostname(), host.port, mode)
            .map_err(|err| err.transient_kind().unwrap_or(TransientKind::ConnectError))?;

        match host.proxy_script.as_deref() {
            Some(script) => {
                for hop in proxy::parse(script) {
                    self.transport
                        .login(&hop.user, &hop.password)
                        .map_err(|err| err.transient_kind().unwrap_or(TransientKind::AuthError))?;
                }
            }
            None => {
                self.transport
                    .login(&host.user, password)
                    .map_err(|err| err.transient_kind().unwrap_or(TransientKind::AuthError))?;
            }
        }
        Ok(())
    }

    fn run_one_job(
        &mut self,
        host: &Host,
        job: &JobDescriptor,
        append_dir: &Path,
        lock_suffix: &str,
        archive: &mut impl FnMut(&Path, &str, &JobDescriptor) -> std::io::Result<PathBuf>,
        clock: &impl Fn() -> SystemTime,
    ) -> Result<Vec<FileTransferReport>, WorkerOutcome> {
        if !job.pool_dir.exists() {
            return Err(WorkerOutcome::FatalFailure(FatalKind::PoolDirMissing));
        }

        let create_target = host.options.contains(HostOptions::CREATE_TARGET_DIR);
        self.transport
            .cd(&job.target_path, create_target)
            .map_err(|err| WorkerOutcome::TransientFailure(err.transient_kind().unwrap_or(TransientKind::ChdirError)))?;

        let type_code = resolve_type_code(job.transfer_mode, host.options.contains(HostOptions::FTP_IGNORE_BIN));
        self.transport
            .set_type(type_code)
            .map_err(|err| WorkerOutcome::TransientFailure(err.transient_kind().unwrap_or(TransientKind::TypeError)))?;

        let append_list_path = append_dir.join(format!("{}.append", job.job_id));
        let mut append_list = AppendList::load(&append_list_path).unwrap_or_default();

        let mut reports = Vec::with_capacity(job.files.len());
        for file in &job.files {
            let report = self.send_one_file(host, job, file, lock_suffix, &mut append_list, archive, clock)?;
            reports.push(report);
        }

        if append_list.is_empty() {
            let _ = fs::remove_file(&append_list_path);
        } else {
            let _ = append_list.save(&append_list_path);
        }

        Ok(reports)
    }

    #[allow(clippy::too_many_lines)]
    fn send_one_file(
        &mut self,
        host: &Host,
        job: &JobDescriptor,
        file: &FileEntry,
        lock_suffix: &str,
        append_list: &mut AppendList,
        archive: &mut impl FnMut(&Path, &str, &JobDescriptor) -> std::io::Result<PathBuf>,
        clock: &impl Fn() -> SystemTime,
    ) -> Result<FileTransferReport, WorkerOutcome> {
        if job.lock_policy == LockPolicy::Sequence {
            if let Some(previous) = lock_name::previous_sequence_name(&file.name, job.attempt) {
                let previous_path = format!("{}/{previous}", job.target_path);
                let _ = self.transport.dele(&previous_path);
            }
        }

        let mut local_path = job.pool_dir.join(&file.name);
        let mut in_flight_name = lock_name::in_flight_name(&file.name, job.lock_policy, job.unique_number, job.attempt, lock_suffix);
        let mut remote_in_flight_path = format!("{}/{}", job.target_path, in_flight_name);

        let resume_offset = if job.restart_names.iter().any(|n| n == &file.name) {
            let remote_size = self.remote_size(host, &remote_in_flight_path)?;
            if remote_size < file.size { remote_size } else { 0 }
        } else {
            0
        };

        let mut local_file = fs::File::open(&local_path)
            .map_err(|_| WorkerOutcome::FatalFailure(FatalKind::OpenLocalError))?;
        local_file
            .seek(SeekFrom::Start(resume_offset))
            .map_err(|_| WorkerOutcome::TransientFailure(TransientKind::ReadLocalError))?;

        let mut retried_busy = false;
        loop {
            match self.transport.open_data(&remote_in_flight_path, resume_offset, TransferDirection::Write) {
                Ok(()) => break,
                Err(TransportError::OpenRemote(msg)) if !retried_busy && is_busy_reply(&msg) => {
                    let Some(busy_char) = host.rename_file_busy else {
                        return Err(WorkerOutcome::TransientFailure(TransientKind::OpenRemoteError));
                    };
                    retried_busy = true;
                    let renamed_name = format!("{}{busy_char}", file.name);
                    let renamed_local = job.pool_dir.join(&renamed_name);
                    fs::rename(&local_path, &renamed_local).map_err(|_| WorkerOutcome::TransientFailure(TransientKind::OpenRemoteError))?;
                    local_path = renamed_local;
                    in_flight_name = lock_name::in_flight_name(&renamed_name, job.lock_policy, job.unique_number, job.attempt, lock_suffix);
                    remote_in_flight_path = format!("{}/{}", job.target_path, in_flight_name);
                }
                Err(err) => return Err(WorkerOutcome::TransientFailure(err.transient_kind().unwrap_or(TransientKind::OpenRemoteError))),
            }
        }

        let wants_header = job.header_injection && resume_offset == 0;
        if wants_header {
            self.write_block(&header::prefix(&file.name), job, None)
                .map_err(|err| WorkerOutcome::TransientFailure(err.transient_kind().unwrap_or(TransientKind::WriteRemoteError)))?;
        }

        let mode = write_mode(job.transfer_mode, host.options.contains(HostOptions::FTP_IGNORE_BIN));
        let mut limiter = host.transfer_rate_limit.map(BandwidthLimiter::new);
        let block_size = limiter
            .as_ref()
            .map_or(host.block_size, |l| l.recommended_block_size(host.block_size))
            .max(1)
            .min(MAX_BLOCK_SIZE);

        let keep_alive = host.options.contains(HostOptions::KEEP_ALIVE);
        let mut last_keepalive = clock();

        let mut bytes_sent = 0u64;
        let mut buffer = vec![0u8; block_size];
        loop {
            let read = local_file
                .read(&mut buffer)
                .map_err(|_| WorkerOutcome::TransientFailure(TransientKind::ReadLocalError))?;
            if read == 0 {
                break;
            }
            if let Err(err) = self.write_block(&buffer[..read], job, limiter.as_mut()) {
                if bytes_sent > MAX_SEND_BEFORE_APPEND {
                    append_list.record(&file.name, resume_offset + bytes_sent);
                }
                return Err(WorkerOutcome::TransientFailure(err.transient_kind().unwrap_or(TransientKind::WriteRemoteError)));
            }
            bytes_sent += read as u64;

            if keep_alive {
                let now = clock();
                if now.duration_since(last_keepalive).unwrap_or(Duration::ZERO) >= KEEP_ALIVE_INTERVAL {
                    let _ = self.transport.keepalive();
                    last_keepalive = now;
                }
            }
        }

        if wants_header {
            self.write_block(&header::suffix(), job, limiter.as_mut())
                .map_err(|err| WorkerOutcome::TransientFailure(err.transient_kind().unwrap_or(TransientKind::WriteRemoteError)))?;
        }

        match self.transport.close_data() {
            Ok(()) | Err(TransportError::ZeroLengthFile) => {}
            Err(err) => {
                return Err(WorkerOutcome::TransientFailure(err.transient_kind().unwrap_or(TransientKind::CloseRemoteError)));
            }
        }
        append_list.clear(&file.name);

        let final_remote_name = self.resolve_final_name(host, job, &file.name);
        let remote_final_path = format!("{}/{}", job.target_path, final_remote_name);
        self.transport
            .rename(&remote_in_flight_path, &remote_final_path, false, host.options.contains(HostOptions::CREATE_TARGET_DIR))
            .map_err(|err| WorkerOutcome::TransientFailure(err.transient_kind().unwrap_or(TransientKind::MoveRemoteError)))?;

        if let Some(chmod) = &job.chmod {
            let _ = self.transport.chmod(&remote_final_path, chmod);
        }
        if host.options.contains(HostOptions::PRESERVE_MTIME) {
            let _ = self.transport.set_mtime(&remote_final_path, file.mtime);
        }

        let total_sent = resume_offset + bytes_sent;
        let size_mismatch = if total_sent != file.size { Some((file.size, total_sent)) } else { None };
        if let Some((expected, actual)) = size_mismatch {
            warn!(
                job_id = job.job_id,
                file = %file.name,
                expected,
                actual,
                "file was sent without locking -- size changed"
            );
        }

        let name_on_disk = local_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(&file.name);
        let disposition = if job.archive_time > 0 {
            match archive(&job.pool_dir, name_on_disk, job) {
                Ok(path) => FileDisposition::Archived(path),
                Err(_) => {
                    let _ = fs::remove_file(&local_path);
                    FileDisposition::Deleted
                }
            }
        } else {
            let _ = fs::remove_file(&local_path);
            FileDisposition::Deleted
        };

        let _ = clock();
        info!(job_id = job.job_id, file = %file.name, bytes_sent = total_sent, "file transferred");

        Ok(FileTransferReport {
            file_name: file.name.clone(),
            bytes_sent,
            append_offset: resume_offset,
            size_mismatch,
            disposition,
        })
    }

    fn resolve_final_name(&self, host: &Host, job: &JobDescriptor, file_name: &str) -> String {
        let after_lock = lock_name::final_name(file_name, job.lock_policy);
        job.trans_rename
            .as_ref()
            .and_then(|rule| trans_rename::apply(&after_lock, rule, host.current_toggle))
            .unwrap_or(after_lock)
    }

    /// Resolves the remote size of the in-flight file at `path`, either via
    /// `SIZE` or by parsing the configured column of a `LIST` response,
    /// per `host.file_size_offset`. Any transport error resolves to `0`: a
    /// worker that cannot determine the remote size simply restarts from
    /// the beginning rather than failing the job.
    fn remote_size(&mut self, host: &Host, path: &str) -> Result<u64, WorkerOutcome> {
        match host.file_size_offset {
            FileSizeOffset::Auto => match self.transport.size(path) {
                Ok(size) => Ok(size.unwrap_or(0)),
                Err(_) => Ok(0),
            },
            FileSizeOffset::Column(column) => {
                let (dir, name) = path.rsplit_once('/').unwrap_or((".", path));
                let lines = self.transport.list(dir).unwrap_or_default();
                Ok(parse_list_size(&lines, name, column).unwrap_or(0))
            }
        }
    }

    fn write_block(&mut self, block: &[u8], _job: &JobDescriptor, limiter: Option<&mut BandwidthLimiter>) -> Result<(), TransportError> {
        let written = self.transport.write(block, WriteMode::binary())?;
        if let Some(limiter) = limiter {
            limiter.register(written);
        }
        debug!(bytes = written, "wrote block to remote data channel");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use afd_core::host::{ErrorHistory, FileSizeOffset, HostStatus};
    use afd_core::{LockPolicy, Scheme};
    use transport::mock::MockTransport;
    use transport::{LoginOutcome, TransferTypeCode};

    /// Wraps [`MockTransport`], failing the `n`th `write` call and every one
    /// after it, to exercise a mid-upload failure the single-shot
    /// `fail_next_write` flag on [`MockTransport`] cannot reach.
    struct FlakyTransport {
        inner: MockTransport,
        writes_seen: u32,
        fail_from_write: u32,
    }

    impl RemoteTransport for FlakyTransport {
        fn connect(&mut self, host: &str, port: u16, mode: ConnectMode) -> Result<(), TransportError> {
            self.inner.connect(host, port, mode)
        }
        fn login(&mut self, user: &str, password: &str) -> Result<LoginOutcome, TransportError> {
            self.inner.login(user, password)
        }
        fn send_site(&mut self, cmd: &str) -> Result<(), TransportError> {
            self.inner.send_site(cmd)
        }
        fn cd(&mut self, path: &str, create_if_missing: bool) -> Result<(), TransportError> {
            self.inner.cd(path, create_if_missing)
        }
        fn set_type(&mut self, mode: TransferTypeCode) -> Result<(), TransportError> {
            self.inner.set_type(mode)
        }
        fn list(&mut self, path: &str) -> Result<Vec<String>, TransportError> {
            self.inner.list(path)
        }
        fn size(&mut self, path: &str) -> Result<Option<u64>, TransportError> {
            self.inner.size(path)
        }
        fn open_data(&mut self, path: &str, offset: u64, direction: TransferDirection) -> Result<(), TransportError> {
            self.inner.open_data(path, offset, direction)
        }
        fn write(&mut self, block: &[u8], mode: WriteMode) -> Result<usize, TransportError> {
            self.writes_seen += 1;
            if self.writes_seen >= self.fail_from_write {
                return Err(TransportError::WriteRemote("flaky transport failure".into()));
            }
            self.inner.write(block, mode)
        }
        fn close_data(&mut self) -> Result<(), TransportError> {
            self.inner.close_data()
        }
        fn rename(&mut self, from: &str, to: &str, fast: bool, create_target: bool) -> Result<(), TransportError> {
            self.inner.rename(from, to, fast, create_target)
        }
        fn chmod(&mut self, path: &str, mode: &str) -> Result<(), TransportError> {
            self.inner.chmod(path, mode)
        }
        fn set_mtime(&mut self, path: &str, mtime: SystemTime) -> Result<(), TransportError> {
            self.inner.set_mtime(path, mtime)
        }
        fn dele(&mut self, path: &str) -> Result<(), TransportError> {
            self.inner.dele(path)
        }
        fn quit(&mut self) -> Result<(), TransportError> {
            self.inner.quit()
        }
        fn keepalive(&mut self) -> Result<(), TransportError> {
            self.inner.keepalive()
        }
    }

    fn host() -> Host {
        Host {
            alias: "h1".into(),
            hostnames: ("h1.example".into(), None),
            current_toggle: 1,
            scheme: Scheme::Ftp,
            port: 21,
            user: "afd".into(),
            proxy_script: None,
            allowed_transfers: 1,
            active_transfers: 0,
            max_errors: 5,
            retry_interval: Duration::from_secs(1),
            block_size: 4096,
            file_size_offset: FileSizeOffset::Auto,
            transfer_rate_limit: None,
            options: HostOptions::none(),
            rename_file_busy: Some('~'),
            lock_policy: LockPolicy::Dot,
            lock_file_name: Some(".lockfile".into()),
            burst_limit: 5,
            transfer_timeout: Duration::from_secs(30),
            error_history: ErrorHistory::default(),
            error_counter: 0,
            status: HostStatus::none(),
        }
    }

    fn job(pool_dir: &Path, files: Vec<FileEntry>) -> JobDescriptor {
        JobDescriptor {
            job_id: 1,
            directory_id: 1,
            host_alias: "h1".into(),
            scheme: Scheme::Ftp,
            target_path: "in".into(),
            created_at: SystemTime::UNIX_EPOCH,
            split_job_counter: 0,
            unique_number: 7,
            lock_policy: LockPolicy::Dot,
            transfer_mode: TransferMode::Image,
            chmod: None,
            trans_rename: None,
            archive_time: 0,
            header_injection: false,
            files,
            restart_names: Vec::new(),
            pool_dir: pool_dir.to_path_buf(),
            attempt: 0,
            toggle_host: false,
        }
    }

    fn entry(name: &str, size: u64) -> FileEntry {
        FileEntry {
            name: name.to_string(),
            size,
            mtime: SystemTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn successful_single_file_job_renames_to_the_final_name_and_deletes_the_local_copy() {
        let pool = tempfile::tempdir().unwrap();
        let append_dir = tempfile::tempdir().unwrap();
        let local_path = pool.path().join("a.txt");
        fs::write(&local_path, b"hello world").unwrap();

        let mut worker = TransferWorker::new(MockTransport::new());
        let j = job(pool.path(), vec![entry("a.txt", 11)]);
        let (outcome, report) = worker.run(
            &host(),
            "secret",
            j,
            append_dir.path(),
            ".lck",
            true,
            || true,
            || None,
            |_, _, _| Ok(PathBuf::from("/archive/unused")),
            SystemTime::now,
        );

        assert!(matches!(outcome, WorkerOutcome::Success));
        assert_eq!(report.files.len(), 1);
        assert_eq!(report.files[0].bytes_sent, 11);
        assert!(!local_path.exists());
    }

    #[test]
    fn a_proxy_script_logs_in_through_every_hop_instead_of_the_host_credentials() {
        let pool = tempfile::tempdir().unwrap();
        let append_dir = tempfile::tempdir().unwrap();
        fs::write(pool.path().join("a.txt"), b"data").unwrap();

        let mut h = host();
        h.proxy_script = Some("$Ufirsthop;$Psecret;$Uafd;".to_string());

        let mut worker = TransferWorker::new(MockTransport::new());
        let j = job(pool.path(), vec![entry("a.txt", 4)]);
        let (outcome, _report) = worker.run(
            &h,
            "unused",
            j,
            append_dir.path(),
            ".lck",
            true,
            || true,
            || None,
            |_, _, _| Ok(PathBuf::new()),
            SystemTime::now,
        );

        assert!(matches!(outcome, WorkerOutcome::Success));
    }

    #[test]
    fn job_with_archive_time_calls_the_archiver() {
        let pool = tempfile::tempdir().unwrap();
        let append_dir = tempfile::tempdir().unwrap();
        fs::write(pool.path().join("a.txt"), b"data").unwrap();

        let mut worker = TransferWorker::new(MockTransport::new());
        let mut j = job(pool.path(), vec![entry("a.txt", 4)]);
        j.archive_time = 3600;

        let mut archived_paths = Vec::new();
        let (outcome, report) = worker.run(
            &host(),
            "secret",
            j,
            append_dir.path(),
            ".lck",
            true,
            || true,
            || None,
            |_, name, _| {
                archived_paths.push(name.to_string());
                Ok(PathBuf::from(format!("/archive/{name}")))
            },
            SystemTime::now,
        );

        assert!(matches!(outcome, WorkerOutcome::Success));
        assert_eq!(archived_paths, vec!["a.txt".to_string()]);
        assert!(matches!(report.files[0].disposition, FileDisposition::Archived(_)));
    }

    #[test]
    fn busy_target_retries_once_under_the_rename_file_busy_suffix() {
        let pool = tempfile::tempdir().unwrap();
        let append_dir = tempfile::tempdir().unwrap();
        fs::write(pool.path().join("a.txt"), b"data").unwrap();

        let mut transport = MockTransport::new();
        transport.fail_next_open_data_busy = true;
        let mut worker = TransferWorker::new(transport);
        let j = job(pool.path(), vec![entry("a.txt", 4)]);
        let (outcome, report) = worker.run(
            &host(),
            "secret",
            j,
            append_dir.path(),
            ".lck",
            true,
            || true,
            || None,
            |_, _, _| Ok(PathBuf::new()),
            SystemTime::now,
        );

        assert!(matches!(outcome, WorkerOutcome::Success));
        assert_eq!(report.files.len(), 1);
        assert!(!pool.path().join("a.txt~").exists());
        assert!(!pool.path().join("a.txt").exists());
    }

    #[test]
    fn lock_file_policy_creates_on_first_connect_and_removes_on_last_quit() {
        let pool = tempfile::tempdir().unwrap();
        let append_dir = tempfile::tempdir().unwrap();
        fs::write(pool.path().join("a.txt"), b"data").unwrap();

        let mut worker_host = host();
        worker_host.lock_file_name = Some(".lockfile".into());

        let mut worker = TransferWorker::new(MockTransport::new());
        let mut j = job(pool.path(), vec![entry("a.txt", 4)]);
        j.lock_policy = LockPolicy::LockFile;

        let (outcome, _report) = worker.run(
            &worker_host,
            "secret",
            j,
            append_dir.path(),
            ".lck",
            true,
            || true,
            || None,
            |_, _, _| Ok(PathBuf::new()),
            SystemTime::now,
        );

        assert!(matches!(outcome, WorkerOutcome::Success));
    }

    #[test]
    fn missing_pool_dir_is_a_fatal_failure() {
        let pool_dir = PathBuf::from("/nonexistent/pool/dir");
        let append_dir = tempfile::tempdir().unwrap();
        let mut worker = TransferWorker::new(MockTransport::new());
        let j = job(&pool_dir, vec![entry("a.txt", 1)]);
        let (outcome, _report) =
            worker.run(&host(), "secret", j, append_dir.path(), ".lck", true, || true, || None, |_, _, _| unreachable!(), SystemTime::now);
        assert!(matches!(outcome, WorkerOutcome::FatalFailure(FatalKind::PoolDirMissing)));
    }

    #[test]
    fn write_failure_after_a_large_partial_transfer_persists_the_append_list() {
        let pool = tempfile::tempdir().unwrap();
        let append_dir = tempfile::tempdir().unwrap();
        let chunk = (MAX_SEND_BEFORE_APPEND as usize) + 1;
        let payload = vec![b'x'; chunk * 3];
        fs::write(pool.path().join("big.bin"), &payload).unwrap();

        let transport = FlakyTransport {
            inner: MockTransport::new(),
            writes_seen: 0,
            fail_from_write: 2,
        };
        let mut worker_host = host();
        worker_host.block_size = chunk;

        let mut worker = TransferWorker::new(transport);
        let j = job(pool.path(), vec![entry("big.bin", payload.len() as u64)]);
        let (outcome, _report) = worker.run(
            &worker_host,
            "secret",
            j,
            append_dir.path(),
            ".lck",
            true,
            || true,
            || None,
            |_, _, _| unreachable!(),
            SystemTime::now,
        );
        assert!(matches!(outcome, WorkerOutcome::TransientFailure(TransientKind::WriteRemoteError)));

        let append_list_path = append_dir.path().join("1.append");
        let persisted = AppendList::load(&append_list_path).unwrap();
        assert_eq!(persisted.offset("big.bin"), Some(chunk as u64));
    }

    #[test]
    fn burst_chains_a_second_job_on_the_same_connection() {
        let pool = tempfile::tempdir().unwrap();
        let append_dir = tempfile::tempdir().unwrap();
        fs::write(pool.path().join("a.txt"), b"one").unwrap();
        fs::write(pool.path().join("b.txt"), b"two").unwrap();

        let mut worker = TransferWorker::new(MockTransport::new());
        let first = job(pool.path(), vec![entry("a.txt", 3)]);
        let mut second = job(pool.path(), vec![entry("b.txt", 3)]);
        second.job_id = 2;

        let mut handed_out = false;
        let (outcome, report) = worker.run(
            &host(),
            "secret",
            first,
            append_dir.path(),
            ".lck",
            true,
            || true,
            || {
                if handed_out {
                    None
                } else {
                    handed_out = true;
                    Some(second.clone())
                }
            },
            |_, _, _| Ok(PathBuf::new()),
            SystemTime::now,
        );

        assert!(matches!(outcome, WorkerOutcome::Success));
        assert_eq!(report.jobs_completed, 2);
        assert_eq!(report.files.len(), 2);
    }
}
