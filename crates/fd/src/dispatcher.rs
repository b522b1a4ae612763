//! The job dispatcher: per-host slot pools, the main FIFO, and worker exit
//! handling, tying together [`crate::retry::RetryQueue`] and
//! [`crate::guard::duplicate_file_guard`].

use std::collections::{HashMap, VecDeque};
use std::time::Instant;

use afd_core::host::SlotState;
use afd_core::outcome::{FatalKind, TransientKind, WorkerOutcome};
use afd_core::{DeleteReason, Host, HostStatus, JobDescriptor};
use tracing::{debug, info, warn};

use crate::error::FdError;
use crate::guard::duplicate_file_guard;
use crate::retry::RetryQueue;

/// A host's worker slots alongside its live configuration and counters.
#[derive(Debug)]
pub struct HostEntry {
    pub host: Host,
    pub slots: Vec<SlotState>,
}

impl HostEntry {
    #[must_use]
    pub fn new(host: Host) -> Self {
        let slots = (0..host.allowed_transfers).map(|_| SlotState::Idle).collect();
        Self { host, slots }
    }

    fn first_idle_slot(&self) -> Option<usize> {
        self.slots.iter().position(|s| matches!(s, SlotState::Idle))
    }

    /// File names in flight on slots other than `except_slot`.
    fn in_flight_file_names(&self, except_slot: usize, names: impl Fn(u64) -> Option<String>) -> Vec<String> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(idx, _)| *idx != except_slot)
            .filter_map(|(_, slot)| match slot {
                SlotState::Running { job_id, .. } => names(*job_id),
                _ => None,
            })
            .collect()
    }
}

/// A job the caller should now spawn a worker for, plus the slot it occupies.
#[derive(Debug)]
pub struct ReadyJob {
    pub host_alias: String,
    pub slot: usize,
    pub job: JobDescriptor,
}

/// What happened to a job and its host's slot after a worker exited.
#[derive(Debug)]
pub enum ExitAction {
    /// The slot is free; the host's error counter was reset.
    Freed,
    /// More files were waiting in the pool directory; the job was re-queued
    /// at the front of the main FIFO to run again without delay.
    Requeued,
    /// The job was scheduled to retry after a backoff delay.
    RetryScheduled { until: Instant },
    /// The host's error counter reached its limit; the host is now
    /// `AUTO_PAUSED` and the job sits at the front of the queue, to be
    /// retried once an operator clears the host.
    HostAutoPaused,
    /// The job cannot succeed and was dropped.
    Dropped { reason: DeleteReason },
}

/// Owns the global FIFO, per-host slot pools, and the retry queue.
#[derive(Debug, Default)]
pub struct Dispatcher {
    queue: VecDeque<JobDescriptor>,
    retry: RetryQueue,
    hosts: HashMap<String, HostEntry>,
}

impl Dispatcher {
    #[must_use]
    pub fn new(hosts: impl IntoIterator<Item = Host>) -> Self {
        let hosts = hosts
            .into_iter()
            .map(|host| (host.alias.clone(), HostEntry::new(host)))
            .collect();
        Self {
            queue: VecDeque::new(),
            retry: RetryQueue::new(),
            hosts,
        }
    }

    /// Adds a job to the back of the main FIFO.
    pub fn submit(&mut self, job: JobDescriptor) {
        self.queue.push_back(job);
    }

    /// Returns the host registered under `alias`, if any.
    #[must_use]
    pub fn host(&self, alias: &str) -> Option<&Host> {
        self.hosts.get(alias).map(|entry| &entry.host)
    }

    /// Number of jobs waiting in the main FIFO (not counting retry backoff).
    #[must_use]
    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Moves due retry-queue jobs back to the front of the FIFO, then walks
    /// the FIFO assigning jobs to idle slots. `in_flight_name` resolves a
    /// running job id to the file name it currently has open, for the
    /// duplicate-file guard; `withheld` receives any file names pulled out of
    /// a job because a sibling slot already has them open.
    pub fn tick(
        &mut self,
        now: Instant,
        in_flight_name: impl Fn(u64) -> Option<String> + Copy,
        mut withheld: impl FnMut(&JobDescriptor, &str),
    ) -> Vec<ReadyJob> {
        for job in self.retry.drain_due(now).into_iter().rev() {
            self.queue.push_front(job);
        }

        let mut ready = Vec::new();
        let mut requeue = VecDeque::new();

        while let Some(mut job) = self.queue.pop_front() {
            let Some(entry) = self.hosts.get_mut(&job.host_alias) else {
                warn!(host = %job.host_alias, job_id = job.job_id, "dropping job for unknown host");
                continue;
            };
            if !entry.host.status.accepts_new_jobs() {
                requeue.push_back(job);
                continue;
            }
            let Some(slot) = entry.first_idle_slot() else {
                requeue.push_back(job);
                continue;
            };

            let in_flight = entry.in_flight_file_names(slot, in_flight_name);
            let withheld_files = duplicate_file_guard(&mut job.files, &in_flight);
            for file in &withheld_files {
                withheld(&job, &file.name);
            }
            if job.files.is_empty() {
                requeue.push_back(job);
                continue;
            }

            if job.toggle_host {
                entry.host.toggle();
                debug!(host = %job.host_alias, job_id = job.job_id, toggle = entry.host.current_toggle, "flipped host toggle for job");
            }

            entry.slots[slot] = SlotState::Running {
                pid: 0,
                job_id: job.job_id,
            };
            ready.push(ReadyJob {
                host_alias: job.host_alias.clone(),
                slot,
                job,
            });
        }

        self.queue = requeue;
        ready
    }

    /// Records that `job`'s worker on `host_alias`'s slot `slot` produced
    /// `outcome`. `attempt` is the attempt number the worker just ran.
    pub fn on_worker_exit(
        &mut self,
        host_alias: &str,
        slot: usize,
        mut job: JobDescriptor,
        outcome: WorkerOutcome,
        now: Instant,
    ) -> Result<ExitAction, FdError> {
        let entry = self
            .hosts
            .get_mut(host_alias)
            .ok_or_else(|| FdError::UnknownHost(host_alias.to_string()))?;
        let current = entry
            .slots
            .get(slot)
            .ok_or_else(|| FdError::NoSuchSlot { host: host_alias.to_string(), slot })?;
        if !matches!(current, SlotState::Running { .. }) {
            return Err(FdError::SlotNotRunning { host: host_alias.to_string(), slot });
        }

        entry.slots[slot] = SlotState::Idle;

        match outcome {
            WorkerOutcome::Success => {
                entry.host.error_counter = 0;
                entry.host.error_history.clear();
                info!(host = host_alias, job_id = job.job_id, "job completed");
                Ok(ExitAction::Freed)
            }
            WorkerOutcome::StillFilesToSend => {
                debug!(host = host_alias, job_id = job.job_id, "more files appeared, requeuing");
                self.queue.push_front(job);
                Ok(ExitAction::Requeued)
            }
            WorkerOutcome::TransientFailure(kind) => {
                entry.host.error_counter += 1;
                entry.host.error_history.push(kind);
                if entry.host.error_counter >= entry.host.max_errors {
                    entry.host.status = entry.host.status.insert(HostStatus::AUTO_PAUSED);
                    warn!(host = host_alias, job_id = job.job_id, "host auto-paused after repeated errors");
                    job.attempt += 1;
                    self.queue.push_front(job);
                    Ok(ExitAction::HostAutoPaused)
                } else {
                    job.attempt += 1;
                    let delay = entry.host.backoff(job.attempt);
                    let until = now + delay;
                    debug!(host = host_alias, job_id = job.job_id, attempt = job.attempt, ?delay, "scheduling retry");
                    self.retry.schedule(job, until);
                    Ok(ExitAction::RetryScheduled { until })
                }
            }
            WorkerOutcome::FatalFailure(kind) => {
                let reason = match kind {
                    FatalKind::DuplicateFileDetected => DeleteReason::FileCurrentlyTransmitted,
                    _ => DeleteReason::OtherDel,
                };
                warn!(host = host_alias, job_id = job.job_id, %kind, "job dropped after fatal failure");
                Ok(ExitAction::Dropped { reason })
            }
        }
    }

    /// Number of jobs currently waiting out a retry backoff.
    #[must_use]
    pub fn retry_len(&self) -> usize {
        self.retry.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use afd_core::host::{ErrorHistory, FileSizeOffset, HostOptions};
    use afd_core::{FileEntry, LockPolicy, Scheme, TransferMode};
    use std::time::{Duration, SystemTime};

    fn host(alias: &str, allowed_transfers: u8) -> Host {
        Host {
            alias: alias.to_string(),
            hostnames: (format!("{alias}.example"), None),
            current_toggle: 1,
            scheme: Scheme::Ftp,
            port: 21,
            user: "afd".into(),
            proxy_script: None,
            allowed_transfers,
            active_transfers: 0,
            max_errors: 2,
            retry_interval: Duration::from_secs(1),
            block_size: 32 * 1024,
            file_size_offset: FileSizeOffset::Auto,
            transfer_rate_limit: None,
            options: HostOptions::none(),
            rename_file_busy: Some('~'),
            lock_policy: LockPolicy::Dot,
            lock_file_name: None,
            burst_limit: 5,
            transfer_timeout: Duration::from_secs(120),
            error_history: ErrorHistory::default(),
            error_counter: 0,
            status: HostStatus::none(),
        }
    }

    fn job(job_id: u64, host_alias: &str, file_names: &[&str]) -> JobDescriptor {
        job_with_toggle(job_id, host_alias, file_names, false)
    }

    fn job_with_toggle(job_id: u64, host_alias: &str, file_names: &[&str], toggle_host: bool) -> JobDescriptor {
        JobDescriptor {
            job_id,
            directory_id: 1,
            host_alias: host_alias.to_string(),
            scheme: Scheme::Ftp,
            target_path: "/in".into(),
            created_at: SystemTime::UNIX_EPOCH,
            split_job_counter: 0,
            unique_number: 0,
            lock_policy: LockPolicy::None,
            transfer_mode: TransferMode::Image,
            chmod: None,
            trans_rename: None,
            archive_time: 0,
            header_injection: false,
            files: file_names
                .iter()
                .map(|name| FileEntry {
                    name: (*name).to_string(),
                    size: 1,
                    mtime: SystemTime::UNIX_EPOCH,
                })
                .collect(),
            restart_names: Vec::new(),
            pool_dir: "/pool".into(),
            attempt: 0,
            toggle_host,
        }
    }

    #[test]
    fn tick_assigns_a_job_to_an_idle_slot() {
        let mut dispatcher = Dispatcher::new([host("h1", 1)]);
        dispatcher.submit(job(1, "h1", &["a.txt"]));
        let ready = dispatcher.tick(Instant::now(), |_| None, |_, _| {});
        assert_eq!(ready.len(), 1);
        assert_eq!(ready[0].slot, 0);
        assert_eq!(dispatcher.queue_len(), 0);
    }

    #[test]
    fn tick_leaves_job_queued_when_no_slot_is_free() {
        let mut dispatcher = Dispatcher::new([host("h1", 1)]);
        dispatcher.submit(job(1, "h1", &["a.txt"]));
        dispatcher.submit(job(2, "h1", &["b.txt"]));
        let ready = dispatcher.tick(Instant::now(), |_| None, |_, _| {});
        assert_eq!(ready.len(), 1);
        assert_eq!(dispatcher.queue_len(), 1);
    }

    #[test]
    fn tick_withholds_a_file_already_in_flight_on_a_sibling_slot() {
        let mut dispatcher = Dispatcher::new([host("h1", 2)]);
        dispatcher.submit(job(1, "h1", &["a.txt"]));
        let first = dispatcher.tick(Instant::now(), |_| None, |_, _| {});
        assert_eq!(first.len(), 1);

        dispatcher.submit(job(2, "h1", &["a.txt"]));
        let mut withheld_names = Vec::new();
        let second = dispatcher.tick(
            Instant::now(),
            |job_id| if job_id == 1 { Some("a.txt".to_string()) } else { None },
            |_, name| withheld_names.push(name.to_string()),
        );
        assert!(second.is_empty());
        assert_eq!(withheld_names, vec!["a.txt".to_string()]);
        assert_eq!(dispatcher.queue_len(), 0);
    }

    #[test]
    fn success_frees_the_slot_and_clears_error_counter() {
        let mut dispatcher = Dispatcher::new([host("h1", 1)]);
        dispatcher.submit(job(1, "h1", &["a.txt"]));
        let ready = dispatcher.tick(Instant::now(), |_| None, |_, _| {});
        let action = dispatcher
            .on_worker_exit("h1", ready[0].slot, job(1, "h1", &["a.txt"]), WorkerOutcome::Success, Instant::now())
            .unwrap();
        assert!(matches!(action, ExitAction::Freed));
    }

    #[test]
    fn transient_failure_schedules_a_retry() {
        let mut dispatcher = Dispatcher::new([host("h1", 1)]);
        dispatcher.submit(job(1, "h1", &["a.txt"]));
        let ready = dispatcher.tick(Instant::now(), |_| None, |_, _| {});
        let action = dispatcher
            .on_worker_exit(
                "h1",
                ready[0].slot,
                job(1, "h1", &["a.txt"]),
                WorkerOutcome::TransientFailure(TransientKind::Timeout),
                Instant::now(),
            )
            .unwrap();
        assert!(matches!(action, ExitAction::RetryScheduled { .. }));
        assert_eq!(dispatcher.retry_len(), 1);
    }

    #[test]
    fn repeated_transient_failures_auto_pause_the_host() {
        let mut dispatcher = Dispatcher::new([host("h1", 1)]);
        dispatcher.submit(job(1, "h1", &["a.txt"]));
        let ready = dispatcher.tick(Instant::now(), |_| None, |_, _| {});
        let mut current_job = job(1, "h1", &["a.txt"]);
        current_job.attempt = 1;
        let action = dispatcher
            .on_worker_exit(
                "h1",
                ready[0].slot,
                current_job,
                WorkerOutcome::TransientFailure(TransientKind::Timeout),
                Instant::now(),
            )
            .unwrap();
        assert!(matches!(action, ExitAction::HostAutoPaused));
        assert!(dispatcher.host("h1").unwrap().status.contains(HostStatus::AUTO_PAUSED));
    }

    #[test]
    fn fatal_duplicate_file_maps_to_file_currently_transmitted() {
        let mut dispatcher = Dispatcher::new([host("h1", 1)]);
        dispatcher.submit(job(1, "h1", &["a.txt"]));
        let ready = dispatcher.tick(Instant::now(), |_| None, |_, _| {});
        let action = dispatcher
            .on_worker_exit(
                "h1",
                ready[0].slot,
                job(1, "h1", &["a.txt"]),
                WorkerOutcome::FatalFailure(FatalKind::DuplicateFileDetected),
                Instant::now(),
            )
            .unwrap();
        assert!(matches!(action, ExitAction::Dropped { reason: DeleteReason::FileCurrentlyTransmitted }));
    }

    #[test]
    fn tick_flips_the_host_toggle_for_a_job_that_requests_it() {
        let mut h = host("h1", 1);
        h.hostnames = ("h1.example".into(), Some("h1-alt.example".into()));
        let mut dispatcher = Dispatcher::new([h]);
        dispatcher.submit(job_with_toggle(1, "h1", &["a.txt"], true));
        let ready = dispatcher.tick(Instant::now(), |_| None, |_, _| {});
        assert_eq!(ready.len(), 1);
        assert_eq!(dispatcher.host("h1").unwrap().current_toggle, 2);
    }

    #[test]
    fn exit_for_unknown_host_is_an_error() {
        let mut dispatcher = Dispatcher::new([host("h1", 1)]);
        let err = dispatcher
            .on_worker_exit("ghost", 0, job(1, "ghost", &["a.txt"]), WorkerOutcome::Success, Instant::now())
            .unwrap_err();
        assert!(matches!(err, FdError::UnknownHost(_)));
    }
}
