//! The burst coordinator (C6): decides whether a worker that just finished a
//! job should keep its connection open for another job to the same host.

use afd_core::{Host, JobDescriptor};

/// What a worker should do after finishing a job, per the burst coordinator.
#[derive(Debug)]
pub enum BurstDecision {
    /// Stay connected and immediately process `next`.
    Continue(Box<JobDescriptor>),
    /// Log off; the connection is not worth keeping open.
    Disconnect,
    /// No decision can be made right now (e.g. no further job queued); the
    /// worker exits and a fresh connection is opened for the next job.
    Neither,
}

/// Decides the next step for a worker that just completed `finished` on
/// `host` with `burst_counter` jobs already chained on this connection.
///
/// `next_same_host` is the next queued job for this host alias, if any,
/// supplied by the caller (the dispatcher owns queue access). A burst never
/// continues across a host's `current_toggle` change: a toggle forces a
/// fresh login on the other hostname, so the live connection is useless.
#[must_use]
pub fn check_burst(
    host: &Host,
    burst_counter: u32,
    finished: &JobDescriptor,
    next_same_host: Option<JobDescriptor>,
) -> BurstDecision {
    if !host.status.accepts_new_jobs() {
        return BurstDecision::Disconnect;
    }
    if burst_counter >= host.burst_limit {
        return BurstDecision::Disconnect;
    }
    let Some(next) = next_same_host else {
        return BurstDecision::Neither;
    };
    if next.toggle_host != finished.toggle_host {
        return BurstDecision::Disconnect;
    }
    BurstDecision::Continue(Box::new(next))
}

#[cfg(test)]
mod tests {
    use super::*;
    use afd_core::host::{ErrorHistory, FileSizeOffset, HostOptions, HostStatus};
    use afd_core::{LockPolicy, Scheme, TransferMode};
    use std::time::{Duration, SystemTime};

    fn host() -> Host {
        Host {
            alias: "h1".into(),
            hostnames: ("h1.example".into(), None),
            current_toggle: 1,
            scheme: Scheme::Ftp,
            port: 21,
            user: "afd".into(),
            proxy_script: None,
            allowed_transfers: 2,
            active_transfers: 0,
            max_errors: 5,
            retry_interval: Duration::from_secs(10),
            block_size: 32 * 1024,
            file_size_offset: FileSizeOffset::Auto,
            transfer_rate_limit: None,
            options: HostOptions::none(),
            rename_file_busy: Some('~'),
            lock_policy: LockPolicy::Dot,
            lock_file_name: None,
            burst_limit: 3,
            transfer_timeout: Duration::from_secs(120),
            error_history: ErrorHistory::default(),
            error_counter: 0,
            status: HostStatus::none(),
        }
    }

    fn job(job_id: u64, toggle_host: bool) -> JobDescriptor {
        JobDescriptor {
            job_id,
            directory_id: 1,
            host_alias: "h1".into(),
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
            files: Vec::new(),
            restart_names: Vec::new(),
            pool_dir: "/pool".into(),
            attempt: 0,
            toggle_host,
        }
    }

    #[test]
    fn no_queued_job_yields_neither() {
        let decision = check_burst(&host(), 0, &job(1, false), None);
        assert!(matches!(decision, BurstDecision::Neither));
    }

    #[test]
    fn queued_job_for_same_host_continues() {
        let decision = check_burst(&host(), 0, &job(1, false), Some(job(2, false)));
        assert!(matches!(decision, BurstDecision::Continue(next) if next.job_id == 2));
    }

    #[test]
    fn burst_limit_reached_disconnects() {
        let decision = check_burst(&host(), 3, &job(1, false), Some(job(2, false)));
        assert!(matches!(decision, BurstDecision::Disconnect));
    }

    #[test]
    fn host_no_longer_accepting_jobs_disconnects() {
        let mut h = host();
        h.status = HostStatus::PAUSED;
        let decision = check_burst(&h, 0, &job(1, false), Some(job(2, false)));
        assert!(matches!(decision, BurstDecision::Disconnect));
    }

    #[test]
    fn toggle_change_forces_disconnect() {
        let decision = check_burst(&host(), 0, &job(1, false), Some(job(2, true)));
        assert!(matches!(decision, BurstDecision::Disconnect));
    }
}
