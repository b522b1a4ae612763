//! Per-entry classification against a directory's recipient rules.

/// The outcome of matching one directory entry against its directory's
/// recipient rules and host status.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum EntryClass {
    /// No recipient rule matches this entry's name.
    Unknown,
    /// A rule matches, but the recipient host is paused or stopped.
    Queued,
    /// A rule matches and the recipient host is accepting new jobs.
    Candidate,
}

/// Classifies one entry given whether a recipient rule matched and, if so,
/// whether that recipient's host currently accepts new jobs.
#[must_use]
pub const fn classify_entry(matched_recipient: bool, host_accepts_new_jobs: bool) -> EntryClass {
    if !matched_recipient {
        EntryClass::Unknown
    } else if host_accepts_new_jobs {
        EntryClass::Candidate
    } else {
        EntryClass::Queued
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_match_is_unknown_regardless_of_host_status() {
        assert_eq!(classify_entry(false, true), EntryClass::Unknown);
        assert_eq!(classify_entry(false, false), EntryClass::Unknown);
    }

    #[test]
    fn matched_with_healthy_host_is_candidate() {
        assert_eq!(classify_entry(true, true), EntryClass::Candidate);
    }

    #[test]
    fn matched_with_blocked_host_is_queued() {
        assert_eq!(classify_entry(true, false), EntryClass::Queued);
    }
}
