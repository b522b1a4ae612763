//! A watched source directory and its admission rule.

use std::path::PathBuf;
use std::time::Duration;

/// Which classes of stale file a directory's scanner is allowed to delete.
/// Combinable: a directory can delete unrecognized files, queued-but-stale
/// files, and stale lock-suffixed leftovers independently of one another.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct DeleteFlags(u8);

impl DeleteFlags {
    /// Delete unrecognized (no matching recipient rule) files once stale.
    pub const UNKNOWN: Self = Self(1 << 0);
    /// Delete recognized-but-queued (host paused) files once stale.
    pub const QUEUED: Self = Self(1 << 1);
    /// Delete stale lock-suffixed leftovers from a crashed worker.
    pub const LOCKED: Self = Self(1 << 2);

    #[must_use]
    pub const fn none() -> Self {
        Self(0)
    }

    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }

    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }
}

/// A downstream recipient of this directory's files: the host to send to and
/// the scheme/target path pairing that selects a [`crate::job::Scheme`].
#[derive(Clone, Debug)]
pub struct Recipient {
    /// Host alias this directory forwards to.
    pub host_alias: String,
    /// Remote target path for this directory/host pairing.
    pub target_path: String,
}

/// A watched source with its own admission rule.
#[derive(Clone, Debug)]
pub struct Directory {
    /// Stable numeric id, assigned when the directory first appears in config.
    pub id: u32,
    /// Local filesystem path scanned on every AMG cycle.
    pub path: PathBuf,
    /// Age beyond which an UNKNOWN or QUEUED file becomes eligible for deletion.
    pub old_file_time: Duration,
    /// Which stale-file classes this directory will delete.
    pub delete_flags: DeleteFlags,
    /// Maximum number of files admitted into one pool directory per scan.
    pub max_copied_files: u32,
    /// Maximum cumulative bytes admitted into one pool directory per scan.
    pub max_copied_bytes: u64,
    /// Downstream recipients; a file matching none of these is UNKNOWN.
    pub recipients: Vec<Recipient>,
    /// Set by the scanner when the directory itself becomes unreadable;
    /// scanning resumes only after the next configuration reload.
    pub disabled: bool,
}

impl Directory {
    /// Returns the configured recipient for `host_alias`, if any.
    #[must_use]
    pub fn recipient_for(&self, host_alias: &str) -> Option<&Recipient> {
        self.recipients.iter().find(|r| r.host_alias == host_alias)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delete_flags_are_combinable() {
        let flags = DeleteFlags::UNKNOWN.union(DeleteFlags::LOCKED);
        assert!(flags.contains(DeleteFlags::UNKNOWN));
        assert!(flags.contains(DeleteFlags::LOCKED));
        assert!(!flags.contains(DeleteFlags::QUEUED));
    }

    #[test]
    fn recipient_for_finds_matching_alias() {
        let dir = Directory {
            id: 1,
            path: "/in/a".into(),
            old_file_time: Duration::from_secs(3600),
            delete_flags: DeleteFlags::none(),
            max_copied_files: 100,
            max_copied_bytes: 1 << 30,
            recipients: vec![Recipient {
                host_alias: "h1".into(),
                target_path: "/incoming".into(),
            }],
            disabled: false,
        };
        assert!(dir.recipient_for("h1").is_some());
        assert!(dir.recipient_for("h2").is_none());
    }
}
