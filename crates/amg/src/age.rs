//! Age-based delete-files-flag evaluation.

use std::time::Duration;

use afd_core::DeleteReason;

use crate::classify::EntryClass;

/// Whether an aged entry should be kept or removed, and under which
/// delete-log reason code.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AgeDecision {
    Keep,
    Delete(DeleteReason),
}

/// Evaluates the delete-files-flag policy for one entry.
///
/// `has_lock_suffix` flags a file left behind under a stale lock notation
/// (e.g. a crashed worker's `.filename`); such files age out under
/// `USER_DEL` independent of their [`EntryClass`].
#[must_use]
pub fn classify_for_deletion(
    class: EntryClass,
    age: Duration,
    old_file_time: Duration,
    has_lock_suffix: bool,
) -> AgeDecision {
    if age < old_file_time {
        return AgeDecision::Keep;
    }
    if has_lock_suffix {
        return AgeDecision::Delete(DeleteReason::UserDel);
    }
    match class {
        EntryClass::Unknown => AgeDecision::Delete(DeleteReason::OtherDel),
        EntryClass::Queued => AgeDecision::Delete(DeleteReason::AgeOutput),
        EntryClass::Candidate => AgeDecision::Keep,
    }
}
