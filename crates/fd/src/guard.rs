//! The duplicate-file guard (specification §5, `FILE_CURRENTLY_TRANSMITTED`).
//!
//! Before a job is spawned, the dispatcher checks the file names already in
//! flight on the job's other sibling slots for the same host. A name already
//! in use is pulled out of the job rather than sent twice; if that empties
//! the job, the whole job is withheld rather than spawning an empty worker.

use afd_core::{DeleteReason, FileEntry};
use logging::record::LogLine;

/// One file removed from a job because a sibling slot already has it open.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct WithheldFile {
    pub name: String,
}

/// Removes any file in `files` whose name appears in `in_flight`, in place.
///
/// Returns the withheld files, in the order they appeared in `files`.
pub fn duplicate_file_guard(files: &mut Vec<FileEntry>, in_flight: &[String]) -> Vec<WithheldFile> {
    let mut withheld = Vec::new();
    files.retain(|entry| {
        if in_flight.iter().any(|name| name == &entry.name) {
            withheld.push(WithheldFile { name: entry.name.clone() });
            false
        } else {
            true
        }
    });
    withheld
}

/// Renders the delete-log line for a file withheld by the guard: always
/// reason [`DeleteReason::FileCurrentlyTransmitted`].
#[must_use]
pub fn delete_log_line(timestamp: u64, host_alias: &str, withheld: &WithheldFile) -> String {
    LogLine::new(timestamp)
        .host_and_reason(host_alias, DeleteReason::FileCurrentlyTransmitted)
        .field(withheld.name.clone())
        .render()
}
