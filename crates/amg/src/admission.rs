//! Batch selection among a directory's admitted candidates.

use afd_core::FileEntry;

/// Selects the next batch from `candidates`, oldest `mtime` first, stopping
/// at the first entry that would push the batch past `max_copied_files` or
/// `max_copied_bytes`.
///
/// Stopping rather than skipping past an over-budget entry to pick up a
/// smaller, newer one preserves the oldest-first admission order the
/// specification calls out as preventing backlog starvation; a skip-ahead
/// policy would let a steady stream of small new files starve one old
/// large file indefinitely.
#[must_use]
pub fn select_batch(candidates: &[FileEntry], max_copied_files: usize, max_copied_bytes: u64) -> Vec<FileEntry> {
    let mut sorted: Vec<FileEntry> = candidates.to_vec();
    sorted.sort_by_key(|entry| entry.mtime);

    let mut batch = Vec::new();
    let mut total_bytes: u64 = 0;
    for entry in sorted {
        if batch.len() >= max_copied_files {
            break;
        }
        let Some(next_total) = total_bytes.checked_add(entry.size) else {
            break;
        };
        if next_total > max_copied_bytes && !batch.is_empty() {
            break;
        }
        total_bytes = next_total;
        batch.push(entry);
    }
    batch
}
