//! Top-level search: selects the rotated files a time window can
//! intersect, memory-maps each in turn, probes to the first candidate
//! record, and walks forward applying predicates, emitting matches in
//! batches so a caller can stream results to a terminal or a pipe instead
//! of waiting for the whole window to finish.

use std::fs::File;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use logging::LogCategory;
use memmap2::Mmap;
use tracing::debug;

use crate::error::LogSearchError;
use crate::index::LineIndex;
use crate::predicate::Predicates;
use crate::record::ParsedRecord;
use crate::timeline::search_time;
use crate::window::{numbered_path, select_files, TimeWindow};

/// Number of matching lines buffered before a batch is emitted to the
/// caller's sink, matching the engine's "bounded memory regardless of
/// match count" requirement.
pub const DEFAULT_BATCH_SIZE: usize = 1024;

/// Every byte range that matched, ready for a caller to render.
#[derive(Clone, Debug)]
pub struct MatchBatch {
    pub file_no: u32,
    pub lines: Vec<String>,
}

/// Cooperative cancellation: checked every [`CANCEL_CHECK_INTERVAL`] records
/// so a long search over a large window can be aborted promptly without
/// locking around every single record.
const CANCEL_CHECK_INTERVAL: usize = 256;

/// Runs `window` against `category`'s rotated files under `dir`, calling
/// `emit` with each batch of matches as it fills, in file order (`.0`
/// first means oldest-to-newest within the selected range is not
/// guaranteed; callers that need chronological order across files should
/// sort the selected range themselves, which `select_files` already
/// returns ascending by file number).
///
/// Returns the total number of matching records found.
pub fn search(
    dir: &Path,
    category: LogCategory,
    max_files: u32,
    switch_file_time: Duration,
    window: TimeWindow,
    predicates: &Predicates,
    cancel: &AtomicBool,
    batch_size: usize,
    mut emit: impl FnMut(MatchBatch),
) -> Result<usize, LogSearchError> {
    let files = select_files(dir, category, max_files, switch_file_time, window)?;
    debug!(category = %category, files = files.len(), "log search selected rotated files");
    let mut total = 0usize;
    for file_no in files {
        if cancel.load(Ordering::Relaxed) {
            break;
        }
        total += search_one_file(dir, category, file_no, window, predicates, cancel, batch_size, &mut emit)?;
    }
    Ok(total)
}

fn search_one_file(
    dir: &Path,
    category: LogCategory,
    file_no: u32,
    window: TimeWindow,
    predicates: &Predicates,
    cancel: &AtomicBool,
    batch_size: usize,
    emit: &mut impl FnMut(MatchBatch),
) -> Result<usize, LogSearchError> {
    let path = numbered_path(dir, category, file_no);
    let file = File::open(&path).map_err(|source| LogSearchError::Open { path: path.clone(), source })?;
    if file.metadata().map(|m| m.len()).unwrap_or(0) == 0 {
        return Ok(0);
    }
    // SAFETY: `file` is a regular, locally-owned log file opened read-only
    // above; the mapping is dropped at the end of this function before
    // `file` itself goes out of scope, and nothing else in this process
    // truncates a rotated log file while a search holds it open.
    let mmap = unsafe { Mmap::map(&file) }.map_err(|source| LogSearchError::Map { path: path.clone(), source })?;
    let data: &[u8] = &mmap;
    let index = LineIndex::build(data);

    let start = search_time(data, &index, window.start);
    let mut matched = 0usize;
    let mut batch = Vec::with_capacity(batch_size.min(DEFAULT_BATCH_SIZE));
    for i in start..index.len() {
        if i % CANCEL_CHECK_INTERVAL == 0 && cancel.load(Ordering::Relaxed) {
            break;
        }
        let line = index.line(data, i);
        let Some(record) = ParsedRecord::parse(line) else { continue };
        if record.timestamp > window.end {
            break;
        }
        if !predicates.evaluate(&record) {
            continue;
        }
        matched += 1;
        batch.push(line.to_string());
        if batch.len() >= batch_size {
            emit(MatchBatch { file_no, lines: std::mem::take(&mut batch) });
        }
    }
    if !batch.is_empty() {
        emit(MatchBatch { file_no, lines: batch });
    }
    Ok(matched)
}

/// Shared, cloneable cancellation flag a caller hands to [`search`] and can
/// flip from another thread (e.g. a UI's "stop" button).
#[must_use]
pub fn new_cancel_flag() -> Arc<AtomicBool> {
    Arc::new(AtomicBool::new(false))
}
