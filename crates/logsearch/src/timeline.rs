//! Locating the byte offset of the first record at or after a timestamp,
//! inside one already-mapped log file, without scanning every line.
//!
//! Records are append-only and monotonically non-decreasing in timestamp
//! within a single rotated file (a writer never back-dates a line), so the
//! search is a branchless binary probe over the file's line index rather
//! than a linear scan — the same guarantee a numbered `category.N` file
//! gives [`crate::window::select_files`] at the file-selection level.

use crate::index::LineIndex;
use crate::record::ParsedRecord;

/// Returns the index of the first record whose timestamp is `>= target`,
/// or `index.len()` if every record precedes `target`.
#[must_use]
pub fn search_time(data: &[u8], index: &LineIndex, target: u64) -> usize {
    let mut lo = 0usize;
    let mut hi = index.len();
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        let line = index.line(data, mid);
        let timestamp = ParsedRecord::parse(line).map_or(0, |r| r.timestamp);
        if timestamp < target {
            lo = mid + 1;
        } else {
            hi = mid;
        }
    }
    lo
}

#[cfg(test)]
mod tests {
    use super::*;
    use logging::LogLine;

    fn build(timestamps: &[u64]) -> (Vec<u8>, LineIndex) {
        let mut data = Vec::new();
        let mut index = LineIndex::new();
        for &t in timestamps {
            let offset = data.len();
            let line = LogLine::new(t).field("x").render();
            data.extend_from_slice(line.as_bytes());
            index.push(offset, line.len());
        }
        (data, index)
    }

    #[test]
    fn finds_exact_match() {
        let (data, index) = build(&[10, 20, 30, 40]);
        assert_eq!(search_time(&data, &index, 30), 2);
    }

    #[test]
    fn finds_first_at_or_after_a_gap() {
        let (data, index) = build(&[10, 20, 40, 50]);
        assert_eq!(search_time(&data, &index, 30), 2);
    }

    #[test]
    fn target_after_everything_returns_len() {
        let (data, index) = build(&[10, 20]);
        assert_eq!(search_time(&data, &index, 100), 2);
    }

    #[test]
    fn target_before_everything_returns_zero() {
        let (data, index) = build(&[10, 20]);
        assert_eq!(search_time(&data, &index, 1), 0);
    }

    #[test]
    fn empty_index_returns_zero() {
        let (data, index) = build(&[]);
        assert_eq!(search_time(&data, &index, 1), 0);
    }
}
