//! Line index built once per mapped file: the byte offset and length of
//! every newline-terminated record, grown in fixed-size chunks so scanning
//! a multi-gigabyte log doesn't repeatedly reallocate one `Vec`.

/// Entries are appended `CHUNK_SIZE` at a time to bound reallocation churn
/// while indexing a large rotated file.
const CHUNK_SIZE: usize = 1024;

#[derive(Clone, Copy, Debug)]
struct Entry {
    offset: usize,
    len: usize,
}

/// A flat, chunk-grown table of `(offset, len)` pairs, one per line.
#[derive(Debug, Default)]
pub struct LineIndex {
    entries: Vec<Entry>,
}

impl LineIndex {
    #[must_use]
    pub fn new() -> Self {
        Self { entries: Vec::with_capacity(CHUNK_SIZE) }
    }

    /// Scans `data` for `\n`-terminated lines and builds a full index.
    #[must_use]
    pub fn build(data: &[u8]) -> Self {
        let mut index = Self::new();
        let mut offset = 0usize;
        for line in data.split_inclusive(|&b| b == b'\n') {
            if line.last() != Some(&b'\n') {
                break;
            }
            index.push(offset, line.len());
            offset += line.len();
        }
        index
    }

    pub fn push(&mut self, offset: usize, len: usize) {
        if self.entries.len() == self.entries.capacity() {
            self.entries.reserve(CHUNK_SIZE);
        }
        self.entries.push(Entry { offset, len });
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The raw bytes of line `i`, trailing newline included.
    #[must_use]
    pub fn line_bytes<'a>(&self, data: &'a [u8], i: usize) -> &'a [u8] {
        let entry = self.entries[i];
        &data[entry.offset..entry.offset + entry.len]
    }

    /// The line as `str`, trailing newline stripped. Malformed (non-UTF-8)
    /// lines are reported as empty rather than panicking; a log line is
    /// always producer-generated ASCII, so this only guards against a
    /// corrupt or truncated file.
    #[must_use]
    pub fn line<'a>(&self, data: &'a [u8], i: usize) -> &'a str {
        std::str::from_utf8(self.line_bytes(data, i)).unwrap_or("").trim_end_matches('\n')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_indexes_each_newline_terminated_line() {
        let data = b"aaa\nbb\ncccc\n";
        let index = LineIndex::build(data);
        assert_eq!(index.len(), 3);
        assert_eq!(index.line(data, 0), "aaa");
        assert_eq!(index.line(data, 1), "bb");
        assert_eq!(index.line(data, 2), "cccc");
    }

    #[test]
    fn build_ignores_a_trailing_partial_line() {
        let data = b"aaa\nbb";
        let index = LineIndex::build(data);
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn empty_data_yields_an_empty_index() {
        let index = LineIndex::build(b"");
        assert!(index.is_empty());
    }

    #[test]
    fn growth_past_one_chunk_preserves_all_entries() {
        let mut data = Vec::new();
        let mut expected = 0usize;
        for i in 0..(CHUNK_SIZE * 2 + 5) {
            data.extend_from_slice(format!("{i}\n").as_bytes());
            expected += 1;
        }
        let index = LineIndex::build(&data);
        assert_eq!(index.len(), expected);
        assert_eq!(index.line(&data, expected - 1), (expected - 1).to_string());
    }
}
