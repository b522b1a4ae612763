//! The line format shared by every log category.

use afd_core::DeleteReason;

use crate::SEPARATOR;

/// Width, in characters, of the fixed host-name column used by categories
/// that pair a host alias with a short code (the delete log's
/// `host_name:11 chars + reason:3 chars` column from the byte layout).
const HOST_COLUMN_WIDTH: usize = 11;

/// One log line under construction: a hex timestamp followed by
/// `SEPARATOR`-joined fields.
#[derive(Clone, Debug)]
pub struct LogLine {
    timestamp: u64,
    fields: Vec<String>,
}

impl LogLine {
    /// Starts a new line stamped with `timestamp` (Unix seconds).
    #[must_use]
    pub const fn new(timestamp: u64) -> Self {
        Self {
            timestamp,
            fields: Vec::new(),
        }
    }

    /// Formats `timestamp` as the fixed-width lowercase hex prefix every
    /// category shares. This is the only routine allowed to produce that
    /// prefix, so the log search engine's binary search stays valid for
    /// every category.
    #[must_use]
    pub fn timestamp_prefix(timestamp: u64) -> String {
        format!("{timestamp:010x}")
    }

    /// Appends a plain field.
    #[must_use]
    pub fn field(mut self, value: impl Into<String>) -> Self {
        self.fields.push(value.into());
        self
    }

    /// Appends the compound `host_name:11 chars + reason:3 chars` column
    /// used by the delete log. A host alias longer than
    /// [`HOST_COLUMN_WIDTH`] is truncated rather than widening the column,
    /// matching the fixed byte layout the search engine's delete-log
    /// specialization relies on.
    #[must_use]
    pub fn host_and_reason(self, host_alias: &str, reason: DeleteReason) -> Self {
        let mut column = format!("{host_alias:<HOST_COLUMN_WIDTH$}");
        column.truncate(HOST_COLUMN_WIDTH);
        column.push_str(reason.code());
        self.field(column)
    }

    /// The fields joined by [`SEPARATOR`], excluding the timestamp. This is
    /// what [`crate::dedup::DuplicateCoalescer`] compares between
    /// consecutive records: the timestamp always differs, the payload often
    /// doesn't.
    #[must_use]
    pub fn payload(&self) -> String {
        self.fields.join(&SEPARATOR.to_string())
    }

    /// Renders the complete, newline-terminated line.
    #[must_use]
    pub fn render(&self) -> String {
        let mut line = Self::timestamp_prefix(self.timestamp);
        line.push(' ');
        line.push_str(&self.payload());
        line.push('\n');
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_prefix_is_ten_char_lowercase_hex() {
        let prefix = LogLine::timestamp_prefix(0x1234_5678);
        assert_eq!(prefix.len(), 10);
        assert_eq!(prefix, "0012345678");
    }

    #[test]
    fn render_joins_fields_with_separator_after_timestamp() {
        let line = LogLine::new(1).field("alpha").field("beta").render();
        assert_eq!(line, "0000000001 alpha|beta\n");
    }

    #[test]
    fn host_and_reason_pads_short_alias_to_fixed_width() {
        let line = LogLine::new(1).host_and_reason("h1", DeleteReason::AgeOutput).render();
        assert!(line.contains("h1         AGE_OUTPUT"));
    }

    #[test]
    fn host_and_reason_truncates_long_alias() {
        let line = LogLine::new(1)
            .host_and_reason("a-very-long-host-alias", DeleteReason::UserDel)
            .render();
        assert!(line.contains("a-very-long USER_DEL"));
    }

    #[test]
    fn payload_excludes_the_timestamp() {
        let line = LogLine::new(42).field("x");
        assert_eq!(line.payload(), "x");
        assert!(!line.render().starts_with("x"));
    }
}
