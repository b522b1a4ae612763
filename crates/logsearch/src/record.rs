//! Splitting one rendered [`logging::LogLine`] back into its timestamp and
//! `SEPARATOR`-delimited fields.
//!
//! No writer in this codebase has yet settled a fixed column layout for the
//! transfer, receive, or input categories beyond "host, file name, size,
//! ..." (only the delete log's `host_and_reason` column is nailed down).
//! `ParsedRecord` therefore exposes both raw indexed field access and a
//! handful of named accessors for the columns every non-delete category is
//! expected to share; a future writer that adds columns only needs to
//! start passing more fields, not restructure this parser.

use logging::LogCategory;

use afd_core::DeleteReason;

/// One decoded line: its Unix-second timestamp and the fields after it.
#[derive(Clone, Debug)]
pub struct ParsedRecord<'a> {
    pub timestamp: u64,
    fields: Vec<&'a str>,
}

impl<'a> ParsedRecord<'a> {
    /// Parses one line of the form `{10-hex-digit timestamp} {fields}`.
    /// Returns `None` for a line too short to carry a timestamp prefix, or
    /// non-hex where the prefix should be.
    #[must_use]
    pub fn parse(line: &'a str) -> Option<Self> {
        let line = line.strip_suffix('\n').unwrap_or(line);
        let (prefix, rest) = line.split_at_checked(10)?;
        let timestamp = u64::from_str_radix(prefix, 16).ok()?;
        let payload = rest.strip_prefix(' ').unwrap_or(rest);
        let fields = payload.split(logging::SEPARATOR).collect();
        Some(Self { timestamp, fields })
    }

    #[must_use]
    pub fn field(&self, index: usize) -> Option<&'a str> {
        self.fields.get(index).copied()
    }

    /// For [`LogCategory::Delete`]: the 11-char host alias column, trimmed.
    #[must_use]
    pub fn delete_host(&self) -> Option<&'a str> {
        let column = self.field(0)?;
        column.get(..11).map(str::trim_end)
    }

    /// For [`LogCategory::Delete`]: the reason code suffix after the host column.
    #[must_use]
    pub fn delete_reason_code(&self) -> Option<&'a str> {
        self.field(0)?.get(11..)
    }

    #[must_use]
    pub fn matches_reason(&self, reason: DeleteReason) -> bool {
        self.delete_reason_code() == Some(reason.code())
    }

    /// Host alias column for the non-delete categories (field 0).
    #[must_use]
    pub fn host(&self) -> Option<&'a str> {
        self.field(0)
    }

    /// File name column (field 1) for categories that transfer files:
    /// [`LogCategory::Transfer`], [`LogCategory::Receive`], [`LogCategory::Input`].
    #[must_use]
    pub fn file_name(&self) -> Option<&'a str> {
        self.field(1)
    }

    /// File size column (field 2), parsed as a byte count.
    #[must_use]
    pub fn size(&self) -> Option<u64> {
        self.field(2)?.parse().ok()
    }

    /// Recipient/job column (field 3), present on transfer-shaped records.
    #[must_use]
    pub fn recipient(&self) -> Option<&'a str> {
        self.field(3)
    }

    /// Source or pool directory column (field 4).
    #[must_use]
    pub fn directory(&self) -> Option<&'a str> {
        self.field(4)
    }
}

/// True when `category` is one of the file-transfer-shaped categories
/// `host_name()`/`file_name()`/`size()`/`recipient()`/`directory()` assume.
#[must_use]
pub const fn is_transfer_shaped(category: LogCategory) -> bool {
    matches!(category, LogCategory::Transfer | LogCategory::Receive | LogCategory::Input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use logging::LogLine;

    #[test]
    fn round_trips_a_plain_field_line() {
        let rendered = LogLine::new(0x1234).field("h1").field("a.txt").field("42").render();
        let parsed = ParsedRecord::parse(&rendered).unwrap();
        assert_eq!(parsed.timestamp, 0x1234);
        assert_eq!(parsed.host(), Some("h1"));
        assert_eq!(parsed.file_name(), Some("a.txt"));
        assert_eq!(parsed.size(), Some(42));
    }

    #[test]
    fn decodes_the_delete_log_compound_column() {
        let rendered = LogLine::new(1).host_and_reason("h1", DeleteReason::AgeOutput).field("withheld.dat").render();
        let parsed = ParsedRecord::parse(&rendered).unwrap();
        assert_eq!(parsed.delete_host(), Some("h1"));
        assert!(parsed.matches_reason(DeleteReason::AgeOutput));
        assert_eq!(parsed.field(1), Some("withheld.dat"));
    }

    #[test]
    fn a_short_line_fails_to_parse() {
        assert!(ParsedRecord::parse("abc").is_none());
    }

    #[test]
    fn transfer_receive_and_input_are_transfer_shaped() {
        assert!(is_transfer_shaped(LogCategory::Transfer));
        assert!(is_transfer_shaped(LogCategory::Receive));
        assert!(is_transfer_shaped(LogCategory::Input));
        assert!(!is_transfer_shaped(LogCategory::Delete));
    }
}
