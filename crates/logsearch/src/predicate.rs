//! Record filtering: the optional name/size/recipient/directory predicates
//! a search can combine.
//!
//! Rather than hand-specializing one evaluation path per combination of
//! the four optional filters, `Predicates::evaluate` short-circuits
//! through whichever are actually set. Each unset filter costs one `if
//! let None` check; a record is rejected as soon as any set filter fails,
//! so the skipped-work characteristics of a hand-specialized match arm
//! are preserved without the combinatorial blow-up of writing one out.

use crate::glob;
use crate::record::ParsedRecord;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SizeComparison {
    Exactly,
    AtLeast,
    AtMost,
}

impl SizeComparison {
    #[must_use]
    fn accepts(self, actual: u64, target: u64) -> bool {
        match self {
            Self::Exactly => actual == target,
            Self::AtLeast => actual >= target,
            Self::AtMost => actual <= target,
        }
    }
}

/// A size filter: `comparison` applied between a record's size and `bytes`.
#[derive(Clone, Copy, Debug)]
pub struct SizeFilter {
    pub comparison: SizeComparison,
    pub bytes: u64,
}

/// The optional filters a search combines; `None` means "don't filter on this".
#[derive(Clone, Debug, Default)]
pub struct Predicates {
    pub name_glob: Option<String>,
    pub size: Option<SizeFilter>,
    pub recipient: Option<String>,
    pub directory: Option<String>,
}

impl Predicates {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name_glob.is_none() && self.size.is_none() && self.recipient.is_none() && self.directory.is_none()
    }

    /// Whether `record` satisfies every predicate that is set.
    #[must_use]
    pub fn evaluate(&self, record: &ParsedRecord<'_>) -> bool {
        if let Some(pattern) = &self.name_glob {
            let Some(name) = record.file_name() else { return false };
            if !glob::matches(pattern, name) {
                return false;
            }
        }
        if let Some(filter) = &self.size {
            let Some(actual) = record.size() else { return false };
            if !filter.comparison.accepts(actual, filter.bytes) {
                return false;
            }
        }
        if let Some(wanted) = &self.recipient {
            if record.recipient() != Some(wanted.as_str()) {
                return false;
            }
        }
        if let Some(wanted) = &self.directory {
            if record.directory() != Some(wanted.as_str()) {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use logging::LogLine;

    fn record(line: &str) -> ParsedRecord<'_> {
        ParsedRecord::parse(line).unwrap()
    }

    #[test]
    fn empty_predicates_accept_everything() {
        let line = LogLine::new(1).field("h1").field("a.txt").field("10").render();
        assert!(Predicates::default().evaluate(&record(&line)));
    }

    #[test]
    fn name_glob_filters_by_file_name() {
        let line = LogLine::new(1).field("h1").field("a.txt").field("10").render();
        let predicates = Predicates { name_glob: Some("*.txt".into()), ..Predicates::default() };
        assert!(predicates.evaluate(&record(&line)));
        let predicates = Predicates { name_glob: Some("*.bin".into()), ..Predicates::default() };
        assert!(!predicates.evaluate(&record(&line)));
    }

    #[test]
    fn size_at_least_filters_out_smaller_records() {
        let line = LogLine::new(1).field("h1").field("a.txt").field("10").render();
        let predicates = Predicates { size: Some(SizeFilter { comparison: SizeComparison::AtLeast, bytes: 20 }), ..Predicates::default() };
        assert!(!predicates.evaluate(&record(&line)));
    }

    #[test]
    fn recipient_and_directory_both_must_match() {
        let line = LogLine::new(1).field("h1").field("a.txt").field("10").field("bob").field("/pool").render();
        let predicates = Predicates { recipient: Some("bob".into()), directory: Some("/pool".into()), ..Predicates::default() };
        assert!(predicates.evaluate(&record(&line)));
        let predicates = Predicates { recipient: Some("alice".into()), ..Predicates::default() };
        assert!(!predicates.evaluate(&record(&line)));
    }
}
