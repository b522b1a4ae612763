//! Three-letter delete reason codes written into the delete-log.

use std::fmt;

/// Why a file was removed from a directory or a pool directory without being sent.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
#[non_exhaustive]
pub enum DeleteReason {
    /// Unrecognized file, aged out of an input directory.
    AgeInput,
    /// Recognized but queued (host paused), aged out.
    AgeOutput,
    /// An operator or external tool deleted the file.
    UserDel,
    /// Catch-all: fatal worker failure, configuration inconsistency.
    OtherDel,
    /// A second worker found the file already in flight on the same host.
    FileCurrentlyTransmitted,
}

impl DeleteReason {
    /// Returns the fixed 3-character code rendered in the delete-log.
    ///
    /// `FILE_CURRENTLY_TRANSMITTED` does not fit the 3-letter convention used by
    /// the others; it is rendered as its full upstream name for readability,
    /// matching how the original tool special-cased this one reason.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::AgeInput => "AGE_INPUT",
            Self::AgeOutput => "AGE_OUTPUT",
            Self::UserDel => "USER_DEL",
            Self::OtherDel => "OTHER_DEL",
            Self::FileCurrentlyTransmitted => "FILE_CURRENTLY_TRANSMITTED",
        }
    }
}

impl fmt::Display for DeleteReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_round_trip_through_display() {
        for reason in [
            DeleteReason::AgeInput,
            DeleteReason::AgeOutput,
            DeleteReason::UserDel,
            DeleteReason::OtherDel,
            DeleteReason::FileCurrentlyTransmitted,
        ] {
            assert_eq!(reason.to_string(), reason.code());
        }
    }
}
