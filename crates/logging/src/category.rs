//! The seven named log categories, each owned by one writer task.

use std::fmt;

/// One of the seven record streams producers write into.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum LogCategory {
    /// Process lifecycle, configuration reloads, and internal faults.
    System,
    /// One record per file successfully handed off to a remote host.
    Transfer,
    /// Verbose per-block transfer tracing, enabled separately from `Transfer`.
    TransferDebug,
    /// Inbound-side equivalent of `Transfer`, also backs the log history ring.
    Receive,
    /// One record per file admitted into a pool directory by AMG.
    Input,
    /// Deprecated alias retained for files that still reference legacy output logs.
    Output,
    /// One record per file removed without being sent, with a delete reason code.
    Delete,
}

impl LogCategory {
    /// All seven categories, in the order the specification lists them.
    pub const ALL: [Self; 7] = [
        Self::System,
        Self::Transfer,
        Self::TransferDebug,
        Self::Receive,
        Self::Input,
        Self::Output,
        Self::Delete,
    ];

    /// The base file name this category rotates, e.g. `transfer_log`.
    #[must_use]
    pub const fn file_stem(self) -> &'static str {
        match self {
            Self::System => "system_log",
            Self::Transfer => "transfer_log",
            Self::TransferDebug => "transfer_debug_log",
            Self::Receive => "receive_log",
            Self::Input => "input_log",
            Self::Output => "output_log",
            Self::Delete => "delete_log",
        }
    }

    /// Whether this category suppresses runs of byte-identical records.
    #[must_use]
    pub const fn coalesces_duplicates(self) -> bool {
        matches!(self, Self::Transfer | Self::Receive)
    }
}

impl fmt::Display for LogCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_stem())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_transfer_and_receive_coalesce() {
        for category in LogCategory::ALL {
            let expected = matches!(category, LogCategory::Transfer | LogCategory::Receive);
            assert_eq!(category.coalesces_duplicates(), expected);
        }
    }

    #[test]
    fn file_stems_are_unique() {
        let mut stems: Vec<&str> = LogCategory::ALL.iter().map(|c| c.file_stem()).collect();
        stems.sort_unstable();
        stems.dedup();
        assert_eq!(stems.len(), LogCategory::ALL.len());
    }
}
