//! Pool directory naming: `<host>_<hex_time>_<hex_split>_<hex_unique>`.

use std::sync::atomic::{AtomicU64, Ordering};

/// Process-wide monotone source for a pool directory's unique component.
#[derive(Debug, Default)]
pub struct UniqueNumberGenerator(AtomicU64);

impl UniqueNumberGenerator {
    #[must_use]
    pub const fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    /// Returns the next unique number, starting at 0.
    pub fn next(&self) -> u64 {
        self.0.fetch_add(1, Ordering::Relaxed)
    }
}

/// The decoded components of a pool directory name.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PoolDirName {
    pub host_alias: String,
    pub creation_time: u64,
    pub split_job_counter: u32,
    pub unique_number: u64,
}

impl PoolDirName {
    /// Renders the `<host>_<hex_time>_<hex_split>_<hex_unique>` directory name.
    #[must_use]
    pub fn format(&self) -> String {
        format!(
            "{}_{:x}_{:x}_{:x}",
            self.host_alias, self.creation_time, self.split_job_counter, self.unique_number
        )
    }

    /// Parses a name previously produced by [`Self::format`].
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        let mut parts = name.rsplitn(4, '_');
        let unique_number = u64::from_str_radix(parts.next()?, 16).ok()?;
        let split_job_counter = u32::from_str_radix(parts.next()?, 16).ok()?;
        let creation_time = u64::from_str_radix(parts.next()?, 16).ok()?;
        let host_alias = parts.next()?.to_string();
        if parts.next().is_some() {
            return None;
        }
        Some(Self {
            host_alias,
            creation_time,
            split_job_counter,
            unique_number,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_then_parse_round_trips() {
        let name = PoolDirName {
            host_alias: "h1".into(),
            creation_time: 0x6123_abcd,
            split_job_counter: 2,
            unique_number: 99,
        };
        let formatted = name.format();
        assert_eq!(PoolDirName::parse(&formatted), Some(name));
    }

    #[test]
    fn host_alias_containing_underscores_still_round_trips() {
        let name = PoolDirName {
            host_alias: "ftp_backup_site".into(),
            creation_time: 1,
            split_job_counter: 0,
            unique_number: 0,
        };
        assert_eq!(PoolDirName::parse(&name.format()), Some(name));
    }

    #[test]
    fn unique_numbers_are_monotone_and_start_at_zero() {
        let gen = UniqueNumberGenerator::new();
        assert_eq!(gen.next(), 0);
        assert_eq!(gen.next(), 1);
        assert_eq!(gen.next(), 2);
    }
}
