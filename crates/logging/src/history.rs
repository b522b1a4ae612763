//! The receive-log writer's 48-byte severity ring, held in shared memory.

use crate::severity::Severity;

/// One cell per hour, wrapping after two days.
pub const RING_LEN: usize = 48;

/// A view over a 48-byte shared-memory slice, one byte per one-hour bucket.
///
/// The bytes themselves live in the shared status area; this type only
/// knows how to compute bucket indices and merge severities into them. A
/// bucket holds the highest severity seen during its hour; writes never
/// downgrade a bucket, only [`LogHistoryRing::record`] with a higher
/// [`Severity`] or the wrap-around 48 hours later changes it. Because no
/// extra metadata records which wall-clock cycle last touched a bucket, a
/// bucket that saw no events this cycle keeps showing the previous cycle's
/// severity until something overwrites it; GUI tiles treat that as "no new
/// information", which matches what the ring is for.
pub struct LogHistoryRing<'a> {
    bytes: &'a mut [u8],
}

impl<'a> LogHistoryRing<'a> {
    /// Wraps a shared-memory slice. `bytes.len()` must be [`RING_LEN`].
    ///
    /// # Panics
    ///
    /// Panics if `bytes.len() != RING_LEN`; the caller owns layout sizing
    /// and a mismatch means the shared status area was built incorrectly.
    #[must_use]
    pub fn new(bytes: &'a mut [u8]) -> Self {
        assert_eq!(bytes.len(), RING_LEN, "log history ring must be {RING_LEN} bytes");
        Self { bytes }
    }

    /// Bucket index for a Unix timestamp.
    #[must_use]
    pub const fn bucket_index(timestamp: u64) -> usize {
        ((timestamp / 3600) % RING_LEN as u64) as usize
    }

    /// Merges `severity` into the bucket covering `timestamp`, keeping
    /// whichever of the existing and new value is higher.
    pub fn record(&mut self, timestamp: u64, severity: Severity) {
        let idx = Self::bucket_index(timestamp);
        let current = Severity::from_byte(self.bytes[idx]);
        if severity > current {
            self.bytes[idx] = severity.to_byte();
        }
    }

    /// The severity currently recorded for `timestamp`'s bucket.
    #[must_use]
    pub fn get(&self, timestamp: u64) -> Severity {
        Severity::from_byte(self.bytes[Self::bucket_index(timestamp)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_keeps_the_highest_severity_seen_in_a_bucket() {
        let mut backing = [0u8; RING_LEN];
        let mut ring = LogHistoryRing::new(&mut backing);
        ring.record(0, Severity::Warn);
        ring.record(1, Severity::Info);
        assert_eq!(ring.get(0), Severity::Warn);
    }

    #[test]
    fn higher_severity_overwrites_a_lower_one() {
        let mut backing = [0u8; RING_LEN];
        let mut ring = LogHistoryRing::new(&mut backing);
        ring.record(0, Severity::Info);
        ring.record(0, Severity::Fatal);
        assert_eq!(ring.get(0), Severity::Fatal);
    }

    #[test]
    fn bucket_index_wraps_after_forty_eight_hours() {
        let hour = 3600;
        assert_eq!(LogHistoryRing::bucket_index(0), LogHistoryRing::bucket_index(48 * hour));
    }

    #[test]
    #[should_panic(expected = "48 bytes")]
    fn wrong_sized_backing_slice_panics() {
        let mut backing = [0u8; 10];
        let _ = LogHistoryRing::new(&mut backing);
    }
}
