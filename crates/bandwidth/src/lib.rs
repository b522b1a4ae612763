#![deny(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! Token-bucket pacing for a host's per-process transfer rate limit (§4.5,
//! "Rate limiting"). A transfer worker registers each block it writes; the
//! limiter sleeps just enough to keep the observed throughput at or below the
//! configured bytes-per-second rate.
//!
//! # Design
//!
//! The algorithm accumulates a byte "debt" on every [`BandwidthLimiter::register`]
//! call and converts it to a sleep duration once the debt implies a pause
//! longer than [`MINIMUM_SLEEP_MICROS`], coalescing short bursts instead of
//! sleeping on every single write.

use std::num::NonZeroU64;
use std::time::{Duration, Instant};

const MICROS_PER_SECOND: u128 = 1_000_000;
const MINIMUM_SLEEP_MICROS: u128 = MICROS_PER_SECOND / 10;
const MAX_REPRESENTABLE_MICROSECONDS: u128 =
    (u64::MAX as u128) * MICROS_PER_SECOND + (MICROS_PER_SECOND - 1);
const MAX_SLEEP_DURATION: Duration = Duration::new(i64::MAX as u64, 999_999_999);
const MIN_WRITE_MAX: usize = 512;

/// Result of a single [`BandwidthLimiter::register`] call.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[must_use]
pub struct LimiterSleep {
    requested: Duration,
    actual: Duration,
}

impl LimiterSleep {
    /// Amount of time the limiter attempted to sleep.
    #[must_use]
    pub const fn requested(&self) -> Duration {
        self.requested
    }

    /// Time actually observed by the limiter around the sleep.
    #[must_use]
    pub const fn actual(&self) -> Duration {
        self.actual
    }

    /// `true` when the limiter skipped sleeping altogether.
    #[must_use]
    pub const fn is_noop(&self) -> bool {
        self.requested.is_zero() && self.actual.is_zero()
    }
}

fn duration_from_microseconds(us: u128) -> Duration {
    if us == 0 {
        return Duration::ZERO;
    }
    if us > MAX_REPRESENTABLE_MICROSECONDS {
        return Duration::MAX;
    }
    let seconds = (us / MICROS_PER_SECOND) as u64;
    let micros = (us % MICROS_PER_SECOND) as u32;
    Duration::new(seconds, micros.saturating_mul(1_000))
}

/// Sleeps for `duration`, chunked below the platform's maximum sleep.
///
/// Test builds skip the actual sleep so unit tests stay fast; the pacing math
/// is exercised without paying for real wall-clock delay.
fn sleep_for(duration: Duration) {
    #[cfg(test)]
    {
        let _ = duration;
        return;
    }
    #[cfg(not(test))]
    {
        let mut remaining = duration;
        while !remaining.is_zero() {
            let chunk = remaining.min(MAX_SLEEP_DURATION);
            std::thread::sleep(chunk);
            remaining = remaining.saturating_sub(chunk);
        }
    }
}

fn calculate_write_max(limit: NonZeroU64) -> usize {
    let kib = if limit.get() < 1024 { 1 } else { limit.get() / 1024 };
    let base = u128::from(kib).saturating_mul(128).max(MIN_WRITE_MAX as u128);
    (base.min(usize::MAX as u128) as usize).max(MIN_WRITE_MAX)
}

/// Token-bucket limiter bounding a worker's outbound write rate to one host.
#[derive(Clone, Debug)]
pub struct BandwidthLimiter {
    limit_bytes: NonZeroU64,
    write_max: usize,
    total_written: u128,
    last_instant: Option<Instant>,
    simulated_elapsed_us: u128,
}

impl BandwidthLimiter {
    /// Constructs a limiter pacing writes to `limit` bytes per second.
    #[must_use]
    pub fn new(limit: NonZeroU64) -> Self {
        Self {
            limit_bytes: limit,
            write_max: calculate_write_max(limit),
            total_written: 0,
            last_instant: None,
            simulated_elapsed_us: 0,
        }
    }

    /// Configured rate, in bytes per second.
    #[must_use]
    pub const fn limit_bytes(&self) -> NonZeroU64 {
        self.limit_bytes
    }

    /// Largest chunk the caller should write before calling [`Self::register`]
    /// again, sized so bursts don't overshoot the rate before pacing kicks in.
    #[must_use]
    pub fn recommended_block_size(&self, buffer_len: usize) -> usize {
        buffer_len.min(self.write_max.max(1))
    }

    /// Records a completed write and sleeps if accumulated debt requires it.
    pub fn register(&mut self, bytes: usize) -> LimiterSleep {
        if bytes == 0 {
            return LimiterSleep::default();
        }

        self.total_written = self.total_written.saturating_add(bytes as u128);

        let start = Instant::now();
        let bytes_per_second = u128::from(self.limit_bytes.get());

        let mut elapsed_us = self.simulated_elapsed_us;
        if let Some(previous) = self.last_instant {
            elapsed_us = elapsed_us.saturating_add(start.duration_since(previous).as_micros());
        }
        self.simulated_elapsed_us = 0;

        if elapsed_us > 0 {
            let allowed = elapsed_us.saturating_mul(bytes_per_second) / MICROS_PER_SECOND;
            self.total_written = self.total_written.saturating_sub(allowed.min(self.total_written));
        }

        let sleep_us = self.total_written.saturating_mul(MICROS_PER_SECOND) / bytes_per_second;

        if sleep_us < MINIMUM_SLEEP_MICROS {
            self.last_instant = Some(start);
            return LimiterSleep::default();
        }

        let requested = duration_from_microseconds(sleep_us);
        if !requested.is_zero() {
            sleep_for(requested);
        }

        let end = Instant::now();
        let elapsed_us = end
            .checked_duration_since(start)
            .map_or(0, |d| d.as_micros());
        if sleep_us > elapsed_us {
            self.simulated_elapsed_us = sleep_us - elapsed_us;
        }
        let leftover_us = sleep_us.saturating_sub(elapsed_us);
        self.total_written = leftover_us.saturating_mul(bytes_per_second) / MICROS_PER_SECOND;
        self.last_instant = Some(end);

        LimiterSleep {
            requested,
            actual: Duration::from_micros(elapsed_us.min(u128::from(u64::MAX)) as u64),
        }
    }
}
