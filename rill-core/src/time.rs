//! Time oracles consumed by the output stage.
//!
//! The stage never owns a clock; both send-time sources are injected so
//! that tests can script exact timestamp sequences and so that the
//! process-wide monotonic reader stays a single shared instance.

use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Process-wide monotonic wall-clock reader.
///
/// Source stages stamp send-times from this oracle and require strict
/// monotonicity across consecutive reads.
pub trait MonotonicClock: Send + Sync {
    /// Current reading in nanoseconds.
    fn nanos(&self) -> i64;
}

/// Task-local candidate send-time, typically derived from the current
/// input record's own send-time. May regress; forwarding stages correct
/// regressions, source stages never consult this oracle.
pub trait TaskClock: Send + Sync {
    /// Candidate send-time for the element currently being emitted.
    fn out_ts(&self) -> i64;
}

/// Production monotonic clock: wall-clock nanoseconds, clamped so that
/// consecutive reads are strictly increasing process-wide.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemMonotonicClock;

static LAST_READING: AtomicI64 = AtomicI64::new(0);

impl SystemMonotonicClock {
    /// Create the production clock.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn wallclock_nanos() -> i64 {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_nanos());
        i64::try_from(nanos).unwrap_or(i64::MAX)
    }
}

impl MonotonicClock for SystemMonotonicClock {
    fn nanos(&self) -> i64 {
        let raw = Self::wallclock_nanos();
        let mut prev = LAST_READING.load(Ordering::Relaxed);
        loop {
            let next = if raw > prev { raw } else { prev + 1 };
            match LAST_READING.compare_exchange_weak(
                prev,
                next,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return next,
                Err(observed) => prev = observed,
            }
        }
    }
}
