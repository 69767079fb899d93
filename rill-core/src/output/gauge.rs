//! Stage observability: the watermark gauge and emission counters.
//!
//! Both are plain atomics so a monitoring thread can poll them without
//! coordinating with the single-threaded stage.

use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::Arc;

/// The last watermark value emitted by a stage.
///
/// Clones share the same underlying cell; the stage keeps one clone and
/// hands others to whoever monitors it.
#[derive(Debug, Clone)]
pub struct WatermarkGauge {
    current: Arc<AtomicI64>,
}

impl WatermarkGauge {
    /// Create a gauge initialized to the minimum watermark.
    #[must_use]
    pub fn new() -> Self {
        Self { current: Arc::new(AtomicI64::new(i64::MIN)) }
    }

    /// Record a new watermark value.
    pub fn set(&self, timestamp: i64) {
        self.current.store(timestamp, Ordering::Relaxed);
    }

    /// The last recorded watermark value.
    #[must_use]
    pub fn current(&self) -> i64 {
        self.current.load(Ordering::Relaxed)
    }
}

impl Default for WatermarkGauge {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-stage emission counters, grouped by element kind.
#[derive(Debug, Default)]
pub struct StageSummary {
    records: AtomicU64,
    watermarks: AtomicU64,
    latency_markers: AtomicU64,
    status_signals: AtomicU64,
    epoch_markers: AtomicU64,
    corrections: AtomicU64,
}

impl StageSummary {
    pub(crate) fn record_stamped(&self) {
        self.records.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn watermark_stamped(&self) {
        self.watermarks.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn latency_marker_stamped(&self) {
        self.latency_markers.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn status_stamped(&self) {
        self.status_signals.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn epoch_marker_stamped(&self) {
        self.epoch_markers.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn correction_applied(&self) {
        self.corrections.fetch_add(1, Ordering::Relaxed);
    }

    /// Take a consistent-enough snapshot of all counters.
    #[must_use]
    pub fn snapshot(&self) -> SummarySnapshot {
        SummarySnapshot {
            records: self.records.load(Ordering::Relaxed),
            watermarks: self.watermarks.load(Ordering::Relaxed),
            latency_markers: self.latency_markers.load(Ordering::Relaxed),
            status_signals: self.status_signals.load(Ordering::Relaxed),
            epoch_markers: self.epoch_markers.load(Ordering::Relaxed),
            corrections: self.corrections.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time view of a stage's emission counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SummarySnapshot {
    /// Records stamped.
    pub records: u64,
    /// Watermarks stamped (including those withheld while idle).
    pub watermarks: u64,
    /// Latency markers stamped.
    pub latency_markers: u64,
    /// Stream-status signals stamped.
    pub status_signals: u64,
    /// Epoch markers stamped.
    pub epoch_markers: u64,
    /// Forwarding-mode timestamp corrections applied.
    pub corrections: u64,
}

impl SummarySnapshot {
    /// Total elements stamped across all kinds.
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.records
            + self.watermarks
            + self.latency_markers
            + self.status_signals
            + self.epoch_markers
    }
}
