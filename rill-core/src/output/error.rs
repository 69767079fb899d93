//! Output-stage error types.

use crate::wire::WireError;
use thiserror::Error;

/// Errors raised by an output stage.
///
/// The stage performs no local suppression or retry: every failure it
/// cannot structurally prevent is surfaced to the caller verbatim, and
/// fatal failures abort the owning task.
#[derive(Error, Debug)]
pub enum StageError {
    /// A source stage observed a non-increasing monotonic clock reading.
    /// This is an engine-level defect, not a data error; the stage is
    /// poisoned and the owning task must abort.
    #[error("send timestamps are not strictly monotonic: previous {previous}, next {next}")]
    NonMonotonicClock {
        /// The previously stamped send-time.
        previous: i64,
        /// The offending clock reading.
        next: i64,
    },

    /// The stage was used after a fatal monotonicity failure.
    #[error("output stage poisoned by an earlier monotonicity failure")]
    Poisoned,

    /// The wire codec rejected an element.
    #[error("wire codec error: {0}")]
    Wire(#[from] WireError),

    /// The channel writer failed; the cause is propagated unchanged.
    /// Retry and backoff policy belong to the owning task's recovery
    /// layer, not to the sequencer.
    #[error("channel writer error: {0}")]
    Writer(#[from] std::io::Error),
}

/// Result type for output-stage operations.
pub type StageResult<T> = std::result::Result<T, StageError>;

impl StageError {
    /// Whether this failure must abort the owning task.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::NonMonotonicClock { .. } | Self::Poisoned)
    }
}
