//! Output stage: the sequencing and transmission side of the data plane.
//!
//! An [`OutputStage`] sits between operator user code and a multiplexed
//! [`ChannelWriter`]. It stamps transport metadata onto every element
//! (send-time sequencing, the dedup counter, epoch assignment), encodes
//! the stamped element through the wire codec, and hands the frame to
//! the writer using the transmission policy of the element's kind:
//!
//! | Kind            | Policy                                    |
//! |-----------------|-------------------------------------------|
//! | Record          | unicast, writer-selected partition        |
//! | Watermark       | broadcast, withheld while the stream idles|
//! | Latency marker  | one randomly selected channel             |
//! | Stream status   | broadcast, unconditional                  |
//! | Epoch marker    | broadcast, unconditional                  |
//!
//! Each stage owns exactly one logical channel (the main output or one
//! side output) and is driven by a single task thread. The
//! [`InterceptorChain`] lets operator hooks observe stamped elements
//! before transmission.

pub mod chain;
pub mod error;
pub mod gauge;
pub mod stage;
pub mod writer;

pub use chain::{ChainAction, Interceptor, InterceptorChain};
pub use error::{StageError, StageResult};
pub use gauge::{StageSummary, SummarySnapshot, WatermarkGauge};
pub use stage::OutputStage;
pub use writer::ChannelWriter;

use crate::element::StreamStatus;
use crate::types::OutputTag;
use serde::{Deserialize, Serialize};

/// Static configuration for one output stage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputStageConfig {
    /// Side-output tag this stage serves, or `None` for the main channel.
    #[serde(default)]
    pub side_output: Option<OutputTag>,
    /// Whether the owning task is a source. Sources stamp send-times
    /// from the shared monotonic clock and treat a clock stall as fatal.
    #[serde(default)]
    pub is_source: bool,
}

impl OutputStageConfig {
    /// Configuration for a main-channel stage on a non-source task.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the owning task as a source.
    #[must_use]
    pub fn as_source(mut self) -> Self {
        self.is_source = true;
        self
    }

    /// Dedicate this stage to the given side-output channel.
    #[must_use]
    pub fn with_side_output(mut self, tag: OutputTag) -> Self {
        self.side_output = Some(tag);
        self
    }
}

/// Source of the current stream-activity status, consulted at watermark
/// transmission time.
///
/// The status is owned by the task's input side; the output stage only
/// reads it.
pub trait StreamStatusProvider: Send + Sync {
    /// The stream's current activity status.
    fn stream_status(&self) -> StreamStatus;
}

/// A provider that always reports the same status. Sources that never
/// idle use this; tests script it.
#[derive(Debug, Clone, Copy)]
pub struct ConstantStatus(StreamStatus);

impl ConstantStatus {
    /// Create a provider pinned to the given status.
    #[must_use]
    pub const fn new(status: StreamStatus) -> Self {
        Self(status)
    }
}

impl StreamStatusProvider for ConstantStatus {
    fn stream_status(&self) -> StreamStatus {
        self.0
    }
}
