//! # Prelude
//!
//! Convenient access to the types most callers of the output data plane
//! need.

pub use crate::{
    element::{
        EndOfEpochMarker, LatencyMarker, SequencedElement, StreamElement, StreamRecord,
        StreamStatus, TransportMeta, Watermark,
    },
    error::{Error, Result},
    output::{
        ChainAction, ChannelWriter, Interceptor, InterceptorChain, OutputStage,
        OutputStageConfig, StageError, StreamStatusProvider, WatermarkGauge,
    },
    time::{MonotonicClock, SystemMonotonicClock, TaskClock},
    types::{OperatorId, OutputTag, MAX_TIMESTAMP},
    wire::{BytesCodec, ElementCodec, ValueCodec, WireError},
};

// Re-export commonly used companion types
pub use bytes::{Bytes, BytesMut};
pub use uuid::Uuid;
