//! Stream element model: the tagged-variant data carried through the
//! output data plane, plus the transport metadata stamped onto every
//! element before transmission.

use crate::types::OperatorId;
use std::fmt;

/// A data record flowing through the pipeline.
///
/// The event-time timestamp is optional; its presence selects the wire
/// tag used by the codec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamRecord<T> {
    /// The business payload.
    pub value: T,
    /// Event-time timestamp, if one has been assigned.
    pub timestamp: Option<i64>,
}

impl<T> StreamRecord<T> {
    /// Create a record without an event-time timestamp.
    #[must_use]
    pub const fn new(value: T) -> Self {
        Self { value, timestamp: None }
    }

    /// Create a record with an event-time timestamp.
    #[must_use]
    pub const fn with_timestamp(value: T, timestamp: i64) -> Self {
        Self { value, timestamp: Some(timestamp) }
    }

    /// Whether this record carries an event-time timestamp.
    #[must_use]
    pub const fn has_timestamp(&self) -> bool {
        self.timestamp.is_some()
    }
}

/// A progress marker asserting that no further elements with event time
/// below its value will arrive on the channel. Immutable once created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Watermark(i64);

impl Watermark {
    /// The smallest possible watermark.
    pub const MIN: Self = Self(i64::MIN);

    /// The largest possible watermark, signalling end of event time.
    pub const MAX: Self = Self(i64::MAX);

    /// Create a watermark for the given event time.
    #[must_use]
    pub const fn new(timestamp: i64) -> Self {
        Self(timestamp)
    }

    /// Get the watermark's event-time value.
    #[must_use]
    pub const fn timestamp(self) -> i64 {
        self.0
    }
}

impl fmt::Display for Watermark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Watermark({})", self.0)
    }
}

/// A latency probe injected at a source and sampled along one arbitrary
/// downstream path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LatencyMarker {
    /// Wall-clock time at which the marker was created.
    pub marked_time: i64,
    /// Identifier of the operator that created the marker.
    pub operator_id: OperatorId,
    /// Subtask index of the creating operator instance.
    pub subtask_index: i32,
}

impl LatencyMarker {
    /// Create a new latency marker.
    #[must_use]
    pub const fn new(marked_time: i64, operator_id: OperatorId, subtask_index: i32) -> Self {
        Self { marked_time, operator_id, subtask_index }
    }
}

/// Stream-activity signal.
///
/// The code is kept raw so that any value observed on the wire
/// round-trips unchanged; the two well-known codes have named
/// constructors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StreamStatus(i32);

impl StreamStatus {
    /// Status code for an active stream.
    pub const ACTIVE: Self = Self(0);

    /// Status code for an idle stream.
    pub const IDLE: Self = Self(-1);

    /// Create a status from a raw code.
    #[must_use]
    pub const fn from_code(code: i32) -> Self {
        Self(code)
    }

    /// Get the raw status code.
    #[must_use]
    pub const fn code(self) -> i32 {
        self.0
    }

    /// Whether the stream is active.
    #[must_use]
    pub const fn is_active(self) -> bool {
        self.0 == Self::ACTIVE.0
    }

    /// Whether the stream is idle.
    #[must_use]
    pub const fn is_idle(self) -> bool {
        self.0 == Self::IDLE.0
    }
}

/// Marker closing a logical batch of elements.
///
/// The epoch number is assigned by the transmitting stage at stamping
/// time; the value supplied at construction is a placeholder until then.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EndOfEpochMarker {
    /// The epoch this marker closes.
    pub epoch: i64,
}

impl EndOfEpochMarker {
    /// Create a marker; the epoch is filled in by the stamping stage.
    #[must_use]
    pub const fn new() -> Self {
        Self { epoch: 0 }
    }
}

/// The tagged union of everything that travels on an output channel.
///
/// The enum is closed on purpose: every consumption site (stamping,
/// encoding, decoding, transmission-policy selection) matches
/// exhaustively, so an unhandled element kind is a compile error rather
/// than a runtime cast failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamElement<T> {
    /// A data record.
    Record(StreamRecord<T>),
    /// An event-time progress marker.
    Watermark(Watermark),
    /// A latency probe.
    LatencyMarker(LatencyMarker),
    /// A stream-activity signal.
    Status(StreamStatus),
    /// An epoch-boundary marker.
    EpochMarker(EndOfEpochMarker),
}

impl<T> StreamElement<T> {
    /// Short name of the element kind, for logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Record(_) => "record",
            Self::Watermark(_) => "watermark",
            Self::LatencyMarker(_) => "latency-marker",
            Self::Status(_) => "stream-status",
            Self::EpochMarker(_) => "epoch-marker",
        }
    }

    /// Whether this is a data record.
    #[must_use]
    pub const fn is_record(&self) -> bool {
        matches!(self, Self::Record(_))
    }
}

impl<T> From<StreamRecord<T>> for StreamElement<T> {
    fn from(record: StreamRecord<T>) -> Self {
        Self::Record(record)
    }
}

impl<T> From<Watermark> for StreamElement<T> {
    fn from(mark: Watermark) -> Self {
        Self::Watermark(mark)
    }
}

impl<T> From<LatencyMarker> for StreamElement<T> {
    fn from(marker: LatencyMarker) -> Self {
        Self::LatencyMarker(marker)
    }
}

impl<T> From<StreamStatus> for StreamElement<T> {
    fn from(status: StreamStatus) -> Self {
        Self::Status(status)
    }
}

impl<T> From<EndOfEpochMarker> for StreamElement<T> {
    fn from(marker: EndOfEpochMarker) -> Self {
        Self::EpochMarker(marker)
    }
}

/// Transport metadata stamped onto an element by the output stage that
/// first transmits it.
///
/// A stamp is written exactly once; the stamped element is immutable for
/// the remainder of its life.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TransportMeta {
    /// Send-time assigned by the transmitting stage.
    pub current_ts: i64,
    /// Send-time of the immediately preceding element from the same stage.
    pub previous_ts: i64,
    /// Strictly increasing per-stage sequence counter, unrelated to
    /// event time.
    pub dedup_ts: i64,
    /// Epoch active when the element was stamped. Only epoch markers
    /// carry this value on the wire; for other kinds it is local-only.
    pub epoch: i64,
}

/// An element together with its transport stamp; the unit the wire
/// codec encodes and decodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequencedElement<T> {
    /// The logical element.
    pub element: StreamElement<T>,
    /// The transport stamp.
    pub meta: TransportMeta,
}

impl<T> SequencedElement<T> {
    /// Pair an element with its transport stamp.
    #[must_use]
    pub const fn new(element: StreamElement<T>, meta: TransportMeta) -> Self {
        Self { element, meta }
    }
}
