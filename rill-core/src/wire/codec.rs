//! Element-level encode, decode, and relay.

use crate::element::{
    EndOfEpochMarker, LatencyMarker, SequencedElement, StreamElement, StreamRecord, StreamStatus,
    TransportMeta, Watermark,
};
use crate::types::OperatorId;
use crate::wire::{
    check_remaining, ValueCodec, WireError, WireResult, TAG_EPOCH_MARKER, TAG_LATENCY_MARKER,
    TAG_RECORD_WITHOUT_TIMESTAMP, TAG_RECORD_WITH_TIMESTAMP, TAG_STREAM_STATUS, TAG_WATERMARK,
};
use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::fmt;
use std::marker::PhantomData;

/// Codec for stamped stream elements, generic over the payload codec.
///
/// Stateless and reentrant: every operation takes `&self` and works on
/// caller-owned buffers.
pub struct ElementCodec<T, C> {
    value_codec: C,
    _value: PhantomData<fn() -> T>,
}

impl<T, C: ValueCodec<T>> ElementCodec<T, C> {
    /// Create an element codec around the given payload codec.
    ///
    /// # Errors
    /// Returns [`WireError::NestedElementCodec`] if the payload codec is
    /// itself an element codec; nesting would double-tag every record.
    pub fn new(value_codec: C) -> WireResult<Self> {
        if value_codec.is_element_codec() {
            return Err(WireError::NestedElementCodec);
        }
        Ok(Self { value_codec, _value: PhantomData })
    }

    /// The nested payload codec.
    #[must_use]
    pub const fn value_codec(&self) -> &C {
        &self.value_codec
    }

    /// Encode one stamped element to a fresh buffer.
    ///
    /// # Errors
    /// Returns an error if the payload codec rejects the record value.
    pub fn encode(&self, element: &SequencedElement<T>) -> WireResult<Bytes> {
        let mut buf = BytesMut::with_capacity(64);
        self.encode_into(element, &mut buf)?;
        Ok(buf.freeze())
    }

    /// Append the encoding of one stamped element to `dst`.
    ///
    /// # Errors
    /// Returns an error if the payload codec rejects the record value.
    pub fn encode_into(&self, element: &SequencedElement<T>, dst: &mut BytesMut) -> WireResult<()> {
        let meta = element.meta;
        match &element.element {
            StreamElement::Record(record) => {
                match record.timestamp {
                    Some(timestamp) => {
                        dst.put_u8(TAG_RECORD_WITH_TIMESTAMP);
                        dst.put_i64(timestamp);
                    },
                    None => dst.put_u8(TAG_RECORD_WITHOUT_TIMESTAMP),
                }
                dst.put_i64(meta.dedup_ts);
                dst.put_i64(meta.current_ts);
                dst.put_i64(meta.previous_ts);
                self.value_codec.encode(&record.value, dst)?;
            },
            StreamElement::Watermark(mark) => {
                dst.put_u8(TAG_WATERMARK);
                dst.put_i64(mark.timestamp());
                dst.put_i64(meta.dedup_ts);
                dst.put_i64(meta.current_ts);
                dst.put_i64(meta.previous_ts);
            },
            StreamElement::LatencyMarker(marker) => {
                dst.put_u8(TAG_LATENCY_MARKER);
                dst.put_i64(marker.marked_time);
                dst.put_i64(marker.operator_id.low);
                dst.put_i64(marker.operator_id.high);
                dst.put_i32(marker.subtask_index);
                dst.put_i64(meta.dedup_ts);
                dst.put_i64(meta.current_ts);
                dst.put_i64(meta.previous_ts);
            },
            StreamElement::Status(status) => {
                dst.put_u8(TAG_STREAM_STATUS);
                dst.put_i32(status.code());
                dst.put_i64(meta.dedup_ts);
                dst.put_i64(meta.current_ts);
                dst.put_i64(meta.previous_ts);
            },
            StreamElement::EpochMarker(marker) => {
                dst.put_u8(TAG_EPOCH_MARKER);
                dst.put_i64(meta.dedup_ts);
                dst.put_i64(meta.current_ts);
                dst.put_i64(marker.epoch);
                dst.put_i64(meta.previous_ts);
            },
        }
        Ok(())
    }

    /// Decode one stamped element from the front of `src`, advancing it.
    ///
    /// # Errors
    /// Returns [`WireError::CorruptStream`] for an unknown leading tag
    /// and [`WireError::BufferTooSmall`] for truncated input; never
    /// guesses past either.
    pub fn decode(&self, src: &mut Bytes) -> WireResult<SequencedElement<T>> {
        check_remaining(src, 1)?;
        let tag = src.get_u8();
        match tag {
            TAG_RECORD_WITH_TIMESTAMP => {
                check_remaining(src, 32)?;
                let timestamp = src.get_i64();
                let dedup_ts = src.get_i64();
                let current_ts = src.get_i64();
                let previous_ts = src.get_i64();
                let value = self.value_codec.decode(src)?;
                Ok(SequencedElement::new(
                    StreamElement::Record(StreamRecord::with_timestamp(value, timestamp)),
                    TransportMeta { current_ts, previous_ts, dedup_ts, epoch: 0 },
                ))
            },
            TAG_RECORD_WITHOUT_TIMESTAMP => {
                check_remaining(src, 24)?;
                let dedup_ts = src.get_i64();
                let current_ts = src.get_i64();
                let previous_ts = src.get_i64();
                let value = self.value_codec.decode(src)?;
                Ok(SequencedElement::new(
                    StreamElement::Record(StreamRecord::new(value)),
                    TransportMeta { current_ts, previous_ts, dedup_ts, epoch: 0 },
                ))
            },
            TAG_WATERMARK => {
                check_remaining(src, 32)?;
                let value = src.get_i64();
                let dedup_ts = src.get_i64();
                let current_ts = src.get_i64();
                let previous_ts = src.get_i64();
                Ok(SequencedElement::new(
                    StreamElement::Watermark(Watermark::new(value)),
                    TransportMeta { current_ts, previous_ts, dedup_ts, epoch: 0 },
                ))
            },
            TAG_LATENCY_MARKER => {
                check_remaining(src, 52)?;
                let marked_time = src.get_i64();
                let low = src.get_i64();
                let high = src.get_i64();
                let subtask_index = src.get_i32();
                let dedup_ts = src.get_i64();
                let current_ts = src.get_i64();
                let previous_ts = src.get_i64();
                Ok(SequencedElement::new(
                    StreamElement::LatencyMarker(LatencyMarker::new(
                        marked_time,
                        OperatorId::new(high, low),
                        subtask_index,
                    )),
                    TransportMeta { current_ts, previous_ts, dedup_ts, epoch: 0 },
                ))
            },
            TAG_STREAM_STATUS => {
                check_remaining(src, 28)?;
                let code = src.get_i32();
                let dedup_ts = src.get_i64();
                let current_ts = src.get_i64();
                let previous_ts = src.get_i64();
                Ok(SequencedElement::new(
                    StreamElement::Status(StreamStatus::from_code(code)),
                    TransportMeta { current_ts, previous_ts, dedup_ts, epoch: 0 },
                ))
            },
            TAG_EPOCH_MARKER => {
                check_remaining(src, 32)?;
                let dedup_ts = src.get_i64();
                let current_ts = src.get_i64();
                let epoch = src.get_i64();
                let previous_ts = src.get_i64();
                Ok(SequencedElement::new(
                    StreamElement::EpochMarker(EndOfEpochMarker { epoch }),
                    TransportMeta { current_ts, previous_ts, dedup_ts, epoch },
                ))
            },
            other => Err(WireError::CorruptStream { tag: other }),
        }
    }

    /// Copy one encoded element from `src` to `dst` without
    /// reconstructing the logical value.
    ///
    /// Reads and rewrites exactly the fields implied by the leading tag;
    /// record payloads are moved via the payload codec's own relay
    /// primitive. This is the forwarding path for stages that pass
    /// elements along unchanged.
    ///
    /// # Errors
    /// Same failure modes as [`Self::decode`].
    pub fn relay(&self, src: &mut Bytes, dst: &mut BytesMut) -> WireResult<()> {
        check_remaining(src, 1)?;
        let tag = src.get_u8();
        dst.put_u8(tag);
        match tag {
            TAG_RECORD_WITH_TIMESTAMP => {
                copy_i64s(src, dst, 4)?;
                self.value_codec.relay(src, dst)?;
            },
            TAG_RECORD_WITHOUT_TIMESTAMP => {
                copy_i64s(src, dst, 3)?;
                self.value_codec.relay(src, dst)?;
            },
            TAG_WATERMARK | TAG_EPOCH_MARKER => copy_i64s(src, dst, 4)?,
            TAG_LATENCY_MARKER => {
                copy_i64s(src, dst, 3)?;
                copy_i32(src, dst)?;
                copy_i64s(src, dst, 3)?;
            },
            TAG_STREAM_STATUS => {
                copy_i32(src, dst)?;
                copy_i64s(src, dst, 3)?;
            },
            other => return Err(WireError::CorruptStream { tag: other }),
        }
        Ok(())
    }
}

fn copy_i64s(src: &mut Bytes, dst: &mut BytesMut, count: usize) -> WireResult<()> {
    check_remaining(src, count * 8)?;
    for _ in 0..count {
        dst.put_i64(src.get_i64());
    }
    Ok(())
}

fn copy_i32(src: &mut Bytes, dst: &mut BytesMut) -> WireResult<()> {
    check_remaining(src, 4)?;
    dst.put_i32(src.get_i32());
    Ok(())
}

// An element codec is itself a value codec, which is exactly what the
// nesting check in `new` exists to catch.
impl<T, C: ValueCodec<T>> ValueCodec<SequencedElement<T>> for ElementCodec<T, C> {
    fn encode(&self, value: &SequencedElement<T>, dst: &mut BytesMut) -> WireResult<()> {
        self.encode_into(value, dst)
    }

    fn decode(&self, src: &mut Bytes) -> WireResult<SequencedElement<T>> {
        ElementCodec::decode(self, src)
    }

    fn relay(&self, src: &mut Bytes, dst: &mut BytesMut) -> WireResult<()> {
        ElementCodec::relay(self, src, dst)
    }

    fn is_element_codec(&self) -> bool {
        true
    }
}

// Two element codecs are equivalent iff their payload codecs are; the
// engine's state-compatibility checks rely on this when resuming.
impl<T, C: PartialEq> PartialEq for ElementCodec<T, C> {
    fn eq(&self, other: &Self) -> bool {
        self.value_codec == other.value_codec
    }
}

impl<T, C: Eq> Eq for ElementCodec<T, C> {}

impl<T, C: Clone> Clone for ElementCodec<T, C> {
    fn clone(&self) -> Self {
        Self { value_codec: self.value_codec.clone(), _value: PhantomData }
    }
}

impl<T, C: fmt::Debug> fmt::Debug for ElementCodec<T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElementCodec").field("value_codec", &self.value_codec).finish()
    }
}
