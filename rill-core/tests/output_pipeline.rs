//! End-to-end pipeline test: stamp at a source stage, encode, relay the
//! frames through an intermediate hop without decoding, then decode at
//! the far end and check sequencing and routing survived the trip.

use bytes::{Bytes, BytesMut};
use parking_lot::Mutex;
use rill_core::element::{
    EndOfEpochMarker, LatencyMarker, SequencedElement, StreamElement, StreamRecord, StreamStatus,
    TransportMeta, Watermark,
};
use rill_core::output::{
    ChainAction, ChannelWriter, ConstantStatus, Interceptor, InterceptorChain, OutputStage,
    OutputStageConfig,
};
use rill_core::time::{MonotonicClock, TaskClock};
use rill_core::types::{OperatorId, OutputTag, MAX_TIMESTAMP};
use rill_core::wire::{BytesCodec, ElementCodec};
use std::collections::VecDeque;
use std::sync::Arc;

/// Writer that keeps every transmitted frame, in order, tagged with the
/// policy used to send it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Policy {
    Unicast,
    Broadcast,
    Random,
}

struct FrameLog {
    frames: Arc<Mutex<Vec<(Policy, Bytes)>>>,
}

impl FrameLog {
    fn new() -> (Self, Arc<Mutex<Vec<(Policy, Bytes)>>>) {
        let frames = Arc::new(Mutex::new(Vec::new()));
        (Self { frames: Arc::clone(&frames) }, frames)
    }
}

impl ChannelWriter for FrameLog {
    type Event = ();

    fn emit(&mut self, frame: Bytes) -> std::io::Result<()> {
        self.frames.lock().push((Policy::Unicast, frame));
        Ok(())
    }

    fn broadcast_emit(&mut self, frame: Bytes) -> std::io::Result<()> {
        self.frames.lock().push((Policy::Broadcast, frame));
        Ok(())
    }

    fn random_emit(&mut self, frame: Bytes) -> std::io::Result<()> {
        self.frames.lock().push((Policy::Random, frame));
        Ok(())
    }

    fn broadcast_event(&mut self, _event: ()) -> std::io::Result<()> {
        Ok(())
    }

    fn flush_all(&mut self) -> std::io::Result<()> {
        Ok(())
    }

    fn close(&mut self) {}
}

struct ScriptedClock(Mutex<VecDeque<i64>>);

impl ScriptedClock {
    fn new(readings: &[i64]) -> Arc<Self> {
        Arc::new(Self(Mutex::new(readings.iter().copied().collect())))
    }
}

impl MonotonicClock for ScriptedClock {
    fn nanos(&self) -> i64 {
        self.0.lock().pop_front().expect("clock script exhausted")
    }
}

impl TaskClock for ScriptedClock {
    fn out_ts(&self) -> i64 {
        self.0.lock().pop_front().expect("out-ts script exhausted")
    }
}

/// Chain link that collects the element kinds it observes.
struct KindTap {
    kinds: Arc<Mutex<Vec<&'static str>>>,
    finished_channels: Arc<Mutex<Vec<usize>>>,
}

impl Interceptor<Bytes> for KindTap {
    fn accept(
        &mut self,
        element: &SequencedElement<Bytes>,
        _channel: usize,
    ) -> rill_core::Result<ChainAction> {
        self.kinds.lock().push(element.element.kind());
        Ok(ChainAction::Continue)
    }

    fn end_of_stream(&mut self, channel: usize) -> rill_core::Result<()> {
        self.finished_channels.lock().push(channel);
        Ok(())
    }
}

fn codec() -> ElementCodec<Bytes, BytesCodec> {
    ElementCodec::new(BytesCodec::new()).unwrap()
}

#[test]
fn sequence_survives_encode_relay_decode() {
    // Source stage: construction reads 100, then one reading per
    // non-marker element.
    let clock = ScriptedClock::new(&[100, 110, 120, 130, 140, 150]);
    let (writer, frames) = FrameLog::new();
    let mut stage = OutputStage::new(
        OutputStageConfig::new().as_source(),
        codec(),
        writer,
        Arc::new(ConstantStatus::new(StreamStatus::ACTIVE)),
        ScriptedClock::new(&[]),
        clock,
    );

    stage
        .collect(StreamRecord::with_timestamp(Bytes::from_static(b"one"), 7), None)
        .unwrap();
    stage.emit_watermark(Watermark::new(7)).unwrap();
    stage.collect(StreamRecord::new(Bytes::from_static(b"two")), None).unwrap();
    stage
        .emit_latency_marker(LatencyMarker::new(999, OperatorId::new(1, 2), 3))
        .unwrap();
    stage.emit_epoch_marker(EndOfEpochMarker::new()).unwrap();
    stage.emit_stream_status(StreamStatus::IDLE).unwrap();
    stage.flush().unwrap();
    stage.close();

    let sent = frames.lock().clone();
    assert_eq!(sent.len(), 6);

    // Intermediate hop: relay every frame without touching payloads.
    let hop = codec();
    let relayed: Vec<(Policy, Bytes)> = sent
        .iter()
        .map(|(policy, frame)| {
            let mut src = frame.clone();
            let mut dst = BytesMut::new();
            hop.relay(&mut src, &mut dst).unwrap();
            assert!(src.is_empty(), "relay must consume the whole frame");
            (*policy, dst.freeze())
        })
        .collect();
    for ((_, original), (_, copy)) in sent.iter().zip(&relayed) {
        assert_eq!(original, copy, "relay must preserve frames byte for byte");
    }

    // Far end: decode and re-check both routing and sequencing.
    let sink = codec();
    let decoded: Vec<(Policy, SequencedElement<Bytes>)> = relayed
        .iter()
        .map(|(policy, frame)| {
            let mut src = frame.clone();
            let element = sink.decode(&mut src).unwrap();
            assert!(src.is_empty());
            (*policy, element)
        })
        .collect();

    let kinds: Vec<&str> = decoded.iter().map(|(_, e)| e.element.kind()).collect();
    assert_eq!(
        kinds,
        vec!["record", "watermark", "record", "latency-marker", "epoch-marker", "stream-status"]
    );

    let policies: Vec<Policy> = decoded.iter().map(|(p, _)| *p).collect();
    assert_eq!(
        policies,
        vec![
            Policy::Unicast,
            Policy::Broadcast,
            Policy::Unicast,
            Policy::Random,
            Policy::Broadcast,
            Policy::Broadcast,
        ]
    );

    // Dedup counters are the contiguous series 1..=6 regardless of kind.
    let dedups: Vec<i64> = decoded.iter().map(|(_, e)| e.meta.dedup_ts).collect();
    assert_eq!(dedups, vec![1, 2, 3, 4, 5, 6]);

    // Source send-times chain strictly: each previous_ts equals the
    // prior element's current_ts. The epoch marker's sentinel stamp
    // breaks out of the chain without disturbing it.
    let metas: Vec<TransportMeta> = decoded.iter().map(|(_, e)| e.meta).collect();
    assert_eq!(metas[0].current_ts, 110);
    assert_eq!(metas[0].previous_ts, 100);
    assert_eq!(metas[1].previous_ts, 110);
    assert_eq!(metas[2].previous_ts, 120);
    assert_eq!(metas[3].previous_ts, 130);
    assert_eq!(metas[4].current_ts, MAX_TIMESTAMP);
    assert_eq!(metas[4].previous_ts, MAX_TIMESTAMP);
    assert_eq!(metas[5].previous_ts, 140);

    // Epoch on the wire only for the marker; payloads intact.
    match &decoded[4].1.element {
        StreamElement::EpochMarker(marker) => assert_eq!(marker.epoch, 0),
        other => panic!("expected epoch marker, got {other:?}"),
    }
    match &decoded[0].1.element {
        StreamElement::Record(record) => {
            assert_eq!(record.value, Bytes::from_static(b"one"));
            assert_eq!(record.timestamp, Some(7));
        },
        other => panic!("expected record, got {other:?}"),
    }
    assert_eq!(stage.summary().snapshot().total(), 6);
}

#[test]
fn chain_taps_the_decoded_stream() {
    let clock = ScriptedClock::new(&[0, 10, 20]);
    let (writer, frames) = FrameLog::new();
    let mut stage = OutputStage::new(
        OutputStageConfig::new().as_source(),
        codec(),
        writer,
        Arc::new(ConstantStatus::new(StreamStatus::ACTIVE)),
        ScriptedClock::new(&[]),
        clock,
    );

    stage.collect(StreamRecord::new(Bytes::from_static(b"x")), None).unwrap();
    stage.emit_watermark(Watermark::new(3)).unwrap();
    stage.close();

    // Receiving side runs the decoded elements through a chain.
    let kinds = Arc::new(Mutex::new(Vec::new()));
    let finished = Arc::new(Mutex::new(Vec::new()));
    let mut chain: InterceptorChain<Bytes> = InterceptorChain::new();
    chain.push(Box::new(KindTap {
        kinds: Arc::clone(&kinds),
        finished_channels: Arc::clone(&finished),
    }));
    assert_eq!(chain.len(), 1);

    let sink = codec();
    for (_, frame) in frames.lock().iter() {
        let element = sink.decode(&mut frame.clone()).unwrap();
        chain.accept(&element, 0).unwrap();
    }
    chain.end_of_stream(0).unwrap();

    assert_eq!(*kinds.lock(), vec!["record", "watermark"]);
    assert_eq!(*finished.lock(), vec![0]);
}

#[test]
fn side_output_stage_serves_only_its_tag() {
    let tag = OutputTag::new("late-arrivals").unwrap();
    let (writer, frames) = FrameLog::new();
    let mut stage = OutputStage::new(
        OutputStageConfig::new().with_side_output(tag.clone()),
        codec(),
        writer,
        Arc::new(ConstantStatus::new(StreamStatus::ACTIVE)),
        ScriptedClock::new(&[5]),
        ScriptedClock::new(&[0]),
    );

    stage.collect(StreamRecord::new(Bytes::from_static(b"main")), None).unwrap();
    assert!(frames.lock().is_empty());

    stage
        .collect(StreamRecord::new(Bytes::from_static(b"late")), Some(&tag))
        .unwrap();
    let sent = frames.lock();
    assert_eq!(sent.len(), 1);

    let element = codec().decode(&mut sent[0].1.clone()).unwrap();
    match element.element {
        StreamElement::Record(record) => assert_eq!(record.value, Bytes::from_static(b"late")),
        other => panic!("expected record, got {other:?}"),
    }
    // The dropped main-channel record consumed no sequence slot.
    assert_eq!(element.meta.dedup_ts, 1);
}
