//! The stateful sequencer that stamps, encodes, and routes elements.

use crate::element::{
    EndOfEpochMarker, LatencyMarker, SequencedElement, StreamElement, StreamRecord, StreamStatus,
    TransportMeta, Watermark,
};
use crate::output::{
    ChannelWriter, OutputStageConfig, StageError, StageResult, StageSummary, StreamStatusProvider,
    WatermarkGauge,
};
use crate::time::{MonotonicClock, TaskClock};
use crate::types::{OutputTag, MAX_TIMESTAMP};
use crate::wire::{ElementCodec, ValueCodec};
use bytes::{Bytes, BytesMut};
use std::sync::Arc;

/// One logical output of a processing stage: either the main channel or
/// a single side-output channel.
///
/// The stage owns the monotonicity/epoch state machine. It is driven by
/// exactly one task-local thread; nothing here is internally
/// synchronized except the observability gauges.
pub struct OutputStage<T, C: ValueCodec<T>, W: ChannelWriter> {
    codec: ElementCodec<T, C>,
    writer: W,
    status_provider: Arc<dyn StreamStatusProvider>,
    task_clock: Arc<dyn TaskClock>,
    clock: Arc<dyn MonotonicClock>,
    side_output: Option<OutputTag>,
    is_source: bool,

    previous_sent_ts: i64,
    last_dedup_ts: i64,
    current_epoch: i64,
    poisoned: bool,

    watermark_gauge: WatermarkGauge,
    summary: Arc<StageSummary>,

    // Reusable encode buffer; split off per element.
    buf: BytesMut,
}

impl<T, C: ValueCodec<T>, W: ChannelWriter> OutputStage<T, C, W> {
    /// Create a stage over the given writer and codec.
    ///
    /// `previous_sent_ts` starts at the current monotonic reading, so
    /// the first source-mode stamp is already constrained to move the
    /// clock forward.
    pub fn new(
        config: OutputStageConfig,
        codec: ElementCodec<T, C>,
        writer: W,
        status_provider: Arc<dyn StreamStatusProvider>,
        task_clock: Arc<dyn TaskClock>,
        clock: Arc<dyn MonotonicClock>,
    ) -> Self {
        let previous_sent_ts = clock.nanos();
        tracing::debug!(
            is_source = config.is_source,
            side_output = config.side_output.as_ref().map(OutputTag::as_str),
            "created output stage"
        );
        Self {
            codec,
            writer,
            status_provider,
            task_clock,
            clock,
            side_output: config.side_output,
            is_source: config.is_source,
            previous_sent_ts,
            last_dedup_ts: 0,
            current_epoch: 0,
            poisoned: false,
            watermark_gauge: WatermarkGauge::new(),
            summary: Arc::new(StageSummary::default()),
            buf: BytesMut::with_capacity(256),
        }
    }

    /// Whether this stage belongs to a source task.
    #[must_use]
    pub const fn is_source(&self) -> bool {
        self.is_source
    }

    /// The side-output tag this stage owns, if any.
    #[must_use]
    pub const fn side_output(&self) -> Option<&OutputTag> {
        self.side_output.as_ref()
    }

    /// The epoch the next stamped element will carry.
    #[must_use]
    pub const fn current_epoch(&self) -> i64 {
        self.current_epoch
    }

    /// A shared handle onto the last-emitted-watermark gauge.
    #[must_use]
    pub fn watermark_gauge(&self) -> WatermarkGauge {
        self.watermark_gauge.clone()
    }

    /// A shared handle onto the stage's emission counters.
    #[must_use]
    pub fn summary(&self) -> Arc<StageSummary> {
        Arc::clone(&self.summary)
    }

    /// Transmit one record if it is addressed to the channel this stage
    /// owns; otherwise do nothing.
    ///
    /// `None` addresses the main channel. A stage only ever transmits
    /// elements addressed to its own channel, so a tag mismatch is a
    /// silent no-op with zero writer calls.
    ///
    /// # Errors
    /// Fatal on a source-clock regression; otherwise codec and writer
    /// failures are propagated unchanged.
    pub fn collect(
        &mut self,
        record: StreamRecord<T>,
        target: Option<&OutputTag>,
    ) -> StageResult<()> {
        if self.side_output.as_ref() != target {
            return Ok(());
        }

        let element = self.stamp(StreamElement::Record(record))?;
        let frame = self.encode(&element)?;
        self.writer.emit(frame)?;
        Ok(())
    }

    /// Stamp a watermark and broadcast it if the stream is currently
    /// active.
    ///
    /// An idle stream still stamps the mark (sequence counters advance
    /// and the gauge updates) but withholds transmission.
    ///
    /// # Errors
    /// Same failure modes as [`Self::collect`].
    pub fn emit_watermark(&mut self, mark: Watermark) -> StageResult<()> {
        let element = self.stamp(StreamElement::Watermark(mark))?;
        self.watermark_gauge.set(mark.timestamp());

        if self.status_provider.stream_status().is_active() {
            let frame = self.encode(&element)?;
            self.writer.broadcast_emit(frame)?;
        }
        Ok(())
    }

    /// Stamp a stream-status signal and broadcast it unconditionally.
    ///
    /// # Errors
    /// Same failure modes as [`Self::collect`].
    pub fn emit_stream_status(&mut self, status: StreamStatus) -> StageResult<()> {
        let element = self.stamp(StreamElement::Status(status))?;
        let frame = self.encode(&element)?;
        self.writer.broadcast_emit(frame)?;
        Ok(())
    }

    /// Stamp a latency marker and emit it to one arbitrarily selected
    /// downstream channel. The marker is a sampling probe; it is not
    /// required on every channel.
    ///
    /// # Errors
    /// Same failure modes as [`Self::collect`].
    pub fn emit_latency_marker(&mut self, marker: LatencyMarker) -> StageResult<()> {
        let element = self.stamp(StreamElement::LatencyMarker(marker))?;
        let frame = self.encode(&element)?;
        self.writer.random_emit(frame)?;
        Ok(())
    }

    /// Stamp an epoch-boundary marker and broadcast it to every
    /// downstream channel, so the boundary is visible to all partitions
    /// before any of them may be considered closed for the epoch.
    ///
    /// # Errors
    /// Same failure modes as [`Self::collect`].
    pub fn emit_epoch_marker(&mut self, marker: EndOfEpochMarker) -> StageResult<()> {
        let element = self.stamp(StreamElement::EpochMarker(marker))?;
        let frame = self.encode(&element)?;
        // TODO: deliver only to channels holding state for the closing
        // epoch once the writer exposes per-partition addressing;
        // broadcast over-delivers on wide fan-outs.
        self.writer.broadcast_emit(frame)?;
        Ok(())
    }

    /// Pass an opaque control event straight to the writer's broadcast
    /// path. The event is not a stream element and is never stamped.
    ///
    /// # Errors
    /// The writer failure is propagated unchanged.
    pub fn broadcast_event(&mut self, event: W::Event) -> StageResult<()> {
        self.writer.broadcast_event(event)?;
        Ok(())
    }

    /// Force all buffered output downstream.
    ///
    /// # Errors
    /// The writer failure is propagated unchanged.
    pub fn flush(&mut self) -> StageResult<()> {
        self.writer.flush_all()?;
        Ok(())
    }

    /// Release the writer. The owning task calls this only after no
    /// further collect/emit calls will be made.
    pub fn close(&mut self) {
        tracing::debug!(elements = self.last_dedup_ts, "closing output stage");
        self.writer.close();
    }

    /// Stamp transport metadata onto one element.
    ///
    /// Produces a new immutable stamped value; nothing downstream can
    /// observe a partially stamped element.
    fn stamp(&mut self, mut element: StreamElement<T>) -> StageResult<SequencedElement<T>> {
        if self.poisoned {
            return Err(StageError::Poisoned);
        }

        let mut meta = if matches!(element, StreamElement::EpochMarker(_)) {
            let epoch = self.current_epoch;
            self.current_epoch += 1;
            if let StreamElement::EpochMarker(marker) = &mut element {
                marker.epoch = epoch;
            }
            // The sentinel keeps boundary markers out of ordinary
            // send-time comparisons downstream. previous_sent_ts is
            // deliberately untouched.
            TransportMeta {
                current_ts: MAX_TIMESTAMP,
                previous_ts: MAX_TIMESTAMP,
                dedup_ts: 0,
                epoch,
            }
        } else if self.is_source {
            let next = self.clock.nanos();
            if next <= self.previous_sent_ts {
                self.poisoned = true;
                return Err(StageError::NonMonotonicClock {
                    previous: self.previous_sent_ts,
                    next,
                });
            }
            let meta = TransportMeta {
                current_ts: next,
                previous_ts: self.previous_sent_ts,
                dedup_ts: 0,
                epoch: self.current_epoch,
            };
            self.previous_sent_ts = next;
            meta
        } else {
            // Forwarding path: tolerate upstream clock skew that a
            // source must not.
            let mut out = self.task_clock.out_ts();
            if out <= self.previous_sent_ts {
                out = self.previous_sent_ts + 1;
                self.summary.correction_applied();
                tracing::trace!(corrected_to = out, "send-time candidate regressed; clamped");
            }
            let meta = TransportMeta {
                current_ts: out,
                previous_ts: self.previous_sent_ts,
                dedup_ts: 0,
                epoch: self.current_epoch,
            };
            self.previous_sent_ts = out;
            meta
        };

        self.last_dedup_ts += 1;
        meta.dedup_ts = self.last_dedup_ts;

        match &element {
            StreamElement::Record(_) => self.summary.record_stamped(),
            StreamElement::Watermark(_) => self.summary.watermark_stamped(),
            StreamElement::LatencyMarker(_) => self.summary.latency_marker_stamped(),
            StreamElement::Status(_) => self.summary.status_stamped(),
            StreamElement::EpochMarker(_) => self.summary.epoch_marker_stamped(),
        }

        Ok(SequencedElement::new(element, meta))
    }

    fn encode(&mut self, element: &SequencedElement<T>) -> StageResult<Bytes> {
        self.buf.clear();
        self.codec.encode_into(element, &mut self.buf)?;
        Ok(self.buf.split().freeze())
    }
}

impl<T, C: ValueCodec<T>, W: ChannelWriter> std::fmt::Debug for OutputStage<T, C, W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutputStage")
            .field("is_source", &self.is_source)
            .field("side_output", &self.side_output)
            .field("previous_sent_ts", &self.previous_sent_ts)
            .field("last_dedup_ts", &self.last_dedup_ts)
            .field("current_epoch", &self.current_epoch)
            .field("poisoned", &self.poisoned)
            .finish_non_exhaustive()
    }
}
