//! The multiplexed channel writer seam.
//!
//! The writer performs the actual network/buffer I/O and is assumed
//! reliable-in-order per channel; it applies flow control by blocking
//! the calling thread when downstream buffers are full. This crate only
//! consumes the interface.

use bytes::Bytes;
use std::io;

/// Downstream hand-off for encoded elements.
///
/// Each method maps to one transmission policy: `emit` unicasts to a
/// partition chosen by the writer's own key routing, `broadcast_emit`
/// reaches every downstream channel, and `random_emit` picks one
/// arbitrary channel (used for sampling probes).
pub trait ChannelWriter {
    /// Opaque control event type accepted by the broadcast-event path.
    type Event;

    /// Unicast one encoded element; the writer chooses the partition.
    ///
    /// # Errors
    /// Returns the underlying I/O failure unchanged.
    fn emit(&mut self, frame: Bytes) -> io::Result<()>;

    /// Send one encoded element to every downstream channel.
    ///
    /// # Errors
    /// Returns the underlying I/O failure unchanged.
    fn broadcast_emit(&mut self, frame: Bytes) -> io::Result<()>;

    /// Send one encoded element to a single randomly selected channel.
    ///
    /// # Errors
    /// Returns the underlying I/O failure unchanged.
    fn random_emit(&mut self, frame: Bytes) -> io::Result<()>;

    /// Pass an opaque control event to every downstream channel,
    /// bypassing element encoding entirely.
    ///
    /// # Errors
    /// Returns the underlying I/O failure unchanged.
    fn broadcast_event(&mut self, event: Self::Event) -> io::Result<()>;

    /// Force all buffered output to be pushed downstream.
    ///
    /// # Errors
    /// Returns the underlying I/O failure unchanged.
    fn flush_all(&mut self) -> io::Result<()>;

    /// Release the writer. No further calls may follow.
    fn close(&mut self);
}
