//! Tagged binary wire format for stream elements.
//!
//! Every element is encoded as a one-byte kind tag followed by
//! fixed-width big-endian fields; record payloads are delegated to an
//! injected [`ValueCodec`]. The format is self-describing and stable:
//! any peer reading an output channel decodes tags 0-5 and treats
//! payload bytes as opaque.
//!
//! ## Layout
//!
//! ```text
//! Tag | Kind                  | Fields (in order)
//! ----|-----------------------|--------------------------------------------------
//!  0  | Record with timestamp | timestamp:i64, dedup:i64, currentTs:i64,
//!     |                       | previousTs:i64, payload
//!  1  | Record, no timestamp  | dedup:i64, currentTs:i64, previousTs:i64, payload
//!  2  | Watermark             | value:i64, dedup:i64, currentTs:i64, previousTs:i64
//!  3  | Latency marker        | markedTime:i64, opIdLow:i64, opIdHigh:i64,
//!     |                       | subtaskIndex:i32, dedup:i64, currentTs:i64,
//!     |                       | previousTs:i64
//!  4  | Stream status         | statusCode:i32, dedup:i64, currentTs:i64,
//!     |                       | previousTs:i64
//!  5  | End-of-epoch marker   | dedup:i64, currentTs:i64, epoch:i64, previousTs:i64
//! ```
//!
//! Besides `encode`/`decode`, the codec offers [`ElementCodec::relay`]:
//! a byte-for-byte copy of one encoded element between streams that
//! never materializes the payload value. Forwarding and broadcast
//! stages use it to pass elements along without touching business data.

pub mod codec;
pub mod error;
pub mod value;

pub use codec::ElementCodec;
pub use error::{WireError, WireResult};
pub use value::{BytesCodec, I64Codec, ValueCodec};

use bytes::{Buf, Bytes};

/// Tag for a record carrying an event-time timestamp.
pub const TAG_RECORD_WITH_TIMESTAMP: u8 = 0;

/// Tag for a record without an event-time timestamp.
pub const TAG_RECORD_WITHOUT_TIMESTAMP: u8 = 1;

/// Tag for a watermark.
pub const TAG_WATERMARK: u8 = 2;

/// Tag for a latency marker.
pub const TAG_LATENCY_MARKER: u8 = 3;

/// Tag for a stream-status signal.
pub const TAG_STREAM_STATUS: u8 = 4;

/// Tag for an end-of-epoch marker.
pub const TAG_EPOCH_MARKER: u8 = 5;

/// Fail with [`WireError::BufferTooSmall`] unless `src` still holds at
/// least `required` bytes.
pub(crate) fn check_remaining(src: &Bytes, required: usize) -> WireResult<()> {
    let actual = src.remaining();
    if actual < required {
        return Err(WireError::BufferTooSmall { required, actual });
    }
    Ok(())
}
