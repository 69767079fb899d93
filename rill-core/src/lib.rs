//! # Rill Core
//!
//! Output-side data plane for the Rill stream-processing task runtime.
//!
//! Rill Core provides the components a task uses to push stream elements
//! downstream: the element model, the tagged binary wire codec, and the
//! output stage that stamps transport metadata and routes each element
//! kind with its transmission policy.
//!
//! ## Features
//!
//! - **Closed element model**: records, watermarks, latency markers,
//!   stream-status signals, and epoch markers as one exhaustive enum
//! - **Tagged wire codec**: compact one-byte-tag frames with pluggable
//!   payload codecs and a zero-decode relay path
//! - **Sequenced output**: strictly monotonic send-time stamping, a
//!   per-stage dedup counter, and epoch assignment at the transmit edge
//! - **Per-kind routing**: unicast records, gated watermark broadcast,
//!   random-channel latency probes, unconditional control broadcast
//! - **Interception**: an ordered hook chain observing stamped elements
//!
//! ## Quick Start
//!
//! ```rust
//! use rill_core::element::{SequencedElement, StreamRecord, TransportMeta};
//! use rill_core::wire::{BytesCodec, ElementCodec};
//! use bytes::Bytes;
//!
//! fn main() -> rill_core::Result<()> {
//!     let codec = ElementCodec::new(BytesCodec::new())?;
//!
//!     let element = SequencedElement::new(
//!         StreamRecord::with_timestamp(Bytes::from_static(b"payload"), 42).into(),
//!         TransportMeta::default(),
//!     );
//!
//!     let frame = codec.encode(&element)?;
//!     let decoded = codec.decode(&mut frame.clone())?;
//!     assert_eq!(decoded, element);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`element`]: the stream element model and transport metadata
//! - [`wire`]: the tagged binary codec (encode, decode, relay)
//! - [`output`]: the output stage, channel-writer seam, and interception
//! - [`time`]: the clock oracles that drive send-time stamping
//! - [`types`]: operator ids, side-output tags, timestamp constants
//! - [`error`]: crate-level error rollup
//! - [`prelude`]: common imports for convenient usage

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod element;
pub mod error;
pub mod output;
pub mod prelude;
pub mod time;
pub mod types;
pub mod wire;

pub use error::{Error, Result};
