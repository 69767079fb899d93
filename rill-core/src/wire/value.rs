//! Payload-level codecs injected into the element codec.

use crate::wire::{check_remaining, WireError, WireResult};
use bytes::{Buf, BufMut, Bytes, BytesMut};

/// Codec for record payload values.
///
/// Implementations must be stateless and reentrant: `&self` methods may
/// be called concurrently on independent buffers. `relay` copies one
/// encoded value from `src` to `dst` without materializing it, which is
/// what lets forwarding stages move records along without decoding
/// business data.
pub trait ValueCodec<T> {
    /// Append the encoding of `value` to `dst`.
    ///
    /// # Errors
    /// Returns an error if the value cannot be represented.
    fn encode(&self, value: &T, dst: &mut BytesMut) -> WireResult<()>;

    /// Decode one value from the front of `src`, advancing it.
    ///
    /// # Errors
    /// Returns an error if `src` is truncated or malformed.
    fn decode(&self, src: &mut Bytes) -> WireResult<T>;

    /// Copy one encoded value from `src` to `dst` without decoding it.
    ///
    /// # Errors
    /// Returns an error if `src` is truncated.
    fn relay(&self, src: &mut Bytes, dst: &mut BytesMut) -> WireResult<()>;

    /// Whether this codec is itself an element codec. Used to reject
    /// element-codec nesting at construction time.
    fn is_element_codec(&self) -> bool {
        false
    }
}

/// Opaque byte payloads with a `u32` length prefix.
///
/// The prefix is what makes `relay` possible without inspecting the
/// payload: skip-copying is a length read plus a bulk copy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BytesCodec;

impl BytesCodec {
    /// Create a byte-payload codec.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl ValueCodec<Bytes> for BytesCodec {
    fn encode(&self, value: &Bytes, dst: &mut BytesMut) -> WireResult<()> {
        let len = u32::try_from(value.len())
            .map_err(|_| WireError::value("payload exceeds u32 length prefix"))?;
        dst.put_u32(len);
        dst.put_slice(value);
        Ok(())
    }

    fn decode(&self, src: &mut Bytes) -> WireResult<Bytes> {
        check_remaining(src, 4)?;
        let len = src.get_u32() as usize;
        check_remaining(src, len)?;
        Ok(src.split_to(len))
    }

    fn relay(&self, src: &mut Bytes, dst: &mut BytesMut) -> WireResult<()> {
        check_remaining(src, 4)?;
        let len = src.get_u32() as usize;
        check_remaining(src, len)?;
        dst.put_u32(len as u32);
        dst.put_slice(&src.split_to(len));
        Ok(())
    }
}

/// Fixed-width `i64` payloads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct I64Codec;

impl I64Codec {
    /// Create an `i64` payload codec.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl ValueCodec<i64> for I64Codec {
    fn encode(&self, value: &i64, dst: &mut BytesMut) -> WireResult<()> {
        dst.put_i64(*value);
        Ok(())
    }

    fn decode(&self, src: &mut Bytes) -> WireResult<i64> {
        check_remaining(src, 8)?;
        Ok(src.get_i64())
    }

    fn relay(&self, src: &mut Bytes, dst: &mut BytesMut) -> WireResult<()> {
        check_remaining(src, 8)?;
        dst.put_i64(src.get_i64());
        Ok(())
    }
}
