//! Wire-format error types.

use thiserror::Error;

/// Errors raised while encoding, decoding, or relaying wire elements.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WireError {
    /// The leading tag byte is not a known element kind. Decoding never
    /// guesses or resynchronizes past a bad tag.
    #[error("corrupt stream, found tag: {tag}")]
    CorruptStream {
        /// The offending tag byte.
        tag: u8,
    },

    /// The input ended before the fields implied by the tag.
    #[error("wire buffer too small: need at least {required} bytes, got {actual}")]
    BufferTooSmall {
        /// Bytes required by the next field group.
        required: usize,
        /// Bytes actually available.
        actual: usize,
    },

    /// An element codec was given another element codec as its value
    /// codec. Nesting is a configuration error caught at construction.
    #[error("element codec cannot wrap another element codec as its value codec")]
    NestedElementCodec,

    /// The injected value codec failed on the payload.
    #[error("value codec error: {message}")]
    Value {
        /// Description of the payload failure.
        message: String,
    },
}

/// Result type for wire operations.
pub type WireResult<T> = std::result::Result<T, WireError>;

impl WireError {
    /// Create a value-codec error with a message.
    #[must_use]
    pub fn value(message: impl Into<String>) -> Self {
        Self::Value { message: message.into() }
    }

    /// Whether this error indicates stream corruption (as opposed to a
    /// short read or a configuration mistake).
    #[must_use]
    pub const fn is_corruption(&self) -> bool {
        matches!(self, Self::CorruptStream { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = WireError::CorruptStream { tag: 9 };
        assert_eq!(err.to_string(), "corrupt stream, found tag: 9");
        assert!(err.is_corruption());

        let short = WireError::BufferTooSmall { required: 32, actual: 4 };
        assert!(!short.is_corruption());
    }
}
