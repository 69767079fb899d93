//! Crate-level error rollup.
//!
//! Each layer keeps its own structured error (`WireError` for the codec,
//! `StageError` for the output stage); this module folds them into one
//! surface for callers that cross layers.

use crate::output::StageError;
use crate::wire::WireError;

/// Result alias using the crate-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Any failure produced by this crate.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A side-output tag failed validation.
    #[error("invalid output tag: {message}")]
    InvalidTag {
        /// What was wrong with the tag.
        message: String,
    },

    /// The wire codec rejected a buffer.
    #[error("wire codec error: {0}")]
    Wire(#[from] WireError),

    /// The output stage failed to stamp or transmit.
    #[error("output stage error: {0}")]
    Stage(#[from] StageError),

    /// An interceptor aborted element processing.
    #[error("interceptor error: {message}")]
    Interceptor {
        /// Reason reported by the interceptor.
        message: String,
    },
}

impl Error {
    /// Create an interceptor error from any printable reason.
    pub fn interceptor(message: impl Into<String>) -> Self {
        Self::Interceptor { message: message.into() }
    }

    /// Whether this failure must tear the owning task down.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Stage(stage) => stage.is_fatal(),
            Self::InvalidTag { .. } | Self::Wire(_) | Self::Interceptor { .. } => false,
        }
    }
}
