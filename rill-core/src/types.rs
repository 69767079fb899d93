//! Common types used throughout the Rill output data plane.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Sentinel send-time larger than any real timestamp.
///
/// Epoch-boundary markers carry this value in both their current and
/// previous send-time slots so that they never participate in ordinary
/// timestamp-monotonicity comparisons downstream.
pub const MAX_TIMESTAMP: i64 = i64::MAX;

/// 128-bit operator identifier, split into high and low halves for the
/// wire format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OperatorId {
    /// Upper 64 bits of the identifier.
    pub high: i64,
    /// Lower 64 bits of the identifier.
    pub low: i64,
}

impl OperatorId {
    /// Create an operator ID from its high and low halves.
    #[must_use]
    pub const fn new(high: i64, low: i64) -> Self {
        Self { high, low }
    }

    /// Generate a fresh random operator ID.
    #[must_use]
    pub fn random() -> Self {
        Self::from_uuid(Uuid::new_v4())
    }

    /// Create an operator ID from a UUID.
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        let bits = uuid.as_u128();
        Self { high: (bits >> 64) as i64, low: bits as i64 }
    }
}

impl fmt::Display for OperatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}{:016x}", self.high, self.low)
    }
}

/// Tag addressing a side-output channel.
///
/// An output stage configured with a tag owns exactly one side channel;
/// a stage without a tag owns the main channel. Ownership is decided by
/// tag equality, never identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OutputTag(String);

impl OutputTag {
    /// Create a new output tag.
    ///
    /// # Errors
    /// Returns an error if the tag is empty, longer than 255 characters,
    /// or contains characters outside `[A-Za-z0-9._-]`.
    pub fn new(name: impl Into<String>) -> crate::Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(crate::Error::InvalidTag {
                message: "tag cannot be empty".to_string(),
            });
        }

        if name.len() > 255 {
            return Err(crate::Error::InvalidTag {
                message: "tag cannot exceed 255 characters".to_string(),
            });
        }

        if !name.chars().all(|c| c.is_alphanumeric() || c == '-' || c == '_' || c == '.') {
            return Err(crate::Error::InvalidTag {
                message: "tag contains invalid characters".to_string(),
            });
        }

        Ok(Self(name))
    }

    /// Get the tag as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Convert to an owned string.
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for OutputTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for OutputTag {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operator_id_from_uuid() {
        let uuid = Uuid::new_v4();
        let id = OperatorId::from_uuid(uuid);
        let bits = uuid.as_u128();

        assert_eq!(id.high, (bits >> 64) as i64);
        assert_eq!(id.low, bits as i64);
    }

    #[test]
    fn test_operator_id_random_is_unique() {
        assert_ne!(OperatorId::random(), OperatorId::random());
    }

    #[test]
    fn test_tag_validation() {
        assert!(OutputTag::new("late-events_v2.side").is_ok());
        assert!(OutputTag::new("").is_err());
        assert!(OutputTag::new("has spaces").is_err());
        assert!(OutputTag::new("bad@tag").is_err());

        let long_name = "a".repeat(256);
        assert!(OutputTag::new(long_name).is_err());
    }

    #[test]
    fn test_tag_equality_not_identity() {
        let a = OutputTag::new("side").unwrap();
        let b = OutputTag::new("side").unwrap();
        assert_eq!(a, b);
    }
}
