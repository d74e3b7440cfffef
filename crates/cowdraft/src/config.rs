//! Producer configuration

use serde::{Deserialize, Serialize};

/// What a draft does when it meets an [`Opaque`](cowdraft_value::Opaque) value
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnsupportedPolicy {
    /// Treat opaque values as leaves, copied by reference
    #[default]
    PassThrough,
    /// Fail with [`DraftError::UnsupportedType`](crate::DraftError::UnsupportedType)
    /// when an opaque value is read through or written into a draft
    Reject,
}

/// Configuration of a [`Producer`](crate::Producer)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProduceConfig {
    /// Deep-freeze every produced value
    pub auto_freeze: bool,
    /// Opaque value handling
    pub unsupported: UnsupportedPolicy,
}

impl ProduceConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With auto-freeze on or off
    #[inline]
    #[must_use]
    pub fn with_auto_freeze(mut self, auto_freeze: bool) -> Self {
        self.auto_freeze = auto_freeze;
        self
    }

    /// With opaque value policy
    #[inline]
    #[must_use]
    pub fn with_unsupported(mut self, policy: UnsupportedPolicy) -> Self {
        self.unsupported = policy;
        self
    }
}

impl Default for ProduceConfig {
    fn default() -> Self {
        Self {
            auto_freeze: true,
            unsupported: UnsupportedPolicy::PassThrough,
        }
    }
}
