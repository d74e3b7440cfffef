//! Error types for draft production
//!
//! Provides error handling for:
//! - Structural preconditions (cycles introduced through drafts)
//! - Immutability enforcement (writes to frozen values)
//! - Unsupported value policy
//! - Misaddressed draft operations

use cowdraft_value::{Key, KeyPath, ValueError, ValueKind};

/// Errors raised by `produce` and by [`Draft`](crate::Draft) operations
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DraftError {
    /// A draft was found to be reachable from itself
    #[error("cyclic structure: draft at {path} is reachable from itself")]
    CyclicStructure { path: KeyPath },

    /// Direct mutation of a value failed (frozen container, bad index)
    #[error(transparent)]
    Value(#[from] ValueError),

    /// Opaque value met while the policy rejects them
    #[error("unsupported value of type {type_name} at {path}")]
    UnsupportedType {
        type_name: &'static str,
        path: KeyPath,
    },

    /// A container was required
    #[error("expected a container at {path}, found {found}")]
    NotAContainer { path: KeyPath, found: ValueKind },

    /// No value at the addressed slot
    #[error("no value at {path}")]
    MissingKey { path: KeyPath },

    /// Field key used on a list, or index key used on a map
    #[error("key '{key}' cannot address a {container} at {path}")]
    KeyKindMismatch {
        path: KeyPath,
        key: Key,
        container: ValueKind,
    },

    /// Position outside the list
    #[error("index {index} out of bounds for list of length {len} at {path}")]
    IndexOutOfBounds {
        path: KeyPath,
        index: usize,
        len: usize,
    },

    /// Draft handle from a different produce call
    #[error("draft belongs to another produce scope")]
    ForeignDraft,

    /// Recipe both modified its draft and returned a replacement
    #[error("recipe returned a replacement value and also modified its draft")]
    ReplacedModifiedDraft,
}

impl DraftError {
    /// Whether this is a write to a frozen value
    #[inline]
    #[must_use]
    pub fn is_immutable_violation(&self) -> bool {
        matches!(self, Self::Value(ValueError::ImmutableViolation { .. }))
    }

    /// Whether this is a cycle rejection
    #[inline]
    #[must_use]
    pub fn is_cyclic(&self) -> bool {
        matches!(self, Self::CyclicStructure { .. })
    }
}

/// Result type alias for draft operations
pub type DraftResult<T> = Result<T, DraftError>;
