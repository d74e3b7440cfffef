//! Draft handles
//!
//! A [`Draft`] is the recipe's view of one container of the base tree. Reads
//! go through to the base until the container is first written; writes land
//! in a shallow copy owned by the produce scope.

use crate::error::{DraftError, DraftResult};
use crate::node::{DraftId, Entry};
use crate::scope::{Resolved, Scope};
use cowdraft_value::{Key, KeyPath, Value, ValueKind};
use std::fmt::{self, Debug, Formatter};

/// Mutable view of one container during a produce call
///
/// Handles are `Copy` and borrow their produce scope, so they cannot outlive
/// the recipe they were passed to.
#[derive(Clone, Copy)]
pub struct Draft<'s> {
    scope: &'s Scope,
    id: DraftId,
}

/// A child read through a draft
#[derive(Debug, Clone, PartialEq)]
pub enum Slot<'s> {
    /// Container child, wrapped in its own draft
    Draft(Draft<'s>),
    /// Primitive or opaque child
    Leaf(Value),
}

impl<'s> Slot<'s> {
    /// The child draft, if this slot holds a container
    #[inline]
    #[must_use]
    pub fn as_draft(&self) -> Option<Draft<'s>> {
        match self {
            Self::Draft(draft) => Some(*draft),
            Self::Leaf(_) => None,
        }
    }

    /// The leaf value, if this slot holds one
    #[inline]
    #[must_use]
    pub fn as_leaf(&self) -> Option<&Value> {
        match self {
            Self::Draft(_) => None,
            Self::Leaf(value) => Some(value),
        }
    }

    /// Current value of the slot
    ///
    /// # Errors
    /// Fails if the child draft is part of a cycle
    pub fn to_value(&self) -> DraftResult<Value> {
        match self {
            Self::Draft(draft) => draft.current(),
            Self::Leaf(value) => Ok(value.clone()),
        }
    }

    /// Current value of a grandchild, `None` when absent or when this slot is a leaf
    ///
    /// # Errors
    /// Same as [`Draft::value`]
    pub fn value(&self, key: impl Into<Key>) -> DraftResult<Option<Value>> {
        match self {
            Self::Draft(draft) => draft.value(key),
            Self::Leaf(_) => Ok(None),
        }
    }
}

impl<'s> Draft<'s> {
    pub(crate) fn new(scope: &'s Scope, id: DraftId) -> Self {
        Self { scope, id }
    }

    fn child(&self, resolved: Resolved) -> Slot<'s> {
        match resolved {
            Resolved::Draft(id) => Slot::Draft(Draft::new(self.scope, id)),
            Resolved::Leaf(value) => Slot::Leaf(value),
        }
    }

    fn owned(&self, draft: Draft<'_>) -> DraftResult<Entry> {
        if draft.scope.id() != self.scope.id() {
            return Err(DraftError::ForeignDraft);
        }
        Ok(Entry::Draft(draft.id))
    }

    // ========================================================================
    // Inspection
    // ========================================================================

    /// Location of this draft, from the root of the produce call
    #[must_use]
    pub fn path(&self) -> KeyPath {
        self.scope.path(self.id)
    }

    /// Map or list
    #[must_use]
    pub fn kind(&self) -> ValueKind {
        self.scope.kind(self.id)
    }

    /// Whether this draft or any descendant has been written
    #[must_use]
    pub fn is_modified(&self) -> bool {
        self.scope.is_modified(self.id)
    }

    /// The base container this draft wraps
    #[must_use]
    pub fn original(&self) -> Value {
        self.scope.original(self.id)
    }

    /// Snapshot of the current state as a plain, unfrozen value
    ///
    /// # Errors
    /// Returns [`DraftError::CyclicStructure`] if the draft contains itself
    pub fn current(&self) -> DraftResult<Value> {
        self.scope.current(self.id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.scope.len(self.id)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Keys in their current order; indices for lists
    #[must_use]
    pub fn keys(&self) -> Vec<Key> {
        self.scope.keys(self.id)
    }

    #[must_use]
    pub fn contains_key(&self, key: impl Into<Key>) -> bool {
        self.scope.contains(self.id, &key.into())
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Read a child; containers come back as drafts
    ///
    /// Reading the same slot twice yields the same draft.
    ///
    /// # Errors
    /// Returns [`DraftError::KeyKindMismatch`] for a field key on a list or an
    /// index on a map, and [`DraftError::UnsupportedType`] for an opaque child
    /// when the policy rejects them
    pub fn get(&self, key: impl Into<Key>) -> DraftResult<Option<Slot<'s>>> {
        let resolved = self.scope.get(self.id, &key.into())?;
        Ok(resolved.map(|resolved| self.child(resolved)))
    }

    /// Draft of a container child
    ///
    /// # Errors
    /// Returns [`DraftError::MissingKey`] if there is no child and
    /// [`DraftError::NotAContainer`] if the child is a leaf
    pub fn draft(&self, key: impl Into<Key>) -> DraftResult<Draft<'s>> {
        let key = key.into();
        match self.get(key.clone())? {
            Some(Slot::Draft(draft)) => Ok(draft),
            Some(Slot::Leaf(value)) => Err(DraftError::NotAContainer {
                path: self.path().child(key),
                found: value.kind(),
            }),
            None => Err(DraftError::MissingKey {
                path: self.path().child(key),
            }),
        }
    }

    /// Draft of a container several levels down
    ///
    /// # Errors
    /// Same as [`Draft::draft`], for the first level that fails
    pub fn draft_at(&self, path: &KeyPath) -> DraftResult<Draft<'s>> {
        path.iter().try_fold(*self, |draft, key| draft.draft(key.clone()))
    }

    /// Current value of a child as a plain value
    ///
    /// # Errors
    /// Same as [`Draft::get`]
    pub fn value(&self, key: impl Into<Key>) -> DraftResult<Option<Value>> {
        self.get(key)?.map(|slot| slot.to_value()).transpose()
    }

    /// First child matching `predicate`
    ///
    /// # Errors
    /// Propagates errors from reads and from `predicate`
    pub fn find<F>(&self, mut predicate: F) -> DraftResult<Option<Slot<'s>>>
    where
        F: FnMut(&Slot<'s>) -> DraftResult<bool>,
    {
        for key in self.keys() {
            if let Some(slot) = self.get(key)? {
                if predicate(&slot)? {
                    return Ok(Some(slot));
                }
            }
        }
        Ok(None)
    }

    // ========================================================================
    // Writes
    // ========================================================================

    /// Store `value` at `key`; on a list `Index(len)` appends
    ///
    /// The value is stored as given. A container taken from elsewhere in the
    /// base is drafted independently when this slot is next read.
    ///
    /// # Errors
    /// Returns [`DraftError::KeyKindMismatch`], [`DraftError::IndexOutOfBounds`]
    /// past the end of a list, or [`DraftError::UnsupportedType`] for an opaque
    /// value when the policy rejects them
    pub fn set(&self, key: impl Into<Key>, value: impl Into<Value>) -> DraftResult<()> {
        self.scope
            .set(self.id, key.into(), Entry::Value(value.into()))
    }

    /// Store another draft at `key`; both locations then share its state
    ///
    /// # Errors
    /// Returns [`DraftError::ForeignDraft`] for a draft of another produce
    /// call, and otherwise the errors of [`Draft::set`]
    pub fn set_draft(&self, key: impl Into<Key>, draft: Draft<'_>) -> DraftResult<()> {
        let entry = self.owned(draft)?;
        self.scope.set(self.id, key.into(), entry)
    }

    /// Remove a child; list items after it shift down
    ///
    /// Returns whether the key was present.
    ///
    /// # Errors
    /// Returns [`DraftError::KeyKindMismatch`]
    pub fn delete(&self, key: impl Into<Key>) -> DraftResult<bool> {
        self.scope.delete(self.id, &key.into())
    }

    /// Append to a list
    ///
    /// # Errors
    /// Returns [`DraftError::KeyKindMismatch`] on a map
    pub fn push(&self, value: impl Into<Value>) -> DraftResult<()> {
        self.set(self.len(), value)
    }

    /// Append another draft to a list
    ///
    /// # Errors
    /// Same as [`Draft::set_draft`]
    pub fn push_draft(&self, draft: Draft<'_>) -> DraftResult<()> {
        self.set_draft(self.len(), draft)
    }

    /// Insert into a list at `index`, shifting later items up
    ///
    /// # Errors
    /// Returns [`DraftError::IndexOutOfBounds`] if `index > len`
    pub fn insert(&self, index: usize, value: impl Into<Value>) -> DraftResult<()> {
        self.scope.insert(self.id, index, Entry::Value(value.into()))
    }

    /// Remove and return the last item of a list
    ///
    /// # Errors
    /// Returns [`DraftError::KeyKindMismatch`] on a map
    pub fn pop(&self) -> DraftResult<Option<Value>> {
        match self.scope.pop(self.id)? {
            Some(entry) => self.scope.detach(entry).map(Some),
            None => Ok(None),
        }
    }

    /// Append every value to a list
    ///
    /// # Errors
    /// Stops at the first failing push
    pub fn extend<I>(&self, values: I) -> DraftResult<()>
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        values.into_iter().try_for_each(|value| self.push(value))
    }

    /// Keep only the children for which `keep` returns true
    ///
    /// Returns how many children were removed.
    ///
    /// # Errors
    /// Propagates errors from reads and from `keep`
    pub fn retain<F>(&self, mut keep: F) -> DraftResult<usize>
    where
        F: FnMut(&Key, &Slot<'s>) -> DraftResult<bool>,
    {
        let mut doomed = Vec::new();
        for key in self.keys() {
            if let Some(slot) = self.get(key.clone())? {
                if !keep(&key, &slot)? {
                    doomed.push(key);
                }
            }
        }
        // back to front so list indices stay valid
        for key in doomed.iter().rev() {
            self.scope.delete(self.id, key)?;
        }
        Ok(doomed.len())
    }
}

impl Debug for Draft<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Draft")
            .field("scope", &self.scope.id())
            .field("path", &self.path().to_string())
            .field("modified", &self.is_modified())
            .finish()
    }
}

impl PartialEq for Draft<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.scope.id() == other.scope.id() && self.id == other.id
    }
}
