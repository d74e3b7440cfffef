//! Keyed and ordered containers
//!
//! [`Map`] and [`List`] are reference-counted nodes. Cloning a container is a
//! reference-count bump, and the node allocation is the container's identity:
//! two handles are "the same container" iff [`Map::ptr_eq`] / [`List::ptr_eq`]
//! holds.
//!
//! Mutation is copy-on-write with value semantics: a shared, unfrozen node is
//! cloned before it is written, so no other holder ever observes the change.
//! A frozen node rejects every write with [`ValueError::ImmutableViolation`].

use crate::path::Key;
use crate::value::{Value, ValueError, ValueKind};
use indexmap::IndexMap;
use std::fmt::{self, Debug, Formatter};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Default)]
struct MapNode {
    entries: IndexMap<String, Value>,
    frozen: AtomicBool,
}

impl Clone for MapNode {
    // Only unfrozen nodes are ever cloned for writing.
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
            frozen: AtomicBool::new(false),
        }
    }
}

#[derive(Default)]
struct ListNode {
    items: Vec<Value>,
    frozen: AtomicBool,
}

impl Clone for ListNode {
    fn clone(&self) -> Self {
        Self {
            items: self.items.clone(),
            frozen: AtomicBool::new(false),
        }
    }
}

/// Keyed container with insertion-ordered fields
#[derive(Clone, Default)]
pub struct Map(Arc<MapNode>);

impl Map {
    /// Create an empty, unfrozen map
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an unfrozen map owning the given entries
    #[inline]
    #[must_use]
    pub fn from_entries(entries: IndexMap<String, Value>) -> Self {
        Self(Arc::new(MapNode {
            entries,
            frozen: AtomicBool::new(false),
        }))
    }

    /// Field value
    #[inline]
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.entries.get(key)
    }

    /// Whether the field exists
    #[inline]
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.entries.contains_key(key)
    }

    /// Number of fields
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.entries.len()
    }

    /// Whether the map has no fields
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.entries.is_empty()
    }

    /// Field names in insertion order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.entries.keys().map(String::as_str)
    }

    /// Fields in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Borrow the underlying entries
    #[inline]
    #[must_use]
    pub fn entries(&self) -> &IndexMap<String, Value> {
        &self.0.entries
    }

    /// Insert or replace a field, returning the previous value
    ///
    /// # Errors
    /// Returns [`ValueError::ImmutableViolation`] if the map is frozen
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<Value>,
    ) -> Result<Option<Value>, ValueError> {
        let key = key.into();
        if self.is_frozen() {
            return Err(ValueError::ImmutableViolation {
                kind: ValueKind::Map,
                key: Key::Field(key),
            });
        }
        Ok(Arc::make_mut(&mut self.0).entries.insert(key, value.into()))
    }

    /// Remove a field, preserving the order of the remaining ones
    ///
    /// # Errors
    /// Returns [`ValueError::ImmutableViolation`] if the map is frozen
    pub fn remove(&mut self, key: &str) -> Result<Option<Value>, ValueError> {
        if self.is_frozen() {
            return Err(ValueError::ImmutableViolation {
                kind: ValueKind::Map,
                key: Key::from(key),
            });
        }
        if !self.contains_key(key) {
            return Ok(None);
        }
        Ok(Arc::make_mut(&mut self.0).entries.shift_remove(key))
    }

    /// Whether the map rejects writes
    #[inline]
    #[must_use]
    pub fn is_frozen(&self) -> bool {
        self.0.frozen.load(Ordering::Acquire)
    }

    /// Deep-freeze this map and every container reachable from it
    ///
    /// Stops at containers that are already frozen.
    pub fn freeze(&self) {
        if self.is_frozen() {
            return;
        }
        for value in self.0.entries.values() {
            value.freeze();
        }
        self.0.frozen.store(true, Ordering::Release);
    }

    /// Reference equality
    #[inline]
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Address of the node, for diagnostics
    #[inline]
    #[must_use]
    pub fn addr(&self) -> usize {
        Arc::as_ptr(&self.0) as usize
    }
}

impl PartialEq for Map {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || self.0.entries == other.0.entries
    }
}

impl Debug for Map {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.0.entries.iter()).finish()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Map {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::from_entries(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Ordered container
#[derive(Clone, Default)]
pub struct List(Arc<ListNode>);

impl List {
    /// Create an empty, unfrozen list
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an unfrozen list owning the given items
    #[inline]
    #[must_use]
    pub fn from_vec(items: Vec<Value>) -> Self {
        Self(Arc::new(ListNode {
            items,
            frozen: AtomicBool::new(false),
        }))
    }

    /// Item at position
    #[inline]
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.0.items.get(index)
    }

    /// Number of items
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.items.len()
    }

    /// Whether the list has no items
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.items.is_empty()
    }

    /// Items in order
    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.0.items.iter()
    }

    /// Borrow the underlying items
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[Value] {
        &self.0.items
    }

    fn check_unfrozen(&self, index: usize) -> Result<(), ValueError> {
        if self.is_frozen() {
            return Err(ValueError::ImmutableViolation {
                kind: ValueKind::List,
                key: Key::Index(index),
            });
        }
        Ok(())
    }

    /// Append an item
    ///
    /// # Errors
    /// Returns [`ValueError::ImmutableViolation`] if the list is frozen
    pub fn push(&mut self, value: impl Into<Value>) -> Result<(), ValueError> {
        self.check_unfrozen(self.len())?;
        Arc::make_mut(&mut self.0).items.push(value.into());
        Ok(())
    }

    /// Remove and return the last item
    ///
    /// # Errors
    /// Returns [`ValueError::ImmutableViolation`] if the list is frozen
    pub fn pop(&mut self) -> Result<Option<Value>, ValueError> {
        self.check_unfrozen(self.len().saturating_sub(1))?;
        if self.is_empty() {
            return Ok(None);
        }
        Ok(Arc::make_mut(&mut self.0).items.pop())
    }

    /// Replace the item at `index`, returning the previous one
    ///
    /// # Errors
    /// Returns [`ValueError::ImmutableViolation`] if the list is frozen, or
    /// [`ValueError::IndexOutOfBounds`] if `index >= len`
    pub fn set(&mut self, index: usize, value: impl Into<Value>) -> Result<Value, ValueError> {
        self.check_unfrozen(index)?;
        let len = self.len();
        if index >= len {
            return Err(ValueError::IndexOutOfBounds { index, len });
        }
        let items = &mut Arc::make_mut(&mut self.0).items;
        Ok(std::mem::replace(&mut items[index], value.into()))
    }

    /// Insert an item at `index`, shifting later items up
    ///
    /// # Errors
    /// Returns [`ValueError::ImmutableViolation`] if the list is frozen, or
    /// [`ValueError::IndexOutOfBounds`] if `index > len`
    pub fn insert(&mut self, index: usize, value: impl Into<Value>) -> Result<(), ValueError> {
        self.check_unfrozen(index)?;
        let len = self.len();
        if index > len {
            return Err(ValueError::IndexOutOfBounds { index, len });
        }
        Arc::make_mut(&mut self.0).items.insert(index, value.into());
        Ok(())
    }

    /// Remove the item at `index`, shifting later items down
    ///
    /// # Errors
    /// Returns [`ValueError::ImmutableViolation`] if the list is frozen, or
    /// [`ValueError::IndexOutOfBounds`] if `index >= len`
    pub fn remove(&mut self, index: usize) -> Result<Value, ValueError> {
        self.check_unfrozen(index)?;
        let len = self.len();
        if index >= len {
            return Err(ValueError::IndexOutOfBounds { index, len });
        }
        Ok(Arc::make_mut(&mut self.0).items.remove(index))
    }

    /// Whether the list rejects writes
    #[inline]
    #[must_use]
    pub fn is_frozen(&self) -> bool {
        self.0.frozen.load(Ordering::Acquire)
    }

    /// Deep-freeze this list and every container reachable from it
    pub fn freeze(&self) {
        if self.is_frozen() {
            return;
        }
        for value in &self.0.items {
            value.freeze();
        }
        self.0.frozen.store(true, Ordering::Release);
    }

    /// Reference equality
    #[inline]
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Address of the node, for diagnostics
    #[inline]
    #[must_use]
    pub fn addr(&self) -> usize {
        Arc::as_ptr(&self.0) as usize
    }
}

impl PartialEq for List {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || self.0.items == other.0.items
    }
}

impl Debug for List {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.0.items.iter()).finish()
    }
}

impl<V: Into<Value>> FromIterator<V> for List {
    fn from_iter<I: IntoIterator<Item = V>>(iter: I) -> Self {
        Self::from_vec(iter.into_iter().map(Into::into).collect())
    }
}

impl<'a> IntoIterator for &'a List {
    type Item = &'a Value;
    type IntoIter = std::slice::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str) -> Map {
        [("id", Value::from(id)), ("foo", Value::from("foo"))]
            .into_iter()
            .collect()
    }

    #[test]
    fn map_insert_on_shared_node_leaves_other_holder_alone() {
        let original = record("i1");
        let mut edited = original.clone();
        assert!(edited.ptr_eq(&original));

        edited.insert("foo", "new foo").unwrap();

        assert!(!edited.ptr_eq(&original));
        assert_eq!(original.get("foo"), Some(&Value::from("foo")));
        assert_eq!(edited.get("foo"), Some(&Value::from("new foo")));
    }

    #[test]
    fn map_remove_preserves_order() {
        let mut map: Map = [("a", 1), ("b", 2), ("c", 3)].into_iter().collect();
        map.remove("b").unwrap();
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["a", "c"]);
        assert_eq!(map.remove("zzz").unwrap(), None);
    }

    #[test]
    fn frozen_map_rejects_writes() {
        let mut map = record("i1");
        map.freeze();

        let err = map.insert("foo", "x").unwrap_err();
        assert_eq!(
            err,
            ValueError::ImmutableViolation {
                kind: ValueKind::Map,
                key: Key::from("foo"),
            }
        );
        assert!(map.remove("foo").is_err());
        assert_eq!(map.get("foo"), Some(&Value::from("foo")));
    }

    #[test]
    fn freeze_is_deep() {
        let inner = record("i1");
        let list: List = vec![Value::Map(inner.clone())].into_iter().collect();
        list.freeze();

        assert!(list.is_frozen());
        assert!(inner.is_frozen());
    }

    #[test]
    fn list_bounds_are_checked() {
        let mut list: List = [1, 2].into_iter().collect();
        assert_eq!(
            list.set(2, 3).unwrap_err(),
            ValueError::IndexOutOfBounds { index: 2, len: 2 }
        );
        list.insert(2, 3).unwrap();
        assert_eq!(list.remove(0).unwrap(), Value::from(1));
        assert_eq!(list.as_slice(), &[Value::from(2), Value::from(3)]);
    }

    #[test]
    fn frozen_list_rejects_push_and_pop() {
        let mut list: List = [1].into_iter().collect();
        list.freeze();
        assert!(list.push(2).is_err());
        assert!(list.pop().is_err());
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn equality_short_circuits_on_identity_and_falls_back_to_structure() {
        let a = record("i1");
        let b = record("i1");
        assert!(!a.ptr_eq(&b));
        assert_eq!(a, b);
        assert_ne!(a, record("i2"));
    }

    proptest::proptest! {
        #[test]
        fn prop_writes_to_a_clone_never_reach_the_original(
            items in proptest::collection::vec(0i64..100, 0..16),
            pushes in proptest::collection::vec(0i64..100, 0..8),
        ) {
            let original: List = items.iter().copied().collect();
            let mut edited = original.clone();
            for item in &pushes {
                edited.push(*item).unwrap();
            }
            if !edited.is_empty() {
                edited.remove(0).unwrap();
            }

            proptest::prop_assert_eq!(original.len(), items.len());
            proptest::prop_assert!(original.iter().map(Value::as_i64).eq(items.iter().copied().map(Some)));
        }

        #[test]
        fn prop_frozen_list_rejects_every_write(
            items in proptest::collection::vec(0i64..100, 1..16),
            index in 0usize..16,
        ) {
            let mut list: List = items.iter().copied().collect();
            list.freeze();
            proptest::prop_assert!(list.push(0).is_err());
            proptest::prop_assert!(list.pop().is_err());
            proptest::prop_assert!(list.set(index, 0).is_err());
            proptest::prop_assert!(list.insert(index, 0).is_err());
            proptest::prop_assert!(list.remove(index).is_err());
            proptest::prop_assert_eq!(list.len(), items.len());
        }
    }
}
