//! Draft nodes
//!
//! A [`DraftNode`] wraps one base container for the lifetime of a scope. It
//! reads through to `base` until the first write, then serves every access
//! from a shallow `copy`.

use cowdraft_value::{Key, KeyPath, List, Map, Value, ValueKind};
use indexmap::IndexMap;
use std::collections::HashMap;
use std::fmt::{self, Display, Formatter};

/// Index of a node in its scope's arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct DraftId(pub(crate) usize);

impl Display for DraftId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The base container a node wraps
#[derive(Debug, Clone)]
pub(crate) enum Container {
    Map(Map),
    List(List),
}

impl Container {
    /// Container view of a value; `None` for leaves
    pub(crate) fn of(value: &Value) -> Option<Self> {
        match value {
            Value::Map(map) => Some(Self::Map(map.clone())),
            Value::List(list) => Some(Self::List(list.clone())),
            _ => None,
        }
    }

    pub(crate) fn kind(&self) -> ValueKind {
        match self {
            Self::Map(_) => ValueKind::Map,
            Self::List(_) => ValueKind::List,
        }
    }

    pub(crate) fn to_value(&self) -> Value {
        match self {
            Self::Map(map) => Value::Map(map.clone()),
            Self::List(list) => Value::List(list.clone()),
        }
    }
}

/// One slot of a node's copy
#[derive(Debug, Clone)]
pub(crate) enum Entry {
    /// Stored verbatim; containers are wrapped on the next read
    Value(Value),
    /// Draft of this scope, finalized recursively
    Draft(DraftId),
}

/// Shallow, writable copy of a container
#[derive(Debug, Clone)]
pub(crate) enum Body {
    Map(IndexMap<String, Entry>),
    List(Vec<Entry>),
}

impl Body {
    pub(crate) fn len(&self) -> usize {
        match self {
            Self::Map(entries) => entries.len(),
            Self::List(items) => items.len(),
        }
    }

    pub(crate) fn get(&self, key: &Key) -> Option<&Entry> {
        match (self, key) {
            (Self::Map(entries), Key::Field(name)) => entries.get(name),
            (Self::List(items), Key::Index(index)) => items.get(*index),
            _ => None,
        }
    }

    pub(crate) fn get_mut(&mut self, key: &Key) -> Option<&mut Entry> {
        match (self, key) {
            (Self::Map(entries), Key::Field(name)) => entries.get_mut(name),
            (Self::List(items), Key::Index(index)) => items.get_mut(*index),
            _ => None,
        }
    }
}

/// Lazy wrapper around one base container
#[derive(Debug)]
pub(crate) struct DraftNode {
    /// Original container, never written
    pub(crate) base: Container,
    /// Allocated on first write to a direct child
    pub(crate) copy: Option<Body>,
    /// Child drafts created by reads before `copy` exists
    pub(crate) wraps: HashMap<Key, DraftId>,
    pub(crate) modified: bool,
    pub(crate) parent: Option<DraftId>,
    /// Key in the parent at the time of wrapping
    pub(crate) key: Option<Key>,
    /// Cached finalized value
    pub(crate) finalized: Option<Value>,
}

impl DraftNode {
    pub(crate) fn new(base: Container, parent: Option<DraftId>, key: Option<Key>) -> Self {
        Self {
            base,
            copy: None,
            wraps: HashMap::new(),
            modified: false,
            parent,
            key,
            finalized: None,
        }
    }

    pub(crate) fn kind(&self) -> ValueKind {
        self.base.kind()
    }

    pub(crate) fn len(&self) -> usize {
        match (&self.copy, &self.base) {
            (Some(body), _) => body.len(),
            (None, Container::Map(map)) => map.len(),
            (None, Container::List(list)) => list.len(),
        }
    }

    /// Keys of the current state, in order
    pub(crate) fn keys(&self) -> Vec<Key> {
        match (&self.copy, &self.base) {
            (Some(Body::Map(entries)), _) => entries.keys().cloned().map(Key::Field).collect(),
            (None, Container::Map(map)) => map.keys().map(Key::from).collect(),
            _ => (0..self.len()).map(Key::Index).collect(),
        }
    }

    /// Current entry at `key`, reading through to `base` before the copy exists
    pub(crate) fn read(&self, key: &Key) -> Option<Entry> {
        if let Some(body) = &self.copy {
            return body.get(key).cloned();
        }
        if let Some(child) = self.wraps.get(key) {
            return Some(Entry::Draft(*child));
        }
        let value = match (&self.base, key) {
            (Container::Map(map), Key::Field(name)) => map.get(name),
            (Container::List(list), Key::Index(index)) => list.get(*index),
            _ => None,
        };
        value.cloned().map(Entry::Value)
    }

    /// Remember that the slot at `key` is now served by `child`
    pub(crate) fn record_wrap(&mut self, key: Key, child: DraftId) {
        match &mut self.copy {
            Some(body) => {
                if let Some(entry) = body.get_mut(&key) {
                    *entry = Entry::Draft(child);
                }
            }
            None => {
                self.wraps.insert(key, child);
            }
        }
    }

    /// Shallow clone of `base` with the pending wraps in place
    pub(crate) fn shallow_body(&self) -> Body {
        match &self.base {
            Container::Map(map) => Body::Map(
                map.iter()
                    .map(|(name, value)| {
                        let entry = match self.wraps.get(&Key::from(name)) {
                            Some(child) => Entry::Draft(*child),
                            None => Entry::Value(value.clone()),
                        };
                        (name.to_string(), entry)
                    })
                    .collect(),
            ),
            Container::List(list) => Body::List(
                list.iter()
                    .enumerate()
                    .map(|(index, value)| match self.wraps.get(&Key::Index(index)) {
                        Some(child) => Entry::Draft(*child),
                        None => Entry::Value(value.clone()),
                    })
                    .collect(),
            ),
        }
    }

    /// The writable copy, allocated from `base` on first use
    pub(crate) fn copy_mut(&mut self) -> &mut Body {
        let body = match self.copy.take() {
            Some(body) => body,
            None => {
                let body = self.shallow_body();
                self.wraps.clear();
                body
            }
        };
        self.copy.insert(body)
    }
}

/// Path of a node, following parent links to the root
pub(crate) fn path_of(nodes: &[DraftNode], id: DraftId) -> KeyPath {
    let node = &nodes[id.0];
    let mut path = node
        .parent
        .map_or_else(KeyPath::root, |parent| path_of(nodes, parent));
    if let Some(key) = &node.key {
        path.push(key.clone());
    }
    path
}
