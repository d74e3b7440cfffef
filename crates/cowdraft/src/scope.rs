//! Produce scopes
//!
//! A [`Scope`] owns every draft node created during one produce call. Nodes
//! live in an arena and refer to each other by [`DraftId`]; the arena is
//! behind a `RefCell` so that any number of [`Draft`](crate::Draft) handles
//! can read and write through the same scope.
//!
//! # Aliasing
//!
//! Wraps are keyed by slot: (parent node, key). Reading the same slot twice
//! yields the same node. A base container written verbatim into another slot
//! is wrapped independently when that slot is read, so the two locations
//! never observe each other's edits. Sharing one node between two locations
//! requires storing the draft itself ([`Entry::Draft`]).

use crate::config::{ProduceConfig, UnsupportedPolicy};
use crate::error::{DraftError, DraftResult};
use crate::finalize::{Finalizer, Mode};
use crate::node::{path_of, Body, Container, DraftId, DraftNode, Entry};
use cowdraft_value::{Key, KeyPath, Value, ValueKind};
use std::cell::{Cell, RefCell};
use std::fmt::{self, Display, Formatter};
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_SCOPE_ID: AtomicU64 = AtomicU64::new(1);

thread_local! {
    static DEPTH: Cell<usize> = const { Cell::new(0) };
}

/// Number of produce calls currently open on this thread
///
/// Nested produce calls from inside a recipe each add one.
#[must_use]
pub fn active_scopes() -> usize {
    DEPTH.with(Cell::get)
}

/// Process-unique scope identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct ScopeId(u64);

impl Display for ScopeId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "scope-{}", self.0)
    }
}

/// A slot read through a draft
#[derive(Debug)]
pub(crate) enum Resolved {
    Draft(DraftId),
    Leaf(Value),
}

/// Node arena and identity tracking for one produce call
pub(crate) struct Scope {
    id: ScopeId,
    depth: usize,
    config: ProduceConfig,
    nodes: RefCell<Vec<DraftNode>>,
}

impl Scope {
    /// Open a scope nested inside whatever scopes are already open
    pub(crate) fn open(config: ProduceConfig) -> Self {
        let id = ScopeId(NEXT_SCOPE_ID.fetch_add(1, Ordering::Relaxed));
        let depth = DEPTH.with(|depth| {
            let next = depth.get() + 1;
            depth.set(next);
            next
        });
        tracing::debug!(scope = %id, depth, "opened produce scope");
        Self {
            id,
            depth,
            config,
            nodes: RefCell::new(Vec::new()),
        }
    }

    #[inline]
    pub(crate) fn id(&self) -> ScopeId {
        self.id
    }

    #[inline]
    pub(crate) fn depth(&self) -> usize {
        self.depth
    }

    /// Wrap the produce call's base value
    pub(crate) fn root(&self, base: &Value) -> DraftResult<DraftId> {
        let container = Container::of(base).ok_or(DraftError::NotAContainer {
            path: KeyPath::root(),
            found: base.kind(),
        })?;
        let mut nodes = self.nodes.borrow_mut();
        Ok(self.alloc(&mut nodes, container, None, None))
    }

    fn alloc(
        &self,
        nodes: &mut Vec<DraftNode>,
        base: Container,
        parent: Option<DraftId>,
        key: Option<Key>,
    ) -> DraftId {
        let id = DraftId(nodes.len());
        nodes.push(DraftNode::new(base, parent, key));
        tracing::trace!(scope = %self.id, draft = %id, path = %path_of(nodes, id), "created draft");
        id
    }

    pub(crate) fn path(&self, id: DraftId) -> KeyPath {
        path_of(&self.nodes.borrow(), id)
    }

    pub(crate) fn kind(&self, id: DraftId) -> ValueKind {
        self.nodes.borrow()[id.0].kind()
    }

    pub(crate) fn len(&self, id: DraftId) -> usize {
        self.nodes.borrow()[id.0].len()
    }

    pub(crate) fn keys(&self, id: DraftId) -> Vec<Key> {
        self.nodes.borrow()[id.0].keys()
    }

    pub(crate) fn contains(&self, id: DraftId, key: &Key) -> bool {
        self.nodes.borrow()[id.0].read(key).is_some()
    }

    pub(crate) fn is_modified(&self, id: DraftId) -> bool {
        self.nodes.borrow()[id.0].modified
    }

    pub(crate) fn original(&self, id: DraftId) -> Value {
        self.nodes.borrow()[id.0].base.to_value()
    }

    fn check_key(nodes: &[DraftNode], id: DraftId, key: &Key) -> DraftResult<()> {
        let container = nodes[id.0].kind();
        match (container, key) {
            (ValueKind::Map, Key::Field(_)) | (ValueKind::List, Key::Index(_)) => Ok(()),
            _ => Err(DraftError::KeyKindMismatch {
                path: path_of(nodes, id),
                key: key.clone(),
                container,
            }),
        }
    }

    fn check_supported(
        &self,
        nodes: &[DraftNode],
        id: DraftId,
        key: &Key,
        value: &Value,
    ) -> DraftResult<()> {
        match (self.config.unsupported, value) {
            (UnsupportedPolicy::Reject, Value::Opaque(opaque)) => Err(DraftError::UnsupportedType {
                type_name: opaque.type_name(),
                path: path_of(nodes, id).child(key.clone()),
            }),
            _ => Ok(()),
        }
    }

    fn check_bounds(nodes: &[DraftNode], id: DraftId, index: usize, len: usize) -> DraftResult<()> {
        if index > len {
            return Err(DraftError::IndexOutOfBounds {
                path: path_of(nodes, id),
                index,
                len,
            });
        }
        Ok(())
    }

    /// Read a slot, wrapping containers in child drafts on first visit
    pub(crate) fn get(&self, id: DraftId, key: &Key) -> DraftResult<Option<Resolved>> {
        let mut nodes = self.nodes.borrow_mut();
        Self::check_key(&nodes, id, key)?;

        let value = match nodes[id.0].read(key) {
            None => return Ok(None),
            Some(Entry::Draft(child)) => return Ok(Some(Resolved::Draft(child))),
            Some(Entry::Value(value)) => value,
        };

        let Some(container) = Container::of(&value) else {
            self.check_supported(&nodes, id, key, &value)?;
            return Ok(Some(Resolved::Leaf(value)));
        };

        let child = self.alloc(&mut nodes, container, Some(id), Some(key.clone()));
        nodes[id.0].record_wrap(key.clone(), child);
        Ok(Some(Resolved::Draft(child)))
    }

    /// Run `write` against the node's copy and mark the node modified
    fn write_body<R>(
        &self,
        nodes: &mut [DraftNode],
        id: DraftId,
        write: impl FnOnce(&mut Body) -> R,
    ) -> R {
        let fresh = nodes[id.0].copy.is_none();
        let result = write(nodes[id.0].copy_mut());
        if fresh {
            tracing::trace!(scope = %self.id, draft = %id, "allocated draft copy");
        }
        Self::mark_modified(nodes, id);
        result
    }

    /// Mark `id` and its ancestors modified, stopping at the first that already is
    fn mark_modified(nodes: &mut [DraftNode], id: DraftId) {
        let mut current = Some(id);
        while let Some(DraftId(index)) = current {
            let node = &mut nodes[index];
            if node.modified {
                break;
            }
            node.modified = true;
            current = node.parent;
        }
    }

    /// Store `entry` at `key`; `Index(len)` appends to a list
    pub(crate) fn set(&self, id: DraftId, key: Key, entry: Entry) -> DraftResult<()> {
        let mut nodes = self.nodes.borrow_mut();
        Self::check_key(&nodes, id, &key)?;
        if let Entry::Value(value) = &entry {
            self.check_supported(&nodes, id, &key, value)?;
        }
        if let Key::Index(index) = key {
            Self::check_bounds(&nodes, id, index, nodes[id.0].len())?;
        }

        // Writing back what is already there leaves an untouched node untouched.
        let node = &nodes[id.0];
        if !node.modified {
            let unchanged = match (node.read(&key), &entry) {
                (Some(Entry::Value(current)), Entry::Value(value)) => current.ptr_eq(value),
                (Some(Entry::Draft(current)), Entry::Draft(draft)) => current == *draft,
                _ => false,
            };
            if unchanged {
                return Ok(());
            }
        }

        self.write_body(&mut nodes, id, |body| match (body, key) {
            (Body::Map(entries), Key::Field(name)) => {
                entries.insert(name, entry);
            }
            (Body::List(items), Key::Index(index)) => {
                if index == items.len() {
                    items.push(entry);
                } else {
                    items[index] = entry;
                }
            }
            // key kind checked above
            _ => {}
        });
        Ok(())
    }

    /// Remove `key`; lists shift later items down. Returns whether it existed.
    pub(crate) fn delete(&self, id: DraftId, key: &Key) -> DraftResult<bool> {
        let mut nodes = self.nodes.borrow_mut();
        Self::check_key(&nodes, id, key)?;
        if nodes[id.0].read(key).is_none() {
            return Ok(false);
        }

        self.write_body(&mut nodes, id, |body| match (body, key) {
            (Body::Map(entries), Key::Field(name)) => {
                entries.shift_remove(name);
            }
            (Body::List(items), Key::Index(index)) => {
                items.remove(*index);
            }
            _ => {}
        });
        Ok(true)
    }

    /// Insert into a list at `index`, shifting later items up
    pub(crate) fn insert(&self, id: DraftId, index: usize, entry: Entry) -> DraftResult<()> {
        let mut nodes = self.nodes.borrow_mut();
        let key = Key::Index(index);
        Self::check_key(&nodes, id, &key)?;
        if let Entry::Value(value) = &entry {
            self.check_supported(&nodes, id, &key, value)?;
        }
        Self::check_bounds(&nodes, id, index, nodes[id.0].len())?;

        self.write_body(&mut nodes, id, |body| {
            if let Body::List(items) = body {
                items.insert(index, entry);
            }
        });
        Ok(())
    }

    /// Remove the last item of a list
    pub(crate) fn pop(&self, id: DraftId) -> DraftResult<Option<Entry>> {
        let mut nodes = self.nodes.borrow_mut();
        let len = nodes[id.0].len();
        Self::check_key(&nodes, id, &Key::Index(len))?;
        if len == 0 {
            return Ok(None);
        }

        Ok(self.write_body(&mut nodes, id, |body| match body {
            Body::List(items) => items.pop(),
            Body::Map(_) => None,
        }))
    }

    /// Finalize the tree under `id`, caching each node's result
    pub(crate) fn finalize(&self, id: DraftId) -> DraftResult<Value> {
        let mut nodes = self.nodes.borrow_mut();
        Finalizer::new(&mut nodes, Mode::Finalize).resolve(id)
    }

    /// Snapshot the current state under `id` without caching
    pub(crate) fn current(&self, id: DraftId) -> DraftResult<Value> {
        let mut nodes = self.nodes.borrow_mut();
        Finalizer::new(&mut nodes, Mode::Snapshot).resolve(id)
    }

    /// Value of an entry taken out of the tree
    pub(crate) fn detach(&self, entry: Entry) -> DraftResult<Value> {
        match entry {
            Entry::Value(value) => Ok(value),
            Entry::Draft(child) => self.current(child),
        }
    }
}

impl Drop for Scope {
    fn drop(&mut self) {
        DEPTH.with(|depth| depth.set(depth.get().saturating_sub(1)));
        tracing::trace!(
            scope = %self.id,
            drafts = self.nodes.get_mut().len(),
            "closed produce scope"
        );
    }
}
