//! Draft finalization
//!
//! Turns a draft tree back into plain values. Unmodified nodes resolve to
//! their base container unchanged; modified nodes are rebuilt from their copy
//! with every child draft resolved in turn.

use crate::error::{DraftError, DraftResult};
use crate::node::{path_of, Body, DraftId, DraftNode, Entry};
use cowdraft_value::{List, Map, Value};
use indexmap::IndexMap;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Mode {
    /// End of the produce call; results are cached on the nodes
    Finalize,
    /// Mid-recipe snapshot; nodes are left as they are
    Snapshot,
}

pub(crate) struct Finalizer<'a> {
    nodes: &'a mut [DraftNode],
    mode: Mode,
    visiting: HashSet<DraftId>,
    resolved: HashMap<DraftId, Value>,
}

impl<'a> Finalizer<'a> {
    pub(crate) fn new(nodes: &'a mut [DraftNode], mode: Mode) -> Self {
        Self {
            nodes,
            mode,
            visiting: HashSet::new(),
            resolved: HashMap::new(),
        }
    }

    /// Value of the draft `id` and everything under it
    pub(crate) fn resolve(&mut self, id: DraftId) -> DraftResult<Value> {
        let node = &self.nodes[id.0];
        if let Some(value) = &node.finalized {
            return Ok(value.clone());
        }
        if !node.modified {
            return Ok(node.base.to_value());
        }
        if let Some(value) = self.resolved.get(&id) {
            return Ok(value.clone());
        }
        if !self.visiting.insert(id) {
            return Err(DraftError::CyclicStructure {
                path: path_of(self.nodes, id),
            });
        }

        let body = match &node.copy {
            Some(body) => body.clone(),
            None => node.shallow_body(),
        };
        let value = match body {
            Body::Map(entries) => {
                let mut fields = IndexMap::with_capacity(entries.len());
                for (name, entry) in entries {
                    fields.insert(name, self.entry(entry)?);
                }
                Value::Map(Map::from_entries(fields))
            }
            Body::List(items) => {
                let mut values = Vec::with_capacity(items.len());
                for entry in items {
                    values.push(self.entry(entry)?);
                }
                Value::List(List::from_vec(values))
            }
        };

        self.visiting.remove(&id);
        self.resolved.insert(id, value.clone());
        if self.mode == Mode::Finalize {
            tracing::trace!(draft = %id, path = %path_of(self.nodes, id), "finalized draft");
            self.nodes[id.0].finalized = Some(value.clone());
        }
        Ok(value)
    }

    fn entry(&mut self, entry: Entry) -> DraftResult<Value> {
        match entry {
            Entry::Value(value) => Ok(value),
            Entry::Draft(child) => self.resolve(child),
        }
    }
}
