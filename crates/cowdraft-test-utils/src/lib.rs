//! Testing utilities for cowdraft workspace
//!
//! Shared fixtures, reducers and property-test strategies.
//!
//! The reducers come in pairs: a spread-style one that copies each level by
//! hand, and a draft-based one built on [`cowdraft::produce`]. Both must
//! agree on every state and action.

#![allow(missing_docs)]

use cowdraft::{produce, DraftResult, Producer, Slot};
use cowdraft_value::{List, Map, Value};
use proptest::prelude::*;

// ============================================================================
// Fixtures
// ============================================================================

pub fn item(id: &str, foo: &str, bar: &str) -> Value {
    [("id", id), ("foo", foo), ("bar", bar)]
        .into_iter()
        .collect::<Map>()
        .into()
}

/// `{ otherStuff, items: [..] }`
pub fn list_state(items: Vec<Value>) -> Value {
    [
        ("otherStuff", Value::from("")),
        ("items", List::from_vec(items).into()),
    ]
    .into_iter()
    .collect::<Map>()
    .into()
}

/// `{ otherStuff, items: { id: item } }`
pub fn dict_state(items: Vec<Value>) -> Value {
    let items: Map = items
        .into_iter()
        .map(|item| (id_of(&item).unwrap_or_default().to_string(), item))
        .collect();
    [("otherStuff", Value::from("")), ("items", items.into())]
        .into_iter()
        .collect::<Map>()
        .into()
}

/// Two records, `i1` and `i2`, as a list
pub fn two_item_list() -> Value {
    list_state(vec![item("i1", "foo", "bar"), item("i2", "foo", "bar")])
}

/// Two records, `i1` and `i2`, keyed by id
pub fn two_item_dict() -> Value {
    dict_state(vec![item("i1", "foo", "bar"), item("i2", "foo", "bar")])
}

fn form_data(suffix_a: &str, suffix_b: &str) -> Value {
    let sub = |suffix: &str| -> Value {
        [
            ("foo", format!("foo{suffix}")),
            ("bar", format!("bar{suffix}")),
        ]
        .into_iter()
        .collect::<Map>()
        .into()
    };
    [("subObjectA", sub(suffix_a)), ("subObjectB", sub(suffix_b))]
        .into_iter()
        .collect::<Map>()
        .into()
}

/// `{ fetchedData: { subObjectA, subObjectB }, editedPerCategory: {} }`
pub fn form_state() -> Value {
    [
        ("fetchedData", form_data(".a", ".b")),
        ("editedPerCategory", Map::new().into()),
    ]
    .into_iter()
    .collect::<Map>()
    .into()
}

/// `{ user: { name, posts: [{ title, content }] } }`
pub fn user_state() -> Value {
    let post: Value = [("title", "Foo"), ("content", "Bar")]
        .into_iter()
        .collect::<Map>()
        .into();
    let user: Value = [
        ("name", Value::from("joe")),
        ("posts", List::from_vec(vec![post]).into()),
    ]
    .into_iter()
    .collect::<Map>()
    .into();
    [("user", user)].into_iter().collect::<Map>().into()
}

/// `[{ id, key }]` with ids 1..=3 and keys a..=c
pub fn keyed_items() -> Value {
    [(1, "a"), (2, "b"), (3, "c")]
        .into_iter()
        .map(|(id, key)| -> Value {
            [("id", Value::from(id)), ("key", Value::from(key))]
                .into_iter()
                .collect::<Map>()
                .into()
        })
        .collect::<List>()
        .into()
}

fn id_of(item: &Value) -> Option<&str> {
    item.get("id").and_then(Value::as_str)
}

// ============================================================================
// Reducers
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Add(Value),
    AddAll(Vec<Value>),
    Remove { id: String },
    EditFoo { id: String, value: String },
}

/// Fresh, unfrozen map with the same entries
fn spread(map: &Map) -> Map {
    Map::from_entries(map.entries().clone())
}

fn with_field(state: &Value, key: &str, value: Value) -> Value {
    let mut next = spread(state.as_map().expect("state is a map"));
    next.insert(key, value).expect("fresh map is writable");
    next.into()
}

/// Spread-style reducer over list-shaped state
pub fn vanilla_list_reducer(state: &Value, action: &Action) -> Value {
    let items = state
        .get("items")
        .and_then(Value::as_list)
        .expect("state has an item list");
    let next: List = match action {
        Action::Add(item) => items.iter().cloned().chain([item.clone()]).collect(),
        Action::AddAll(all) => items.iter().chain(all).cloned().collect(),
        Action::Remove { id } => items
            .iter()
            .filter(|item| id_of(item) != Some(id.as_str()))
            .cloned()
            .collect(),
        Action::EditFoo { id, value } => items
            .iter()
            .map(|item| {
                if id_of(item) == Some(id.as_str()) {
                    with_field(item, "foo", value.as_str().into())
                } else {
                    item.clone()
                }
            })
            .collect(),
    };
    with_field(state, "items", next.into())
}

/// Spread-style reducer over dictionary-shaped state
pub fn classic_dict_reducer(state: &Value, action: &Action) -> Value {
    let items = state
        .get("items")
        .and_then(Value::as_map)
        .expect("state has an item map");
    let mut next = spread(items);
    match action {
        Action::Add(item) => {
            let id = id_of(item).unwrap_or_default();
            next.insert(id, item.clone()).expect("fresh map is writable");
        }
        Action::AddAll(all) => {
            for item in all {
                let id = id_of(item).unwrap_or_default();
                next.insert(id, item.clone()).expect("fresh map is writable");
            }
        }
        Action::Remove { id } => {
            next.remove(id).expect("fresh map is writable");
        }
        Action::EditFoo { id, value } => {
            if let Some(item) = items.get(id) {
                let edited = with_field(item, "foo", value.as_str().into());
                next.insert(id.as_str(), edited).expect("fresh map is writable");
            }
        }
    }
    with_field(state, "items", next.into())
}

fn has_id(slot: &Slot<'_>, id: &str) -> DraftResult<bool> {
    Ok(slot.value("id")? == Some(Value::from(id)))
}

/// Draft-based reducer over list-shaped state
pub fn draft_list_reducer(state: &Value, action: &Action) -> DraftResult<Value> {
    produce(state, |draft| {
        let items = draft.draft("items")?;
        match action {
            Action::Add(item) => items.push(item.clone()),
            Action::AddAll(all) => items.extend(all.iter().cloned()),
            Action::Remove { id } => items.retain(|_, item| Ok(!has_id(item, id)?)).map(drop),
            Action::EditFoo { id, value } => {
                match items.find(|item| has_id(item, id))?.and_then(|slot| slot.as_draft()) {
                    Some(item) => item.set("foo", value.as_str()),
                    None => Ok(()),
                }
            }
        }
    })
}

/// Draft-based reducer over dictionary-shaped state, built once with `curry`
pub fn draft_dict_reducer() -> impl Fn(&Value, Action) -> DraftResult<Value> {
    Producer::new().curry(|draft, action: Action| {
        let items = draft.draft("items")?;
        match &action {
            Action::Add(item) => items.set(id_of(item).unwrap_or_default(), item.clone()),
            Action::AddAll(all) => all
                .iter()
                .try_for_each(|item| items.set(id_of(item).unwrap_or_default(), item.clone())),
            Action::Remove { id } => items.delete(id.as_str()).map(drop),
            Action::EditFoo { id, value } => match items.get(id.as_str())? {
                Some(Slot::Draft(item)) => item.set("foo", value.as_str()),
                _ => Ok(()),
            },
        }
    })
}

// ============================================================================
// Baselines
// ============================================================================

/// Copy every container of the tree
pub fn deep_clone(value: &Value) -> Value {
    match value {
        Value::Map(map) => map
            .iter()
            .map(|(key, child)| (key, deep_clone(child)))
            .collect::<Map>()
            .into(),
        Value::List(list) => list.iter().map(deep_clone).collect::<List>().into(),
        leaf => leaf.clone(),
    }
}

/// Every container reachable from `value`, including itself
pub fn containers(value: &Value) -> Vec<Value> {
    let mut found = Vec::new();
    let mut stack = vec![value.clone()];
    while let Some(value) = stack.pop() {
        match &value {
            Value::Map(map) => stack.extend(map.iter().map(|(_, child)| child.clone())),
            Value::List(list) => stack.extend(list.iter().cloned()),
            _ => continue,
        }
        found.push(value);
    }
    found
}

// ============================================================================
// Strategies
// ============================================================================

pub fn arb_id() -> impl Strategy<Value = String> {
    "i[0-9]{1,2}"
}

pub fn arb_item() -> impl Strategy<Value = Value> {
    (arb_id(), "[a-z]{0,4}", "[a-z]{0,4}").prop_map(|(id, foo, bar)| item(&id, &foo, &bar))
}

/// List-shaped state with unique ids
pub fn arb_list_state() -> impl Strategy<Value = Value> {
    proptest::collection::vec(arb_item(), 0..8).prop_map(|items| {
        let mut seen = std::collections::HashSet::new();
        list_state(
            items
                .into_iter()
                .filter(|item| seen.insert(id_of(item).unwrap_or_default().to_string()))
                .collect(),
        )
    })
}

pub fn arb_dict_state() -> impl Strategy<Value = Value> {
    proptest::collection::vec(arb_item(), 0..8).prop_map(dict_state)
}

pub fn arb_action() -> impl Strategy<Value = Action> {
    prop_oneof![
        arb_item().prop_map(Action::Add),
        proptest::collection::vec(arb_item(), 0..4).prop_map(Action::AddAll),
        arb_id().prop_map(|id| Action::Remove { id }),
        (arb_id(), "[a-z]{0,4}").prop_map(|(id, value)| Action::EditFoo { id, value }),
    ]
}

/// Arbitrary tree of maps and lists with primitive leaves
pub fn arb_tree() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        (-1.0e6f64..1.0e6).prop_map(Value::from),
        "[a-z]{0,6}".prop_map(Value::from),
    ];
    leaf.prop_recursive(4, 48, 5, |inner| {
        prop_oneof![
            proptest::collection::vec(inner.clone(), 0..5)
                .prop_map(|items| List::from_vec(items).into()),
            proptest::collection::btree_map("[a-z]{1,3}", inner, 0..5)
                .prop_map(|fields| fields.into_iter().collect::<Map>().into()),
        ]
    })
}

/// Arbitrary map at the root
pub fn arb_map_tree() -> impl Strategy<Value = Value> {
    proptest::collection::btree_map("[a-z]{1,3}", arb_tree(), 0..6)
        .prop_map(|fields| fields.into_iter().collect::<Map>().into())
}

// ============================================================================
// Tracing
// ============================================================================

/// Install a test subscriber honoring `RUST_LOG`; later calls are no-ops
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
