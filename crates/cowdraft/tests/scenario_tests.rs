use cowdraft::{
    active_scopes, produce, try_produce, DraftError, KeyPath, List, Map, Outcome, Value,
};
use cowdraft_test_utils::{
    classic_dict_reducer, deep_clone, draft_dict_reducer, draft_list_reducer, init_tracing, item,
    keyed_items, two_item_dict, two_item_list, user_state, vanilla_list_reducer, Action,
};
use pretty_assertions::assert_eq;

fn at<'v>(value: &'v Value, path: &str) -> &'v Value {
    let path: KeyPath = path.parse().unwrap();
    value
        .get_path(&path)
        .unwrap_or_else(|| panic!("nothing at {path}"))
}

fn edit_i1() -> Action {
    Action::EditFoo {
        id: "i1".into(),
        value: "new foo".into(),
    }
}

#[test]
fn test_edit_one_item_in_list() {
    init_tracing();
    let state = two_item_list();

    let vanilla = vanilla_list_reducer(&state, &edit_i1());
    let drafted = draft_list_reducer(&state, &edit_i1()).unwrap();

    assert_eq!(drafted, vanilla);
    assert_eq!(at(&drafted, "items[0].foo"), &Value::from("new foo"));

    // item 1 changed
    assert!(!at(&state, "items[0]").ptr_eq(at(&vanilla, "items[0]")));
    assert!(!at(&state, "items[0]").ptr_eq(at(&drafted, "items[0]")));
    // item 2 unchanged
    assert!(at(&state, "items[1]").ptr_eq(at(&vanilla, "items[1]")));
    assert!(at(&state, "items[1]").ptr_eq(at(&drafted, "items[1]")));

    assert_eq!(at(&state, "items[0].foo"), &Value::from("foo"));
}

#[test]
fn test_edit_one_item_in_dict() {
    let state = two_item_dict();
    let reduce = draft_dict_reducer();

    let classic = classic_dict_reducer(&state, &edit_i1());
    let drafted = reduce(&state, edit_i1()).unwrap();

    assert_eq!(drafted, classic);
    assert!(!at(&state, "items.i1").ptr_eq(at(&drafted, "items.i1")));
    assert!(at(&state, "items.i2").ptr_eq(at(&classic, "items.i2")));
    assert!(at(&state, "items.i2").ptr_eq(at(&drafted, "items.i2")));
    assert!(at(&state, "otherStuff").ptr_eq(at(&drafted, "otherStuff")));
}

#[test]
fn test_add_and_remove_in_list() {
    let state = two_item_list();

    let added = draft_list_reducer(&state, &Action::Add(item("i3", "foo", "bar"))).unwrap();
    assert_eq!(at(&added, "items").as_list().unwrap().len(), 3);
    assert!(at(&state, "items[1]").ptr_eq(at(&added, "items[1]")));

    let removed = draft_list_reducer(&added, &Action::Remove { id: "i1".into() }).unwrap();
    assert_eq!(
        removed,
        vanilla_list_reducer(&added, &Action::Remove { id: "i1".into() })
    );
    assert!(at(&added, "items[1]").ptr_eq(at(&removed, "items[0]")));
}

#[test]
fn test_edit_of_missing_item_keeps_state() {
    let state = two_item_list();
    let missing = Action::EditFoo {
        id: "nope".into(),
        value: "x".into(),
    };
    let next = draft_list_reducer(&state, &missing).unwrap();
    assert!(next.ptr_eq(&state));
}

#[test]
fn test_three_ways_to_change_a_list() {
    let items = keyed_items();
    let extra = || -> Value {
        [("id", Value::from(4)), ("key", Value::from("d"))]
            .into_iter()
            .collect::<Map>()
            .into()
    };

    let drafted = produce(&items, |draft| {
        draft.draft(0usize)?.set("key", "A")?;
        draft.push(extra())
    })
    .unwrap();

    let spread: List = items
        .as_list()
        .unwrap()
        .iter()
        .enumerate()
        .map(|(i, it)| {
            if i == 0 {
                let mut copy = Map::from_entries(it.as_map().unwrap().entries().clone());
                copy.insert("key", "A").unwrap();
                copy.into()
            } else {
                it.clone()
            }
        })
        .chain([extra()])
        .collect();
    let spread = Value::from(spread);

    let naive = deep_clone(&items);
    let naive = produce(&naive, |draft| {
        draft.draft(0usize)?.set("key", "A")?;
        draft.push(extra())
    })
    .unwrap();

    assert_eq!(drafted, spread);
    assert_eq!(drafted, naive);

    let reused = |changed: &Value| -> Vec<bool> {
        (0..3usize)
            .map(|i| items.get(i).unwrap().ptr_eq(changed.get(i).unwrap()))
            .collect()
    };
    assert_eq!(reused(&drafted), vec![false, true, true]);
    assert_eq!(reused(&spread), vec![false, true, true]);
    assert_eq!(reused(&naive), vec![false, false, false]);
    assert_eq!(at(&items, "[0].key"), &Value::from("a"));
}

#[test]
fn test_index_list_into_map() {
    let items = keyed_items();
    let indexed = produce(&Map::new().into(), |draft| {
        for it in items.as_list().unwrap() {
            let id = it.get("id").and_then(Value::as_i64).unwrap_or_default();
            draft.set(id.to_string(), it.clone())?;
        }
        Ok(())
    })
    .unwrap();

    let map = indexed.as_map().unwrap();
    assert_eq!(map.keys().collect::<Vec<_>>(), vec!["1", "2", "3"]);
    assert!(map.get("2").unwrap().ptr_eq(items.get(1usize).unwrap()));

    // numeric field names stay fields when addressed by path
    let two: KeyPath = "$.2".parse().unwrap();
    assert_eq!(two.to_string().parse::<KeyPath>().unwrap(), two);
    assert!(at(&indexed, "2").ptr_eq(items.get(1usize).unwrap()));

    let edited = produce(&indexed, |draft| draft.draft_at(&two)?.set("key", "B")).unwrap();
    assert_eq!(at(&edited, "2.key"), &Value::from("B"));
    assert!(at(&edited, "1").ptr_eq(at(&indexed, "1")));
}

fn transform_user(user: &Value) -> Value {
    let posts: List = user
        .get("posts")
        .and_then(Value::as_list)
        .into_iter()
        .flatten()
        .map(|post| -> Value {
            let text = |key: &str| post.get(key).and_then(Value::as_str).unwrap_or_default();
            [
                ("title", text("title").to_uppercase()),
                ("content", text("content").to_lowercase()),
            ]
            .into_iter()
            .collect::<Map>()
            .into()
        })
        .collect();
    let mut next = Map::from_entries(user.as_map().unwrap().entries().clone());
    next.insert("posts", posts).unwrap();
    next.into()
}

#[test]
fn test_replace_subtree_with_transformed_value() {
    let state = user_state();
    let next = produce(&state, |draft| {
        let user = draft
            .value("user")?
            .ok_or(DraftError::MissingKey {
                path: KeyPath::single("user"),
            })?;
        draft.set("user", transform_user(&user))
    })
    .unwrap();

    assert_eq!(
        next.to_json().unwrap(),
        serde_json::json!({"user": {"name": "joe", "posts": [{"title": "FOO", "content": "bar"}]}})
    );
    assert_eq!(at(&state, "user.posts[0].title"), &Value::from("Foo"));
}

#[test]
fn test_replace_whole_state() {
    let state = user_state();
    let next = produce(&state, |draft| {
        let user = transform_user(&draft.original().get("user").cloned().unwrap_or_default());
        Ok(Outcome::Replace([("user", user)].into_iter().collect::<Map>().into()))
    })
    .unwrap();

    assert_eq!(at(&next, "user.posts[0].content"), &Value::from("bar"));
    assert!(next.is_frozen());
}

#[test]
fn test_nested_produce_uses_its_own_scope() {
    let state = two_item_list();
    let outer_depth = active_scopes();

    let next = produce(&state, |draft| {
        assert_eq!(active_scopes(), outer_depth + 1);
        let items = draft.draft("items")?;

        let first = items.draft(0usize)?.original();
        let edited = produce(&first, |inner| {
            assert_eq!(active_scopes(), outer_depth + 2);
            inner.set("bar", "inner bar")
        })?;
        assert_eq!(active_scopes(), outer_depth + 1);

        items.set(0usize, edited)?;
        items.draft(1usize)?.set("bar", "outer bar")
    })
    .unwrap();

    assert_eq!(active_scopes(), outer_depth);
    assert_eq!(at(&next, "items[0].bar"), &Value::from("inner bar"));
    assert_eq!(at(&next, "items[1].bar"), &Value::from("outer bar"));
    assert_eq!(at(&state, "items[0].bar"), &Value::from("bar"));
}

#[derive(Debug, thiserror::Error)]
enum ReducerError {
    #[error(transparent)]
    Draft(#[from] DraftError),
    #[error("item {0} is locked")]
    Locked(String),
}

#[test]
fn test_recipe_error_discards_drafts() {
    let state = two_item_list();
    let before = active_scopes();

    let result: Result<Value, ReducerError> = try_produce(&state, |draft| {
        let item = draft.draft("items")?.draft(0usize)?;
        item.set("foo", "half done")?;
        Err::<(), _>(ReducerError::Locked("i1".into()))
    });

    assert!(matches!(result, Err(ReducerError::Locked(ref id)) if id == "i1"));
    assert_eq!(active_scopes(), before);
    assert_eq!(at(&state, "items[0].foo"), &Value::from("foo"));
    assert!(!state.is_frozen());
}

#[test]
fn test_draft_errors_convert_into_recipe_errors() {
    let state = two_item_list();
    let result: Result<Value, ReducerError> =
        try_produce(&state, |draft| draft.draft("missing").map(drop).map_err(Into::into));
    assert!(matches!(
        result,
        Err(ReducerError::Draft(DraftError::MissingKey { .. }))
    ));

    let leaf = try_produce::<(), ReducerError, _>(&Value::from(1), |_| Ok(()));
    assert!(matches!(
        leaf,
        Err(ReducerError::Draft(DraftError::NotAContainer { .. }))
    ));
}
