use cowdraft::{produce, Draft, DraftResult, Key, Slot, Value};
use cowdraft_test_utils::{
    arb_action, arb_dict_state, arb_list_state, arb_map_tree, classic_dict_reducer, containers,
    deep_clone, draft_dict_reducer, draft_list_reducer, vanilla_list_reducer, Action,
};
use proptest::prelude::*;

/// Read every slot of the tree through drafts without writing anything
fn visit(draft: Draft<'_>) -> DraftResult<()> {
    for key in draft.keys() {
        if let Some(Slot::Draft(child)) = draft.get(key)? {
            visit(child)?;
        }
    }
    Ok(())
}

/// Overwrite every leaf under `draft` whose key starts with `a`
fn scribble(draft: Draft<'_>) -> DraftResult<()> {
    for key in draft.keys() {
        match draft.get(key.clone())? {
            Some(Slot::Draft(child)) => scribble(child)?,
            Some(Slot::Leaf(_)) if key.as_field().is_some_and(|name| name.starts_with('a')) => {
                draft.set(key, "scribbled")?;
            }
            _ => {}
        }
    }
    Ok(())
}

fn untouched_items(action: &Action) -> impl Fn(&Value) -> bool + '_ {
    move |item| {
        let id = item.get("id").and_then(Value::as_str);
        match action {
            Action::EditFoo { id: target, .. } | Action::Remove { id: target } => {
                id != Some(target.as_str())
            }
            Action::Add(_) | Action::AddAll(_) => true,
        }
    }
}

proptest! {
    #[test]
    fn prop_no_op_returns_the_base(tree in arb_map_tree()) {
        let next = produce(&tree, |_| Ok(())).unwrap();
        prop_assert!(next.ptr_eq(&tree));

        let read_only = produce(&tree, visit).unwrap();
        prop_assert!(read_only.ptr_eq(&tree));
    }

    #[test]
    fn prop_base_is_never_mutated(tree in arb_map_tree()) {
        let snapshot = deep_clone(&tree);
        let next = produce(&tree, |draft| {
            scribble(draft)?;
            draft.set("zz_new", 1)?;
            if let Some(first) = draft.keys().into_iter().next() {
                draft.delete(first)?;
            }
            Ok(())
        })
        .unwrap();

        prop_assert_eq!(&tree, &snapshot);
        prop_assert!(!next.ptr_eq(&tree));
    }

    #[test]
    fn prop_untouched_children_are_shared(tree in arb_map_tree()) {
        let next = produce(&tree, |draft| draft.set("zz_new", "new")).unwrap();
        let (before, after) = (tree.as_map().unwrap(), next.as_map().unwrap());

        prop_assert_eq!(after.len(), before.len() + 1);
        for (key, child) in before.iter() {
            prop_assert!(after.get(key).unwrap().ptr_eq(child));
        }
    }

    #[test]
    fn prop_result_is_frozen(tree in arb_map_tree()) {
        let next = produce(&tree, scribble).unwrap();
        for container in containers(&next) {
            prop_assert!(container.is_frozen());
            let mut map = match container {
                Value::Map(map) => map,
                _ => continue,
            };
            prop_assert!(map.insert("zz", 0).is_err());
        }
    }

    #[test]
    fn prop_current_matches_result(tree in arb_map_tree()) {
        let mut snapshot = None;
        let next = produce(&tree, |draft| {
            scribble(draft)?;
            snapshot = Some(draft.current()?);
            Ok(())
        })
        .unwrap();
        prop_assert_eq!(Some(next), snapshot);
    }

    #[test]
    fn prop_list_reducers_agree(state in arb_list_state(), action in arb_action()) {
        let vanilla = vanilla_list_reducer(&state, &action);
        let drafted = draft_list_reducer(&state, &action).unwrap();
        prop_assert_eq!(&drafted, &vanilla);

        let keep = untouched_items(&action);
        let base_items = state.get("items").and_then(Value::as_list).unwrap();
        let next_items = drafted.get("items").and_then(Value::as_list).unwrap();
        for old in base_items.iter().filter(|item| keep(item)) {
            prop_assert!(next_items.iter().any(|new| new.ptr_eq(old)));
        }
    }

    #[test]
    fn prop_dict_reducers_agree(state in arb_dict_state(), action in arb_action()) {
        let classic = classic_dict_reducer(&state, &action);
        let drafted = draft_dict_reducer()(&state, action.clone()).unwrap();
        prop_assert_eq!(&drafted, &classic);

        let keep = untouched_items(&action);
        let base_items = state.get("items").and_then(Value::as_map).unwrap();
        for (id, old) in base_items.iter().filter(|(_, item)| keep(item)) {
            let replaced = match &action {
                Action::Add(item) => item.get("id") == Some(&Value::from(id)),
                Action::AddAll(all) => all.iter().any(|item| item.get("id") == Some(&Value::from(id))),
                _ => false,
            };
            if !replaced {
                let new = drafted.get_path(&[Key::from("items"), Key::from(id)].into_iter().collect());
                prop_assert!(new.is_some_and(|new| new.ptr_eq(old)));
            }
        }
    }
}
