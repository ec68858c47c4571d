use std::sync::{Arc, Mutex};

use manos_nestable::{
    ChangeEvent, CollapseChange, CollapseTarget, Item, ItemId, Key, Nestable, NestableConfig,
    NestableError, Pointer,
};
use serde_json::{Value, json};

fn dump(items: &[Item], depth: usize, out: &mut String) {
    for node in items {
        out.push_str(&"  ".repeat(depth));
        out.push_str(node.id().as_str());
        out.push('\n');
        dump(node.child_items(), depth + 1, out);
    }
}

fn dumped(nestable: &Nestable) -> String {
    let mut s = String::new();
    dump(nestable.tree().roots(), 0, &mut s);
    s.trim_end().to_string()
}

fn id(id: &str) -> ItemId {
    ItemId::from(id)
}

fn recorder() -> (Arc<Mutex<Vec<ChangeEvent>>>, impl Fn(&ChangeEvent) + Send + Sync + 'static) {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    (events, move |event: &ChangeEvent| {
        sink.lock().unwrap().push(event.clone())
    })
}

#[test]
fn forward_reorder_commits_with_target_path() {
    let (events, on_change) = recorder();
    let mut nestable = Nestable::new(NestableConfig::default().group("menu"))
        .items(&[json!({ "id": "A" }), json!({ "id": "B" }), json!({ "id": "C" })])
        .unwrap()
        .on_change(on_change);

    assert!(nestable.begin_drag(&id("A"), Pointer::new(10.0, 10.0)).unwrap());
    assert!(nestable.hover(&id("C")).unwrap());
    assert_eq!(
        dumped(&nestable),
        r#"B
C
A"#
    );

    let event = nestable.end_drag().unwrap().unwrap();
    assert_eq!(event.target_path, vec![2]);
    assert_eq!(event.drag_item.id().as_str(), "A");
    assert_eq!(event.group, "menu");
    assert_eq!(event.items, *nestable.tree());
    assert_eq!(*events.lock().unwrap(), vec![event]);
    assert!(!nestable.is_dragging());
}

#[test]
fn hovering_expanded_parent_below_enters_it() {
    let mut nestable = Nestable::new(NestableConfig::default())
        .items(&[json!({ "id": "A" }), json!({ "id": "B", "children": [{ "id": "X" }] })])
        .unwrap();

    nestable.begin_drag(&id("A"), Pointer::default()).unwrap();
    assert!(nestable.hover(&id("B")).unwrap());
    assert_eq!(
        dumped(&nestable),
        r#"B
  A
  X"#
    );
    assert_eq!(nestable.end_drag().unwrap().unwrap().target_path, vec![0, 0]);
}

#[test]
fn hovering_collapsed_parent_swaps_with_it() {
    let mut nestable = Nestable::new(NestableConfig::default())
        .items(&[json!({ "id": "A" }), json!({ "id": "B", "children": [{ "id": "X" }] })])
        .unwrap();
    nestable.collapse(&CollapseTarget::All);

    nestable.begin_drag(&id("A"), Pointer::default()).unwrap();
    assert!(nestable.hover(&id("B")).unwrap());
    assert_eq!(
        dumped(&nestable),
        r#"B
  X
A"#
    );
}

#[test]
fn deep_subtree_is_flattened_to_fit_max_depth() {
    let mut nestable = Nestable::new(NestableConfig::default().max_depth(2))
        .items(&[
            json!({ "id": "A", "children": [{ "id": "P" }] }),
            json!({ "id": "B", "children": [{ "id": "Z" }] }),
        ])
        .unwrap();

    nestable.begin_drag(&id("A"), Pointer::default()).unwrap();
    assert!(nestable.hover(&id("Z")).unwrap());
    assert_eq!(
        dumped(&nestable),
        r#"B
  Z
A
  P"#
    );
    assert!(nestable.tree().height() <= 2);
}

#[test]
fn cancel_restores_tree_and_payload_exactly() {
    let raw = vec![
        json!({ "id": 1, "title": "one", "meta": { "pinned": true } }),
        json!({ "id": 2, "title": "two", "children": [{ "id": 3, "title": "three" }] }),
        json!({ "id": 4, "title": "four" }),
    ];
    let (events, on_change) = recorder();
    let mut nestable = Nestable::new(NestableConfig::default())
        .items(&raw)
        .unwrap()
        .on_change(on_change);
    let before = nestable.tree().clone();

    nestable.begin_drag(&id("1"), Pointer::new(0.0, 0.0)).unwrap();
    nestable.hover(&id("4")).unwrap();
    nestable.pointer_move(Pointer::new(50.0, 0.0)).unwrap();
    nestable.hover(&id("3")).unwrap();
    assert_ne!(*nestable.tree(), before);

    nestable.cancel_drag().unwrap();
    assert_eq!(*nestable.tree(), before);
    assert!(events.lock().unwrap().is_empty());

    let values: Vec<Value> = nestable.to_values();
    assert_eq!(values[0]["meta"], json!({ "pinned": true }));
    assert_eq!(values[1]["children"][0]["title"], "three");
}

#[test]
fn escape_cancels_and_restores_collapse_state() {
    let mut nestable = Nestable::new(NestableConfig::default().collapsed_by_default(true))
        .items(&[json!({ "id": "A" }), json!({ "id": "B" })])
        .unwrap();

    nestable.begin_drag(&id("B"), Pointer::new(0.0, 0.0)).unwrap();
    assert!(nestable.pointer_move(Pointer::new(31.0, 0.0)).unwrap());
    assert!(!nestable.is_collapsed(&id("A")));

    assert!(nestable.key_down(Key::Escape).unwrap());
    assert!(nestable.is_collapsed(&id("A")));
    assert!(nestable.collapse_state().ids().is_empty());
    assert_eq!(
        dumped(&nestable),
        r#"A
B"#
    );
}

#[test]
fn other_keys_do_not_cancel() {
    let mut nestable = Nestable::new(NestableConfig::default())
        .items(&[json!({ "id": "A" }), json!({ "id": "B" })])
        .unwrap();
    nestable.begin_drag(&id("A"), Pointer::default()).unwrap();
    assert!(!nestable.key_down(Key::Other).unwrap());
    assert!(nestable.is_dragging());
}

#[test]
fn confirm_hook_can_lock_a_parent() {
    let mut nestable = Nestable::new(NestableConfig::default())
        .items(&[
            json!({ "id": "A" }),
            json!({ "id": "Locked", "children": [{ "id": "X" }] }),
            json!({ "id": "C" }),
        ])
        .unwrap()
        .confirm_move(|args| {
            args.destination_parent
                .is_none_or(|parent| parent.id().as_str() != "Locked")
        });

    nestable.begin_drag(&id("A"), Pointer::default()).unwrap();
    // Entering the locked parent is refused, the tree springs back.
    assert!(!nestable.hover(&id("Locked")).unwrap());
    assert!(!nestable.hover(&id("X")).unwrap());
    assert!(nestable.hover(&id("C")).unwrap());
    assert_eq!(
        dumped(&nestable),
        r#"Locked
  X
C
A"#
    );
}

#[test]
fn disabled_items_cannot_be_dragged() {
    let started = Arc::new(Mutex::new(Vec::new()));
    let log = started.clone();
    let mut nestable = Nestable::new(NestableConfig::default())
        .items(&[
            json!({ "id": "A", "fixed": true }),
            json!({ "id": "B", "children": [{ "id": "B1" }] }),
        ])
        .unwrap()
        .disable_drag(|candidate| {
            candidate.item.get_field("fixed") == Some(&json!(true)) || candidate.depth > 0
        })
        .on_drag_start(move |item| log.lock().unwrap().push(item.id().clone()));

    assert!(!nestable.begin_drag(&id("A"), Pointer::default()).unwrap());
    assert!(!nestable.begin_drag(&id("B1"), Pointer::default()).unwrap());
    assert!(!nestable.is_dragging());

    assert!(nestable.begin_drag(&id("B"), Pointer::default()).unwrap());
    assert_eq!(*started.lock().unwrap(), vec![id("B")]);
}

#[test]
fn drag_without_moves_reports_nothing() {
    let (events, on_change) = recorder();
    let mut nestable = Nestable::new(NestableConfig::default())
        .items(&[json!({ "id": "A", "children": [{ "id": "B" }] })])
        .unwrap()
        .on_change(on_change);

    nestable.begin_drag(&id("A"), Pointer::default()).unwrap();
    // Own subtree and own row are no-ops.
    assert!(!nestable.hover(&id("B")).unwrap());
    assert!(!nestable.hover(&id("A")).unwrap());
    nestable.pointer_move(Pointer::new(0.0, 200.0)).unwrap();

    assert_eq!(nestable.end_drag().unwrap(), None);
    assert!(events.lock().unwrap().is_empty());
}

#[test]
fn unknown_ids_are_errors() {
    let mut nestable = Nestable::new(NestableConfig::default())
        .items(&[json!({ "id": "A" })])
        .unwrap();
    assert!(matches!(
        nestable.begin_drag(&id("Z"), Pointer::default()),
        Err(NestableError::UnknownItem(_))
    ));
    nestable.begin_drag(&id("A"), Pointer::default()).unwrap();
    assert!(matches!(nestable.hover(&id("Z")), Err(NestableError::UnknownItem(_))));
    assert!(matches!(nestable.hover(&id("A")), Ok(false)));
}

#[test]
fn collapse_hook_reports_effective_parents() {
    let changes = Arc::new(Mutex::new(Vec::<CollapseChange>::new()));
    let log = changes.clone();
    let mut nestable = Nestable::new(NestableConfig::default())
        .items(&[
            json!({ "id": "A", "children": [{ "id": "A1", "children": [{ "id": "A1a" }] }] }),
            json!({ "id": "B" }),
        ])
        .unwrap()
        .on_collapse_change(move |change| log.lock().unwrap().push(change.clone()));

    nestable.collapse(&CollapseTarget::All);
    nestable.collapse(&CollapseTarget::All);
    nestable.toggle_collapse(&id("A")).unwrap();
    nestable.collapse(&CollapseTarget::Ids(vec![id("A")]));

    let changes = changes.lock().unwrap();
    assert_eq!(
        *changes,
        vec![
            CollapseChange {
                open_ids: vec![],
                closed_ids: vec![id("A"), id("A1")],
            },
            CollapseChange {
                open_ids: vec![id("A")],
                closed_ids: vec![id("A1")],
            },
            CollapseChange {
                open_ids: vec![id("A1")],
                closed_ids: vec![id("A")],
            },
        ]
    );
}

#[test]
fn expand_all_under_collapsed_policy_opens_everything() {
    let mut nestable = Nestable::new(NestableConfig::default().collapsed_by_default(true))
        .items(&[
            json!({ "id": "A", "children": [{ "id": "A1" }] }),
            json!({ "id": "B" }),
        ])
        .unwrap();
    assert!(nestable.is_collapsed(&id("A")));

    nestable.collapse(&CollapseTarget::None);
    for item in nestable.tree().ids() {
        assert!(!nestable.is_collapsed(&item), "{item} should be expanded");
    }
}

#[test]
fn hover_out_of_only_child_parent_closes_it_again() {
    let mut nestable = Nestable::new(NestableConfig::default().collapsed_by_default(true))
        .items(&[
            json!({ "id": "A", "children": [{ "id": "A1" }] }),
            json!({ "id": "B" }),
        ])
        .unwrap();
    nestable.collapse(&CollapseTarget::Ids(vec![]));
    assert!(!nestable.is_collapsed(&id("A")));

    nestable.begin_drag(&id("A1"), Pointer::default()).unwrap();
    assert!(nestable.hover(&id("B")).unwrap());
    assert_eq!(
        dumped(&nestable),
        r#"A
A1
B"#
    );
    assert!(nestable.is_collapsed(&id("A")));
}

#[test]
fn config_round_trips_through_json() {
    let config: NestableConfig = serde_json::from_value(json!({
        "id_field": "key",
        "children_field": "nodes",
        "max_depth": 3,
        "group": "sidebar",
    }))
    .unwrap();
    let nestable = Nestable::new(config)
        .items(&[json!({ "key": "a", "nodes": [{ "key": "b" }] })])
        .unwrap();

    assert_eq!(nestable.config().max_depth, 3);
    assert_eq!(
        nestable.to_values(),
        vec![json!({ "key": "a", "nodes": [{ "key": "b", "nodes": [] }] })]
    );
}
