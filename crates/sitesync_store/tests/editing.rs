//! End-to-end editing scenarios over the instance tree.

use serde_json::json;
use sitesync_store::{create_transaction, Container, EditHistory, StoreRegistry};

#[test]
fn insert_then_toggle_then_undo_redo() {
    let registry = StoreRegistry::new();
    let instances = Container::new(json!({"id": "root", "children": []}));
    registry.register("instances", &instances).unwrap();
    let mut history = EditHistory::new();

    // T1: insert node X under root at position 0.
    let t1 = create_transaction(&registry, &[instances.clone()], |drafts| {
        let children = drafts[0]
            .pointer_mut("/children")
            .unwrap()
            .as_array_mut()
            .unwrap();
        children.insert(0, json!({"id": "x"}));
    })
    .unwrap();
    history.commit(t1).unwrap();

    // T2: set X.disabled = true.
    let t2 = create_transaction(&registry, &[instances.clone()], |drafts| {
        let node = drafts[0].pointer_mut("/children/0").unwrap();
        node["disabled"] = json!(true);
    })
    .unwrap();
    history.commit(t2).unwrap();

    let full = json!({"id": "root", "children": [{"id": "x", "disabled": true}]});
    assert_eq!(instances.get(), full);

    // First undo: the disabled prop is gone, X is still present.
    assert!(history.undo().unwrap());
    assert_eq!(
        instances.get(),
        json!({"id": "root", "children": [{"id": "x"}]})
    );

    // Second undo: X removed, tree equals the pre-T1 state.
    assert!(history.undo().unwrap());
    assert_eq!(instances.get(), json!({"id": "root", "children": []}));

    // Redo twice: tree equals the post-T2 state.
    assert!(history.redo().unwrap());
    assert!(history.redo().unwrap());
    assert_eq!(instances.get(), full);
}

#[test]
fn one_edit_spanning_multiple_namespaces_undoes_atomically() {
    let registry = StoreRegistry::new();
    let instances = Container::new(json!({"id": "root", "children": []}));
    let props = Container::new(json!({}));
    registry.register("instances", &instances).unwrap();
    registry.register("props", &props).unwrap();
    let mut history = EditHistory::new();

    // Dropping a component writes the tree and its props in one edit.
    let transaction = create_transaction(
        &registry,
        &[instances.clone(), props.clone()],
        |drafts| {
            let children = drafts[0]
                .pointer_mut("/children")
                .unwrap()
                .as_array_mut()
                .unwrap();
            children.push(json!({"id": "hero"}));
            drafts[1]["hero:title"] = json!("Welcome");
        },
    )
    .unwrap();
    history.commit(transaction).unwrap();

    assert_eq!(props.get(), json!({"hero:title": "Welcome"}));

    assert!(history.undo().unwrap());
    assert_eq!(instances.get(), json!({"id": "root", "children": []}));
    assert_eq!(props.get(), json!({}));

    assert!(history.redo().unwrap());
    assert_eq!(
        instances.get(),
        json!({"id": "root", "children": [{"id": "hero"}]})
    );
    assert_eq!(props.get(), json!({"hero:title": "Welcome"}));
}
