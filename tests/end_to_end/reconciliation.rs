//! Reconciliation, reference counting and re-entrant producers

use crate::common::*;
use annota::{Computation, Transaction};
use serde_json::json;
use std::sync::Arc;

#[test]
fn repeated_identical_change_is_silent() {
    let doc = TestDoc::new(json!({"todos": [{"id": 1, "title": "a"}, {"id": 2, "title": "b"}]}));
    let todo = Ref::keyed(&doc.handle, path("todos"), "id", 2).unwrap();
    let done: FieldType<bool> = FieldType::define("Done");

    let context = Context::new();
    let notifications = NotificationCounter::attach(&context);
    let produce = |c: &mut annota::ChangeSet| {
        c.add(&todo).with(done.of(true));
    };

    let txn = context.change(produce);
    for _ in 0..5 {
        assert!(!txn.change(produce));
    }
    assert_eq!(notifications.get(), 1);
    assert_eq!(context.ref_count(&todo), 1);
    assert_eq!(context.get_field(&todo, &done), Some(true));
}

#[test]
fn ref_lives_while_any_transaction_contributes_it() {
    let doc = TestDoc::new(json!({"a": 1}));
    let a = doc.at("a");
    let context = Context::new();

    let t1 = context.change(|c| {
        c.add(&a);
    });
    let t2 = context.change(|c| {
        c.add(&a);
    });
    assert_eq!(context.get_all().len(), 1);

    t1.retract();
    assert_eq!(context.get_all().len(), 1);
    t2.retract();
    assert!(context.get_all().is_empty());
}

#[test]
fn keyed_ref_survives_reordering() {
    let doc = TestDoc::new(json!({"todos": [{"id": "x", "n": 1}, {"id": "y", "n": 2}]}));
    let y = Ref::keyed(&doc.handle, path("todos"), "id", "y").unwrap();
    let id_before = y.to_id();

    doc.doc
        .insert(&path("todos").index(0), vec![json!({"id": "z", "n": 0}).into()])
        .unwrap();
    assert_eq!(y.to_id(), id_before);
    assert_eq!(y.value().unwrap(), json!({"id": "y", "n": 2}).into());

    y.change(|value| value["n"] = json!(3)).unwrap();
    assert_eq!(
        doc.doc.snapshot(None).unwrap(),
        json!({"todos": [{"id": "z", "n": 0}, {"id": "x", "n": 1}, {"id": "y", "n": 3}]}).into()
    );

    doc.doc.delete(&path("todos").index(2)).unwrap();
    assert!(y.value().unwrap_err().is_not_found());
}

#[test]
fn derived_producer_settles() {
    // A producer that re-derives from the context inside a subscriber must
    // converge instead of looping.
    let doc = TestDoc::new(json!({"a": 1, "b": 2}));
    let (a, b) = (doc.at("a"), doc.at("b"));
    let mirrored: FieldType<usize> = FieldType::define("Mirrored");

    let context = Context::new();
    let derived = Arc::new(context.change(|_| {}));
    let producer: Arc<Transaction> = Arc::clone(&derived);
    let reader = context.downgrade();
    let field = mirrored.clone();
    let b_for_producer = b.clone();
    context.subscribe(move || {
        let Some(context) = reader.upgrade() else {
            return;
        };
        let live = context.ref_count(&a);
        producer.change(|c| {
            c.add(&b_for_producer).with(field.of(live));
        });
    });

    let notifications = NotificationCounter::attach(&context);
    let source = context.change(|c| {
        c.add(&doc.at("a"));
    });
    assert_eq!(context.get_field(&b, &mirrored), Some(1));
    // The source change plus one derived update
    assert_eq!(notifications.get(), 2);

    source.retract();
    assert_eq!(context.get_field(&b, &mirrored), Some(0));
    assert!(derived.is_active());
}

#[test]
fn computation_tracks_subcontexts() {
    let doc = TestDoc::new(json!({"a": 1, "b": 2}));
    let context = Context::new();
    let sub = context.subcontext();
    let size = Computation::new(&context, Context::len);

    sub.replace(vec![annota::Annotation::new(doc.at("a"))]);
    assert_eq!(size.get(), 1, "refs without fields are still live");

    context.remove(&sub);
    assert_eq!(size.get(), 0);
}
