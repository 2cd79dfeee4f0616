//! Property tests for the annotation context
//!
//! A model of live transactions is driven with random change/retract
//! operations and compared with the context after every step.

use annota_context::{Context, FieldType, Ref, Transaction};
use annota_core::{DocHandle, JsonPath};
use annota_document::MemoryDocument;
use proptest::prelude::*;
use serde_json::json;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

const KEYS: [&str; 4] = ["a", "b", "c", "d"];

fn fixture() -> (DocHandle, Vec<Ref>) {
    let handle: DocHandle =
        MemoryDocument::new(json!({"a": 1, "b": 2, "c": 3, "d": 4}).into()).unwrap();
    let refs = KEYS
        .iter()
        .map(|key| Ref::path(&handle, JsonPath::root().key(*key)).unwrap())
        .collect();
    (handle, refs)
}

#[derive(Debug, Clone)]
enum Op {
    /// Open a transaction contributing the refs selected by the mask
    Open(u8),
    /// Re-run transaction `n % open` with a new mask
    Change(usize, u8),
    /// Retract transaction `n % open`
    Retract(usize),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0u8..16).prop_map(Op::Open),
        (0usize..8, 0u8..16).prop_map(|(n, mask)| Op::Change(n, mask)),
        (0usize..8).prop_map(Op::Retract),
    ]
}

fn selected(mask: u8) -> BTreeSet<usize> {
    (0..KEYS.len()).filter(|i| mask & (1 << i) != 0).collect()
}

proptest! {
    #[test]
    fn ref_counts_match_live_transactions(ops in proptest::collection::vec(op_strategy(), 1..40)) {
        let (_handle, refs) = fixture();
        let context = Context::new();
        let mut transactions: Vec<(Transaction, Option<BTreeSet<usize>>)> = Vec::new();

        for op in ops {
            match op {
                Op::Open(mask) => {
                    let members = selected(mask);
                    let txn = context.change(|c| {
                        for &i in &members {
                            c.add(&refs[i]);
                        }
                    });
                    transactions.push((txn, Some(members)));
                }
                Op::Change(n, mask) if !transactions.is_empty() => {
                    let slot = n % transactions.len();
                    let members = selected(mask);
                    transactions[slot].0.change(|c| {
                        for &i in &members {
                            c.add(&refs[i]);
                        }
                    });
                    transactions[slot].1 = Some(members);
                }
                Op::Retract(n) if !transactions.is_empty() => {
                    let slot = n % transactions.len();
                    transactions[slot].0.retract();
                    transactions[slot].1 = None;
                }
                _ => {}
            }

            let mut expected: BTreeMap<usize, usize> = BTreeMap::new();
            for members in transactions.iter().filter_map(|(_, members)| members.as_ref()) {
                for &i in members {
                    *expected.entry(i).or_default() += 1;
                }
            }
            for (i, reference) in refs.iter().enumerate() {
                prop_assert_eq!(context.ref_count(reference), expected.get(&i).copied().unwrap_or(0));
            }
            prop_assert_eq!(context.len(), expected.len());
        }
    }

    #[test]
    fn identical_rerun_never_notifies(mask in 0u8..16, reruns in 1usize..6) {
        let (_handle, refs) = fixture();
        let label: FieldType<u8> = FieldType::define("Label");
        let context = Context::new();
        let notifications = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&notifications);
        context.subscribe(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let members = selected(mask);
        let produce = |c: &mut annota_context::ChangeSet| {
            for &i in &members {
                c.add(&refs[i]).with(label.of(i as u8));
            }
        };
        let txn = context.change(produce);
        let after_first = notifications.load(Ordering::SeqCst);
        prop_assert_eq!(after_first, usize::from(!members.is_empty()));

        for _ in 0..reruns {
            prop_assert!(!txn.change(produce));
        }
        prop_assert_eq!(notifications.load(Ordering::SeqCst), after_first);
        for &i in &members {
            prop_assert_eq!(context.ref_count(&refs[i]), 1);
        }
    }
}

#[test]
fn subcontexts_merge_contributions_on_the_same_ref() {
    let (_handle, refs) = fixture();
    let flag: FieldType<bool> = FieldType::define("Flag");
    let note: FieldType<&'static str> = FieldType::define("Note");

    let root = Context::new();
    let left = root.subcontext();
    let right = root.subcontext();
    left.replace(vec![refs[0].with(flag.of(true))]);
    right.replace(vec![refs[0].with(note.of("from right"))]);

    let merged = root.resolve(&refs[0]);
    assert_eq!(merged.get(&flag), Some(true));
    assert_eq!(merged.get(&note), Some("from right"));
    assert_eq!(root.get_all().len(), 1);

    root.remove(&right);
    assert!(!root.resolve(&refs[0]).has(&note));
}
