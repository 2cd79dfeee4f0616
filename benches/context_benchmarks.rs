//! Context hot-path benchmarks
//!
//! | Group | What It Measures |
//! |--------|------------------|
//! | `reconcile/*` | `Transaction::change` with unchanged and changed state |
//! | `read/*` | Merged reads across sub-contexts |
//! | `diff/*` | Diff annotations for a document edit |
//!
//! ## Running
//!
//! ```bash
//! cargo bench --bench context_benchmarks
//! cargo bench --bench context_benchmarks -- "reconcile/"
//! ```

use annota::{
    diff_of_doc, ChangeSet, Context, DocHandle, DocumentEngine, FieldType, JsonPath,
    MemoryDocument, Ref,
};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use serde_json::json;

const SIZES: [usize; 3] = [10, 100, 1000];

fn document(size: usize) -> (std::sync::Arc<MemoryDocument>, DocHandle, Vec<Ref>) {
    let items: serde_json::Map<String, serde_json::Value> = (0..size)
        .map(|i| (format!("k{}", i), json!(i)))
        .collect();
    let doc = MemoryDocument::new(serde_json::Value::Object(items).into()).unwrap();
    let handle: DocHandle = doc.clone();
    let refs = (0..size)
        .map(|i| Ref::path(&handle, JsonPath::root().key(format!("k{}", i))).unwrap())
        .collect();
    (doc, handle, refs)
}

fn reconcile_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("reconcile");
    let mark: FieldType<usize> = FieldType::define("Mark");

    for size in SIZES {
        let (_doc, _handle, refs) = document(size);
        let context = Context::new();
        let produce = |round: usize| {
            let refs = &refs;
            let mark = &mark;
            move |c: &mut ChangeSet| {
                for (i, reference) in refs.iter().enumerate() {
                    c.add(reference).with(mark.of(i + round));
                }
            }
        };
        let txn = context.change(produce(0));

        group.bench_with_input(BenchmarkId::new("unchanged", size), &size, |b, _| {
            b.iter(|| black_box(txn.change(produce(0))))
        });

        let mut round = 0;
        group.bench_with_input(BenchmarkId::new("changed", size), &size, |b, _| {
            b.iter(|| {
                round += 1;
                black_box(txn.change(produce(round)))
            })
        });
    }
    group.finish();
}

fn read_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("read");
    let mark: FieldType<bool> = FieldType::define("Mark");

    for size in SIZES {
        let (_doc, _handle, refs) = document(size);
        let context = Context::new();
        let subs: Vec<Context> = (0..4).map(|_| context.subcontext()).collect();
        for (n, sub) in subs.iter().enumerate() {
            sub.replace(
                refs.iter()
                    .skip(n)
                    .step_by(4)
                    .map(|reference| reference.with(mark.of(true))),
            );
        }

        group.bench_with_input(BenchmarkId::new("get_all", size), &size, |b, _| {
            b.iter(|| black_box(context.get_all().len()))
        });
        group.bench_with_input(BenchmarkId::new("resolve", size), &size, |b, _| {
            b.iter(|| black_box(context.resolve(&refs[size / 2]).has(&mark)))
        });
    }
    group.finish();
}

fn diff_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("diff");

    for size in SIZES {
        let (doc, handle, _refs) = document(size);
        let before = handle.heads();
        doc.put(&JsonPath::root().key("k0"), json!("changed").into())
            .unwrap();

        group.bench_with_input(BenchmarkId::new("single_put", size), &size, |b, _| {
            b.iter(|| black_box(diff_of_doc(&handle, Some(before)).unwrap().len()))
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    reconcile_benchmarks,
    read_benchmarks,
    diff_benchmarks
);
criterion_main!(benches);
