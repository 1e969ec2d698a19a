use criterion::{black_box, criterion_group, criterion_main, Criterion};
use fleece_slice::{AllocSlice, Slice};

fn slices(c: &mut Criterion) {
    let a = Slice::from("the quick brown fox jumps over the lazy dog");
    let b = Slice::from("the quick brown fox jumps over the lazy cat");

    c.bench_function("compare", |bench| {
        bench.iter(|| black_box(a).compare(&black_box(b)))
    });

    c.bench_function("hash", |bench| bench.iter(|| black_box(a).hash32()));
}

fn alloc(c: &mut Criterion) {
    c.bench_function("alloc_slice_new", |bench| {
        bench.iter(|| AllocSlice::new(black_box(64)))
    });

    let buf = AllocSlice::from("retained");
    c.bench_function("retain_release", |bench| {
        bench.iter(|| drop(black_box(buf.clone())))
    });
}

criterion_group!(benches, slices, alloc);
criterion_main!(benches);
