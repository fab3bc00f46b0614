use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use chains::list::List;
use chains::tree::Tree;

/// Builds and drops containers of various sizes. The drop half is the
/// interesting part: it has to stay flat in stack depth no matter the size.
fn bench_build_teardown(c: &mut Criterion) {
    let mut group = c.benchmark_group("build-teardown");

    for size in [1_000i32, 15_000] {
        group.bench_function(BenchmarkId::new("list", size), |b| {
            b.iter(|| {
                let mut list = List::new();
                for value in 0..size {
                    list.push_back(black_box(value));
                }
                list
            })
        });

        group.bench_function(BenchmarkId::new("tree", size), |b| {
            b.iter(|| {
                let mut tree = Tree::new();
                for value in 0..size {
                    // A multiplicative walk over the key space keeps the
                    // unbalanced tree bushy; sequential keys would turn every
                    // insert into an O(n) descent down one long chain.
                    tree.insert(black_box(value.wrapping_mul(7_919) % size));
                }
                tree
            })
        });
    }

    group.finish();
}

fn bench_find(c: &mut Criterion) {
    let mut group = c.benchmark_group("find");

    for size in [1_000i32, 15_000] {
        let mut list = List::new();
        for value in 0..size {
            list.push_back(value);
        }

        group.bench_function(BenchmarkId::new("list-hit", size), |b| {
            b.iter(|| black_box(list.find(black_box(size - 1))).is_some())
        });

        group.bench_function(BenchmarkId::new("list-miss", size), |b| {
            b.iter(|| black_box(list.find(black_box(size))).is_none())
        });
    }

    group.finish();
}

criterion_group!(benches, bench_build_teardown, bench_find);
criterion_main!(benches);
