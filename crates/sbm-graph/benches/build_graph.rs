use criterion::{black_box, criterion_group, criterion_main, Criterion};
use sbm_core::rng::RngHandle;
use sbm_graph::{condense, planted_partition};

fn build_graph_bench(c: &mut Criterion) {
    c.bench_function("planted_partition_1k", |b| {
        b.iter(|| {
            let mut rng = RngHandle::from_seed(42);
            let graph = planted_partition(&[250; 4], 0.05, 0.005, false, &mut rng).unwrap();
            black_box(graph);
        });
    });

    let mut rng = RngHandle::from_seed(42);
    let (graph, planted) = planted_partition(&[250; 4], 0.05, 0.005, false, &mut rng).unwrap();
    c.bench_function("condense_1k", |b| {
        b.iter(|| black_box(condense(&graph, &planted).unwrap()));
    });
}

criterion_group!(benches, build_graph_bench);
criterion_main!(benches);
