use criterion::{black_box, criterion_group, criterion_main, Criterion};
use sbm_core::rng::RngHandle;
use sbm_core::GraphView;
use sbm_graph::erdos_renyi;

fn queries_bench(c: &mut Criterion) {
    let mut rng = RngHandle::from_seed(7);
    let graph = erdos_renyi(2_000, 0.004, true, &mut rng).unwrap();

    c.bench_function("incidence_scan", |b| {
        b.iter(|| {
            let mut total = 0usize;
            for v in graph.vertices() {
                for inc in graph.out_edges(v) {
                    total += inc.neighbor;
                }
            }
            black_box(total)
        });
    });

    c.bench_function("degree_queries", |b| {
        b.iter(|| {
            for v in graph.vertices() {
                black_box(graph.in_degree(v));
                black_box(graph.out_degree(v));
            }
        });
    });
}

criterion_group!(benches, queries_bench);
criterion_main!(benches);
