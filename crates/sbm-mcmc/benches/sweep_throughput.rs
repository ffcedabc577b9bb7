use criterion::{black_box, criterion_group, criterion_main, Criterion};
use sbm_core::rng::RngHandle;
use sbm_graph::{planted_partition, random_partition};
use sbm_mcmc::{BlockState, EntropyArgs, McmcEngine};

fn bench_sweep(c: &mut Criterion) {
    let mut rng = RngHandle::from_seed(31);
    let (graph, _) = planted_partition(&[100; 5], 0.1, 0.01, false, &mut rng).unwrap();
    let b = random_partition(500, 5, &mut rng);
    let state = BlockState::new(graph, b, true, EntropyArgs::default()).unwrap();

    c.bench_function("virtual_move_dl", |bench| {
        bench.iter(|| {
            let mut total = 0.0;
            for v in 0..500 {
                total += state.virtual_move_dl(v, (state.block_of(v) + 1) % 5);
            }
            black_box(total)
        });
    });

    let mut engine = McmcEngine::new(state.clone(), 1.0);
    c.bench_function("mh_sweep_500", |bench| {
        bench.iter(|| black_box(engine.sweep(1, &mut rng)));
    });
}

criterion_group!(benches, bench_sweep);
criterion_main!(benches);
