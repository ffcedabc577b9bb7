use sbm_core::rng::RngHandle;
use sbm_graph::{complete_graph, random_partition, AdjacencyGraph};
use sbm_mcmc::{
    exhaustive_density, exhaustive_sweep, BlockState, EntropyArgs, ExhaustiveIter, McmcEngine,
    MoveProposer,
};

fn k4_state(b: Vec<usize>) -> BlockState<AdjacencyGraph> {
    BlockState::new(complete_graph(4, false), b, false, EntropyArgs::default())
        .unwrap()
        .with_proposer(MoveProposer {
            max_blocks: Some(2),
            ..MoveProposer::default()
        })
}

#[test]
fn enumeration_visits_each_partition_once() {
    let mut state = k4_state(vec![0, 1, 0, 1]);
    let mut seen = Vec::new();
    let summary = exhaustive_sweep(&mut state, 4, None, |step, partition| {
        assert!((state_free_dl(partition) - step.s).abs() < 1e-8);
        seen.push(partition.to_vec());
    });
    // Bell number B(4)
    assert_eq!(summary.states, 15);
    seen.sort();
    seen.dedup();
    assert_eq!(seen.len(), 15);
    assert!((state_free_dl(&summary.argmin) - summary.s_min).abs() < 1e-8);

    let mut state = k4_state(vec![0; 4]);
    let at_most_two = ExhaustiveIter::new(&mut state, 2, None).count();
    assert_eq!(at_most_two, 8);
}

fn state_free_dl(partition: &[usize]) -> f64 {
    k4_state(partition.to_vec()).total_dl()
}

#[test]
fn dropping_the_iterator_stops_early() {
    let mut state = k4_state(vec![0; 4]);
    let mut iter = ExhaustiveIter::new(&mut state, 4, Some(5));
    let first: Vec<_> = iter.by_ref().take(3).collect();
    assert_eq!(first.len(), 3);
    assert!(first.windows(2).all(|w| w[1].s_min <= w[0].s_min));
    assert_eq!(iter.count(), 2);
}

#[test]
fn density_histogram_covers_every_partition() {
    let mut state = k4_state(vec![0; 4]);
    let summary = exhaustive_sweep(&mut state, 4, None, |_, _| {});
    let hist = exhaustive_density(&mut state, 4, summary.s_min - 1.0, summary.s_min + 100.0, 10)
        .unwrap();
    assert_eq!(hist.iter().sum::<u64>(), 15);
    assert!(exhaustive_density(&mut state, 4, 1.0, 0.0, 10).is_err());
}

#[test]
fn metropolis_finds_the_exhaustive_minimum() {
    let mut state = k4_state(vec![0; 4]);
    let exact = exhaustive_sweep(&mut state, 2, None, |_, _| {});

    let mut rng = RngHandle::from_seed(0x4B4);
    let mut best = f64::INFINITY;
    for _ in 0..10 {
        let start = random_partition(4, 2, &mut rng);
        let mut engine = McmcEngine::new(k4_state(start), 1.0);
        best = best.min(engine.total_description_length());
        for _ in 0..1_000 {
            engine.sweep(1, &mut rng);
            assert!(engine.state().num_blocks() <= 2);
            best = best.min(engine.total_description_length());
        }
    }
    assert!(
        (best - exact.s_min).abs() < 1e-8,
        "mcmc {best} vs exhaustive {}",
        exact.s_min
    );
}
