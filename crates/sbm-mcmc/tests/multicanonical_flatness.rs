use sbm_core::rng::RngHandle;
use sbm_graph::two_cliques_with_bridge;
use sbm_mcmc::{
    BlockState, DensityOfStates, EntropyArgs, MoveProposer, MulticanonicalSampler,
    WangLandauSchedule,
};

#[test]
fn wang_landau_flattens_the_histogram_on_two_cliques() {
    let (graph, planted) = two_cliques_with_bridge(10).unwrap();
    let proposer = MoveProposer {
        max_blocks: Some(3),
        ..MoveProposer::default()
    };
    let state = BlockState::new(&graph, planted, false, EntropyArgs::default())
        .unwrap()
        .with_proposer(proposer);
    let s_planted = state.total_dl();
    let s_single = BlockState::new(&graph, vec![0; 20], false, EntropyArgs::default())
        .unwrap()
        .total_dl();
    assert!(s_single > s_planted);

    let dos = DensityOfStates::new(s_planted - 1.0, s_single + 40.0, 8).unwrap();
    let schedule = WangLandauSchedule {
        f_initial: 1.0,
        f_min: 1e-3,
        flat_ratio: 2.0,
        check_interval: 5,
    };
    let mut sampler = MulticanonicalSampler::new(state, dos, schedule).unwrap();
    let mut rng = RngHandle::from_seed(2024);
    let report = sampler.run(2_000, &mut rng);

    assert!(report.sweeps <= 2_000);
    assert!(report.min_ratio.is_finite());
    assert!(report.min_ratio < 10.0, "min ratio {}", report.min_ratio);
    assert!(report.log_g.iter().filter(|&&g| g > 0.0).count() >= 2);
    assert!((sampler.current_dl() - sampler.state().total_dl()).abs() < 1e-6);
    assert!(sampler.state().num_blocks() <= 3);
}

#[test]
fn starting_outside_the_range_is_an_error() {
    let (graph, planted) = two_cliques_with_bridge(3).unwrap();
    let state = BlockState::new(graph, planted, false, EntropyArgs::default()).unwrap();
    let s = state.total_dl();
    let dos = DensityOfStates::new(s + 1.0, s + 10.0, 4).unwrap();
    let err = MulticanonicalSampler::new(state, dos, WangLandauSchedule::default()).unwrap_err();
    assert_eq!(err.code(), "start-out-of-range");
}
