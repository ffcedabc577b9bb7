use proptest::prelude::*;
use sbm_core::rng::RngHandle;
use sbm_core::GraphView;
use sbm_graph::{condense, planted_partition, random_partition, AdjacencyGraph};
use sbm_mcmc::{BlockState, DegreeDlKind, DegreeSequence, EntropyArgs};

const KINDS: [DegreeDlKind; 3] = [DegreeDlKind::Ent, DegreeDlKind::Uniform, DegreeDlKind::Dist];

fn close(a: f64, b: f64, scale: f64) -> bool {
    (a - b).abs() <= 1e-8 * (1.0 + scale.abs())
}

fn sample_state(
    seed: u64,
    sizes: &[usize],
    directed: bool,
    deg_corr: bool,
    kind: DegreeDlKind,
) -> BlockState<AdjacencyGraph> {
    let mut rng = RngHandle::from_seed(seed);
    let (graph, _) = planted_partition(sizes, 0.6, 0.2, directed, &mut rng).unwrap();
    let b = random_partition(graph.num_vertices(), 3, &mut rng);
    let args = EntropyArgs {
        degree_dl_kind: kind,
        ..EntropyArgs::default()
    };
    BlockState::new(graph, b, deg_corr, args).unwrap()
}

/// Moves `v` to `nr`, checking every predicted delta against the recomputed
/// totals.
fn checked_move(state: &mut BlockState<AdjacencyGraph>, v: usize, nr: usize) {
    let r = state.block_of(v);
    let kind = state.deg_dl_kind();
    let before = state.entropy_breakdown();
    let stats = state.stats();
    let (part_before, edges_before) = (stats.partition_dl(), stats.edges_dl(stats.actual_b()));
    let deg_before = stats.deg_dl(kind);

    let predicted = state.virtual_move_dl(v, nr);
    let d_part = stats.delta_partition_dl(state.graph(), v, r, nr);
    let d_edges = stats.delta_edges_dl(state.graph(), v, r, nr, stats.actual_b());
    let d_deg = if state.degree_corrected() {
        stats.delta_deg_dl(state.graph(), state.degree_sequence(), v, r, nr, kind)
    } else {
        0.0
    };

    state.move_vertex(v, nr);
    let after = state.entropy_breakdown();
    let stats = state.stats();

    assert!(
        close(after.total - before.total, predicted, before.total),
        "total: predicted {predicted}, actual {}",
        after.total - before.total
    );
    assert!(close(stats.partition_dl() - part_before, d_part, part_before));
    assert!(close(stats.edges_dl(stats.actual_b()) - edges_before, d_edges, edges_before));
    if state.degree_corrected() {
        assert!(close(stats.deg_dl(kind) - deg_before, d_deg, deg_before));
    }

    let occupied_weight: u64 = stats.snapshot().blocks.values().map(|b| b.total).sum();
    let graph = state.graph();
    let graph_weight: u64 = graph.vertices().map(|u| graph.vertex_weight(u)).sum();
    assert_eq!(occupied_weight, graph_weight);
    assert_eq!(stats.actual_b(), state.num_blocks());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn predicted_deltas_match_recomputed_totals(
        seed in any::<u64>(),
        sizes in proptest::collection::vec(2usize..6, 2..4),
        directed in any::<bool>(),
        deg_corr in any::<bool>(),
        kind in 0usize..3,
        moves in proptest::collection::vec((0usize..1000, 0usize..1000), 1..30),
    ) {
        let mut state = sample_state(seed, &sizes, directed, deg_corr, KINDS[kind]);
        let n = state.graph().num_vertices();
        for (x, y) in moves {
            let v = x % n;
            let nr = y % (n.min(6) + 1);
            checked_move(&mut state, v, nr);
        }
        prop_assert!(state.check_consistency());

        let fresh = state.rebuilt().unwrap();
        prop_assert!(close(fresh.total_dl(), state.total_dl(), state.total_dl()));
        prop_assert_eq!(fresh.edge_counts(), state.edge_counts());
        prop_assert_eq!(fresh.stats().snapshot(), state.stats().snapshot());
    }

    #[test]
    fn round_trip_moves_restore_the_state(
        seed in any::<u64>(),
        sizes in proptest::collection::vec(2usize..6, 2..4),
        directed in any::<bool>(),
        kind in 0usize..3,
        v in 0usize..1000,
        nr in 0usize..5,
    ) {
        let mut state = sample_state(seed, &sizes, directed, true, KINDS[kind]);
        let v = v % state.graph().num_vertices();
        let r = state.block_of(v);
        let counts = state.edge_counts();
        let snapshot = state.stats().snapshot();
        let s = state.total_dl();

        state.move_vertex(v, nr);
        state.move_vertex(v, r);

        prop_assert_eq!(state.edge_counts(), counts);
        prop_assert_eq!(state.stats().snapshot(), snapshot);
        prop_assert!(close(state.total_dl(), s, s));
    }
}

#[test]
fn condensed_graphs_price_moves_exactly() {
    let mut rng = RngHandle::from_seed(11);
    let (graph, planted) = planted_partition(&[6, 6, 6], 0.7, 0.1, false, &mut rng).unwrap();
    let coarse: Vec<usize> = (0..graph.num_vertices()).map(|v| v / 2).collect();
    let condensed = condense(&graph, &coarse).unwrap();
    let b: Vec<usize> = condensed
        .labels
        .iter()
        .map(|&label| planted[2 * label])
        .collect();
    for kind in KINDS {
        let args = EntropyArgs {
            degree_dl_kind: kind,
            ..EntropyArgs::default()
        };
        let mut state = BlockState::with_degrees(
            condensed.graph.clone(),
            b.clone(),
            DegreeSequence::Precomputed(condensed.degrees.clone()),
            true,
            args,
        )
        .unwrap();
        for (v, nr) in [(0, 2), (4, 0), (8, 1), (0, 0), (3, 4)] {
            checked_move(&mut state, v, nr);
        }
        assert!(state.check_consistency());
    }
}
