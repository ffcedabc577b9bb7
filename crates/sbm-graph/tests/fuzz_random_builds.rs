use sbm_core::rng::RngHandle;
use sbm_core::GraphView;
use sbm_graph::{
    canonical_hash, graph_from_json, graph_to_json, planted_partition, random_partition,
};
use proptest::prelude::*;

fn check_invariants<G: GraphView>(graph: &G) {
    let mut out_total = 0;
    let mut in_total = 0;
    for v in graph.vertices() {
        out_total += graph.out_degree(v);
        in_total += graph.in_degree(v);
        for inc in graph.out_edges(v) {
            let (s, t) = graph.endpoints(inc.edge);
            assert!(s == v || (!graph.is_directed() && t == v));
        }
    }
    if graph.is_directed() {
        assert_eq!(out_total, graph.total_edge_weight());
        assert_eq!(in_total, graph.total_edge_weight());
    } else {
        assert_eq!(out_total, 2 * graph.total_edge_weight());
        assert_eq!(in_total, 0);
    }
}

proptest! {
    #[test]
    fn random_generators_respect_invariants(
        seed in any::<u64>(),
        sizes in proptest::collection::vec(1usize..6, 1..4),
        directed in any::<bool>(),
    ) {
        let mut rng = RngHandle::from_seed(seed);
        let (graph, planted) = planted_partition(&sizes, 0.7, 0.1, directed, &mut rng).unwrap();
        prop_assert_eq!(planted.len(), graph.num_vertices());
        check_invariants(&graph);

        let json = graph_to_json(&graph).unwrap();
        let restored = graph_from_json(&json).unwrap();
        check_invariants(&restored);
        prop_assert_eq!(canonical_hash(&graph), canonical_hash(&restored));

        let partition = random_partition(graph.num_vertices(), 3, &mut rng);
        prop_assert!(partition.iter().all(|&b| b < 3));
    }
}
