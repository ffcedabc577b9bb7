use sbm_core::GraphView;
use sbm_graph::{condense, two_cliques_with_bridge, AdjacencyGraph, HalfEdgeGraph};

#[test]
fn condense_two_cliques() {
    let (graph, planted) = two_cliques_with_bridge(4).unwrap();
    let relabeled: Vec<usize> = planted.iter().map(|&b| 10 + 5 * b).collect();
    let condensed = condense(&graph, &relabeled).unwrap();

    assert_eq!(condensed.labels, vec![10, 15]);
    assert_eq!(condensed.graph.num_vertices(), 2);
    assert_eq!(condensed.graph.vertex_weight(0), 4);
    assert_eq!(condensed.graph.vertex_weight(1), 4);
    // two internal self-loops of weight 6 and the bridge
    assert_eq!(condensed.graph.num_edges(), 3);
    assert_eq!(condensed.graph.total_edge_weight(), graph.total_edge_weight());
    assert_eq!(condensed.graph.out_degree(0), 13);

    let members: u64 = condensed.degrees[0].iter().map(|&(_, _, n)| n).sum();
    assert_eq!(members, 4);
    assert!(condensed.degrees[0].contains(&(0, 4, 1)));
    assert!(condensed.degrees[0].contains(&(0, 3, 3)));
}

#[test]
fn condense_directed_keeps_orientation() {
    let graph = AdjacencyGraph::from_edges(4, true, &[(0, 2), (0, 3), (3, 1)]).unwrap();
    let condensed = condense(&graph, &[0, 0, 1, 1]).unwrap();
    assert_eq!(condensed.graph.out_degree(0), 2);
    assert_eq!(condensed.graph.in_degree(0), 1);
    assert_eq!(condensed.graph.out_degree(1), 1);
    assert_eq!(condensed.graph.in_degree(1), 2);
}

#[test]
fn condense_rejects_wrong_length() {
    let graph = AdjacencyGraph::with_vertices(3, false);
    let err = condense(&graph, &[0, 1]).unwrap_err();
    assert_eq!(err.code(), "length-mismatch");
}

#[test]
fn half_edges_preserve_degrees() {
    let mut graph = AdjacencyGraph::with_vertices(3, false);
    graph.add_edge(0, 1).unwrap();
    graph.add_weighted_edge(1, 2, 2).unwrap();
    graph.add_edge(2, 2).unwrap();

    let expanded = HalfEdgeGraph::from_graph(&graph);
    assert_eq!(expanded.num_vertices(), 6);
    assert_eq!(expanded.num_original_vertices(), 3);
    assert_eq!(expanded.total_edge_weight(), graph.total_edge_weight());
    for v in graph.vertices() {
        let summed: u64 = expanded
            .half_edges_of(v)
            .iter()
            .map(|&h| expanded.out_degree(h))
            .sum();
        assert_eq!(summed, graph.out_degree(v));
        for &h in expanded.half_edges_of(v) {
            assert_eq!(expanded.owner(h), v);
        }
    }
}
