use sbm_core::GraphView;
use sbm_graph::{
    canonical_hash, graph_from_json, graph_to_json, partition_from_json, partition_to_json,
    AdjacencyGraph,
};

fn sample_graph() -> AdjacencyGraph {
    let mut graph = AdjacencyGraph::with_vertices(4, false);
    graph.add_edge(0, 1).unwrap();
    graph.add_weighted_edge(1, 2, 3).unwrap();
    graph.add_edge(3, 3).unwrap();
    graph.set_vertex_weight(2, 4).unwrap();
    graph
}

#[test]
fn weights_survive_json() {
    let graph = sample_graph();
    let restored = graph_from_json(&graph_to_json(&graph).unwrap()).unwrap();
    assert_eq!(restored.vertex_weight(2), 4);
    assert_eq!(restored.edge_weight(1), 3);
    assert_eq!(restored.out_degree(3), 2);
    assert_eq!(canonical_hash(&graph), canonical_hash(&restored));
}

#[test]
fn hash_ignores_edge_order_and_orientation() {
    let a = AdjacencyGraph::from_edges(3, false, &[(0, 1), (1, 2)]).unwrap();
    let b = AdjacencyGraph::from_edges(3, false, &[(2, 1), (1, 0)]).unwrap();
    assert_eq!(canonical_hash(&a), canonical_hash(&b));

    let c = AdjacencyGraph::from_edges(3, true, &[(0, 1), (1, 2)]).unwrap();
    let d = AdjacencyGraph::from_edges(3, true, &[(1, 0), (1, 2)]).unwrap();
    assert_ne!(canonical_hash(&c), canonical_hash(&d));
}

#[test]
fn edge_weight_defaults_to_one() {
    let json = r#"{"directed":true,"num_vertices":2,"edges":[{"source":0,"target":1}]}"#;
    let graph = graph_from_json(json).unwrap();
    assert_eq!(graph.edge_weight(0), 1);
    assert_eq!(graph.vertex_weight(1), 1);
}

#[test]
fn vertex_weight_length_checked() {
    let json = r#"{"directed":false,"num_vertices":2,"vertex_weights":[1],"edges":[]}"#;
    let err = graph_from_json(json).unwrap_err();
    assert_eq!(err.code(), "vertex-weight-length");
}

#[test]
fn partition_roundtrip_and_errors() {
    let partition = vec![0, 0, 3, 1];
    let json = partition_to_json(&partition).unwrap();
    assert_eq!(partition_from_json(&json).unwrap(), partition);

    let err = partition_from_json("[0, -1]").unwrap_err();
    assert_eq!(err.code(), "deserialize-partition");
    assert!(err.info().hint.is_some());
}
