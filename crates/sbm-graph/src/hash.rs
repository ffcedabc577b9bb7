use sbm_core::GraphView;
use sha2::{Digest, Sha256};

/// Computes a structural hash of any graph view.
///
/// The hash covers directedness, vertex weights and the sorted multiset of
/// weighted edges, so it is independent of edge insertion order.
pub fn canonical_hash<G: GraphView>(graph: &G) -> String {
    let mut hasher = Sha256::new();
    if graph.is_directed() {
        hasher.update(b"directed");
    } else {
        hasher.update(b"undirected");
    }
    hasher.update((graph.num_vertices() as u64).to_le_bytes());
    for v in graph.vertices() {
        hasher.update(graph.vertex_weight(v).to_le_bytes());
    }

    let mut signatures: Vec<(u64, u64, u64)> = (0..graph.num_edges())
        .map(|edge| {
            let (s, t) = graph.endpoints(edge);
            let (s, t) = if graph.is_directed() || s <= t {
                (s, t)
            } else {
                (t, s)
            };
            (s as u64, t as u64, graph.edge_weight(edge))
        })
        .collect();
    signatures.sort_unstable();
    hasher.update((signatures.len() as u64).to_le_bytes());
    for (s, t, w) in signatures {
        hasher.update(s.to_le_bytes());
        hasher.update(t.to_le_bytes());
        hasher.update(w.to_le_bytes());
    }

    format!("{:x}", hasher.finalize())
}
