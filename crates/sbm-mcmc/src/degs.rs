use sbm_core::{GraphView, Vertex};
use sbm_graph::DegreeTuples;

/// Source of the `(in_degree, out_degree, multiplicity)` tuples of a vertex.
///
/// Undirected graphs report an in-degree of zero and the total degree as the
/// out-degree.
#[derive(Debug, Clone, Default)]
pub enum DegreeSequence {
    /// Degrees read from the graph, with the vertex weight as multiplicity.
    #[default]
    Live,
    /// Stored tuples, typically produced by condensing a graph. An empty list
    /// falls back to the live degree of that vertex.
    Precomputed(DegreeTuples),
}

impl DegreeSequence {
    /// Calls `f(kin, kout, n)` for every degree tuple of `v`.
    #[inline]
    pub fn for_each<G, F>(&self, graph: &G, v: Vertex, mut f: F)
    where
        G: GraphView,
        F: FnMut(u64, u64, u64),
    {
        if let DegreeSequence::Precomputed(tuples) = self {
            if let Some(list) = tuples.get(v).filter(|list| !list.is_empty()) {
                for &(kin, kout, n) in list {
                    f(kin, kout, n);
                }
                return;
            }
        }
        f(graph.in_degree(v), graph.out_degree(v), graph.vertex_weight(v));
    }
}
