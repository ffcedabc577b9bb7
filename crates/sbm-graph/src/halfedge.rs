use sbm_core::{Edge, GraphView, Incidence, Vertex};

use crate::adjacency::AdjacencyGraph;

/// Half-edge expansion of a graph, used by the overlapping block model.
///
/// Every edge `e = (s, t)` of the original graph becomes two half-edge nodes,
/// `2e` owned by `s` and `2e + 1` owned by `t`, joined by a single edge with
/// the original multiplicity. Partitioning the half-edge nodes assigns each
/// original vertex a mixed membership: one label per incident edge end.
#[derive(Debug, Clone)]
pub struct HalfEdgeGraph {
    inner: AdjacencyGraph,
    owner: Vec<Vertex>,
    half_edges: Vec<Vec<Vertex>>,
}

impl HalfEdgeGraph {
    /// Expands `graph` into its half-edge graph.
    pub fn from_graph<G: GraphView>(graph: &G) -> Self {
        let mut inner = AdjacencyGraph::with_vertices(2 * graph.num_edges(), graph.is_directed());
        let mut owner = Vec::with_capacity(2 * graph.num_edges());
        let mut half_edges = vec![Vec::new(); graph.num_vertices()];
        for edge in 0..graph.num_edges() {
            let (s, t) = graph.endpoints(edge);
            let hs = 2 * edge;
            let ht = 2 * edge + 1;
            owner.push(s);
            owner.push(t);
            half_edges[s].push(hs);
            half_edges[t].push(ht);
            // both half-edge nodes exist and the weight is positive
            let _ = inner.add_weighted_edge(hs, ht, graph.edge_weight(edge));
        }
        Self {
            inner,
            owner,
            half_edges,
        }
    }

    /// Original vertex owning half-edge node `h`.
    pub fn owner(&self, h: Vertex) -> Vertex {
        self.owner[h]
    }

    /// Half-edge nodes owned by original vertex `v`.
    pub fn half_edges_of(&self, v: Vertex) -> &[Vertex] {
        &self.half_edges[v]
    }

    /// Number of vertices in the original graph.
    pub fn num_original_vertices(&self) -> usize {
        self.half_edges.len()
    }
}

impl GraphView for HalfEdgeGraph {
    fn num_vertices(&self) -> usize {
        self.inner.num_vertices()
    }

    fn num_edges(&self) -> usize {
        self.inner.num_edges()
    }

    fn is_directed(&self) -> bool {
        self.inner.is_directed()
    }

    fn endpoints(&self, edge: Edge) -> (Vertex, Vertex) {
        self.inner.endpoints(edge)
    }

    fn out_edges(&self, v: Vertex) -> &[Incidence] {
        self.inner.out_edges(v)
    }

    fn in_edges(&self, v: Vertex) -> &[Incidence] {
        self.inner.in_edges(v)
    }

    fn edge_weight(&self, edge: Edge) -> u64 {
        self.inner.edge_weight(edge)
    }

    fn out_degree(&self, v: Vertex) -> u64 {
        self.inner.out_degree(v)
    }

    fn in_degree(&self, v: Vertex) -> u64 {
        self.inner.in_degree(v)
    }

    fn total_edge_weight(&self) -> u64 {
        self.inner.total_edge_weight()
    }
}
