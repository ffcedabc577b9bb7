use sbm_core::{
    errors::{ErrorInfo, SbmError},
    Edge, GraphView, Incidence, Vertex,
};

/// Adjacency-list graph with optional vertex and edge weights.
///
/// Directed graphs keep separate outgoing and incoming incidence lists.
/// Undirected graphs keep a single list per vertex in which every incident
/// edge appears once. Weighted degrees are cached and kept current as edges
/// are added.
#[derive(Debug, Clone)]
pub struct AdjacencyGraph {
    directed: bool,
    out_adj: Vec<Vec<Incidence>>,
    in_adj: Vec<Vec<Incidence>>,
    edges: Vec<(Vertex, Vertex)>,
    edge_weights: Vec<u64>,
    vertex_weights: Vec<u64>,
    out_deg: Vec<u64>,
    in_deg: Vec<u64>,
}

impl AdjacencyGraph {
    /// Creates an empty graph.
    pub fn new(directed: bool) -> Self {
        Self {
            directed,
            out_adj: Vec::new(),
            in_adj: Vec::new(),
            edges: Vec::new(),
            edge_weights: Vec::new(),
            vertex_weights: Vec::new(),
            out_deg: Vec::new(),
            in_deg: Vec::new(),
        }
    }

    /// Creates a graph with `n` isolated unit-weight vertices.
    pub fn with_vertices(n: usize, directed: bool) -> Self {
        let mut graph = Self::new(directed);
        for _ in 0..n {
            graph.add_vertex();
        }
        graph
    }

    /// Builds a graph with `n` vertices from an edge list.
    pub fn from_edges(
        n: usize,
        directed: bool,
        edges: &[(Vertex, Vertex)],
    ) -> Result<Self, SbmError> {
        let mut graph = Self::with_vertices(n, directed);
        for &(s, t) in edges {
            graph.add_edge(s, t)?;
        }
        Ok(graph)
    }

    /// Appends a unit-weight vertex and returns its index.
    pub fn add_vertex(&mut self) -> Vertex {
        self.out_adj.push(Vec::new());
        self.in_adj.push(Vec::new());
        self.vertex_weights.push(1);
        self.out_deg.push(0);
        self.in_deg.push(0);
        self.out_adj.len() - 1
    }

    /// Adds a unit-multiplicity edge.
    pub fn add_edge(&mut self, source: Vertex, target: Vertex) -> Result<Edge, SbmError> {
        self.add_weighted_edge(source, target, 1)
    }

    /// Adds an edge with the given multiplicity.
    pub fn add_weighted_edge(
        &mut self,
        source: Vertex,
        target: Vertex,
        weight: u64,
    ) -> Result<Edge, SbmError> {
        self.ensure_vertex(source)?;
        self.ensure_vertex(target)?;
        if weight == 0 {
            return Err(graph_error("zero-edge-weight", "edge multiplicity must be positive")
                .with_context("source", source.to_string())
                .with_context("target", target.to_string()));
        }
        let edge = self.edges.len();
        self.edges.push((source, target));
        self.edge_weights.push(weight);
        self.out_adj[source].push(Incidence {
            neighbor: target,
            edge,
        });
        if self.directed {
            self.in_adj[target].push(Incidence {
                neighbor: source,
                edge,
            });
            self.out_deg[source] += weight;
            self.in_deg[target] += weight;
        } else {
            if source != target {
                self.out_adj[target].push(Incidence {
                    neighbor: source,
                    edge,
                });
            }
            self.out_deg[source] += weight;
            self.out_deg[target] += weight;
        }
        Ok(edge)
    }

    /// Sets the occupancy weight of a vertex.
    pub fn set_vertex_weight(&mut self, v: Vertex, weight: u64) -> Result<(), SbmError> {
        self.ensure_vertex(v)?;
        self.vertex_weights[v] = weight;
        Ok(())
    }

    /// Returns the edge list in insertion order.
    pub fn edge_list(&self) -> &[(Vertex, Vertex)] {
        &self.edges
    }

    /// Returns the neighbours of `v` in both directions, with multiplicity.
    pub fn all_neighbors(&self, v: Vertex) -> impl Iterator<Item = Vertex> + '_ {
        let incoming: &[Incidence] = if self.directed { &self.in_adj[v] } else { &[] };
        self.out_adj[v]
            .iter()
            .chain(incoming.iter())
            .map(|inc| inc.neighbor)
    }

    fn ensure_vertex(&self, v: Vertex) -> Result<(), SbmError> {
        if v >= self.out_adj.len() {
            return Err(graph_error("unknown-vertex", "vertex does not exist")
                .with_context("vertex", v.to_string())
                .with_context("num_vertices", self.out_adj.len().to_string()));
        }
        Ok(())
    }
}

impl GraphView for AdjacencyGraph {
    fn num_vertices(&self) -> usize {
        self.out_adj.len()
    }

    fn num_edges(&self) -> usize {
        self.edges.len()
    }

    fn is_directed(&self) -> bool {
        self.directed
    }

    fn endpoints(&self, edge: Edge) -> (Vertex, Vertex) {
        self.edges[edge]
    }

    fn out_edges(&self, v: Vertex) -> &[Incidence] {
        &self.out_adj[v]
    }

    fn in_edges(&self, v: Vertex) -> &[Incidence] {
        if self.directed {
            &self.in_adj[v]
        } else {
            &self.out_adj[v]
        }
    }

    fn vertex_weight(&self, v: Vertex) -> u64 {
        self.vertex_weights[v]
    }

    fn edge_weight(&self, edge: Edge) -> u64 {
        self.edge_weights[edge]
    }

    fn out_degree(&self, v: Vertex) -> u64 {
        self.out_deg[v]
    }

    fn in_degree(&self, v: Vertex) -> u64 {
        self.in_deg[v]
    }

    fn total_edge_weight(&self) -> u64 {
        self.edge_weights.iter().sum()
    }
}

pub(crate) fn graph_error(code: impl Into<String>, message: impl Into<String>) -> SbmError {
    SbmError::Graph(ErrorInfo::new(code, message))
}
