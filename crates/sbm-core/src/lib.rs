#![deny(missing_docs)]

//! Core traits and data types for the stochastic block-model engine.
//!
//! The inference crates only ever talk to a graph through [`GraphView`]. The
//! trait is intentionally small: vertex and edge counts, incidence lists,
//! weighted degrees and weights. Everything is indexed by dense integers so
//! the hot sampling loops stay monomorphized and allocation free.

pub mod errors;
pub mod rng;

pub use errors::{ErrorInfo, SbmError};
pub use rng::{derive_substream_seed, RngHandle};

/// Dense vertex index in `0..num_vertices()`.
pub type Vertex = usize;

/// Dense edge index in `0..num_edges()`.
pub type Edge = usize;

/// Block (group) label.
pub type Block = usize;

/// Sentinel block meaning "unassigned".
///
/// Moves from or to this label are hypothetical insertions or removals of a
/// vertex and never touch a real block.
pub const NULL_GROUP: Block = usize::MAX;

/// One entry of an incidence list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Incidence {
    /// Vertex at the other end of the edge.
    pub neighbor: Vertex,
    /// Index of the edge.
    pub edge: Edge,
}

/// Read-only capability interface consumed by the inference engine.
///
/// For undirected graphs `out_edges` and `in_edges` both return every
/// incident edge exactly once, self-loops included once, while
/// [`GraphView::out_degree`] counts a self-loop twice. For undirected graphs
/// the in-degree reported to the degree statistics is zero.
pub trait GraphView: Send + Sync {
    /// Number of vertices.
    fn num_vertices(&self) -> usize;

    /// Number of edges (ignoring multiplicities).
    fn num_edges(&self) -> usize;

    /// Whether edges are directed.
    fn is_directed(&self) -> bool;

    /// Source and target of an edge.
    fn endpoints(&self, edge: Edge) -> (Vertex, Vertex);

    /// Outgoing incidences of `v` (all incidences when undirected).
    fn out_edges(&self, v: Vertex) -> &[Incidence];

    /// Incoming incidences of `v` (all incidences when undirected).
    fn in_edges(&self, v: Vertex) -> &[Incidence];

    /// Occupancy weight of a vertex. Condensed graphs use it to stand for
    /// several original vertices.
    fn vertex_weight(&self, _v: Vertex) -> u64 {
        1
    }

    /// Multiplicity of an edge.
    fn edge_weight(&self, _edge: Edge) -> u64 {
        1
    }

    /// Weighted out-degree (total degree when undirected).
    fn out_degree(&self, v: Vertex) -> u64 {
        let mut k = 0;
        for inc in self.out_edges(v) {
            let w = self.edge_weight(inc.edge);
            k += w;
            if !self.is_directed() && inc.neighbor == v {
                k += w;
            }
        }
        k
    }

    /// Weighted in-degree (zero when undirected).
    fn in_degree(&self, v: Vertex) -> u64 {
        if !self.is_directed() {
            return 0;
        }
        self.in_edges(v)
            .iter()
            .map(|inc| self.edge_weight(inc.edge))
            .sum()
    }

    /// Sum of all edge weights.
    fn total_edge_weight(&self) -> u64 {
        (0..self.num_edges()).map(|e| self.edge_weight(e)).sum()
    }

    /// Iterator over all vertex indices.
    fn vertices(&self) -> std::ops::Range<Vertex> {
        0..self.num_vertices()
    }
}

impl<G: GraphView + ?Sized> GraphView for &G {
    fn num_vertices(&self) -> usize {
        (**self).num_vertices()
    }

    fn num_edges(&self) -> usize {
        (**self).num_edges()
    }

    fn is_directed(&self) -> bool {
        (**self).is_directed()
    }

    fn endpoints(&self, edge: Edge) -> (Vertex, Vertex) {
        (**self).endpoints(edge)
    }

    fn out_edges(&self, v: Vertex) -> &[Incidence] {
        (**self).out_edges(v)
    }

    fn in_edges(&self, v: Vertex) -> &[Incidence] {
        (**self).in_edges(v)
    }

    fn vertex_weight(&self, v: Vertex) -> u64 {
        (**self).vertex_weight(v)
    }

    fn edge_weight(&self, edge: Edge) -> u64 {
        (**self).edge_weight(edge)
    }

    fn out_degree(&self, v: Vertex) -> u64 {
        (**self).out_degree(v)
    }

    fn in_degree(&self, v: Vertex) -> u64 {
        (**self).in_degree(v)
    }

    fn total_edge_weight(&self) -> u64 {
        (**self).total_edge_weight()
    }
}
