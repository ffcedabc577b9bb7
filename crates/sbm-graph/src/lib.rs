#![deny(missing_docs)]

//! Adjacency-list graphs for the block-model engine.
//!
//! [`AdjacencyGraph`] implements the `sbm-core` [`GraphView`](sbm_core::GraphView)
//! capability trait. The crate also ships random generators, JSON
//! serialization, a structural hash, the half-edge expansion used by the
//! overlapping model and condensation of a graph along a partition.

mod adjacency;
mod condense;
mod generators;
mod halfedge;
mod hash;
mod serialization;

pub use adjacency::AdjacencyGraph;
pub use condense::{condense, CondensedGraph, DegreeTuples};
pub use generators::{
    complete_graph, erdos_renyi, planted_partition, random_partition, two_cliques_with_bridge,
};
pub use halfedge::HalfEdgeGraph;
pub use hash::canonical_hash;

/// Re-export serialization helpers for downstream crates.
pub use serialization::{graph_from_json, graph_to_json, partition_from_json, partition_to_json};
