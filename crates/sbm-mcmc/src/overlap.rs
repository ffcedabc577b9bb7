//! Overlapping block model through the half-edge expansion.

use std::collections::BTreeMap;

use sbm_core::errors::{ErrorInfo, SbmError};
use sbm_core::{Block, GraphView};
use sbm_graph::HalfEdgeGraph;

use crate::block_state::{BlockState, EntropyArgs};

/// Half-edge partition that gives every half-edge its owner's block.
pub fn expand_partition(graph: &HalfEdgeGraph, b: &[Block]) -> Result<Vec<Block>, SbmError> {
    if b.len() != graph.num_original_vertices() {
        return Err(SbmError::Partition(
            ErrorInfo::new("length-mismatch", "partition length differs from vertex count")
                .with_context("expected", graph.num_original_vertices().to_string())
                .with_context("found", b.len().to_string()),
        ));
    }
    Ok(graph.vertices().map(|h| b[graph.owner(h)]).collect())
}

/// Block memberships of each original vertex: how many of its half-edges
/// sit in each block.
pub fn mixed_membership(
    graph: &HalfEdgeGraph,
    half_edge_partition: &[Block],
) -> Vec<BTreeMap<Block, usize>> {
    (0..graph.num_original_vertices())
        .map(|v| {
            let mut counts = BTreeMap::new();
            for &h in graph.half_edges_of(v) {
                *counts.entry(half_edge_partition[h]).or_insert(0) += 1;
            }
            counts
        })
        .collect()
}

/// Overlapping state of `graph` with vertex partition `b` as starting point.
///
/// The half-edge graph is treated as an ordinary graph, so every sampler
/// applies unchanged; moves relocate single edge ends.
pub fn overlap_state<G: GraphView>(
    graph: &G,
    b: &[Block],
    deg_corr: bool,
    args: EntropyArgs,
) -> Result<BlockState<HalfEdgeGraph>, SbmError> {
    let expanded = HalfEdgeGraph::from_graph(graph);
    let hb = expand_partition(&expanded, b)?;
    BlockState::new(expanded, hb, deg_corr, args)
}
