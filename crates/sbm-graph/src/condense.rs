use std::collections::BTreeMap;

use sbm_core::errors::{ErrorInfo, SbmError};
use sbm_core::{Block, GraphView};

use crate::adjacency::AdjacencyGraph;

/// Per-vertex degree tuples `(in_degree, out_degree, multiplicity)`.
pub type DegreeTuples = Vec<Vec<(u64, u64, u64)>>;

/// Graph condensed along a partition.
#[derive(Debug, Clone)]
pub struct CondensedGraph {
    /// One vertex per occupied block. Vertex weights hold the summed weight of
    /// the members; edge weights hold the summed multiplicities.
    pub graph: AdjacencyGraph,
    /// Degree tuples of the members of each condensed vertex.
    pub degrees: DegreeTuples,
    /// Original block label of each condensed vertex.
    pub labels: Vec<Block>,
}

/// Collapses every block of `partition` into a single weighted vertex.
///
/// The result carries the members' degree tuples so that degree statistics of
/// the condensed graph describe the original vertices.
pub fn condense<G: GraphView>(graph: &G, partition: &[Block]) -> Result<CondensedGraph, SbmError> {
    if partition.len() != graph.num_vertices() {
        return Err(SbmError::Partition(
            ErrorInfo::new("length-mismatch", "partition length differs from vertex count")
                .with_context("expected", graph.num_vertices().to_string())
                .with_context("found", partition.len().to_string()),
        ));
    }

    let mut index: BTreeMap<Block, usize> = BTreeMap::new();
    for &block in partition {
        let next = index.len();
        index.entry(block).or_insert(next);
    }
    // relabel in ascending label order so the output does not depend on vertex order
    for (position, slot) in index.values_mut().enumerate() {
        *slot = position;
    }
    let labels: Vec<Block> = index.keys().copied().collect();

    let mut condensed = AdjacencyGraph::with_vertices(labels.len(), graph.is_directed());
    let mut weights = vec![0u64; labels.len()];
    let mut histograms: Vec<BTreeMap<(u64, u64), u64>> = vec![BTreeMap::new(); labels.len()];
    for v in graph.vertices() {
        let c = index[&partition[v]];
        let w = graph.vertex_weight(v);
        weights[c] += w;
        if w > 0 {
            *histograms[c]
                .entry((graph.in_degree(v), graph.out_degree(v)))
                .or_insert(0) += w;
        }
    }
    for (c, w) in weights.into_iter().enumerate() {
        condensed.set_vertex_weight(c, w)?;
    }

    let mut multiplicities: BTreeMap<(usize, usize), u64> = BTreeMap::new();
    for edge in 0..graph.num_edges() {
        let (s, t) = graph.endpoints(edge);
        let (cs, ct) = (index[&partition[s]], index[&partition[t]]);
        let key = if graph.is_directed() || cs <= ct {
            (cs, ct)
        } else {
            (ct, cs)
        };
        *multiplicities.entry(key).or_insert(0) += graph.edge_weight(edge);
    }
    for ((cs, ct), m) in multiplicities {
        condensed.add_weighted_edge(cs, ct, m)?;
    }

    let degrees = histograms
        .into_iter()
        .map(|hist| {
            hist.into_iter()
                .map(|((kin, kout), n)| (kin, kout, n))
                .collect()
        })
        .collect();

    Ok(CondensedGraph {
        graph: condensed,
        degrees,
        labels,
    })
}
