use rand::Rng;
use sbm_core::errors::SbmError;
use sbm_core::rng::RngHandle;
use sbm_core::Block;

use crate::adjacency::{graph_error, AdjacencyGraph};

/// Generates the complete graph on `n` vertices (no self-loops).
pub fn complete_graph(n: usize, directed: bool) -> AdjacencyGraph {
    let mut graph = AdjacencyGraph::with_vertices(n, directed);
    for s in 0..n {
        for t in 0..n {
            if s == t || (!directed && t < s) {
                continue;
            }
            // indices are in range by construction
            let _ = graph.add_edge(s, t);
        }
    }
    graph
}

/// Two undirected cliques of `clique_size` vertices joined by a single bridge
/// edge between vertex `0` and vertex `clique_size`.
///
/// Returns the graph together with its planted two-block assignment.
pub fn two_cliques_with_bridge(
    clique_size: usize,
) -> Result<(AdjacencyGraph, Vec<Block>), SbmError> {
    if clique_size < 2 {
        return Err(graph_error("clique-too-small", "cliques need at least two vertices")
            .with_context("clique_size", clique_size.to_string()));
    }
    let n = 2 * clique_size;
    let mut graph = AdjacencyGraph::with_vertices(n, false);
    for offset in [0, clique_size] {
        for a in 0..clique_size {
            for b in (a + 1)..clique_size {
                graph.add_edge(offset + a, offset + b)?;
            }
        }
    }
    graph.add_edge(0, clique_size)?;
    let planted = (0..n).map(|v| usize::from(v >= clique_size)).collect();
    Ok((graph, planted))
}

/// Samples a planted-partition graph: vertices in the same group connect with
/// probability `p_in`, vertices in different groups with probability `p_out`.
///
/// Returns the graph and the planted assignment.
pub fn planted_partition(
    sizes: &[usize],
    p_in: f64,
    p_out: f64,
    directed: bool,
    rng: &mut RngHandle,
) -> Result<(AdjacencyGraph, Vec<Block>), SbmError> {
    for (name, p) in [("p_in", p_in), ("p_out", p_out)] {
        if !(0.0..=1.0).contains(&p) {
            return Err(graph_error("invalid-probability", "probability outside [0, 1]")
                .with_context("parameter", name)
                .with_context("value", p.to_string()));
        }
    }
    let planted: Vec<Block> = sizes
        .iter()
        .enumerate()
        .flat_map(|(block, &size)| std::iter::repeat(block).take(size))
        .collect();
    let n = planted.len();
    let mut graph = AdjacencyGraph::with_vertices(n, directed);
    for s in 0..n {
        for t in 0..n {
            if s == t || (!directed && t < s) {
                continue;
            }
            let p = if planted[s] == planted[t] { p_in } else { p_out };
            if rng.inner_mut().gen_bool(p) {
                graph.add_edge(s, t)?;
            }
        }
    }
    Ok((graph, planted))
}

/// Samples an Erdős–Rényi graph `G(n, p)`.
pub fn erdos_renyi(
    n: usize,
    p: f64,
    directed: bool,
    rng: &mut RngHandle,
) -> Result<AdjacencyGraph, SbmError> {
    let (graph, _) = planted_partition(&[n], p, p, directed, rng)?;
    Ok(graph)
}

/// Draws a random assignment of `n` vertices into `blocks` labels.
pub fn random_partition(n: usize, blocks: usize, rng: &mut RngHandle) -> Vec<Block> {
    let blocks = blocks.max(1);
    (0..n).map(|_| rng.index(blocks)).collect()
}
