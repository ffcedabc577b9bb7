use sbm_core::errors::{ErrorInfo, SbmError};
use sbm_core::{Block, GraphView};
use serde::{Deserialize, Serialize};

use crate::adjacency::AdjacencyGraph;

/// Serializes the graph to a JSON string.
pub fn graph_to_json(graph: &AdjacencyGraph) -> Result<String, SbmError> {
    let serializable = SerializableGraph::from_graph(graph);
    serde_json::to_string_pretty(&serializable)
        .map_err(|err| SbmError::Serde(ErrorInfo::new("serialize-json", err.to_string())))
}

/// Restores a graph from a JSON string.
pub fn graph_from_json(json: &str) -> Result<AdjacencyGraph, SbmError> {
    let serializable: SerializableGraph = serde_json::from_str(json)
        .map_err(|err| SbmError::Serde(ErrorInfo::new("deserialize-json", err.to_string())))?;
    serializable.into_graph()
}

/// Parses a partition stored as a JSON integer array (vertex index → block).
pub fn partition_from_json(json: &str) -> Result<Vec<Block>, SbmError> {
    serde_json::from_str(json).map_err(|err| {
        SbmError::Serde(
            ErrorInfo::new("deserialize-partition", err.to_string())
                .with_hint("expected a JSON array of non-negative integers"),
        )
    })
}

/// Serializes a partition as a JSON integer array.
pub fn partition_to_json(partition: &[Block]) -> Result<String, SbmError> {
    serde_json::to_string(partition)
        .map_err(|err| SbmError::Serde(ErrorInfo::new("serialize-partition", err.to_string())))
}

#[derive(Debug, Serialize, Deserialize)]
struct SerializableGraph {
    directed: bool,
    num_vertices: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    vertex_weights: Option<Vec<u64>>,
    edges: Vec<SerializableEdge>,
}

#[derive(Debug, Serialize, Deserialize)]
struct SerializableEdge {
    source: usize,
    target: usize,
    #[serde(default = "default_weight")]
    weight: u64,
}

fn default_weight() -> u64 {
    1
}

impl SerializableGraph {
    fn from_graph(graph: &AdjacencyGraph) -> Self {
        let weights: Vec<u64> = graph.vertices().map(|v| graph.vertex_weight(v)).collect();
        let vertex_weights = if weights.iter().all(|&w| w == 1) {
            None
        } else {
            Some(weights)
        };
        let edges = graph
            .edge_list()
            .iter()
            .enumerate()
            .map(|(edge, &(source, target))| SerializableEdge {
                source,
                target,
                weight: graph.edge_weight(edge),
            })
            .collect();
        Self {
            directed: graph.is_directed(),
            num_vertices: graph.num_vertices(),
            vertex_weights,
            edges,
        }
    }

    fn into_graph(self) -> Result<AdjacencyGraph, SbmError> {
        let mut graph = AdjacencyGraph::with_vertices(self.num_vertices, self.directed);
        if let Some(weights) = self.vertex_weights {
            if weights.len() != self.num_vertices {
                return Err(SbmError::Serde(
                    ErrorInfo::new("vertex-weight-length", "vertex weight count mismatch")
                        .with_context("expected", self.num_vertices.to_string())
                        .with_context("found", weights.len().to_string()),
                ));
            }
            for (v, w) in weights.into_iter().enumerate() {
                graph.set_vertex_weight(v, w)?;
            }
        }
        for edge in self.edges {
            graph.add_weighted_edge(edge.source, edge.target, edge.weight)?;
        }
        Ok(graph)
    }
}
