use std::error::Error;
use std::fs;
use std::path::Path;

use sbm_core::Block;
use sbm_graph::{graph_from_json, partition_from_json, AdjacencyGraph};

pub mod entropy;
pub mod exhaustive;
pub mod generate;
pub mod run;

pub fn load_graph(path: &Path) -> Result<AdjacencyGraph, Box<dyn Error>> {
    let json = fs::read_to_string(path)?;
    Ok(graph_from_json(&json)?)
}

/// Reads a JSON partition, or puts every vertex in block 0 when no path is
/// given.
pub fn load_partition(path: Option<&Path>, n: usize) -> Result<Vec<Block>, Box<dyn Error>> {
    match path {
        Some(path) => Ok(partition_from_json(&fs::read_to_string(path)?)?),
        None => Ok(vec![0; n]),
    }
}

pub fn write_json<P: AsRef<Path>, T: serde::Serialize>(
    path: P,
    value: &T,
) -> Result<(), Box<dyn Error>> {
    if let Some(parent) = path.as_ref().parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json)?;
    Ok(())
}
