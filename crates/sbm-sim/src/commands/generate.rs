use std::error::Error;
use std::fs;
use std::path::PathBuf;

use clap::Args;
use sbm_core::rng::RngHandle;
use sbm_graph::{graph_to_json, partition_to_json, planted_partition};

#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Group sizes, comma separated.
    #[arg(long, value_delimiter = ',', required = true)]
    pub sizes: Vec<usize>,
    /// Edge probability inside a group.
    #[arg(long, default_value_t = 0.5)]
    pub p_in: f64,
    /// Edge probability across groups.
    #[arg(long, default_value_t = 0.05)]
    pub p_out: f64,
    /// Sample a directed graph.
    #[arg(long)]
    pub directed: bool,
    #[arg(long, default_value_t = 0)]
    pub seed: u64,
    /// Output path of the graph.
    #[arg(long)]
    pub out: PathBuf,
    /// Output path of the planted partition.
    #[arg(long)]
    pub partition_out: Option<PathBuf>,
}

pub fn run(args: &GenerateArgs) -> Result<(), Box<dyn Error>> {
    let mut rng = RngHandle::from_seed(args.seed);
    let (graph, planted) =
        planted_partition(&args.sizes, args.p_in, args.p_out, args.directed, &mut rng)?;
    fs::write(&args.out, graph_to_json(&graph)?)?;
    if let Some(path) = &args.partition_out {
        fs::write(path, partition_to_json(&planted)?)?;
    }
    Ok(())
}
