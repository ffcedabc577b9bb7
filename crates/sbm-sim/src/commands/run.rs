use std::error::Error;
use std::fs;
use std::path::PathBuf;

use clap::Args;
use log::info;
use sbm_core::GraphView;
use sbm_graph::partition_to_json;
use sbm_mcmc::{run_chains, RunConfig};

use super::{load_graph, load_partition, write_json};

#[derive(Args, Debug)]
pub struct RunArgs {
    /// YAML configuration of the run.
    #[arg(long)]
    pub config: PathBuf,
    /// Graph in JSON form.
    #[arg(long)]
    pub graph: PathBuf,
    /// Starting partition (JSON array); all vertices in one block if absent.
    #[arg(long)]
    pub partition: Option<PathBuf>,
    /// Output directory.
    #[arg(long)]
    pub out: PathBuf,
    /// Overrides the master seed of the configuration.
    #[arg(long)]
    pub seed: Option<u64>,
}

pub fn run(args: &RunArgs) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(&args.out)?;
    let mut config = RunConfig::load(&args.config)?;
    if let Some(seed) = args.seed {
        config.seed_policy.master_seed = seed;
    }
    let graph = load_graph(&args.graph)?;
    let start = load_partition(args.partition.as_deref(), graph.num_vertices())?;

    let summary = run_chains(&config, &graph, &start)?;

    write_json(args.out.join("summary.json"), &summary)?;
    fs::write(
        args.out.join("best_partition.json"),
        partition_to_json(&summary.best_partition)?,
    )?;
    fs::write(args.out.join("config.yaml"), config.to_yaml_string()?)?;
    info!(
        "wrote run summary to {} (best S={:.6})",
        args.out.display(),
        summary.best_dl
    );
    Ok(())
}
