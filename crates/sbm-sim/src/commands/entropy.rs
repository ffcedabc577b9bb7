use std::error::Error;
use std::path::PathBuf;

use clap::Args;
use sbm_core::GraphView;
use sbm_mcmc::{BlockState, DegreeDlKind, EntropyArgs as Terms};

use super::{load_graph, load_partition};

#[derive(Args, Debug)]
pub struct EntropyArgs {
    /// Graph in JSON form.
    #[arg(long)]
    pub graph: PathBuf,
    /// Partition (JSON array); all vertices in one block if absent.
    #[arg(long)]
    pub partition: Option<PathBuf>,
    /// Use the degree-corrected likelihood.
    #[arg(long)]
    pub degree_corrected: bool,
    /// Degree prior: 0 = ent, 1 = uniform, 2 = dist.
    #[arg(long, default_value_t = 2)]
    pub deg_dl_kind: i32,
    /// Leave out the edge multiplicity constant.
    #[arg(long)]
    pub simple: bool,
}

pub fn run(args: &EntropyArgs) -> Result<(), Box<dyn Error>> {
    let graph = load_graph(&args.graph)?;
    let b = load_partition(args.partition.as_deref(), graph.num_vertices())?;
    let terms = Terms {
        degree_dl_kind: DegreeDlKind::from_code(args.deg_dl_kind),
        multigraph: !args.simple,
        ..Terms::default()
    };
    let state = BlockState::new(graph, b, args.degree_corrected, terms)?;
    let breakdown = state.entropy_breakdown();
    println!("{}", serde_json::to_string_pretty(&breakdown)?);
    Ok(())
}
