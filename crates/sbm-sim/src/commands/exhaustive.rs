use std::error::Error;
use std::path::PathBuf;

use clap::Args;
use sbm_core::GraphView;
use sbm_mcmc::{exhaustive_sweep, BlockState, EntropyArgs};

use super::{load_graph, write_json};

#[derive(Args, Debug)]
pub struct ExhaustiveArgs {
    /// Graph in JSON form.
    #[arg(long)]
    pub graph: PathBuf,
    /// Largest number of blocks to enumerate.
    #[arg(long, default_value_t = 2)]
    pub max_blocks: usize,
    /// Stop after this many partitions.
    #[arg(long)]
    pub max_states: Option<usize>,
    /// Use the degree-corrected likelihood.
    #[arg(long)]
    pub degree_corrected: bool,
    /// Writes the summary here instead of stdout.
    #[arg(long)]
    pub out: Option<PathBuf>,
}

pub fn run(args: &ExhaustiveArgs) -> Result<(), Box<dyn Error>> {
    let graph = load_graph(&args.graph)?;
    let n = graph.num_vertices();
    let mut state = BlockState::new(
        graph,
        vec![0; n],
        args.degree_corrected,
        EntropyArgs::default(),
    )?;
    let summary = exhaustive_sweep(&mut state, args.max_blocks, args.max_states, |_, _| {});
    match &args.out {
        Some(path) => write_json(path, &summary)?,
        None => println!("{}", serde_json::to_string_pretty(&summary)?),
    }
    Ok(())
}
