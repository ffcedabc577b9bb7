use std::error::Error;

use clap::{Parser, Subcommand};
use commands::{
    entropy::{self, EntropyArgs},
    exhaustive::{self, ExhaustiveArgs},
    generate::{self, GenerateArgs},
    run::{self, RunArgs},
};

mod commands;

#[derive(Parser, Debug)]
#[command(name = "sbm-sim", about = "Stochastic block-model inference CLI")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the configured sampler on a graph and write the run summary.
    Run(RunArgs),
    /// Print the description-length breakdown of a partition.
    Entropy(EntropyArgs),
    /// Enumerate every partition of a small graph.
    Exhaustive(ExhaustiveArgs),
    /// Sample a planted-partition graph.
    Generate(GenerateArgs),
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match cli.command {
        Command::Run(args) => run::run(&args),
        Command::Entropy(args) => entropy::run(&args),
        Command::Exhaustive(args) => exhaustive::run(&args),
        Command::Generate(args) => generate::run(&args),
    }
}
