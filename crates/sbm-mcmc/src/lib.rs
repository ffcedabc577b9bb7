#![deny(missing_docs)]

//! Description-length bookkeeping and MCMC samplers for stochastic block
//! models.
//!
//! A [`BlockState`] holds a partition of a [`GraphView`](sbm_core::GraphView)
//! together with the aggregates needed to price single-vertex moves in
//! constant time per incident edge. The samplers ([`McmcEngine`],
//! [`GibbsSampler`], [`MulticanonicalSampler`], [`MergeSplitSampler`]) only
//! talk to the state through `virtual_move_dl` and `move_vertex`, and
//! [`run_chains`] drives any of them from a [`RunConfig`].

/// Sparse-to-dense block label map.
pub mod block_map;
/// Partitioned graph state and entropy terms.
pub mod block_state;
/// YAML configuration schema and defaults.
pub mod config;
/// Per-vertex degree sources.
pub mod degs;
/// Deterministic seed derivation helpers.
pub mod determinism;
/// Single-vertex Metropolis–Hastings engine and the sampler trait.
pub mod engine;
/// Enumeration of all partitions of small graphs.
pub mod exhaustive;
/// Heat-bath sampler.
pub mod gibbs;
pub mod int_part;
/// Multi-chain runner with optional replica exchange.
pub mod kernel;
/// Several edge layers sharing one partition.
pub mod layers;
/// Greedy agglomerative merges.
pub mod merge;
/// Split–merge sampler.
pub mod merge_split;
/// Wang–Landau sampler.
pub mod multicanonical;
pub mod numeric;
pub mod overlap;
/// Partition, edge-count and degree priors.
pub mod partition;
/// Move proposals.
pub mod proposal;
pub mod relabel;
/// Parallel tempering ladder helpers.
pub mod tempering;

pub use block_map::BlockMap;
pub use block_state::{BlockState, EntropyArgs, EntropyBreakdown};
pub use config::{
    AlgorithmConfig, LadderConfig, LadderPolicy, ModelConfig, ProposalConfig, RunConfig,
    SeedPolicy,
};
pub use degs::DegreeSequence;
pub use engine::{McmcEngine, Sampler, StepOutcome, SweepOutcome};
pub use exhaustive::{
    exhaustive_density, exhaustive_sweep, ExhaustiveIter, ExhaustiveStep, ExhaustiveSummary,
};
pub use gibbs::GibbsSampler;
pub use kernel::{run_chains, ChainSummary, RunSummary};
pub use layers::LayeredBlockState;
pub use merge::{merge_delta, merge_sweep, MergeRecord};
pub use merge_split::{MergeSplitSampler, SplitMergeKind, SplitMergeOutcome};
pub use multicanonical::{
    DensityOfStates, MulticanonicalSampler, WangLandauReport, WangLandauSchedule,
};
pub use overlap::{expand_partition, mixed_membership, overlap_state};
pub use partition::{DegreeDlKind, PartitionStats};
pub use proposal::MoveProposer;
pub use relabel::{continuous_map, vector_map, vector_rmap};
