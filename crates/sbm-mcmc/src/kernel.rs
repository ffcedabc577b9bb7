use log::{debug, info};
use rayon::prelude::*;
use sbm_core::errors::SbmError;
use sbm_core::rng::RngHandle;
use sbm_core::{Block, GraphView};
use serde::{Deserialize, Serialize};

use crate::block_state::BlockState;
use crate::config::{AlgorithmConfig, RunConfig};
use crate::determinism;
use crate::engine::{McmcEngine, Sampler, SweepOutcome};
use crate::gibbs::GibbsSampler;
use crate::merge_split::MergeSplitSampler;
use crate::multicanonical::{DensityOfStates, MulticanonicalSampler, WangLandauReport};
use crate::tempering;

/// Per-chain result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainSummary {
    /// Chain (or replica) index.
    pub chain: usize,
    /// Seed of the chain's generator.
    pub seed: u64,
    /// Inverse temperature at the end of the run.
    pub beta: f64,
    /// Description length of the starting partition.
    pub initial_dl: f64,
    /// Description length at the end of the run.
    pub final_dl: f64,
    /// Smallest description length seen after any sweep.
    pub min_dl: f64,
    /// Partition attaining `min_dl`.
    pub best_partition: Vec<Block>,
    /// Partition at the end of the run.
    pub final_partition: Vec<Block>,
    /// Occupied blocks at the end of the run.
    pub num_blocks: usize,
    /// Fraction of accepted proposals.
    pub acceptance_rate: f64,
    /// Sweeps executed.
    pub sweeps: usize,
    /// Wang–Landau progress, for multicanonical chains.
    pub wang_landau: Option<WangLandauReport>,
}

/// Summary returned to callers after a run completes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// One entry per chain, ordered by index.
    pub chains: Vec<ChainSummary>,
    /// Ladder temperatures, empty without replica exchange.
    pub temperatures: Vec<f64>,
    /// Average exchange acceptance per neighbouring temperature pair.
    pub exchange_acceptance: Vec<f64>,
    /// Chain holding the overall best partition.
    pub best_chain: usize,
    /// Smallest description length over all chains.
    pub best_dl: f64,
    /// Partition attaining `best_dl`.
    pub best_partition: Vec<Block>,
    /// Master seed of the run.
    pub master_seed: u64,
    /// Seed label from the configuration.
    pub seed_label: Option<String>,
}

enum ChainSampler<G: GraphView> {
    Metropolis(McmcEngine<G>),
    Gibbs(GibbsSampler<G>),
    MergeSplit(MergeSplitSampler<G>),
    Multicanonical(MulticanonicalSampler<G>),
}

impl<G: GraphView> ChainSampler<G> {
    fn build(config: &RunConfig, state: BlockState<G>, beta: f64) -> Result<Self, SbmError> {
        let max_blocks = config.proposal.max_blocks;
        Ok(match config.algorithm {
            AlgorithmConfig::Metropolis => ChainSampler::Metropolis(McmcEngine::new(state, beta)),
            AlgorithmConfig::Gibbs => {
                ChainSampler::Gibbs(GibbsSampler::new(state, beta, max_blocks))
            }
            AlgorithmConfig::MergeSplit {
                launch_sweeps,
                split_merge_moves,
            } => ChainSampler::MergeSplit(MergeSplitSampler::new(
                state,
                beta,
                launch_sweeps,
                split_merge_moves,
                max_blocks,
            )),
            AlgorithmConfig::Multicanonical {
                s_min, s_max, bins, ..
            } => {
                let dos = DensityOfStates::new(s_min, s_max, bins)?;
                let schedule = config.wang_landau_schedule().unwrap_or_default();
                ChainSampler::Multicanonical(MulticanonicalSampler::new(state, dos, schedule)?)
            }
        })
    }

    fn sampler(&self) -> &dyn Sampler<G> {
        match self {
            ChainSampler::Metropolis(s) => s,
            ChainSampler::Gibbs(s) => s,
            ChainSampler::MergeSplit(s) => s,
            ChainSampler::Multicanonical(s) => s,
        }
    }

    fn sampler_mut(&mut self) -> &mut dyn Sampler<G> {
        match self {
            ChainSampler::Metropolis(s) => s,
            ChainSampler::Gibbs(s) => s,
            ChainSampler::MergeSplit(s) => s,
            ChainSampler::Multicanonical(s) => s,
        }
    }

    fn finished(&self) -> bool {
        matches!(self, ChainSampler::Multicanonical(s) if s.converged())
    }

    fn wang_landau(&self) -> Option<WangLandauReport> {
        match self {
            ChainSampler::Multicanonical(s) => Some(s.report()),
            _ => None,
        }
    }
}

struct Chain<G: GraphView> {
    index: usize,
    seed: u64,
    rng: RngHandle,
    sampler: ChainSampler<G>,
    initial_dl: f64,
    min_dl: f64,
    best_partition: Vec<Block>,
    outcome: SweepOutcome,
    sweeps: usize,
}

impl<G: GraphView> Chain<G> {
    fn new(
        config: &RunConfig,
        index: usize,
        state: BlockState<G>,
        beta: f64,
    ) -> Result<Self, SbmError> {
        let seed = determinism::chain_seed(config.seed_policy.master_seed, index);
        let initial_dl = state.total_dl();
        let best_partition = state.assignment().to_vec();
        Ok(Self {
            index,
            seed,
            rng: RngHandle::from_seed(seed),
            sampler: ChainSampler::build(config, state, beta)?,
            initial_dl,
            min_dl: initial_dl,
            best_partition,
            outcome: SweepOutcome::default(),
            sweeps: 0,
        })
    }

    fn energy(&self) -> f64 {
        self.sampler.sampler().state().total_dl()
    }

    fn advance(&mut self, sweeps: usize) {
        for _ in 0..sweeps {
            if self.sampler.finished() {
                break;
            }
            let outcome = self.sampler.sampler_mut().sweep_once(&mut self.rng);
            self.outcome.merge(&outcome);
            self.sweeps += 1;
            let s = self.energy();
            if s < self.min_dl {
                self.min_dl = s;
                self.best_partition.clear();
                self.best_partition
                    .extend_from_slice(self.sampler.sampler().state().assignment());
            }
        }
    }

    fn summary(&self) -> ChainSummary {
        let sampler = self.sampler.sampler();
        let state = sampler.state();
        let summary = ChainSummary {
            chain: self.index,
            seed: self.seed,
            beta: sampler.beta(),
            initial_dl: self.initial_dl,
            final_dl: state.total_dl(),
            min_dl: self.min_dl,
            best_partition: self.best_partition.clone(),
            final_partition: state.assignment().to_vec(),
            num_blocks: state.num_blocks(),
            acceptance_rate: self.outcome.acceptance_rate(),
            sweeps: self.sweeps,
            wang_landau: self.sampler.wang_landau(),
        };
        info!(
            "chain {} finished: S={:.6} S_min={:.6} B={} acceptance={:.3}",
            summary.chain,
            summary.final_dl,
            summary.min_dl,
            summary.num_blocks,
            summary.acceptance_rate
        );
        summary
    }
}

/// Runs the configured sampler on independent chains, or on a replica
/// ladder with neighbour exchanges when `config.ladder` is set.
///
/// Chains run on the rayon pool. Chain `i` draws from the substream
/// `chain_seed(master_seed, i)`, so results only depend on the configuration.
pub fn run_chains<G: GraphView + Clone>(
    config: &RunConfig,
    graph: &G,
    partition: &[Block],
) -> Result<RunSummary, SbmError> {
    config.validate()?;
    let initial = BlockState::new(
        graph.clone(),
        partition.to_vec(),
        config.model.degree_corrected,
        config.model.entropy,
    )?
    .with_proposer(config.proposal.proposer());
    info!(
        "starting run: N={} E={} B={} S={:.6}",
        graph.num_vertices(),
        graph.total_edge_weight(),
        initial.num_blocks(),
        initial.total_dl()
    );

    let temperatures = config
        .ladder
        .as_ref()
        .map(tempering::build_ladder)
        .unwrap_or_default();
    let betas: Vec<f64> = if temperatures.is_empty() {
        vec![config.beta; config.chains]
    } else {
        temperatures.iter().map(|t| 1.0 / t).collect()
    };

    let mut chains = betas
        .iter()
        .enumerate()
        .map(|(index, &beta)| Chain::new(config, index, initial.clone(), beta))
        .collect::<Result<Vec<_>, _>>()?;

    let mut exchange_acceptance = Vec::new();
    match &config.ladder {
        None => chains
            .par_iter_mut()
            .for_each(|chain| chain.advance(config.sweeps)),
        Some(ladder) => {
            exchange_acceptance = run_ladder(
                config.seed_policy.master_seed,
                config.sweeps,
                ladder.exchange_interval.max(1),
                &temperatures,
                &mut chains,
            );
        }
    }

    let summaries: Vec<ChainSummary> = chains.iter().map(Chain::summary).collect();
    let best = summaries
        .iter()
        .min_by(|a, b| a.min_dl.total_cmp(&b.min_dl))
        .map(|c| (c.chain, c.min_dl, c.best_partition.clone()))
        .unwrap_or((0, initial.total_dl(), partition.to_vec()));
    info!("run finished: best S={:.6} on chain {}", best.1, best.0);
    Ok(RunSummary {
        chains: summaries,
        temperatures,
        exchange_acceptance,
        best_chain: best.0,
        best_dl: best.1,
        best_partition: best.2,
        master_seed: config.seed_policy.master_seed,
        seed_label: config.seed_policy.label.clone(),
    })
}

/// Alternates parallel sweeps with rounds of neighbour exchanges.
/// `order[k]` is the chain currently holding temperature `k`.
fn run_ladder<G: GraphView>(
    master_seed: u64,
    sweeps: usize,
    interval: usize,
    temperatures: &[f64],
    chains: &mut [Chain<G>],
) -> Vec<f64> {
    let mut ledger = tempering::ExchangeLedger::new(temperatures.len());
    let mut order: Vec<usize> = (0..chains.len()).collect();
    let mut done = 0;
    let mut round = 0;
    while done < sweeps {
        let block = interval.min(sweeps - done);
        chains.par_iter_mut().for_each(|chain| chain.advance(block));
        done += block;

        let mut rng = RngHandle::from_seed(determinism::exchange_seed(master_seed, round));
        let dl_at: Vec<f64> = order.iter().map(|&c| chains[c].energy()).collect();
        for k in tempering::exchange_round(round, &dl_at, temperatures, &mut ledger, &mut rng) {
            order.swap(k, k + 1);
            for rung in [k, k + 1] {
                chains[order[rung]]
                    .sampler
                    .sampler_mut()
                    .set_beta(1.0 / temperatures[rung]);
            }
        }
        debug!("exchange round {round}: order={order:?}");
        round += 1;
    }
    ledger.rates()
}
