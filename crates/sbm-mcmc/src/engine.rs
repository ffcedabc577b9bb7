use log::debug;
use rand::seq::SliceRandom;
use sbm_core::rng::RngHandle;
use sbm_core::{Block, GraphView, Vertex};
use serde::{Deserialize, Serialize};

use crate::block_state::BlockState;

/// Result of a single proposal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepOutcome {
    /// Vertex that was considered.
    pub vertex: Vertex,
    /// Block before the step.
    pub from: Block,
    /// Proposed block.
    pub to: Block,
    /// Whether the move was committed.
    pub accepted: bool,
    /// Change of the description length actually applied.
    pub delta: f64,
}

/// Aggregate of one or more sweeps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SweepOutcome {
    /// Proposals made.
    pub attempted: usize,
    /// Proposals accepted.
    pub accepted: usize,
    /// Summed change of the description length.
    pub delta: f64,
}

impl SweepOutcome {
    /// Folds a step into the aggregate.
    pub fn record(&mut self, step: &StepOutcome) {
        self.attempted += 1;
        if step.accepted {
            self.accepted += 1;
        }
        self.delta += step.delta;
    }

    /// Folds another aggregate into this one.
    pub fn merge(&mut self, other: &SweepOutcome) {
        self.attempted += other.attempted;
        self.accepted += other.accepted;
        self.delta += other.delta;
    }

    /// Fraction of accepted proposals.
    pub fn acceptance_rate(&self) -> f64 {
        if self.attempted == 0 {
            0.0
        } else {
            self.accepted as f64 / self.attempted as f64
        }
    }
}

/// Common surface of the samplers driven by the chain runner.
pub trait Sampler<G: GraphView> {
    /// Runs one sweep.
    fn sweep_once(&mut self, rng: &mut RngHandle) -> SweepOutcome;

    /// Current state.
    fn state(&self) -> &BlockState<G>;

    /// Inverse temperature.
    fn beta(&self) -> f64 {
        1.0
    }

    /// Sets the inverse temperature. Samplers without a temperature ignore it.
    fn set_beta(&mut self, _beta: f64) {}
}

/// Metropolis–Hastings acceptance test in log space.
pub(crate) fn metropolis_accept(log_a: f64, rng: &mut RngHandle) -> bool {
    if log_a.is_nan() {
        return false;
    }
    log_a >= 0.0 || rng.unit() < log_a.exp()
}

/// Vertices in a fresh random order.
pub(crate) fn shuffled_vertices<G: GraphView>(graph: &G, rng: &mut RngHandle) -> Vec<Vertex> {
    let mut order: Vec<Vertex> = graph.vertices().collect();
    order.shuffle(rng.inner_mut());
    order
}

/// Single-vertex Metropolis–Hastings sampler.
///
/// A move `v: r -> s` is accepted with probability
/// `min(1, exp(-beta dS) P(s -> r) / P(r -> s))`, with both proposal
/// probabilities taken from the state's [`MoveProposer`](crate::MoveProposer).
#[derive(Debug, Clone)]
pub struct McmcEngine<G: GraphView> {
    state: BlockState<G>,
    beta: f64,
}

impl<G: GraphView> McmcEngine<G> {
    /// Wraps a state; `beta = 1` samples the posterior.
    pub fn new(state: BlockState<G>, beta: f64) -> Self {
        Self { state, beta }
    }

    /// Current state.
    pub fn state(&self) -> &BlockState<G> {
        &self.state
    }

    /// Mutable access to the state.
    pub fn state_mut(&mut self) -> &mut BlockState<G> {
        &mut self.state
    }

    /// Consumes the engine and returns the state.
    pub fn into_state(self) -> BlockState<G> {
        self.state
    }

    /// Description length of the current state.
    pub fn total_description_length(&self) -> f64 {
        self.state.total_dl()
    }

    /// Proposes and possibly commits a move of `v`.
    pub fn step_vertex(&mut self, v: Vertex, rng: &mut RngHandle) -> StepOutcome {
        let r = self.state.block_of(v);
        let nr = self.state.propose_move(v, rng);
        let mut outcome = StepOutcome {
            vertex: v,
            from: r,
            to: nr,
            accepted: false,
            delta: 0.0,
        };
        if nr == r {
            return outcome;
        }
        let ds = self.state.virtual_move_dl(v, nr);
        let proposer = *self.state.proposer();
        let forward = proposer.log_prob(&self.state, v, r, nr);
        let reverse = proposer.log_prob(&self.state, v, nr, r);
        if metropolis_accept(-self.beta * ds + reverse - forward, rng) {
            self.state.move_vertex(v, nr);
            outcome.accepted = true;
            outcome.delta = ds;
        }
        outcome
    }

    /// Proposes a move for a uniformly random vertex.
    pub fn propose_and_step(&mut self, rng: &mut RngHandle) -> StepOutcome {
        let v = rng.index(self.state.graph().num_vertices());
        self.step_vertex(v, rng)
    }

    /// Runs `sweeps` passes; each pass visits every vertex once in random
    /// order.
    pub fn sweep(&mut self, sweeps: usize, rng: &mut RngHandle) -> SweepOutcome {
        let mut total = SweepOutcome::default();
        for _ in 0..sweeps {
            let mut outcome = SweepOutcome::default();
            for v in shuffled_vertices(self.state.graph(), rng) {
                let step = self.step_vertex(v, rng);
                outcome.record(&step);
            }
            debug!(
                "mh sweep: accepted {}/{} dS={:.4} B={}",
                outcome.accepted,
                outcome.attempted,
                outcome.delta,
                self.state.num_blocks()
            );
            total.merge(&outcome);
        }
        total
    }
}

impl<G: GraphView> Sampler<G> for McmcEngine<G> {
    fn sweep_once(&mut self, rng: &mut RngHandle) -> SweepOutcome {
        self.sweep(1, rng)
    }

    fn state(&self) -> &BlockState<G> {
        &self.state
    }

    fn beta(&self) -> f64 {
        self.beta
    }

    fn set_beta(&mut self, beta: f64) {
        self.beta = beta;
    }
}
