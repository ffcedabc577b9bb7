use log::debug;
use sbm_core::rng::RngHandle;
use sbm_core::{Block, GraphView, Vertex};

use crate::block_state::BlockState;
use crate::engine::{shuffled_vertices, Sampler, StepOutcome, SweepOutcome};
use crate::numeric::sample_log_weights;

/// Heat-bath sampler: each vertex is redrawn from its full conditional over
/// the occupied blocks plus one empty block.
///
/// The empty block is only offered while `v` shares its block with another
/// vertex and the block cap allows another block, so every partition appears
/// once among the candidates.
#[derive(Debug, Clone)]
pub struct GibbsSampler<G: GraphView> {
    state: BlockState<G>,
    beta: f64,
    max_blocks: Option<usize>,
}

impl<G: GraphView> GibbsSampler<G> {
    /// Wraps a state.
    pub fn new(state: BlockState<G>, beta: f64, max_blocks: Option<usize>) -> Self {
        Self {
            state,
            beta,
            max_blocks,
        }
    }

    /// Current state.
    pub fn state(&self) -> &BlockState<G> {
        &self.state
    }

    /// Consumes the sampler and returns the state.
    pub fn into_state(self) -> BlockState<G> {
        self.state
    }

    /// Blocks `v` may be drawn into.
    pub fn candidates(&self, v: Vertex) -> Vec<Block> {
        let mut candidates = self.state.occupied_blocks().to_vec();
        candidates.sort_unstable();
        let r = self.state.block_of(v);
        let below_cap = self
            .max_blocks
            .map_or(true, |cap| self.state.num_blocks() < cap);
        if self.state.block_size(r) > 1 && below_cap {
            candidates.push(self.state.new_block_label());
        }
        candidates
    }

    /// Redraws the block of `v` from its conditional distribution.
    pub fn step_vertex(&mut self, v: Vertex, rng: &mut RngHandle) -> StepOutcome {
        let r = self.state.block_of(v);
        let candidates = self.candidates(v);
        let deltas = self.state.virtual_moves(v, &candidates);
        let log_weights: Vec<f64> = deltas
            .iter()
            .map(|&ds| if ds.is_nan() { f64::NEG_INFINITY } else { -self.beta * ds })
            .collect();
        let (index, _) = sample_log_weights(&log_weights, rng.unit());
        let nr = candidates[index];
        let delta = deltas[index];
        self.state.move_vertex(v, nr);
        StepOutcome {
            vertex: v,
            from: r,
            to: nr,
            accepted: nr != r,
            delta,
        }
    }
}

impl<G: GraphView> Sampler<G> for GibbsSampler<G> {
    fn sweep_once(&mut self, rng: &mut RngHandle) -> SweepOutcome {
        let mut outcome = SweepOutcome::default();
        for v in shuffled_vertices(self.state.graph(), rng) {
            let step = self.step_vertex(v, rng);
            outcome.record(&step);
        }
        debug!(
            "gibbs sweep: moved {}/{} dS={:.4} B={}",
            outcome.accepted,
            outcome.attempted,
            outcome.delta,
            self.state.num_blocks()
        );
        outcome
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
