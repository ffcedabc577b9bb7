use log::debug;
use rand::seq::SliceRandom;
use sbm_core::rng::RngHandle;
use sbm_core::{Block, GraphView, Vertex};
use serde::{Deserialize, Serialize};

use crate::block_state::BlockState;
use crate::engine::{metropolis_accept, Sampler, SweepOutcome};
use crate::numeric::log_sum_exp;

/// Kind of split–merge proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SplitMergeKind {
    /// Both anchors shared a block, which was split.
    Split,
    /// The anchors' blocks were merged.
    Merge,
    /// No proposal was possible (fewer than two vertices or block cap).
    Skipped,
}

/// Result of one split–merge proposal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SplitMergeOutcome {
    /// Proposal kind.
    pub kind: SplitMergeKind,
    /// Whether the proposal was accepted.
    pub accepted: bool,
    /// Applied change of the description length.
    pub delta: f64,
}

/// Jain–Neal split–merge sampler.
///
/// Two anchor vertices are drawn. When they share a block, the block is split
/// with the anchors on opposite sides: the other members are placed at random
/// and refined by restricted Gibbs launch sweeps, and a final restricted
/// Gibbs pass yields the split proposal and its probability. Otherwise the
/// two blocks are merged, and the probability of the reverse split is
/// computed by the same procedure with the final pass forced to the current
/// assignment.
#[derive(Debug, Clone)]
pub struct MergeSplitSampler<G: GraphView> {
    state: BlockState<G>,
    beta: f64,
    launch_sweeps: usize,
    moves_per_sweep: usize,
    max_blocks: Option<usize>,
}

impl<G: GraphView> MergeSplitSampler<G> {
    /// Wraps a state. `moves_per_sweep == 0` means one proposal per vertex.
    pub fn new(
        state: BlockState<G>,
        beta: f64,
        launch_sweeps: usize,
        moves_per_sweep: usize,
        max_blocks: Option<usize>,
    ) -> Self {
        Self {
            state,
            beta,
            launch_sweeps,
            moves_per_sweep,
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

    fn tracked_move(&mut self, v: Vertex, nr: Block) -> f64 {
        let ds = self.state.virtual_move_dl(v, nr);
        self.state.move_vertex(v, nr);
        ds
    }

    /// One restricted Gibbs pass over `vertices` between blocks `r` and `t`.
    ///
    /// With `forced` set, each vertex is sent to the given block instead of a
    /// sampled one. Returns the log-probability of the realized choices and
    /// the accumulated description-length change.
    fn restricted_pass(
        &mut self,
        vertices: &[Vertex],
        (r, t): (Block, Block),
        forced: Option<&[Block]>,
        rng: &mut RngHandle,
    ) -> (f64, f64) {
        let mut log_p = 0.0;
        let mut ds_total = 0.0;
        for (idx, &k) in vertices.iter().enumerate() {
            let deltas = [
                self.state.virtual_move_dl(k, r),
                self.state.virtual_move_dl(k, t),
            ];
            let log_weights = [-self.beta * deltas[0], -self.beta * deltas[1]];
            let norm = log_sum_exp(log_weights[0], log_weights[1]);
            let choice = match forced {
                Some(targets) => usize::from(targets[idx] == t),
                None => usize::from(rng.unit() >= (log_weights[0] - norm).exp()),
            };
            let lp = log_weights[choice] - norm;
            log_p += lp;
            let target = if choice == 0 { r } else { t };
            ds_total += deltas[choice];
            self.state.move_vertex(k, target);
        }
        (log_p, ds_total)
    }

    fn launch(
        &mut self,
        vertices: &[Vertex],
        labels: (Block, Block),
        rng: &mut RngHandle,
    ) -> f64 {
        let mut ds = 0.0;
        for &k in vertices {
            let target = if rng.unit() < 0.5 { labels.0 } else { labels.1 };
            ds += self.tracked_move(k, target);
        }
        for _ in 0..self.launch_sweeps {
            ds += self.restricted_pass(vertices, labels, None, rng).1;
        }
        ds
    }

    fn split(&mut self, i: Vertex, j: Vertex, rng: &mut RngHandle) -> SplitMergeOutcome {
        let r = self.state.block_of(i);
        if let Some(cap) = self.max_blocks {
            if self.state.num_blocks() >= cap {
                return SplitMergeOutcome {
                    kind: SplitMergeKind::Skipped,
                    accepted: false,
                    delta: 0.0,
                };
            }
        }
        let mut others: Vec<Vertex> = self
            .state
            .block_members(r)
            .into_iter()
            .filter(|&k| k != i && k != j)
            .collect();
        others.shuffle(rng.inner_mut());

        let t = self.state.new_block_label();
        let mut ds = self.tracked_move(j, t);
        ds += self.launch(&others, (r, t), rng);
        let (log_q_split, final_ds) = self.restricted_pass(&others, (r, t), None, rng);
        ds += final_ds;

        if metropolis_accept(-self.beta * ds - log_q_split, rng) {
            return SplitMergeOutcome {
                kind: SplitMergeKind::Split,
                accepted: true,
                delta: ds,
            };
        }
        self.state.move_vertex(j, r);
        for &k in &others {
            self.state.move_vertex(k, r);
        }
        SplitMergeOutcome {
            kind: SplitMergeKind::Split,
            accepted: false,
            delta: 0.0,
        }
    }

    fn merge(&mut self, i: Vertex, j: Vertex, rng: &mut RngHandle) -> SplitMergeOutcome {
        let (r, s) = (self.state.block_of(i), self.state.block_of(j));
        let mut others: Vec<Vertex> = self
            .state
            .block_members(r)
            .into_iter()
            .chain(self.state.block_members(s))
            .filter(|&k| k != i && k != j)
            .collect();
        others.sort_unstable();
        others.shuffle(rng.inner_mut());
        let original: Vec<Block> = others.iter().map(|&k| self.state.block_of(k)).collect();

        // probability that a split of the merged block recreates r and s
        self.launch(&others, (r, s), rng);
        let (log_q_split, _) = self.restricted_pass(&others, (r, s), Some(&original), rng);

        let moved = self.state.block_members(s);
        let mut ds = 0.0;
        for &k in &moved {
            ds += self.tracked_move(k, r);
        }
        if metropolis_accept(-self.beta * ds + log_q_split, rng) {
            return SplitMergeOutcome {
                kind: SplitMergeKind::Merge,
                accepted: true,
                delta: ds,
            };
        }
        for &k in &moved {
            self.state.move_vertex(k, s);
        }
        SplitMergeOutcome {
            kind: SplitMergeKind::Merge,
            accepted: false,
            delta: 0.0,
        }
    }

    /// Draws two anchors and performs one split or merge proposal.
    pub fn attempt(&mut self, rng: &mut RngHandle) -> SplitMergeOutcome {
        let n = self.state.graph().num_vertices();
        if n < 2 {
            return SplitMergeOutcome {
                kind: SplitMergeKind::Skipped,
                accepted: false,
                delta: 0.0,
            };
        }
        let i = rng.index(n);
        let mut j = rng.index(n - 1);
        if j >= i {
            j += 1;
        }
        if self.state.block_of(i) == self.state.block_of(j) {
            self.split(i, j, rng)
        } else {
            self.merge(i, j, rng)
        }
    }
}

impl<G: GraphView> Sampler<G> for MergeSplitSampler<G> {
    fn sweep_once(&mut self, rng: &mut RngHandle) -> SweepOutcome {
        let moves = if self.moves_per_sweep == 0 {
            self.state.graph().num_vertices()
        } else {
            self.moves_per_sweep
        };
        let mut outcome = SweepOutcome::default();
        for _ in 0..moves {
            let attempt = self.attempt(rng);
            if attempt.kind == SplitMergeKind::Skipped {
                continue;
            }
            outcome.attempted += 1;
            if attempt.accepted {
                outcome.accepted += 1;
                outcome.delta += attempt.delta;
            }
        }
        debug!(
            "merge-split sweep: accepted {}/{} dS={:.4} B={}",
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
