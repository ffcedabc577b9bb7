use sbm_core::rng::RngHandle;
use sbm_core::{Block, GraphView, Vertex};
use serde::{Deserialize, Serialize};

use crate::block_state::BlockState;

/// Single-vertex move proposal.
///
/// With probability `p_new` (only while fewer than `max_blocks` labels are
/// occupied, as counted by [`BlockState::num_blocks`]) a brand-new block is
/// proposed. Otherwise, with probability
/// `epsilon` a uniformly random occupied block, else the block of a random
/// neighbour chosen by edge weight. Vertices without neighbours always use
/// the uniform choice.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MoveProposer {
    /// Weight of the uniform component among occupied blocks.
    pub epsilon: f64,
    /// Probability of proposing a brand-new block.
    pub p_new: f64,
    /// Optional cap on the number of occupied blocks.
    pub max_blocks: Option<usize>,
}

impl Default for MoveProposer {
    fn default() -> Self {
        Self {
            epsilon: 0.1,
            p_new: 0.05,
            max_blocks: None,
        }
    }
}

impl MoveProposer {
    /// Effective new-block probability with `occupied` blocks in use.
    pub fn new_block_probability(&self, occupied: usize) -> f64 {
        match self.max_blocks {
            Some(cap) if occupied >= cap => 0.0,
            _ => self.p_new,
        }
    }

    /// Draws a target block for `v`.
    pub fn propose<G: GraphView>(
        &self,
        state: &BlockState<G>,
        v: Vertex,
        rng: &mut RngHandle,
    ) -> Block {
        let occupied = state.occupied_blocks();
        let p_new = self.new_block_probability(occupied.len());
        if p_new > 0.0 && rng.unit() < p_new {
            return state.new_block_label();
        }
        let k = state.neighbor_weight(v);
        if k == 0 || rng.unit() < self.epsilon {
            return occupied[rng.index(occupied.len())];
        }
        let mut x = (rng.unit() * k as f64) as u64;
        for (u, w) in state.incidences(v) {
            if x < w {
                return state.block_of(u);
            }
            x -= w;
        }
        state.block_of(v)
    }

    /// Log-probability of proposing `to` for `v`, evaluated as if `v` sat in
    /// block `from` and everything else stayed as in `state`.
    ///
    /// With `from` equal to the current block this is the forward
    /// probability; with `from` set to the target of a pending move it is the
    /// probability of the reverse proposal.
    pub fn log_prob<G: GraphView>(
        &self,
        state: &BlockState<G>,
        v: Vertex,
        from: Block,
        to: Block,
    ) -> f64 {
        let current = state.block_of(v);
        let size = |s: Block| {
            let mut c = state.block_size(s);
            if s == current {
                c -= 1;
            }
            if s == from {
                c += 1;
            }
            c
        };
        let mut occupied = state.num_blocks();
        if from != current {
            if state.block_size(current) == 1 {
                occupied -= 1;
            }
            if state.block_size(from) == 0 {
                occupied += 1;
            }
        }

        let p_new = self.new_block_probability(occupied);
        if size(to) == 0 {
            return p_new.ln();
        }
        let uniform = 1.0 / occupied as f64;
        let k = state.neighbor_weight(v);
        let p = if k == 0 {
            uniform
        } else {
            let towards: u64 = state
                .incidences(v)
                .filter(|&(u, _)| {
                    let block = if u == v { from } else { state.block_of(u) };
                    block == to
                })
                .map(|(_, w)| w)
                .sum();
            self.epsilon * uniform + (1.0 - self.epsilon) * towards as f64 / k as f64
        };
        ((1.0 - p_new) * p).ln()
    }
}
