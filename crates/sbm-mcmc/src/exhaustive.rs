use log::info;
use sbm_core::errors::SbmError;
use sbm_core::{Block, GraphView};
use serde::{Deserialize, Serialize};

use crate::block_state::BlockState;
use crate::multicanonical::DensityOfStates;

/// One enumerated partition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExhaustiveStep {
    /// Position in the enumeration, starting at zero.
    pub index: usize,
    /// Description length of the partition.
    pub s: f64,
    /// Smallest description length seen so far.
    pub s_min: f64,
}

/// Result of a complete enumeration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExhaustiveSummary {
    /// Partitions visited.
    pub states: usize,
    /// Smallest description length.
    pub s_min: f64,
    /// Partition attaining `s_min`.
    pub argmin: Vec<Block>,
}

/// Enumerates every partition with at most `max_blocks` blocks.
///
/// Partitions are visited as restricted-growth strings (vertex 0 in block 0,
/// each later vertex in a block at most one above the largest label before
/// it), so no partition appears twice under relabelling. The state is moved
/// in place and the description length is tracked with virtual deltas.
/// Dropping the iterator stops the enumeration and leaves the state at the
/// last visited partition.
pub struct ExhaustiveIter<'a, G: GraphView> {
    state: &'a mut BlockState<G>,
    labels: Vec<Block>,
    prefix_max: Vec<Block>,
    max_blocks: usize,
    max_states: Option<usize>,
    index: usize,
    s: f64,
    s_min: f64,
    best: Vec<Block>,
    done: bool,
}

impl<'a, G: GraphView> ExhaustiveIter<'a, G> {
    /// Moves every vertex into block 0 and prepares the enumeration.
    pub fn new(state: &'a mut BlockState<G>, max_blocks: usize, max_states: Option<usize>) -> Self {
        let n = state.graph().num_vertices();
        for v in 0..n {
            if state.block_of(v) != 0 {
                state.move_vertex(v, 0);
            }
        }
        let s = state.total_dl();
        Self {
            labels: vec![0; n],
            prefix_max: vec![0; n],
            max_blocks: max_blocks.max(1),
            max_states,
            index: 0,
            s,
            s_min: f64::INFINITY,
            best: state.assignment().to_vec(),
            state,
            done: false,
        }
    }

    /// Current partition.
    pub fn assignment(&self) -> &[Block] {
        self.state.assignment()
    }

    /// Partition with the smallest description length seen so far.
    pub fn best_partition(&self) -> &[Block] {
        &self.best
    }

    /// Smallest description length seen so far.
    pub fn s_min(&self) -> f64 {
        self.s_min
    }

    /// Moves to the next restricted-growth string; `false` when exhausted.
    fn advance(&mut self) -> bool {
        let n = self.labels.len();
        let max_label = self.max_blocks - 1;
        let position = (1..n)
            .rev()
            .find(|&i| self.labels[i] < (self.prefix_max[i] + 1).min(max_label));
        let i = match position {
            Some(i) => i,
            None => return false,
        };
        let next = self.labels[i] + 1;
        self.labels[i] = next;
        self.s += self.state.virtual_move_dl(i, next);
        self.state.move_vertex(i, next);
        let carried = self.prefix_max[i].max(next);
        for j in i + 1..n {
            self.prefix_max[j] = carried;
            if self.labels[j] != 0 {
                self.labels[j] = 0;
                self.s += self.state.virtual_move_dl(j, 0);
                self.state.move_vertex(j, 0);
            }
        }
        true
    }
}

impl<G: GraphView> Iterator for ExhaustiveIter<'_, G> {
    type Item = ExhaustiveStep;

    fn next(&mut self) -> Option<ExhaustiveStep> {
        if self.done || self.max_states.map_or(false, |cap| self.index >= cap) {
            return None;
        }
        if self.index > 0 && !self.advance() {
            self.done = true;
            return None;
        }
        if self.s < self.s_min {
            self.s_min = self.s;
            self.best.clear();
            self.best.extend_from_slice(self.state.assignment());
        }
        let step = ExhaustiveStep {
            index: self.index,
            s: self.s,
            s_min: self.s_min,
        };
        self.index += 1;
        Some(step)
    }
}

/// Enumerates all partitions, calling `visit` with each step and partition.
pub fn exhaustive_sweep<G, F>(
    state: &mut BlockState<G>,
    max_blocks: usize,
    max_states: Option<usize>,
    mut visit: F,
) -> ExhaustiveSummary
where
    G: GraphView,
    F: FnMut(&ExhaustiveStep, &[Block]),
{
    let mut iter = ExhaustiveIter::new(state, max_blocks, max_states);
    let mut states = 0;
    while let Some(step) = iter.next() {
        visit(&step, iter.assignment());
        states += 1;
    }
    let summary = ExhaustiveSummary {
        states,
        s_min: iter.s_min(),
        argmin: iter.best_partition().to_vec(),
    };
    info!(
        "exhaustive enumeration visited {} partitions, S_min={:.6}",
        summary.states, summary.s_min
    );
    summary
}

/// Histogram of the description length over `[s_min, s_max)` for all
/// partitions with at most `max_blocks` blocks.
pub fn exhaustive_density<G: GraphView>(
    state: &mut BlockState<G>,
    max_blocks: usize,
    s_min: f64,
    s_max: f64,
    bins: usize,
) -> Result<Vec<u64>, SbmError> {
    let range = DensityOfStates::new(s_min, s_max, bins)?;
    let mut hist = vec![0u64; bins];
    for step in ExhaustiveIter::new(state, max_blocks, None) {
        if let Some(bin) = range.bin(step.s) {
            hist[bin] += 1;
        }
    }
    Ok(hist)
}
