use std::collections::BTreeSet;

use log::{debug, info};
use sbm_core::rng::RngHandle;
use sbm_core::{Block, GraphView};
use serde::{Deserialize, Serialize};

use crate::block_state::BlockState;

/// One committed block merge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MergeRecord {
    /// Block that was emptied.
    pub from: Block,
    /// Block that received the members.
    pub into: Block,
    /// Change of the description length.
    pub delta: f64,
}

/// Description-length change of merging block `s` into `r`.
///
/// The merge is applied and undone, so the state is unchanged on return.
pub fn merge_delta<G: GraphView>(state: &mut BlockState<G>, s: Block, r: Block) -> f64 {
    if s == r {
        return 0.0;
    }
    let members = state.block_members(s);
    let mut ds = 0.0;
    for &v in &members {
        ds += state.virtual_move_dl(v, r);
        state.move_vertex(v, r);
    }
    for &v in &members {
        state.move_vertex(v, s);
    }
    ds
}

fn merge_candidates<G: GraphView>(
    state: &BlockState<G>,
    s: Block,
    count: usize,
    rng: &mut RngHandle,
) -> Vec<Block> {
    let members = state.block_members(s);
    let occupied = state.occupied_blocks();
    let mut found = BTreeSet::new();
    for _ in 0..count * 4 {
        if found.len() >= count || occupied.len() < 2 {
            break;
        }
        let v = members[rng.index(members.len())];
        let k = state.neighbor_weight(v);
        let mut candidate = occupied[rng.index(occupied.len())];
        if k > 0 && rng.unit() >= state.proposer().epsilon {
            let mut x = (rng.unit() * k as f64) as u64;
            for (u, w) in state.incidences(v) {
                if x < w {
                    candidate = state.block_of(u);
                    break;
                }
                x -= w;
            }
        }
        if candidate != s {
            found.insert(candidate);
        }
    }
    found.into_iter().collect()
}

/// Greedy agglomerative reduction of the number of blocks.
///
/// Each round evaluates, for every occupied block, up to
/// `candidates_per_block` merge targets drawn from neighbouring blocks, keeps
/// the cheapest one and then commits the cheapest non-overlapping merges
/// until `target_blocks` remain.
pub fn merge_sweep<G: GraphView>(
    state: &mut BlockState<G>,
    target_blocks: usize,
    candidates_per_block: usize,
    rng: &mut RngHandle,
) -> Vec<MergeRecord> {
    let target = target_blocks.max(1);
    let mut records = Vec::new();
    while state.num_blocks() > target {
        let mut blocks = state.occupied_blocks().to_vec();
        blocks.sort_unstable();
        let mut best: Vec<(f64, Block, Block)> = Vec::new();
        for &s in &blocks {
            let mut choice: Option<(f64, Block)> = None;
            for r in merge_candidates(state, s, candidates_per_block.max(1), rng) {
                let ds = merge_delta(state, s, r);
                if choice.map_or(true, |(d, _)| ds < d) {
                    choice = Some((ds, r));
                }
            }
            if let Some((ds, r)) = choice {
                best.push((ds, s, r));
            }
        }
        best.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut touched = BTreeSet::new();
        let before = records.len();
        for (_, s, r) in best {
            if state.num_blocks() <= target {
                break;
            }
            if touched.contains(&s) || touched.contains(&r) {
                continue;
            }
            let mut delta = 0.0;
            for v in state.block_members(s) {
                delta += state.virtual_move_dl(v, r);
                state.move_vertex(v, r);
            }
            touched.insert(s);
            touched.insert(r);
            records.push(MergeRecord {
                from: s,
                into: r,
                delta,
            });
        }
        debug!(
            "merge round: {} merges, B={}",
            records.len() - before,
            state.num_blocks()
        );
        if records.len() == before {
            break;
        }
    }
    info!(
        "greedy merge finished with B={} after {} merges",
        state.num_blocks(),
        records.len()
    );
    records
}
