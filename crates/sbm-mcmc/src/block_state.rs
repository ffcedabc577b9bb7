use std::collections::{BTreeMap, BTreeSet};
use std::f64::consts::LN_2;

use log::warn;
use rayon::prelude::*;
use sbm_core::errors::{ErrorInfo, SbmError};
use sbm_core::rng::RngHandle;
use sbm_core::{Block, GraphView, Vertex, NULL_GROUP};
use serde::{Deserialize, Serialize};

use crate::degs::DegreeSequence;
use crate::numeric::{ln_factorial, safelog};
use crate::partition::{DegreeDlKind, PartitionStats};
use crate::proposal::MoveProposer;

/// Candidate lists at least this long are evaluated on the rayon pool.
pub const PARALLEL_CANDIDATES: usize = 64;

/// Which description-length terms are counted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EntropyArgs {
    /// Microcanonical likelihood of the edges given the block edge counts.
    #[serde(default = "default_true")]
    pub adjacency: bool,
    /// Partition prior.
    #[serde(default = "default_true")]
    pub partition_dl: bool,
    /// Prior on the block edge counts.
    #[serde(default = "default_true")]
    pub edges_dl: bool,
    /// Degree prior, only used by degree-corrected states.
    #[serde(default = "default_true")]
    pub degree_dl: bool,
    /// Kind of degree prior.
    #[serde(default)]
    pub degree_dl_kind: DegreeDlKind,
    /// Include the edge multiplicity constant.
    #[serde(default = "default_true")]
    pub multigraph: bool,
}

fn default_true() -> bool {
    true
}

impl Default for EntropyArgs {
    fn default() -> Self {
        Self {
            adjacency: true,
            partition_dl: true,
            edges_dl: true,
            degree_dl: true,
            degree_dl_kind: DegreeDlKind::default(),
            multigraph: true,
        }
    }
}

/// Description length split by term. Disabled terms are reported as zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EntropyBreakdown {
    /// Adjacency likelihood term.
    pub adjacency: f64,
    /// Partition prior.
    pub partition: f64,
    /// Edge-count prior.
    pub edges: f64,
    /// Degree prior.
    pub degrees: f64,
    /// Sum of the above.
    pub total: f64,
}

/// Block assignment of a graph together with every aggregate needed to
/// price single-vertex moves.
///
/// The state keeps the block edge-count matrix, per-block degree totals and
/// weights, the [`PartitionStats`] and an ordered freelist of empty labels.
/// Labels are dense indices; a move to a label past the current range grows
/// the per-block vectors.
#[derive(Debug, Clone)]
pub struct BlockState<G: GraphView> {
    graph: G,
    degs: DegreeSequence,
    deg_corr: bool,
    args: EntropyArgs,
    proposer: MoveProposer,
    b: Vec<Block>,
    mrs: BTreeMap<(Block, Block), u64>,
    mrp: Vec<u64>,
    mrm: Vec<u64>,
    wr: Vec<u64>,
    members: Vec<usize>,
    occupied: Vec<Block>,
    occupied_pos: Vec<usize>,
    empty: BTreeSet<Block>,
    stats: PartitionStats,
    graph_constant: f64,
}

impl<G: GraphView> BlockState<G> {
    /// Builds the state of assignment `b` with degrees read from the graph.
    pub fn new(
        graph: G,
        b: Vec<Block>,
        deg_corr: bool,
        args: EntropyArgs,
    ) -> Result<Self, SbmError> {
        Self::with_degrees(graph, b, DegreeSequence::Live, deg_corr, args)
    }

    /// Builds the state with an explicit degree sequence.
    pub fn with_degrees(
        graph: G,
        b: Vec<Block>,
        degs: DegreeSequence,
        deg_corr: bool,
        args: EntropyArgs,
    ) -> Result<Self, SbmError> {
        let n = graph.num_vertices();
        if b.len() != n {
            return Err(SbmError::Partition(
                ErrorInfo::new("length-mismatch", "partition length differs from vertex count")
                    .with_context("expected", n.to_string())
                    .with_context("found", b.len().to_string()),
            ));
        }
        if let Some(v) = b.iter().position(|&r| r == NULL_GROUP || r > n) {
            return Err(SbmError::Partition(
                ErrorInfo::new("label-out-of-range", "block label exceeds the vertex count")
                    .with_context("vertex", v.to_string())
                    .with_context("label", b[v].to_string())
                    .with_hint("relabel the partition with continuous_map"),
            ));
        }
        if let DegreeSequence::Precomputed(tuples) = &degs {
            if tuples.len() != n {
                return Err(SbmError::Partition(
                    ErrorInfo::new("degree-length", "degree tuple count differs from vertex count")
                        .with_context("expected", n.to_string())
                        .with_context("found", tuples.len().to_string()),
                ));
            }
        }

        let stats = PartitionStats::new(&graph, &b, &degs, deg_corr);
        let mut state = Self {
            graph,
            degs,
            deg_corr,
            args,
            proposer: MoveProposer::default(),
            b: Vec::new(),
            mrs: BTreeMap::new(),
            mrp: Vec::new(),
            mrm: Vec::new(),
            wr: Vec::new(),
            members: Vec::new(),
            occupied: Vec::new(),
            occupied_pos: Vec::new(),
            empty: BTreeSet::new(),
            stats,
            graph_constant: 0.0,
        };
        let labels = b.iter().max().map_or(0, |&r| r + 1);
        state.grow_labels(labels);
        state.b = b;
        state.graph_constant = state.compute_graph_constant();

        for v in 0..n {
            let r = state.b[v];
            let (kin, kout) = state.vertex_degrees(v);
            state.mrp[r] += kout;
            state.mrm[r] += kin;
            state.wr[r] += state.graph.vertex_weight(v);
            if state.members[r] == 0 {
                state.occupy(r);
            }
            state.members[r] += 1;
        }
        for edge in 0..state.graph.num_edges() {
            let (s, t) = state.graph.endpoints(edge);
            let key = state.key(state.b[s], state.b[t]);
            *state.mrs.entry(key).or_insert(0) += state.graph.edge_weight(edge);
        }
        Ok(state)
    }

    /// Replaces the move proposer.
    pub fn with_proposer(mut self, proposer: MoveProposer) -> Self {
        self.proposer = proposer;
        self
    }

    /// Current move proposer.
    pub fn proposer(&self) -> &MoveProposer {
        &self.proposer
    }

    /// Underlying graph.
    pub fn graph(&self) -> &G {
        &self.graph
    }

    /// Degree sequence used for the degree statistics.
    pub fn degree_sequence(&self) -> &DegreeSequence {
        &self.degs
    }

    /// Whether the state is degree corrected.
    pub fn degree_corrected(&self) -> bool {
        self.deg_corr
    }

    /// Counted description-length terms.
    pub fn entropy_args(&self) -> &EntropyArgs {
        &self.args
    }

    /// Kind of degree prior.
    pub fn deg_dl_kind(&self) -> DegreeDlKind {
        self.args.degree_dl_kind
    }

    /// Partition statistics.
    pub fn stats(&self) -> &PartitionStats {
        &self.stats
    }

    /// Block assignment, indexed by vertex.
    pub fn assignment(&self) -> &[Block] {
        &self.b
    }

    /// Block of vertex `v`.
    #[inline]
    pub fn block_of(&self, v: Vertex) -> Block {
        self.b[v]
    }

    /// Number of labels holding at least one vertex.
    ///
    /// Zero-weight vertices count here, so a block holding only such vertices
    /// is occupied for the proposer and Gibbs caps while
    /// [`PartitionStats::actual_b`] (which prices the edge term) ignores it.
    pub fn num_blocks(&self) -> usize {
        self.occupied.len()
    }

    /// Occupied block labels, in no particular order.
    pub fn occupied_blocks(&self) -> &[Block] {
        &self.occupied
    }

    /// Empty labels below the current label range, in ascending order.
    pub fn empty_blocks(&self) -> &BTreeSet<Block> {
        &self.empty
    }

    /// Size of the label range.
    pub fn num_labels(&self) -> usize {
        self.members.len()
    }

    /// Number of vertices in block `r`.
    #[inline]
    pub fn block_size(&self, r: Block) -> usize {
        self.members.get(r).copied().unwrap_or(0)
    }

    /// Summed vertex weight of block `r`.
    pub fn block_weight(&self, r: Block) -> u64 {
        self.wr.get(r).copied().unwrap_or(0)
    }

    /// Vertices currently in block `r`.
    pub fn block_members(&self, r: Block) -> Vec<Vertex> {
        self.graph.vertices().filter(|&v| self.b[v] == r).collect()
    }

    /// Label a move into a brand-new block should use: the smallest empty
    /// label, or the next label past the range.
    pub fn new_block_label(&self) -> Block {
        self.empty
            .first()
            .copied()
            .unwrap_or(self.members.len())
    }

    /// Number of edges (with multiplicity) between blocks `r` and `s`.
    pub fn edge_count(&self, r: Block, s: Block) -> u64 {
        self.mrs.get(&self.key(r, s)).copied().unwrap_or(0)
    }

    /// Non-zero block edge counts. Undirected pairs are keyed `(min, max)`.
    pub fn edge_counts(&self) -> BTreeMap<(Block, Block), u64> {
        self.mrs.clone()
    }

    /// Summed weight of the incidences of `v` used for neighbour proposals.
    pub fn neighbor_weight(&self, v: Vertex) -> u64 {
        self.incidences(v).map(|(_, w)| w).sum()
    }

    /// Neighbours of `v` with edge weights: out-incidences followed by
    /// in-incidences when directed.
    pub fn incidences(&self, v: Vertex) -> impl Iterator<Item = (Vertex, u64)> + '_ {
        let incoming = if self.graph.is_directed() {
            self.graph.in_edges(v)
        } else {
            &[]
        };
        self.graph
            .out_edges(v)
            .iter()
            .chain(incoming.iter())
            .map(move |inc| (inc.neighbor, self.graph.edge_weight(inc.edge)))
    }

    /// Proposes a target block for `v` with the configured proposer.
    pub fn propose_move(&self, v: Vertex, rng: &mut RngHandle) -> Block {
        self.proposer.propose(self, v, rng)
    }

    #[inline]
    fn key(&self, r: Block, s: Block) -> (Block, Block) {
        if self.graph.is_directed() || r <= s {
            (r, s)
        } else {
            (s, r)
        }
    }

    fn vertex_degrees(&self, v: Vertex) -> (u64, u64) {
        (self.graph.in_degree(v), self.graph.out_degree(v))
    }

    fn grow_labels(&mut self, len: usize) {
        while self.members.len() < len {
            let label = self.members.len();
            self.mrp.push(0);
            self.mrm.push(0);
            self.wr.push(0);
            self.members.push(0);
            self.occupied_pos.push(usize::MAX);
            self.empty.insert(label);
        }
        while self.stats.total_b() < len {
            self.stats.add_block();
        }
    }

    fn occupy(&mut self, r: Block) {
        self.empty.remove(&r);
        self.occupied_pos[r] = self.occupied.len();
        self.occupied.push(r);
    }

    fn vacate(&mut self, r: Block) {
        let pos = self.occupied_pos[r];
        self.occupied.swap_remove(pos);
        if let Some(&moved) = self.occupied.get(pos) {
            self.occupied_pos[moved] = pos;
        }
        self.occupied_pos[r] = usize::MAX;
        self.empty.insert(r);
    }

    fn compute_graph_constant(&self) -> f64 {
        let mut s = 0.0;
        if self.args.multigraph {
            for edge in 0..self.graph.num_edges() {
                let w = self.graph.edge_weight(edge);
                s += ln_factorial(w);
                let (a, b) = self.graph.endpoints(edge);
                if !self.graph.is_directed() && a == b {
                    s += w as f64 * LN_2;
                }
            }
        }
        if self.deg_corr {
            for v in self.graph.vertices() {
                self.degs.for_each(&self.graph, v, |kin, kout, n| {
                    s -= n as f64 * (ln_factorial(kin) + ln_factorial(kout));
                });
            }
        }
        s
    }

    #[inline]
    fn eterm(&self, r: Block, s: Block, m: u64) -> f64 {
        let mut value = -ln_factorial(m);
        if !self.graph.is_directed() && r == s {
            value -= m as f64 * LN_2;
        }
        value
    }

    #[inline]
    fn vterm(&self, mrp: u64, mrm: u64, wr: u64) -> f64 {
        let directed = self.graph.is_directed();
        if self.deg_corr {
            let mut value = ln_factorial(mrp);
            if directed {
                value += ln_factorial(mrm);
            }
            value
        } else if directed {
            (mrp + mrm) as f64 * safelog(wr)
        } else {
            mrp as f64 * safelog(wr)
        }
    }

    fn block_aggregates(&self, r: Block) -> (u64, u64, u64) {
        (
            self.mrp.get(r).copied().unwrap_or(0),
            self.mrm.get(r).copied().unwrap_or(0),
            self.wr.get(r).copied().unwrap_or(0),
        )
    }

    /// Block edge-count changes caused by moving `v` from `r` to `nr`.
    fn edge_changes(&self, v: Vertex, r: Block, nr: Block) -> Vec<((Block, Block), i64)> {
        let mut changes = Vec::with_capacity(2 * self.graph.out_edges(v).len() + 2);
        for inc in self.graph.out_edges(v) {
            let w = self.graph.edge_weight(inc.edge) as i64;
            if inc.neighbor == v {
                changes.push((self.key(r, r), -w));
                changes.push((self.key(nr, nr), w));
            } else {
                let t = self.b[inc.neighbor];
                changes.push((self.key(r, t), -w));
                changes.push((self.key(nr, t), w));
            }
        }
        if self.graph.is_directed() {
            for inc in self.graph.in_edges(v) {
                if inc.neighbor == v {
                    continue;
                }
                let w = self.graph.edge_weight(inc.edge) as i64;
                let s = self.b[inc.neighbor];
                changes.push(((s, r), -w));
                changes.push(((s, nr), w));
            }
        }
        changes.sort_unstable_by_key(|&(key, _)| key);
        let mut merged: Vec<((Block, Block), i64)> = Vec::with_capacity(changes.len());
        for (key, d) in changes {
            match merged.last_mut() {
                Some((last, acc)) if *last == key => *acc += d,
                _ => merged.push((key, d)),
            }
        }
        merged.retain(|&(_, d)| d != 0);
        merged
    }

    fn delta_adjacency(&self, v: Vertex, r: Block, nr: Block) -> f64 {
        let mut ds = 0.0;
        for ((s, t), d) in self.edge_changes(v, r, nr) {
            let m = self.mrs.get(&(s, t)).copied().unwrap_or(0);
            debug_assert!(m as i64 + d >= 0);
            ds += self.eterm(s, t, (m as i64 + d) as u64) - self.eterm(s, t, m);
        }
        let (kin, kout) = self.vertex_degrees(v);
        let w = self.graph.vertex_weight(v);
        let (p, m, n) = self.block_aggregates(r);
        ds += self.vterm(p - kout, m - kin, n - w) - self.vterm(p, m, n);
        let (p, m, n) = self.block_aggregates(nr);
        ds += self.vterm(p + kout, m + kin, n + w) - self.vterm(p, m, n);
        ds
    }

    /// Adjacency likelihood term, including the graph constant.
    pub fn adjacency_dl(&self) -> f64 {
        let mut s = self.graph_constant;
        for (&(r, t), &m) in &self.mrs {
            s += self.eterm(r, t, m);
        }
        for r in 0..self.members.len() {
            s += self.vterm(self.mrp[r], self.mrm[r], self.wr[r]);
        }
        s
    }

    /// Every enabled term of the description length.
    pub fn entropy_breakdown(&self) -> EntropyBreakdown {
        let adjacency = if self.args.adjacency {
            self.adjacency_dl()
        } else {
            0.0
        };
        let partition = if self.args.partition_dl {
            self.stats.partition_dl()
        } else {
            0.0
        };
        let edges = if self.args.edges_dl {
            self.stats.edges_dl(self.stats.actual_b())
        } else {
            0.0
        };
        let degrees = if self.deg_corr && self.args.degree_dl {
            self.stats.deg_dl(self.args.degree_dl_kind)
        } else {
            0.0
        };
        let total = adjacency + partition + edges + degrees;
        if !total.is_finite() {
            warn!(
                "non-finite description length (degree kind {:?})",
                self.args.degree_dl_kind
            );
        }
        EntropyBreakdown {
            adjacency,
            partition,
            edges,
            degrees,
            total,
        }
    }

    /// Total description length of the current assignment.
    pub fn total_dl(&self) -> f64 {
        self.entropy_breakdown().total
    }

    /// Change of [`total_dl`](Self::total_dl) if `v` moved to `nr`, without
    /// committing the move.
    pub fn virtual_move_dl(&self, v: Vertex, nr: Block) -> f64 {
        let r = self.b[v];
        if r == nr {
            return 0.0;
        }
        let mut ds = 0.0;
        if self.args.adjacency {
            ds += self.delta_adjacency(v, r, nr);
        }
        if self.args.partition_dl {
            ds += self.stats.delta_partition_dl(&self.graph, v, r, nr);
        }
        if self.args.edges_dl {
            ds += self
                .stats
                .delta_edges_dl(&self.graph, v, r, nr, self.stats.actual_b());
        }
        if self.deg_corr && self.args.degree_dl {
            ds += self.stats.delta_deg_dl(
                &self.graph,
                &self.degs,
                v,
                r,
                nr,
                self.args.degree_dl_kind,
            );
        }
        ds
    }

    /// [`virtual_move_dl`](Self::virtual_move_dl) for every candidate block.
    pub fn virtual_moves(&self, v: Vertex, candidates: &[Block]) -> Vec<f64> {
        if candidates.len() >= PARALLEL_CANDIDATES {
            candidates
                .par_iter()
                .map(|&nr| self.virtual_move_dl(v, nr))
                .collect()
        } else {
            candidates
                .iter()
                .map(|&nr| self.virtual_move_dl(v, nr))
                .collect()
        }
    }

    /// Moves `v` into block `nr` and updates every aggregate.
    pub fn move_vertex(&mut self, v: Vertex, nr: Block) {
        debug_assert!(nr != NULL_GROUP);
        let r = self.b[v];
        if r == nr {
            return;
        }
        self.grow_labels(nr + 1);

        for (key, d) in self.edge_changes(v, r, nr) {
            let entry = self.mrs.entry(key).or_insert(0);
            *entry = (*entry as i64 + d) as u64;
            if *entry == 0 {
                self.mrs.remove(&key);
            }
        }
        let (kin, kout) = self.vertex_degrees(v);
        let w = self.graph.vertex_weight(v);
        self.mrp[r] -= kout;
        self.mrm[r] -= kin;
        self.wr[r] -= w;
        self.mrp[nr] += kout;
        self.mrm[nr] += kin;
        self.wr[nr] += w;

        self.stats.remove_vertex(&self.graph, &self.degs, v, r);
        self.stats.add_vertex(&self.graph, &self.degs, v, nr);
        self.b[v] = nr;

        self.members[r] -= 1;
        if self.members[r] == 0 {
            self.vacate(r);
        }
        if self.members[nr] == 0 {
            self.occupy(nr);
        }
        self.members[nr] += 1;
    }

    /// Moves every member of `s` into `r`.
    pub fn merge_blocks(&mut self, s: Block, r: Block) {
        for v in self.block_members(s) {
            self.move_vertex(v, r);
        }
    }

    /// Rebuilds the state from scratch with the current assignment.
    pub fn rebuilt(&self) -> Result<Self, SbmError>
    where
        G: Clone,
    {
        Ok(Self::with_degrees(
            self.graph.clone(),
            self.b.clone(),
            self.degs.clone(),
            self.deg_corr,
            self.args,
        )?
        .with_proposer(self.proposer))
    }

    /// Checks the cached aggregates against a from-scratch recount.
    pub fn check_consistency(&self) -> bool
    where
        G: Clone,
    {
        let Ok(fresh) = self.rebuilt() else {
            return false;
        };
        let mut agg_ok = true;
        for r in 0..self.members.len().max(fresh.members.len()) {
            agg_ok &= self.block_aggregates(r) == fresh.block_aggregates(r)
                && self.block_size(r) == fresh.block_size(r);
        }
        agg_ok
            && self.edge_counts() == fresh.edge_counts()
            && self.stats.snapshot() == fresh.stats.snapshot()
            && self.stats.check_degs(&self.graph, &self.b, &self.degs)
            && self.num_blocks() == fresh.num_blocks()
    }
}
