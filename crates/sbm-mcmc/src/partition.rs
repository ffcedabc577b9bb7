use std::collections::BTreeMap;

use sbm_core::{Block, GraphView, Vertex, NULL_GROUP};
use serde::{Deserialize, Serialize};

use crate::block_map::BlockMap;
use crate::degs::DegreeSequence;
use crate::int_part::log_q;
use crate::numeric::{lbinom, ln_factorial, safelog, xlogx};

/// Prior used for the degree sequence inside each block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DegreeDlKind {
    /// Empirical entropy of the degree histogram.
    Ent,
    /// Uniform prior over degree sequences with the block's edge total.
    Uniform,
    /// Hierarchical prior over the degree distribution.
    #[default]
    Dist,
    /// Any other numeric code. Description lengths evaluate to NaN.
    Unsupported(i32),
}

impl DegreeDlKind {
    /// Maps a numeric kind code (`0` ent, `1` uniform, `2` dist).
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => DegreeDlKind::Ent,
            1 => DegreeDlKind::Uniform,
            2 => DegreeDlKind::Dist,
            other => DegreeDlKind::Unsupported(other),
        }
    }

    /// Numeric code of the kind.
    pub fn code(self) -> i32 {
        match self {
            DegreeDlKind::Ent => 0,
            DegreeDlKind::Uniform => 1,
            DegreeDlKind::Dist => 2,
            DegreeDlKind::Unsupported(code) => code,
        }
    }
}

/// Aggregates of one occupied block, keyed by external label in
/// [`StatsSnapshot`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockStats {
    /// Occupied weight.
    pub total: u64,
    /// Summed out-degree.
    pub ep: u64,
    /// Summed in-degree.
    pub em: u64,
    /// `(kin, kout) -> count` histogram.
    pub hist: BTreeMap<(u64, u64), u64>,
}

/// Label-independent view of a [`PartitionStats`], used to compare
/// incrementally maintained statistics with a fresh rebuild.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Occupied weight.
    pub n: u64,
    /// Edge total.
    pub e: u64,
    /// Number of non-empty blocks.
    pub actual_b: usize,
    /// Non-empty blocks.
    pub blocks: BTreeMap<Block, BlockStats>,
}

/// Incrementally maintained partition statistics.
///
/// Holds, per block, the occupied weight, the summed in/out degrees and the
/// histogram of degree pairs, plus the global counts `N`, `E`, the number of
/// non-empty blocks and the nominal block count. Delta queries take `&self`
/// and only read the two blocks touched by a hypothetical move; mutation goes
/// through paired [`remove_vertex`](Self::remove_vertex) /
/// [`add_vertex`](Self::add_vertex) calls.
#[derive(Debug, Clone)]
pub struct PartitionStats {
    bmap: BlockMap,
    directed: bool,
    track_degrees: bool,
    n: u64,
    e: u64,
    actual_b: usize,
    total_b: usize,
    total: Vec<u64>,
    ep: Vec<u64>,
    em: Vec<u64>,
    hist: Vec<BTreeMap<(u64, u64), u64>>,
}

#[inline]
fn lf(x: i64) -> f64 {
    debug_assert!(x >= 0, "negative count {x}");
    ln_factorial(x.max(0) as u64)
}

impl PartitionStats {
    /// Builds the statistics of assignment `b` from scratch.
    ///
    /// Zero-weight vertices and vertices in [`NULL_GROUP`] are skipped. Degree
    /// histograms are only kept when `track_degrees` is set.
    pub fn new<G: GraphView>(
        graph: &G,
        b: &[Block],
        degs: &DegreeSequence,
        track_degrees: bool,
    ) -> Self {
        let total_b = b
            .iter()
            .filter(|&&r| r != NULL_GROUP)
            .max()
            .map_or(0, |&r| r + 1);
        let mut stats = Self {
            bmap: BlockMap::new(),
            directed: graph.is_directed(),
            track_degrees,
            n: 0,
            e: graph.total_edge_weight(),
            actual_b: 0,
            total_b,
            total: Vec::new(),
            ep: Vec::new(),
            em: Vec::new(),
            hist: Vec::new(),
        };
        for v in graph.vertices() {
            stats.add_vertex(graph, degs, v, b[v]);
        }
        stats
    }

    fn dense(&self, r: Block) -> Option<usize> {
        self.bmap.lookup(r)
    }

    fn slot(&mut self, r: Block) -> usize {
        let dense = self.bmap.get_or_insert(r);
        if dense >= self.total.len() {
            self.total.resize(dense + 1, 0);
            self.ep.resize(dense + 1, 0);
            self.em.resize(dense + 1, 0);
            self.hist.resize_with(dense + 1, BTreeMap::new);
        }
        dense
    }

    fn count_of(&self, r: Block) -> i64 {
        self.dense(r).map_or(0, |d| self.total[d] as i64)
    }

    fn hist_count(&self, dense: Option<usize>, key: (u64, u64)) -> i64 {
        dense
            .and_then(|d| self.hist[d].get(&key))
            .map_or(0, |&c| c as i64)
    }

    /// Occupied weight `N`.
    pub fn n(&self) -> u64 {
        self.n
    }

    /// Edge total `E`.
    pub fn e(&self) -> u64 {
        self.e
    }

    /// Number of non-empty blocks.
    pub fn actual_b(&self) -> usize {
        self.actual_b
    }

    /// Nominal block count, grown by [`add_block`](Self::add_block).
    pub fn total_b(&self) -> usize {
        self.total_b
    }

    /// Occupied weight of block `r`.
    pub fn block_total(&self, r: Block) -> u64 {
        self.dense(r).map_or(0, |d| self.total[d])
    }

    /// Summed `(in, out)` degree of block `r`.
    pub fn block_degrees(&self, r: Block) -> (u64, u64) {
        self.dense(r).map_or((0, 0), |d| (self.em[d], self.ep[d]))
    }

    /// Number of members of `r` with degree pair `(kin, kout)`.
    pub fn degree_count(&self, r: Block, kin: u64, kout: u64) -> u64 {
        self.hist_count(self.dense(r), (kin, kout)) as u64
    }

    /// Adjusts the edge total.
    pub fn change_e(&mut self, de: i64) {
        debug_assert!(self.e as i64 + de >= 0);
        self.e = (self.e as i64 + de).max(0) as u64;
    }

    /// Increments the nominal block count.
    pub fn add_block(&mut self) {
        self.total_b += 1;
    }

    /// Partition description length:
    /// `lbinom(N-1, B-1) + ln N! - Σ_r ln n_r! + ln N`.
    pub fn partition_dl(&self) -> f64 {
        let n = self.n as i64;
        let mut s = lbinom(n - 1, self.actual_b as i64 - 1);
        s += lf(n);
        for &nr in &self.total {
            s -= lf(nr as i64);
        }
        s + safelog(self.n)
    }

    /// Edge-count description length for `b` blocks.
    pub fn edges_dl(&self, b: usize) -> f64 {
        let b = b as i64;
        let bb = if self.directed { b * b } else { b * (b + 1) / 2 };
        let e = self.e as i64;
        lbinom(bb + e - 1, e)
    }

    /// Degree description length summed over all blocks.
    ///
    /// Zero when degrees are not tracked; unsupported kinds yield NaN.
    pub fn deg_dl(&self, kind: DegreeDlKind) -> f64 {
        if let DegreeDlKind::Unsupported(_) = kind {
            return f64::NAN;
        }
        if !self.track_degrees {
            return 0.0;
        }
        let mut s = 0.0;
        for d in 0..self.total.len() {
            let total = self.total[d] as i64;
            let (ep, em) = (self.ep[d] as i64, self.em[d] as i64);
            match kind {
                DegreeDlKind::Ent => {
                    for &count in self.hist[d].values() {
                        s -= xlogx(count);
                    }
                    s += xlogx(self.total[d]);
                }
                DegreeDlKind::Uniform => {
                    s += lbinom(total + ep - 1, ep);
                    s += lbinom(total + em - 1, em);
                }
                DegreeDlKind::Dist => {
                    s += log_q(ep, total);
                    s += log_q(em, total);
                    for &count in self.hist[d].values() {
                        s -= lf(count as i64);
                    }
                    s += lf(total);
                }
                DegreeDlKind::Unsupported(_) => return f64::NAN,
            }
        }
        s
    }

    /// Change of [`partition_dl`](Self::partition_dl) if `v` moved from `r`
    /// to `nr`. Either side may be [`NULL_GROUP`].
    pub fn delta_partition_dl<G: GraphView>(
        &self,
        graph: &G,
        v: Vertex,
        r: Block,
        nr: Block,
    ) -> f64 {
        if r == nr {
            return 0.0;
        }
        let mut n = graph.vertex_weight(v) as i64;
        if n == 0 {
            if r == NULL_GROUP {
                n = 1;
            } else {
                return 0.0;
            }
        }

        let (mut s_b, mut s_a) = (0.0, 0.0);
        if r != NULL_GROUP {
            let tr = self.count_of(r);
            s_b -= lf(tr);
            s_a -= lf(tr - n);
        }
        if nr != NULL_GROUP {
            let tnr = self.count_of(nr);
            s_b -= lf(tnr);
            s_a -= lf(tnr + n);
        }

        let mut dn = 0;
        if r == NULL_GROUP {
            dn += n;
        }
        if nr == NULL_GROUP {
            dn -= n;
        }
        let big_n = self.n as i64;
        s_b += lf(big_n);
        s_a += lf(big_n + dn);

        let db = self.delta_b(r, nr, n);
        let b = self.actual_b as i64;
        if dn != 0 || db != 0 {
            s_b += lbinom(big_n - 1, b - 1);
            s_a += lbinom(big_n - 1 + dn, b + db - 1);
        }
        if dn != 0 {
            s_b += safelog(self.n);
            s_a += safelog((big_n + dn).max(0) as u64);
        }
        s_a - s_b
    }

    fn delta_b(&self, r: Block, nr: Block, n: i64) -> i64 {
        let mut db = 0;
        if r != NULL_GROUP && self.count_of(r) == n {
            db -= 1;
        }
        if nr != NULL_GROUP && self.count_of(nr) == 0 {
            db += 1;
        }
        db
    }

    /// Change of [`edges_dl`](Self::edges_dl) if `v` moved from `r` to `nr`,
    /// given `actual_b` occupied blocks before the move.
    pub fn delta_edges_dl<G: GraphView>(
        &self,
        graph: &G,
        v: Vertex,
        r: Block,
        nr: Block,
        actual_b: usize,
    ) -> f64 {
        if r == nr {
            return 0.0;
        }
        let mut n = graph.vertex_weight(v) as i64;
        if n == 0 {
            if r == NULL_GROUP {
                n = 1;
            } else {
                return 0.0;
            }
        }
        let db = self.delta_b(r, nr, n);
        if db == 0 {
            return 0.0;
        }
        let after = (actual_b as i64 + db).max(0) as usize;
        self.edges_dl(after) - self.edges_dl(actual_b)
    }

    /// Change of [`deg_dl`](Self::deg_dl) if `v` moved from `r` to `nr`.
    ///
    /// Zero-weight vertices, `r == nr` and untracked degrees cost nothing.
    /// Unsupported kinds yield NaN.
    pub fn delta_deg_dl<G: GraphView>(
        &self,
        graph: &G,
        degs: &DegreeSequence,
        v: Vertex,
        r: Block,
        nr: Block,
        kind: DegreeDlKind,
    ) -> f64 {
        if r == nr || graph.vertex_weight(v) == 0 {
            return 0.0;
        }
        if let DegreeDlKind::Unsupported(_) = kind {
            return f64::NAN;
        }
        if !self.track_degrees {
            return 0.0;
        }
        let mut ds = 0.0;
        for (block, diff) in [(r, -1i64), (nr, 1i64)] {
            if block == NULL_GROUP {
                continue;
            }
            ds += match kind {
                DegreeDlKind::Ent => self.ent_change(graph, degs, v, block, diff),
                DegreeDlKind::Uniform => self.uniform_change(graph, degs, v, block, diff),
                _ => self.dist_change(graph, degs, v, block, diff),
            };
        }
        ds
    }

    fn ent_change<G: GraphView>(
        &self,
        graph: &G,
        degs: &DegreeSequence,
        v: Vertex,
        r: Block,
        diff: i64,
    ) -> f64 {
        let dense = self.dense(r);
        let nr = self.count_of(r);
        let (mut s_b, mut s_a) = (0.0, 0.0);
        let mut dn = 0i64;
        degs.for_each(graph, v, |kin, kout, nk| {
            let delta = diff * nk as i64;
            dn += delta;
            let nd = self.hist_count(dense, (kin, kout));
            debug_assert!(nd + delta >= 0);
            s_b -= xlogx(nd as u64);
            s_a -= xlogx((nd + delta).max(0) as u64);
        });
        s_b += xlogx(nr as u64);
        s_a += xlogx((nr + dn).max(0) as u64);
        s_a - s_b
    }

    fn degree_sums<G: GraphView>(
        graph: &G,
        degs: &DegreeSequence,
        v: Vertex,
    ) -> (i64, i64, i64) {
        let (mut tkin, mut tkout, mut n) = (0i64, 0i64, 0i64);
        degs.for_each(graph, v, |kin, kout, nk| {
            tkin += (kin * nk) as i64;
            tkout += (kout * nk) as i64;
            n += nk as i64;
        });
        (tkin, tkout, n)
    }

    fn uniform_change<G: GraphView>(
        &self,
        graph: &G,
        degs: &DegreeSequence,
        v: Vertex,
        r: Block,
        diff: i64,
    ) -> f64 {
        let total = self.count_of(r);
        let (em, ep) = self.block_degrees(r);
        let (em, ep) = (em as i64, ep as i64);
        let se = |dn: i64, dkin: i64, dkout: i64| {
            lbinom(total + dn + ep - 1 + dkout, ep + dkout)
                + lbinom(total + dn + em - 1 + dkin, em + dkin)
        };
        let (tkin, tkout, n) = Self::degree_sums(graph, degs, v);
        se(diff * n, diff * tkin, diff * tkout) - se(0, 0, 0)
    }

    fn dist_change<G: GraphView>(
        &self,
        graph: &G,
        degs: &DegreeSequence,
        v: Vertex,
        r: Block,
        diff: i64,
    ) -> f64 {
        let dense = self.dense(r);
        let total = self.count_of(r);
        let (em, ep) = self.block_degrees(r);
        let (em, ep) = (em as i64, ep as i64);
        let se = |delta: i64, kin: i64, kout: i64| {
            debug_assert!(total + delta >= 0 && em + kin >= 0 && ep + kout >= 0);
            log_q(em + kin, total + delta) + log_q(ep + kout, total + delta)
        };

        let (mut s_b, mut s_a) = (0.0, 0.0);
        let (mut tkin, mut tkout, mut n) = (0i64, 0i64, 0i64);
        degs.for_each(graph, v, |kin, kout, nk| {
            tkin += (kin * nk) as i64;
            tkout += (kout * nk) as i64;
            n += nk as i64;
            let nd = self.hist_count(dense, (kin, kout));
            s_b -= lf(nd);
            s_a -= lf(nd + diff * nk as i64);
        });
        s_b += se(0, 0, 0);
        s_a += se(diff * n, diff * tkin, diff * tkout);
        s_b += lf(total);
        s_a += lf(total + diff * n);
        s_a - s_b
    }

    fn change_vertex(&mut self, dense: usize, weight: u64, diff: i64) {
        let dv = weight as i64 * diff;
        if self.total[dense] == 0 && dv > 0 {
            self.actual_b += 1;
        }
        if self.total[dense] == weight && dv < 0 {
            self.actual_b -= 1;
        }
        debug_assert!(self.total[dense] as i64 + dv >= 0);
        self.total[dense] = (self.total[dense] as i64 + dv) as u64;
        self.n = (self.n as i64 + dv) as u64;
    }

    fn change_vertex_degs<G: GraphView>(
        &mut self,
        graph: &G,
        degs: &DegreeSequence,
        v: Vertex,
        dense: usize,
        diff: i64,
    ) {
        let hist = &mut self.hist[dense];
        let ep = &mut self.ep[dense];
        let em = &mut self.em[dense];
        degs.for_each(graph, v, |kin, kout, nk| {
            let dk = diff * nk as i64;
            let entry = hist.entry((kin, kout)).or_insert(0);
            *entry = (*entry as i64 + dk) as u64;
            if *entry == 0 {
                hist.remove(&(kin, kout));
            }
            *em = (*em as i64 + dk * kin as i64) as u64;
            *ep = (*ep as i64 + dk * kout as i64) as u64;
        });
    }

    /// Removes `v` from block `r`.
    pub fn remove_vertex<G: GraphView>(
        &mut self,
        graph: &G,
        degs: &DegreeSequence,
        v: Vertex,
        r: Block,
    ) {
        let weight = graph.vertex_weight(v);
        if r == NULL_GROUP || weight == 0 {
            return;
        }
        let dense = self.slot(r);
        self.change_vertex(dense, weight, -1);
        if self.track_degrees {
            self.change_vertex_degs(graph, degs, v, dense, -1);
        }
        if self.total[dense] == 0 {
            debug_assert!(self.hist[dense].is_empty());
            self.hist[dense].clear();
            self.ep[dense] = 0;
            self.em[dense] = 0;
            self.bmap.release(r);
        }
    }

    /// Adds `v` to block `nr`.
    pub fn add_vertex<G: GraphView>(
        &mut self,
        graph: &G,
        degs: &DegreeSequence,
        v: Vertex,
        nr: Block,
    ) {
        let weight = graph.vertex_weight(v);
        if nr == NULL_GROUP || weight == 0 {
            return;
        }
        let dense = self.slot(nr);
        self.change_vertex(dense, weight, 1);
        if self.track_degrees {
            self.change_vertex_degs(graph, degs, v, dense, 1);
        }
    }

    /// Recounts the degree histograms of assignment `b` and compares them
    /// with the maintained ones.
    pub fn check_degs<G: GraphView>(&self, graph: &G, b: &[Block], degs: &DegreeSequence) -> bool {
        if !self.track_degrees {
            return true;
        }
        let mut recount: BTreeMap<Block, BTreeMap<(u64, u64), u64>> = BTreeMap::new();
        for v in graph.vertices() {
            if b[v] == NULL_GROUP || graph.vertex_weight(v) == 0 {
                continue;
            }
            let hist = recount.entry(b[v]).or_default();
            degs.for_each(graph, v, |kin, kout, n| {
                *hist.entry((kin, kout)).or_insert(0) += n;
            });
        }
        for hist in recount.values_mut() {
            hist.retain(|_, n| *n > 0);
        }
        recount.retain(|_, hist| !hist.is_empty());
        let stored: BTreeMap<Block, BTreeMap<(u64, u64), u64>> = self
            .snapshot()
            .blocks
            .into_iter()
            .map(|(r, block)| (r, block.hist))
            .filter(|(_, hist)| !hist.is_empty())
            .collect();
        recount == stored
    }

    /// Label-keyed copy of every non-empty block.
    pub fn snapshot(&self) -> StatsSnapshot {
        let mut blocks = BTreeMap::new();
        for d in 0..self.total.len() {
            let Some(label) = self.bmap.label(d) else {
                continue;
            };
            if self.total[d] == 0 {
                continue;
            }
            blocks.insert(
                label,
                BlockStats {
                    total: self.total[d],
                    ep: self.ep[d],
                    em: self.em[d],
                    hist: self.hist[d].iter().map(|(&k, &c)| (k, c)).collect(),
                },
            );
        }
        StatsSnapshot {
            n: self.n,
            e: self.e,
            actual_b: self.actual_b,
            blocks,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sbm_graph::AdjacencyGraph;

    fn path_graph() -> AdjacencyGraph {
        AdjacencyGraph::from_edges(5, false, &[(0, 1), (1, 2), (2, 3), (3, 4)]).unwrap()
    }

    #[test]
    fn construction_counts_blocks() {
        let graph = path_graph();
        let stats = PartitionStats::new(&graph, &[0, 0, 1, 1, 7], &DegreeSequence::Live, true);
        assert_eq!(stats.n(), 5);
        assert_eq!(stats.e(), 4);
        assert_eq!(stats.actual_b(), 3);
        assert_eq!(stats.total_b(), 8);
        assert_eq!(stats.block_total(7), 1);
        assert_eq!(stats.block_degrees(0), (0, 3));
        assert_eq!(stats.degree_count(1, 0, 2), 2);
    }

    #[test]
    fn single_block_edges_term_vanishes() {
        let graph = path_graph();
        let stats = PartitionStats::new(&graph, &[0; 5], &DegreeSequence::Live, false);
        assert_eq!(stats.edges_dl(stats.actual_b()), 0.0);
        let expected = 5f64.ln();
        assert!((stats.partition_dl() - expected).abs() < 1e-12);
    }

    #[test]
    fn null_group_moves_do_not_touch_counts() {
        let graph = path_graph();
        let mut stats = PartitionStats::new(&graph, &[0, 0, 1, 1, 1], &DegreeSequence::Live, true);
        let before = stats.snapshot();
        stats.remove_vertex(&graph, &DegreeSequence::Live, 0, NULL_GROUP);
        stats.add_vertex(&graph, &DegreeSequence::Live, 0, NULL_GROUP);
        assert_eq!(stats.snapshot(), before);

        let removal = stats.delta_partition_dl(&graph, 4, 1, NULL_GROUP);
        let edges = stats.delta_edges_dl(&graph, 4, 1, NULL_GROUP, stats.actual_b());
        assert!(removal.is_finite());
        assert_eq!(edges, 0.0);
    }

    #[test]
    fn emptied_blocks_release_their_slot() {
        let graph = path_graph();
        let degs = DegreeSequence::Live;
        let mut stats = PartitionStats::new(&graph, &[0, 0, 1, 1, 2], &degs, true);
        stats.remove_vertex(&graph, &degs, 4, 2);
        assert_eq!(stats.actual_b(), 2);
        stats.add_vertex(&graph, &degs, 4, 9);
        assert_eq!(stats.actual_b(), 3);
        assert!(stats.check_degs(&graph, &[0, 0, 1, 1, 9], &degs));
        assert!(!stats.check_degs(&graph, &[0, 0, 1, 1, 2], &degs));
    }

    #[test]
    fn unsupported_kind_is_nan() {
        let graph = path_graph();
        let stats = PartitionStats::new(&graph, &[0, 0, 1, 1, 1], &DegreeSequence::Live, true);
        let kind = DegreeDlKind::from_code(17);
        assert_eq!(kind, DegreeDlKind::Unsupported(17));
        assert!(stats.deg_dl(kind).is_nan());
        assert!(stats
            .delta_deg_dl(&graph, &DegreeSequence::Live, 0, 0, 1, kind)
            .is_nan());
        assert_eq!(DegreeDlKind::from_code(2), DegreeDlKind::Dist);
    }

    #[test]
    fn untracked_degrees_have_no_degree_term() {
        let graph = path_graph();
        let degs = DegreeSequence::Live;
        let stats = PartitionStats::new(&graph, &[0, 0, 1, 1, 1], &degs, false);
        for kind in [DegreeDlKind::Ent, DegreeDlKind::Uniform, DegreeDlKind::Dist] {
            assert_eq!(stats.deg_dl(kind), 0.0);
            assert_eq!(stats.delta_deg_dl(&graph, &degs, 2, 1, 0, kind), 0.0);
            assert_eq!(stats.delta_deg_dl(&graph, &degs, 4, 1, 5, kind), 0.0);
        }
        assert!(stats.deg_dl(DegreeDlKind::from_code(9)).is_nan());
    }

    #[test]
    fn change_e_and_add_block() {
        let graph = path_graph();
        let mut stats = PartitionStats::new(&graph, &[0; 5], &DegreeSequence::Live, false);
        stats.change_e(3);
        assert_eq!(stats.e(), 7);
        stats.change_e(-7);
        assert_eq!(stats.e(), 0);
        stats.add_block();
        assert_eq!(stats.total_b(), 2);
    }
}
