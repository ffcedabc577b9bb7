use log::{debug, info};
use sbm_core::errors::{ErrorInfo, SbmError};
use sbm_core::rng::RngHandle;
use sbm_core::{GraphView, Vertex};
use serde::{Deserialize, Serialize};

use crate::block_state::BlockState;
use crate::engine::{metropolis_accept, shuffled_vertices, Sampler, StepOutcome, SweepOutcome};

/// Learned density of states over description-length bins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DensityOfStates {
    s_min: f64,
    s_max: f64,
    log_g: Vec<f64>,
    hist: Vec<u64>,
}

impl DensityOfStates {
    /// Splits `[s_min, s_max)` into `bins` equal bins.
    pub fn new(s_min: f64, s_max: f64, bins: usize) -> Result<Self, SbmError> {
        if !(s_min.is_finite() && s_max.is_finite() && s_max > s_min) || bins == 0 {
            return Err(SbmError::Config(
                ErrorInfo::new("invalid-range", "density range must be finite and non-empty")
                    .with_context("s_min", s_min.to_string())
                    .with_context("s_max", s_max.to_string())
                    .with_context("bins", bins.to_string()),
            ));
        }
        Ok(Self {
            s_min,
            s_max,
            log_g: vec![0.0; bins],
            hist: vec![0; bins],
        })
    }

    /// Bin of description length `s`, or `None` outside the range.
    pub fn bin(&self, s: f64) -> Option<usize> {
        if !(s >= self.s_min && s < self.s_max) {
            return None;
        }
        let width = (self.s_max - self.s_min) / self.log_g.len() as f64;
        let index = ((s - self.s_min) / width) as usize;
        Some(index.min(self.log_g.len() - 1))
    }

    /// Log-density per bin.
    pub fn log_g(&self) -> &[f64] {
        &self.log_g
    }

    /// Visit counts per bin since the last reset.
    pub fn histogram(&self) -> &[u64] {
        &self.hist
    }

    /// Raises the log-density of `bin` by `f` and counts the visit.
    pub fn visit(&mut self, bin: usize, f: f64) {
        self.log_g[bin] += f;
        self.hist[bin] += 1;
    }

    /// Clears the visit counts.
    pub fn reset_histogram(&mut self) {
        self.hist.iter_mut().for_each(|h| *h = 0);
    }

    fn visited(&self) -> impl Iterator<Item = u64> + '_ {
        self.hist.iter().copied().filter(|&h| h > 0)
    }

    /// Number of bins visited since the last reset.
    pub fn visited_bins(&self) -> usize {
        self.visited().count()
    }

    /// `min / mean` of the visited bins' counts; zero before any visit.
    pub fn flatness(&self) -> f64 {
        let (count, sum, min) = self
            .visited()
            .fold((0usize, 0u64, u64::MAX), |(c, s, m), h| (c + 1, s + h, m.min(h)));
        if count == 0 {
            return 0.0;
        }
        min as f64 / (sum as f64 / count as f64)
    }

    /// `max / min` of the visited bins' counts; infinite before any visit.
    pub fn flatness_ratio(&self) -> f64 {
        let (min, max) = self
            .visited()
            .fold((u64::MAX, 0u64), |(lo, hi), h| (lo.min(h), hi.max(h)));
        if max == 0 {
            return f64::INFINITY;
        }
        max as f64 / min as f64
    }
}

/// Wang–Landau schedule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WangLandauSchedule {
    /// Initial modification factor (log space).
    pub f_initial: f64,
    /// The run stops once the factor drops below this value.
    pub f_min: f64,
    /// A stage ends when the flatness ratio falls below this value.
    pub flat_ratio: f64,
    /// Sweeps between flatness checks.
    pub check_interval: usize,
}

impl Default for WangLandauSchedule {
    fn default() -> Self {
        Self {
            f_initial: 1.0,
            f_min: 1e-4,
            flat_ratio: 2.0,
            check_interval: 100,
        }
    }
}

/// Final state of a Wang–Landau run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WangLandauReport {
    /// Sweeps executed.
    pub sweeps: usize,
    /// Completed stages (factor halvings).
    pub stages: usize,
    /// Modification factor at the end.
    pub f: f64,
    /// Flatness ratio at the end.
    pub flatness_ratio: f64,
    /// Smallest ratio seen at a check with at least two visited bins.
    pub min_ratio: f64,
    /// Whether the factor reached `f_min`.
    pub converged: bool,
    /// Learned log-density.
    pub log_g: Vec<f64>,
}

/// Multicanonical single-vertex sampler.
///
/// Moves are accepted with `min(1, g(S) / g(S') P(rev) / P(fwd))`; moves
/// leaving the density range are rejected. Every step raises the log-density
/// of the current bin by `f`.
#[derive(Debug, Clone)]
pub struct MulticanonicalSampler<G: GraphView> {
    state: BlockState<G>,
    dos: DensityOfStates,
    schedule: WangLandauSchedule,
    s: f64,
    f: f64,
    stage: usize,
    sweeps: usize,
    min_ratio: f64,
}

impl<G: GraphView> MulticanonicalSampler<G> {
    /// Creates the sampler. The state's description length must lie inside
    /// the density range.
    pub fn new(
        state: BlockState<G>,
        dos: DensityOfStates,
        schedule: WangLandauSchedule,
    ) -> Result<Self, SbmError> {
        let s = state.total_dl();
        if dos.bin(s).is_none() {
            return Err(SbmError::Config(
                ErrorInfo::new("start-out-of-range", "initial description length outside range")
                    .with_context("s", s.to_string())
                    .with_context("s_min", dos.s_min.to_string())
                    .with_context("s_max", dos.s_max.to_string())
                    .with_hint("widen [s_min, s_max) or start from another partition"),
            ));
        }
        Ok(Self {
            state,
            dos,
            f: schedule.f_initial,
            schedule,
            s,
            stage: 0,
            sweeps: 0,
            min_ratio: f64::INFINITY,
        })
    }

    /// Current state.
    pub fn state(&self) -> &BlockState<G> {
        &self.state
    }

    /// Learned density of states.
    pub fn density(&self) -> &DensityOfStates {
        &self.dos
    }

    /// Tracked description length of the current state.
    pub fn current_dl(&self) -> f64 {
        self.s
    }

    /// Current modification factor.
    pub fn modification_factor(&self) -> f64 {
        self.f
    }

    /// Whether the modification factor dropped below `f_min`.
    pub fn converged(&self) -> bool {
        self.f < self.schedule.f_min
    }

    /// `min / mean` of the visited bins.
    pub fn flatness(&self) -> f64 {
        self.dos.flatness()
    }

    /// `max / min` of the visited bins.
    pub fn flatness_ratio(&self) -> f64 {
        self.dos.flatness_ratio()
    }

    /// Proposes and possibly commits a move of `v`, then updates the density.
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
        if nr != r {
            let ds = self.state.virtual_move_dl(v, nr);
            let current = self.dos.bin(self.s);
            if let (Some(cur), Some(next)) = (current, self.dos.bin(self.s + ds)) {
                let proposer = *self.state.proposer();
                let forward = proposer.log_prob(&self.state, v, r, nr);
                let reverse = proposer.log_prob(&self.state, v, nr, r);
                let log_a = self.dos.log_g[cur] - self.dos.log_g[next] + reverse - forward;
                if metropolis_accept(log_a, rng) {
                    self.state.move_vertex(v, nr);
                    self.s += ds;
                    outcome.accepted = true;
                    outcome.delta = ds;
                }
            }
        }
        if let Some(bin) = self.dos.bin(self.s) {
            self.dos.visit(bin, self.f);
        }
        outcome
    }

    fn check_flatness(&mut self) {
        if self.dos.visited_bins() < 2 {
            return;
        }
        let ratio = self.dos.flatness_ratio();
        self.min_ratio = self.min_ratio.min(ratio);
        if ratio < self.schedule.flat_ratio {
            self.f /= 2.0;
            self.stage += 1;
            self.dos.reset_histogram();
            debug!(
                "wang-landau stage {} done: ratio={:.3} f={:.3e}",
                self.stage, ratio, self.f
            );
        }
    }

    /// Runs sweeps until the factor converges or `max_sweeps` is spent.
    pub fn run(&mut self, max_sweeps: usize, rng: &mut RngHandle) -> WangLandauReport {
        while self.sweeps < max_sweeps && !self.converged() {
            self.sweep_once(rng);
        }
        let report = self.report();
        info!(
            "wang-landau finished after {} sweeps: stages={} f={:.3e} ratio={:.3}",
            report.sweeps, report.stages, report.f, report.flatness_ratio
        );
        report
    }

    /// Snapshot of the schedule progress.
    pub fn report(&self) -> WangLandauReport {
        WangLandauReport {
            sweeps: self.sweeps,
            stages: self.stage,
            f: self.f,
            flatness_ratio: self.dos.flatness_ratio(),
            min_ratio: self.min_ratio,
            converged: self.converged(),
            log_g: self.dos.log_g.clone(),
        }
    }
}

impl<G: GraphView> Sampler<G> for MulticanonicalSampler<G> {
    fn sweep_once(&mut self, rng: &mut RngHandle) -> SweepOutcome {
        let mut outcome = SweepOutcome::default();
        for v in shuffled_vertices(self.state.graph(), rng) {
            let step = self.step_vertex(v, rng);
            outcome.record(&step);
        }
        self.sweeps += 1;
        if self.schedule.check_interval > 0 && self.sweeps % self.schedule.check_interval == 0 {
            self.check_flatness();
        }
        outcome
    }

    fn state(&self) -> &BlockState<G> {
        &self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bins_cover_half_open_range() {
        let dos = DensityOfStates::new(0.0, 10.0, 5).unwrap();
        assert_eq!(dos.bin(0.0), Some(0));
        assert_eq!(dos.bin(9.999), Some(4));
        assert_eq!(dos.bin(10.0), None);
        assert_eq!(dos.bin(-0.1), None);
        assert_eq!(dos.bin(f64::NAN), None);
    }

    #[test]
    fn flatness_measures_use_visited_bins() {
        let mut dos = DensityOfStates::new(0.0, 4.0, 4).unwrap();
        assert_eq!(dos.flatness(), 0.0);
        assert!(dos.flatness_ratio().is_infinite());
        for _ in 0..4 {
            dos.visit(0, 1.0);
        }
        dos.visit(2, 1.0);
        dos.visit(2, 1.0);
        assert!((dos.flatness_ratio() - 2.0).abs() < 1e-12);
        assert!((dos.flatness() - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(dos.log_g()[0], 4.0);
        dos.reset_histogram();
        assert_eq!(dos.visited_bins(), 0);
        assert_eq!(dos.log_g()[2], 2.0);
    }

    #[test]
    fn invalid_ranges_rejected() {
        assert!(DensityOfStates::new(1.0, 1.0, 3).is_err());
        assert!(DensityOfStates::new(0.0, 1.0, 0).is_err());
        let err = DensityOfStates::new(f64::NEG_INFINITY, 1.0, 2).unwrap_err();
        assert_eq!(err.code(), "invalid-range");
    }
}
