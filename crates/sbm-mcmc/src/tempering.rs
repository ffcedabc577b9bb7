use sbm_core::rng::RngHandle;

use crate::config::{LadderConfig, LadderPolicy};

/// Temperatures of the replica ladder, coldest first.
pub fn build_ladder(config: &LadderConfig) -> Vec<f64> {
    let replicas = config.replicas.max(1);
    match &config.policy {
        LadderPolicy::Geometric { ratio } => {
            let ratio = ratio.max(1.01);
            let mut temperature = config.base_temperature;
            (0..replicas)
                .map(|_| {
                    let t = temperature.max(1e-6);
                    temperature *= ratio;
                    t
                })
                .collect()
        }
        LadderPolicy::Manual { temperatures } if temperatures.is_empty() => {
            vec![config.base_temperature]
        }
        LadderPolicy::Manual { temperatures } => temperatures.clone(),
    }
}

/// Probability of swapping two replicas holding description lengths `dl_a`
/// and `dl_b` at temperatures `temp_a` and `temp_b`.
pub fn exchange_acceptance(dl_a: f64, temp_a: f64, dl_b: f64, temp_b: f64) -> f64 {
    let log_a = (1.0 / temp_a.max(1e-9) - 1.0 / temp_b.max(1e-9)) * (dl_a - dl_b);
    if log_a.is_nan() {
        0.0
    } else {
        log_a.exp().min(1.0)
    }
}

/// Draws an exchange decision; returns it with its probability.
pub fn attempt_exchange(
    dl_a: f64,
    temp_a: f64,
    dl_b: f64,
    temp_b: f64,
    rng: &mut RngHandle,
) -> (bool, f64) {
    let acceptance = exchange_acceptance(dl_a, temp_a, dl_b, temp_b);
    (rng.unit() < acceptance, acceptance)
}

/// Running exchange acceptance per neighbouring temperature pair.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExchangeLedger {
    totals: Vec<f64>,
    attempts: Vec<usize>,
}

impl ExchangeLedger {
    /// Ledger for a ladder of `temperatures` rungs.
    pub fn new(temperatures: usize) -> Self {
        let pairs = temperatures.saturating_sub(1);
        Self {
            totals: vec![0.0; pairs],
            attempts: vec![0; pairs],
        }
    }

    /// Number of neighbouring pairs.
    pub fn pairs(&self) -> usize {
        self.totals.len()
    }

    fn record(&mut self, pair: usize, probability: f64) {
        self.totals[pair] += probability;
        self.attempts[pair] += 1;
    }

    /// Mean acceptance probability of each pair; zero for untried pairs.
    pub fn rates(&self) -> Vec<f64> {
        self.totals
            .iter()
            .zip(&self.attempts)
            .map(|(&total, &n)| if n == 0 { 0.0 } else { total / n as f64 })
            .collect()
    }
}

/// One round of neighbour exchanges.
///
/// `dl_at[k]` is the description length of the replica at temperature `k`.
/// Even rounds try the pairs `(0, 1), (2, 3), ..`, odd rounds the pairs
/// `(1, 2), (3, 4), ..`, so no replica takes part in two swaps. Returns the
/// lower rung `k` of every accepted pair.
pub fn exchange_round(
    round: usize,
    dl_at: &[f64],
    temperatures: &[f64],
    ledger: &mut ExchangeLedger,
    rng: &mut RngHandle,
) -> Vec<usize> {
    let mut accepted = Vec::new();
    for k in (round % 2..ledger.pairs()).step_by(2) {
        let (swap, p) = attempt_exchange(
            dl_at[k],
            temperatures[k],
            dl_at[k + 1],
            temperatures[k + 1],
            rng,
        );
        ledger.record(k, p);
        if swap {
            accepted.push(k);
        }
    }
    accepted
}
