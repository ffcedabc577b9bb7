//! Logarithm of the number of restricted integer partitions.
//!
//! `q(n, k)` counts the partitions of `n` into at most `k` parts. It is exact
//! up to [`Q_CACHE_BOUND`] and approximated beyond.

use std::f64::consts::PI;
use std::sync::OnceLock;

use crate::numeric::{lbinom, ln_factorial, log_sum_exp};

/// Largest `n` for which `log_q` is read from the exact table.
pub const Q_CACHE_BOUND: usize = 1000;

fn q_table() -> &'static Vec<Vec<f64>> {
    static TABLE: OnceLock<Vec<Vec<f64>>> = OnceLock::new();
    TABLE.get_or_init(|| build_table(Q_CACHE_BOUND))
}

// Row n holds ln q(n, k) for k in 0..=n.
fn build_table(bound: usize) -> Vec<Vec<f64>> {
    let mut table: Vec<Vec<f64>> = Vec::with_capacity(bound + 1);
    table.push(vec![0.0]);
    for n in 1..=bound {
        let mut row = vec![f64::NEG_INFINITY; n + 1];
        for k in 1..=n {
            let rest = n - k;
            let with_k = if rest == 0 {
                0.0
            } else {
                table[rest][k.min(rest)]
            };
            row[k] = log_sum_exp(row[k - 1], with_k);
        }
        table.push(row);
    }
    table
}

/// `ln q(n, k)`; zero when `n <= 0` or `k < 1`.
pub fn log_q(n: i64, k: i64) -> f64 {
    if n <= 0 || k < 1 {
        return 0.0;
    }
    let k = k.min(n);
    let (n, k) = (n as usize, k as usize);
    if n <= Q_CACHE_BOUND {
        return q_table()[n][k];
    }
    log_q_approx(n, k)
}

/// Asymptotic approximation of `ln q(n, k)`.
pub fn log_q_approx(n: usize, k: usize) -> f64 {
    if (k as f64) < (n as f64).powf(0.25) {
        log_q_approx_small(n, k)
    } else {
        log_q_approx_big(n, k)
    }
}

fn log_q_approx_small(n: usize, k: usize) -> f64 {
    lbinom(n as i64 - 1, k as i64 - 1) - ln_factorial(k as u64)
}

fn log_q_approx_big(n: usize, k: usize) -> f64 {
    let c = PI * (2.0f64 / 3.0).sqrt();
    let nf = n as f64;
    let mut s = c * nf.sqrt() - (4.0 * 3f64.sqrt() * nf).ln();
    if k < n {
        let x = k as f64 / nf.sqrt() - nf.ln() / c;
        s -= (2.0 / c) * (-c * x / 2.0).exp();
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    fn brute_q(n: usize, k: usize) -> u64 {
        fn count(n: usize, max_part: usize, parts: usize) -> u64 {
            if n == 0 {
                return 1;
            }
            if parts == 0 {
                return 0;
            }
            (1..=max_part.min(n))
                .map(|p| count(n - p, p, parts - 1))
                .sum()
        }
        count(n, n, k)
    }

    #[test]
    fn small_values_are_exact() {
        for n in 1..=12usize {
            for k in 1..=n {
                let expected = (brute_q(n, k) as f64).ln();
                assert!(
                    (log_q(n as i64, k as i64) - expected).abs() < 1e-10,
                    "n={n} k={k}"
                );
            }
        }
        assert!((log_q(100, 100) - 190_569_292f64.ln()).abs() < 1e-8);
    }

    #[test]
    fn degenerate_arguments() {
        assert_eq!(log_q(0, 5), 0.0);
        assert_eq!(log_q(5, 0), 0.0);
        assert_eq!(log_q(-3, 2), 0.0);
        assert_eq!(log_q(4, 9), log_q(4, 4));
    }

    #[test]
    fn approximation_tracks_table_near_the_bound() {
        let n = Q_CACHE_BOUND;
        for k in [n / 2, n] {
            let exact = q_table()[n][k];
            let approx = log_q_approx(n, k);
            assert!((exact - approx).abs() / exact < 0.02, "k={k}");
        }
    }
}
