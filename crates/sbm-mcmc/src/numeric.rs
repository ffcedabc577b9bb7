//! Numerically stable combinatorial helpers used by the description-length
//! terms.

use std::sync::OnceLock;

use statrs::function::gamma::ln_gamma;

const LN_FACTORIAL_CACHE: usize = 1 << 16;

fn ln_factorial_table() -> &'static [f64] {
    static TABLE: OnceLock<Vec<f64>> = OnceLock::new();
    TABLE.get_or_init(|| {
        (0..LN_FACTORIAL_CACHE)
            .map(|n| ln_gamma(n as f64 + 1.0))
            .collect()
    })
}

/// `ln Γ(x)` for real arguments.
pub fn lgamma(x: f64) -> f64 {
    ln_gamma(x)
}

/// `ln n!`, served from a table for small `n`.
#[inline]
pub fn ln_factorial(n: u64) -> f64 {
    match ln_factorial_table().get(n as usize) {
        Some(&value) => value,
        None => ln_gamma(n as f64 + 1.0),
    }
}

/// Logarithm of the binomial coefficient.
///
/// Returns zero whenever `n <= 0`, `k <= 0` or `k >= n`, so callers can pass
/// shifted counts such as `n + e - 1` without guarding the empty cases.
#[inline]
pub fn lbinom(n: i64, k: i64) -> f64 {
    if n <= 0 || k <= 0 || k >= n {
        return 0.0;
    }
    ln_factorial(n as u64) - ln_factorial(k as u64) - ln_factorial((n - k) as u64)
}

/// `x ln x` with `0 ln 0 = 0`.
#[inline]
pub fn xlogx(x: u64) -> f64 {
    if x == 0 {
        0.0
    } else {
        let x = x as f64;
        x * x.ln()
    }
}

/// `ln x` with `ln 0` mapped to zero.
#[inline]
pub fn safelog(x: u64) -> f64 {
    if x == 0 {
        0.0
    } else {
        (x as f64).ln()
    }
}

/// `ln(e^a + e^b)` evaluated without overflow.
#[inline]
pub fn log_sum_exp(a: f64, b: f64) -> f64 {
    if a == f64::NEG_INFINITY {
        return b;
    }
    if b == f64::NEG_INFINITY {
        return a;
    }
    let (hi, lo) = if a > b { (a, b) } else { (b, a) };
    hi + (lo - hi).exp().ln_1p()
}

/// Samples an index with probability proportional to `exp(log_weights[i])`.
///
/// `u` is a uniform draw in `[0, 1)`. Returns the chosen index together with
/// its normalized log-probability.
pub fn sample_log_weights(log_weights: &[f64], u: f64) -> (usize, f64) {
    let norm = log_weights
        .iter()
        .fold(f64::NEG_INFINITY, |acc, &w| log_sum_exp(acc, w));
    let mut cumulative = 0.0;
    for (index, &w) in log_weights.iter().enumerate() {
        cumulative += (w - norm).exp();
        if u < cumulative {
            return (index, w - norm);
        }
    }
    let last = log_weights.len() - 1;
    (last, log_weights[last] - norm)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lbinom_matches_direct_formula() {
        assert!((lbinom(10, 3) - 120f64.ln()).abs() < 1e-10);
        assert!((lbinom(52, 5) - 2_598_960f64.ln()).abs() < 1e-9);
        assert_eq!(lbinom(0, 0), 0.0);
        assert_eq!(lbinom(5, 5), 0.0);
        assert_eq!(lbinom(5, 9), 0.0);
        assert_eq!(lbinom(-1, 0), 0.0);
    }

    #[test]
    fn factorial_cache_agrees_with_gamma() {
        for n in [0u64, 1, 2, 10, 1000, 65_535, 65_536, 200_000] {
            let expected = ln_gamma(n as f64 + 1.0);
            assert!((ln_factorial(n) - expected).abs() < 1e-8 * expected.max(1.0));
        }
    }

    #[test]
    fn xlogx_and_safelog_handle_zero() {
        assert_eq!(xlogx(0), 0.0);
        assert_eq!(xlogx(1), 0.0);
        assert_eq!(safelog(0), 0.0);
        assert!((xlogx(4) - 4.0 * 4f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn log_sum_exp_is_stable() {
        let big = log_sum_exp(1000.0, 1000.0);
        assert!((big - (1000.0 + 2f64.ln())).abs() < 1e-12);
        assert_eq!(log_sum_exp(f64::NEG_INFINITY, 3.0), 3.0);
    }

    #[test]
    fn sampling_respects_weights() {
        let weights = [0.0, f64::NEG_INFINITY, 0.0];
        let (first, lp) = sample_log_weights(&weights, 0.1);
        assert_eq!(first, 0);
        assert!((lp - 0.5f64.ln()).abs() < 1e-12);
        let (last, _) = sample_log_weights(&weights, 0.9);
        assert_eq!(last, 2);
    }
}
