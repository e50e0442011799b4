//! `SupportCalculator` trait and its three interchangeable implementations:
//! Poly-DP (default), FFT divide-and-conquer, and naive divide-and-conquer.
//! See `SPEC_FULL.md` §4.3.

use crate::fft;
use crate::tidset::Tidset;
use crate::{EPSILON, MIN_PROB};

/// Reverse prefix sum of a support-count distribution: `freq[s] = P(support
/// >= s)`. Monotonically non-increasing in `s`.
pub fn frequentness(dist: &[f64]) -> Vec<f64> {
    let mut freq = vec![0.0; dist.len()];
    let mut acc = 0.0;
    for i in (0..dist.len()).rev() {
        acc += dist[i];
        freq[i] = acc;
    }
    freq
}

/// `max { s : freq[s] >= tau - EPSILON }`, found by binary search since
/// `freq` is non-increasing. Returns `(s, freq[s])`.
pub fn support_from_distribution(dist: &[f64], tau: f64) -> (u32, f64) {
    if dist.is_empty() {
        return (0, 1.0);
    }
    let freq = frequentness(dist);
    let threshold = tau - EPSILON;

    let mut best = 0usize;
    let (mut lo, mut hi) = (0usize, freq.len() - 1);
    loop {
        let mid = lo + (hi - lo) / 2;
        if freq[mid] >= threshold {
            best = mid;
            if mid == hi {
                break;
            }
            lo = mid + 1;
        } else {
            if mid == lo {
                break;
            }
            hi = mid - 1;
        }
    }
    (best as u32, freq[best])
}

/// Contract shared by every support-probability implementation: given the
/// independent per-transaction probabilities of an itemset, report the
/// largest support count whose frequentness clears `tau`, and that
/// frequentness as the pattern's probability.
pub trait SupportCalculator: Send + Sync {
    /// The coefficient vector of `G(x) = prod((1-p_i) + p_i x)`, i.e.
    /// `dist[s] = P(support == s)`.
    fn distribution(&self, probs: &[f64]) -> Vec<f64>;

    fn support_and_probability(&self, probs: &[f64], tau: f64) -> (u32, f64) {
        support_from_distribution(&self.distribution(probs), tau)
    }

    /// Equivalent to `support_and_probability` on the dense vector padded
    /// with zeros out to `n_total`, but computed over the tidset's non-zero
    /// entries only (absent transactions contribute a (1-0) == 1 factor and
    /// cannot change the distribution).
    fn support_and_probability_sparse(
        &self,
        tidset: &Tidset,
        n_total: usize,
        tau: f64,
    ) -> (u32, f64) {
        debug_assert!(tidset.len() <= n_total);
        self.support_and_probability(&tidset.probs(), tau)
    }
}

/// Default calculator. O(n^2) time, O(n) space, in-place back-to-front
/// update so each probability is folded in without overwriting state it
/// still needs to read.
#[derive(Debug, Default, Clone, Copy)]
pub struct PolyDp;

impl SupportCalculator for PolyDp {
    fn distribution(&self, probs: &[f64]) -> Vec<f64> {
        let mut c = vec![0.0; probs.len() + 1];
        c[0] = 1.0;
        let mut degree = 0usize;
        for &p in probs {
            if p < MIN_PROB {
                continue;
            }
            for i in (1..=degree + 1).rev() {
                c[i] = c[i] * (1.0 - p) + c[i - 1] * p;
            }
            c[0] *= 1.0 - p;
            degree += 1;
        }
        c.truncate(degree + 1);
        c
    }
}

fn filtered_factors(probs: &[f64]) -> Vec<[f64; 2]> {
    probs
        .iter()
        .filter(|&&p| p >= MIN_PROB && p <= 1.0)
        .map(|&p| [1.0 - p, p])
        .collect()
}

fn divide_conquer(factors: &[[f64; 2]], mul: &dyn Fn(&[f64], &[f64]) -> Vec<f64>) -> Vec<f64> {
    match factors.len() {
        0 => vec![1.0],
        1 => factors[0].to_vec(),
        n => {
            let mid = n / 2;
            let left = divide_conquer(&factors[..mid], mul);
            let right = divide_conquer(&factors[mid..], mul);
            mul(&left, &right)
        }
    }
}

/// FFT-accelerated divide and conquer: O(n log^2 n) total, by multiplying
/// the per-transaction length-2 polynomials pairwise in a balanced tree
/// using `fft::multiply` at every merge.
#[derive(Debug, Default, Clone, Copy)]
pub struct FftDivideConquer;

impl SupportCalculator for FftDivideConquer {
    fn distribution(&self, probs: &[f64]) -> Vec<f64> {
        divide_conquer(&filtered_factors(probs), &fft::multiply)
    }
}

fn naive_multiply(a: &[f64], b: &[f64]) -> Vec<f64> {
    if a.is_empty() || b.is_empty() {
        return vec![];
    }
    let mut out = vec![0.0; a.len() + b.len() - 1];
    for (i, &x) in a.iter().enumerate() {
        for (j, &y) in b.iter().enumerate() {
            out[i + j] += x * y;
        }
    }
    out
}

/// Same merge tree as [`FftDivideConquer`] but with direct O(|a| * |b|)
/// convolution at each merge. O(n^2 log n) total; offered for correctness
/// cross-checking and as a reference for parallelizing the tree.
#[derive(Debug, Default, Clone, Copy)]
pub struct NaiveDivideConquer;

impl SupportCalculator for NaiveDivideConquer {
    fn distribution(&self, probs: &[f64]) -> Vec<f64> {
        divide_conquer(&filtered_factors(probs), &naive_multiply)
    }
}
