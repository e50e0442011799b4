//! Radix-2 Cooley–Tukey FFT and the polynomial multiplication built on top
//! of it. See `SPEC_FULL.md` §4.4.

use num_complex::Complex64;
use std::f64::consts::PI;

use crate::FFT_NOISE_FLOOR;

/// In-place radix-2 FFT. `a.len()` must be a power of two. `invert` selects
/// the inverse transform (conjugate, forward transform, conjugate, divide
/// by n).
pub fn fft(a: &mut [Complex64], invert: bool) {
    let n = a.len();
    if n <= 1 {
        return;
    }
    assert!(n.is_power_of_two(), "fft length must be a power of two");

    // Bit-reversal permutation.
    let mut j = 0usize;
    for i in 1..n {
        let mut bit = n >> 1;
        while j & bit != 0 {
            j ^= bit;
            bit >>= 1;
        }
        j |= bit;
        if i < j {
            a.swap(i, j);
        }
    }

    let mut len = 2;
    while len <= n {
        let ang = 2.0 * PI / len as f64 * if invert { 1.0 } else { -1.0 };
        let wlen = Complex64::new(ang.cos(), ang.sin());
        let mut i = 0;
        while i < n {
            let mut w = Complex64::new(1.0, 0.0);
            for k in 0..len / 2 {
                let u = a[i + k];
                let v = a[i + k + len / 2] * w;
                a[i + k] = u + v;
                a[i + k + len / 2] = u - v;
                w *= wlen;
            }
            i += len;
        }
        len <<= 1;
    }

    if invert {
        for x in a.iter_mut() {
            *x /= n as f64;
        }
    }
}

fn next_pow2(n: usize) -> usize {
    n.max(1).next_power_of_two()
}

/// Multiply two real polynomials (coefficient vectors, ascending degree) via
/// FFT. Returns a vector of length `a.len() + b.len() - 1` with magnitudes
/// below [`crate::FFT_NOISE_FLOOR`] floored to zero.
pub fn multiply(a: &[f64], b: &[f64]) -> Vec<f64> {
    if a.is_empty() || b.is_empty() {
        return vec![];
    }
    let result_len = a.len() + b.len() - 1;
    let n = next_pow2(result_len);

    let mut fa: Vec<Complex64> = a.iter().map(|&x| Complex64::new(x, 0.0)).collect();
    let mut fb: Vec<Complex64> = b.iter().map(|&x| Complex64::new(x, 0.0)).collect();
    fa.resize(n, Complex64::new(0.0, 0.0));
    fb.resize(n, Complex64::new(0.0, 0.0));

    fft(&mut fa, false);
    fft(&mut fb, false);
    for (x, y) in fa.iter_mut().zip(fb.iter()) {
        *x *= *y;
    }
    fft(&mut fa, true);

    fa.into_iter()
        .take(result_len)
        .map(|c| {
            let re = c.re;
            if re.abs() < FFT_NOISE_FLOOR {
                0.0
            } else {
                re
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multiply_matches_hand_computed_product() {
        // (1 + 2x) * (3 + 4x) = 3 + 10x + 8x^2
        let out = multiply(&[1.0, 2.0], &[3.0, 4.0]);
        assert_eq!(out.len(), 3);
        assert!((out[0] - 3.0).abs() < 1e-9);
        assert!((out[1] - 10.0).abs() < 1e-9);
        assert!((out[2] - 8.0).abs() < 1e-9);
    }

    #[test]
    fn multiply_by_empty_is_empty() {
        assert!(multiply(&[], &[1.0, 2.0]).is_empty());
    }

    #[test]
    fn multiply_is_commutative() {
        let a = [0.6, 0.4, 0.1];
        let b = [0.2, 0.8];
        let ab = multiply(&a, &b);
        let ba = multiply(&b, &a);
        assert_eq!(ab.len(), ba.len());
        for (x, y) in ab.iter().zip(ba.iter()) {
            assert!((x - y).abs() < 1e-9);
        }
    }

    #[test]
    fn fft_roundtrip_is_identity() {
        let mut a: Vec<Complex64> = (0..8).map(|i| Complex64::new(i as f64, 0.0)).collect();
        let original = a.clone();
        fft(&mut a, false);
        fft(&mut a, true);
        for (x, y) in a.iter().zip(original.iter()) {
            assert!((x.re - y.re).abs() < 1e-9);
            assert!((x.im - y.im).abs() < 1e-9);
        }
    }
}
