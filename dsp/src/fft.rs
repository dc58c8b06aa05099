//! Radix-2 Cooley-Tukey FFT.
//!
//! The forward transform divides every output bin by the transform size;
//! the backward transform applies no scaling, so
//! `backward(forward(x, n), n)` reproduces `x`.

use std::f64::consts::PI;

use crate::{Complex, DspError};

/// Transforms `samples` into the frequency domain.
///
/// Input shorter than `size` is zero-padded, longer input is truncated.
pub fn forward_transform(samples: &[Complex], size: usize) -> Result<Vec<Complex>, DspError> {
    let mut data = prepare(samples, size)?;
    transform(&mut data, true);
    let scale = 1.0 / size as f64;
    for v in &mut data {
        *v = *v * scale;
    }
    Ok(data)
}

/// Transforms a spectrum back into the time domain. No scaling is applied.
pub fn backward_transform(samples: &[Complex], size: usize) -> Result<Vec<Complex>, DspError> {
    let mut data = prepare(samples, size)?;
    transform(&mut data, false);
    Ok(data)
}

/// [`forward_transform`] for real-valued input.
pub fn forward_real(samples: &[f64], size: usize) -> Result<Vec<Complex>, DspError> {
    let data: Vec<Complex> = samples.iter().take(size).map(|&x| Complex::real(x)).collect();
    forward_transform(&data, size)
}

/// [`backward_transform`] for real-valued input, discarding the imaginary
/// part of the result.
pub fn backward_real(samples: &[f64], size: usize) -> Result<Vec<f64>, DspError> {
    let data: Vec<Complex> = samples.iter().take(size).map(|&x| Complex::real(x)).collect();
    Ok(backward_transform(&data, size)?
        .into_iter()
        .map(|c| c.re)
        .collect())
}

/// Returns true if `n` is a nonzero power of two.
pub fn is_power_of_two(n: usize) -> bool {
    n != 0 && n & (n - 1) == 0
}

/// Smallest power of two `>= n` (1 for `n == 0`).
pub fn next_pow2(n: usize) -> usize {
    let mut p = 1;
    while p < n {
        p <<= 1;
    }
    p
}

fn prepare(samples: &[Complex], size: usize) -> Result<Vec<Complex>, DspError> {
    if !is_power_of_two(size) {
        return Err(DspError::InvalidTransformSize(size));
    }
    let mut data = vec![Complex::ZERO; size];
    let n = samples.len().min(size);
    data[..n].copy_from_slice(&samples[..n]);
    Ok(data)
}

fn transform(x: &mut [Complex], forward: bool) {
    let n = x.len();
    if n <= 1 {
        return;
    }

    // Bit-reversal permutation.
    let mut j = 0usize;
    for i in 1..n {
        let mut bit = n >> 1;
        while j & bit != 0 {
            j ^= bit;
            bit >>= 1;
        }
        j ^= bit;
        if i < j {
            x.swap(i, j);
        }
    }

    // Butterflies; the twiddle factor is rotated incrementally per stage.
    let sign = if forward { -1.0 } else { 1.0 };
    let mut size = 2;
    while size <= n {
        let half = size / 2;
        let angle = sign * 2.0 * PI / size as f64;
        let wn = Complex::new(angle.cos(), angle.sin());
        let mut start = 0;
        while start < n {
            let mut w = Complex::real(1.0);
            for k in 0..half {
                let u = x[start + k];
                let t = w * x[start + k + half];
                x[start + k] = u + t;
                x[start + k + half] = u - t;
                w = w * wn;
            }
            start += size;
        }
        size <<= 1;
    }
}
