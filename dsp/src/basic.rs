//! Scalar measures and element-wise transforms over raw sample slices.

use std::ops::Range;

use rand::Rng;

use crate::{DspError, Signal};

/// A signal with additive noise mixed in, and the resulting SNR.
#[derive(Debug, Clone, PartialEq)]
pub struct NoisySignal {
    pub signal: Signal,
    /// Signal-to-noise ratio in decibels.
    pub snr_db: f64,
}

/// Mean power of the samples. Zero for an empty slice.
pub fn energy(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    samples.iter().map(|x| x * x).sum::<f64>() / samples.len() as f64
}

/// Correlation coefficient between the samples and a copy shifted by
/// `delay`, normalized by the energy of the overlapping head.
pub fn correlation(samples: &[f64], delay: usize) -> f64 {
    if delay >= samples.len() {
        return 0.0;
    }
    let n = samples.len() - delay;
    let mut power = 0.0;
    let mut corr = 0.0;
    for j in 0..n {
        power += samples[j] * samples[j];
        corr += samples[j] * samples[j + delay];
    }
    if power == 0.0 { 0.0 } else { corr / power }
}

/// Scales the samples so that the largest magnitude becomes 1.
pub fn normalize(samples: &[f64]) -> Vec<f64> {
    let peak = peak(samples);
    if peak == 0.0 {
        return samples.to_vec();
    }
    samples.iter().map(|x| x / peak).collect()
}

pub fn central_limitation(samples: &[f64], level: f64) -> Result<Vec<f64>, DspError> {
    if !(0.0..=1.0).contains(&level) {
        return Err(DspError::range(
            "central limitation",
            format!("level must be in [0, 1], got {level}"),
        ));
    }
    let border = level * peak(samples);
    Ok(samples
        .iter()
        .map(|&x| if x.abs() > border { x } else { 0.0 })
        .collect())
}

/// Adds uniform noise in `[-level, level]` and reports the SNR, measuring
/// signal power only inside `energy_range`.
pub fn add_noise<R: Rng + ?Sized>(
    samples: &[f64],
    level: f64,
    energy_range: Range<usize>,
    rng: &mut R,
) -> Result<(Vec<f64>, f64), DspError> {
    if !(level >= 0.0 && level.is_finite()) {
        return Err(DspError::range(
            "noise level",
            format!("must be finite and non-negative, got {level}"),
        ));
    }
    if energy_range.start > energy_range.end || energy_range.end > samples.len() {
        return Err(DspError::range(
            "energy range",
            format!(
                "{}..{} does not fit a signal of {} samples",
                energy_range.start,
                energy_range.end,
                samples.len()
            ),
        ));
    }

    let signal_power: f64 = samples[energy_range].iter().map(|x| x * x).sum();
    let mut noise_power = 0.0;
    let noisy = samples
        .iter()
        .map(|&x| {
            let n = (rng.random::<f64>() * 2.0 - 1.0) * level;
            noise_power += n * n;
            x + n
        })
        .collect();
    let snr_db = 10.0 * (signal_power.log10() - noise_power.log10());
    Ok((noisy, snr_db))
}

fn peak(samples: &[f64]) -> f64 {
    samples.iter().fold(0.0_f64, |m, x| m.max(x.abs()))
}
