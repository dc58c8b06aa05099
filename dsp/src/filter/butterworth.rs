use std::f64::consts::PI;

use super::DigitalFilter;
use crate::DspError;

/// Number of cascaded sections in every Butterworth filter.
pub const FILTER_SECTIONS: usize = 4;

/// Pole angle term of section `i`.
fn pole(i: usize) -> f64 {
    (PI * (2.0 * i as f64 + 1.0) / (4.0 * FILTER_SECTIONS as f64)).sin()
}

fn check_cutoff(name: &'static str, freq: f64, sample_rate: u32) -> Result<(), DspError> {
    let nyquist = sample_rate as f64 / 2.0;
    if !(freq > 0.0 && freq < nyquist) {
        return Err(DspError::range(
            name,
            format!("{freq} Hz must lie in (0, {nyquist}) Hz"),
        ));
    }
    Ok(())
}

/// Coefficients and delay line of one second-order section.
#[derive(Debug, Clone, Default)]
struct Biquad {
    gain: f64,
    d1: f64,
    d2: f64,
    w: [f64; 3],
}

impl Biquad {
    /// Feeds one sample through the recursive part.
    fn push(&mut self, x: f64) {
        self.w[0] = self.d1 * self.w[1] + self.d2 * self.w[2] + x;
    }

    fn shift(&mut self) {
        self.w[2] = self.w[1];
        self.w[1] = self.w[0];
    }
}

/// Second-order sections for the low- and high-pass designs. `s` and the
/// numerator sign are the only differences between the two.
fn design_sections(cutoff: f64, sample_rate: u32, low_pass: bool) -> [Biquad; FILTER_SECTIONS] {
    let a = (PI * cutoff / sample_rate as f64).tan();
    let a2 = a * a;
    std::array::from_fn(|i| {
        let r = pole(i);
        let s = a2 + 2.0 * a * r + 1.0;
        Biquad {
            gain: if low_pass { a2 / s } else { 1.0 / s },
            d1: 2.0 * (1.0 - a2) / s,
            d2: -(a2 - 2.0 * a * r + 1.0) / s,
            w: [0.0; 3],
        }
    })
}

/// Butterworth low-pass filter.
#[derive(Debug, Clone)]
pub struct LowPassFilter {
    sections: [Biquad; FILTER_SECTIONS],
}

impl LowPassFilter {
    pub fn new(cutoff: f64, sample_rate: u32) -> Result<Self, DspError> {
        check_cutoff("low-pass cutoff", cutoff, sample_rate)?;
        Ok(Self {
            sections: design_sections(cutoff, sample_rate, true),
        })
    }
}

impl DigitalFilter for LowPassFilter {
    fn filter(&mut self, samples: &[f64]) -> Vec<f64> {
        self.sections.iter_mut().for_each(|s| s.w = [0.0; 3]);
        samples
            .iter()
            .map(|&x| {
                self.sections.iter_mut().fold(x, |x, s| {
                    s.push(x);
                    let y = s.gain * (s.w[0] + 2.0 * s.w[1] + s.w[2]);
                    s.shift();
                    y
                })
            })
            .collect()
    }
}

/// Butterworth high-pass filter.
#[derive(Debug, Clone)]
pub struct HighPassFilter {
    sections: [Biquad; FILTER_SECTIONS],
}

impl HighPassFilter {
    pub fn new(cutoff: f64, sample_rate: u32) -> Result<Self, DspError> {
        check_cutoff("high-pass cutoff", cutoff, sample_rate)?;
        Ok(Self {
            sections: design_sections(cutoff, sample_rate, false),
        })
    }
}

impl DigitalFilter for HighPassFilter {
    fn filter(&mut self, samples: &[f64]) -> Vec<f64> {
        self.sections.iter_mut().for_each(|s| s.w = [0.0; 3]);
        samples
            .iter()
            .map(|&x| {
                self.sections.iter_mut().fold(x, |x, s| {
                    s.push(x);
                    let y = s.gain * (s.w[0] - 2.0 * s.w[1] + s.w[2]);
                    s.shift();
                    y
                })
            })
            .collect()
    }
}

/// Fourth-order band-pass section.
#[derive(Debug, Clone, Default)]
struct BandSection {
    gain: f64,
    d: [f64; 4],
    w: [f64; 5],
}

/// Butterworth band-pass filter.
#[derive(Debug, Clone)]
pub struct BandPassFilter {
    sections: [BandSection; FILTER_SECTIONS],
}

impl BandPassFilter {
    pub fn new(low: f64, high: f64, sample_rate: u32) -> Result<Self, DspError> {
        check_cutoff("band-pass low edge", low, sample_rate)?;
        check_cutoff("band-pass high edge", high, sample_rate)?;
        if low >= high {
            return Err(DspError::range(
                "band-pass edges",
                format!("low edge {low} Hz must be below high edge {high} Hz"),
            ));
        }

        let sr = sample_rate as f64;
        let a = (PI * (high + low) / sr).cos() / (PI * (high - low) / sr).cos();
        let a2 = a * a;
        let b = (PI * (high - low) / sr).tan();
        let b2 = b * b;
        let sections = std::array::from_fn(|i| {
            let r = pole(i);
            let s = b2 + 2.0 * b * r + 1.0;
            BandSection {
                gain: b2 / s,
                d: [
                    4.0 * a * (1.0 + b * r) / s,
                    2.0 * (b2 - 2.0 * a2 - 1.0) / s,
                    4.0 * a * (1.0 - b * r) / s,
                    -(b2 - 2.0 * b * r + 1.0) / s,
                ],
                w: [0.0; 5],
            }
        });
        Ok(Self { sections })
    }
}

impl DigitalFilter for BandPassFilter {
    fn filter(&mut self, samples: &[f64]) -> Vec<f64> {
        self.sections.iter_mut().for_each(|s| s.w = [0.0; 5]);
        samples
            .iter()
            .map(|&x| {
                self.sections.iter_mut().fold(x, |x, s| {
                    let w = &mut s.w;
                    w[0] = s.d[0] * w[1] + s.d[1] * w[2] + s.d[2] * w[3] + s.d[3] * w[4] + x;
                    let y = s.gain * (w[0] - 2.0 * w[2] + w[4]);
                    w.copy_within(0..4, 1);
                    y
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tone(freq: f64, sample_rate: u32, n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| (2.0 * PI * freq * i as f64 / sample_rate as f64).sin())
            .collect()
    }

    fn tail_power(x: &[f64]) -> f64 {
        let tail = &x[x.len() / 2..];
        tail.iter().map(|v| v * v).sum::<f64>() / tail.len() as f64
    }

    #[test]
    fn low_pass_has_unit_dc_gain() {
        let mut f = LowPassFilter::new(300.0, 8000).unwrap();
        let out = f.filter(&[1.0; 2000]);
        assert!((out[1999] - 1.0).abs() < 1e-6, "dc gain {}", out[1999]);
    }

    #[test]
    fn high_pass_blocks_dc() {
        let mut f = HighPassFilter::new(60.0, 8000).unwrap();
        let out = f.filter(&[1.0; 8000]);
        assert!(out[7999].abs() < 1e-6, "dc leak {}", out[7999]);
    }

    #[test]
    fn cutoff_is_half_power() {
        let mut lp = LowPassFilter::new(1000.0, 16000).unwrap();
        let mut hp = HighPassFilter::new(1000.0, 16000).unwrap();
        let x = tone(1000.0, 16000, 16000);
        let lp_gain = tail_power(&lp.filter(&x)) / tail_power(&x);
        let hp_gain = tail_power(&hp.filter(&x)) / tail_power(&x);
        assert!((lp_gain - 0.5).abs() < 0.02, "low-pass gain {lp_gain}");
        assert!((hp_gain - 0.5).abs() < 0.02, "high-pass gain {hp_gain}");
    }

    #[test]
    fn band_pass_center_and_stop_bands() {
        let mut f = BandPassFilter::new(300.0, 3000.0, 16000).unwrap();
        let pass = tail_power(&f.filter(&tone(1000.0, 16000, 8000)));
        let below = tail_power(&f.filter(&tone(50.0, 16000, 8000)));
        let above = tail_power(&f.filter(&tone(7000.0, 16000, 8000)));
        assert!((pass / 0.5 - 1.0).abs() < 0.02, "pass-band power {pass}");
        assert!(below < 1e-6, "50 Hz leaked {below}");
        assert!(above < 1e-6, "7 kHz leaked {above}");
    }

    #[test]
    fn state_resets_between_calls() {
        let mut f = BandPassFilter::new(100.0, 1000.0, 8000).unwrap();
        let x = tone(400.0, 8000, 512);
        let first = f.filter(&x);
        let second = f.filter(&x);
        assert_eq!(first, second);
    }

    #[test]
    fn rejects_invalid_cutoffs() {
        assert!(LowPassFilter::new(0.0, 8000).is_err());
        assert!(LowPassFilter::new(4000.0, 8000).is_err());
        assert!(HighPassFilter::new(-5.0, 8000).is_err());
        assert!(BandPassFilter::new(1000.0, 500.0, 8000).is_err());
        assert!(BandPassFilter::new(100.0, 5000.0, 8000).is_err());
    }
}
