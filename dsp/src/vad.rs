//! Voiced-speech detection.
//!
//! Each frame is scored by `corr * energy^2`, where `energy` is the summed
//! power of the low-passed frame and `corr` is the lag-one correlation of the
//! raw frame after a little uniform noise is mixed in. Noise decorrelates
//! silence and leaves voiced speech, which is dominated by low
//! frequencies, strongly correlated. Runs of the per-sample score above a
//! border are reported as [`VoicedInterval`]s.

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::frame::{check_framing, frame_len, hop_len};
use crate::{DspError, Signal, WindowFunction};

/// Voice activity detector settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VadConfig {
    /// Analysis frame length in seconds.
    pub window: f64,
    /// Fraction of each frame shared with the next, in [0, 1).
    pub overlap: f64,
    /// Cutoff of the low-pass filter applied before measuring energy (Hz).
    pub low_pass: f64,
    /// Amplitude of the uniform noise mixed in before correlating.
    pub noise_level: f64,
    /// Score above which a sample counts as voiced.
    pub border: f64,
    /// Seed for the noise generator.
    pub seed: u64,
}

impl Default for VadConfig {
    fn default() -> Self {
        Self {
            window: 0.04,
            overlap: 0.95,
            low_pass: 300.0,
            noise_level: 0.2,
            border: 5.0,
            seed: 0,
        }
    }
}

/// Half-open range of samples `[start, stop)` holding voiced speech.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VoicedInterval {
    pub start: usize,
    pub stop: usize,
}

impl VoicedInterval {
    pub fn len(&self) -> usize {
        self.stop.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.stop <= self.start
    }

    pub fn contains(&self, sample: usize) -> bool {
        (self.start..self.stop).contains(&sample)
    }
}

/// Per-sample voice activity score, aligned with `signal`.
pub fn voice_activity(signal: &Signal, config: &VadConfig) -> Result<Signal, DspError> {
    check_framing(config.window, config.overlap)?;
    if !config.border.is_finite() {
        return Err(DspError::range("voicing border", "must be finite"));
    }

    let filtered = signal.low_pass(config.low_pass)?;
    let window = WindowFunction::Rectangular;
    let len = frame_len(config.window, signal.sample_rate());

    let energy: Vec<f64> = filtered
        .split(config.window, config.overlap, window)?
        .iter()
        .map(|f| f.signal.energy() * len as f64)
        .collect();

    let mut rng = StdRng::seed_from_u64(config.seed);
    let frames = signal.split(config.window, config.overlap, window)?;
    let mut corr = Vec::with_capacity(frames.len());
    for f in &frames {
        let noisy = f.signal.add_noise(config.noise_level, 0..0, &mut rng)?;
        corr.push(noisy.signal.correlation(1));
    }

    let hop = hop_len(len, config.overlap);
    let mut track = vec![0.0; len / 2];
    for (e, c) in energy.iter().zip(&corr) {
        let score = c * e * e;
        track.extend(std::iter::repeat_n(score, hop));
    }
    track.resize(signal.len(), 0.0);
    Ok(Signal::with_format(track, signal.format()))
}

/// Contiguous runs where the voice activity score exceeds `config.border`.
pub fn voiced_intervals(
    signal: &Signal,
    config: &VadConfig,
) -> Result<Vec<VoicedInterval>, DspError> {
    let track = voice_activity(signal, config)?;
    let intervals = threshold_runs(track.samples(), config.border);
    debug!(
        "found {} voiced intervals in {} samples",
        intervals.len(),
        signal.len()
    );
    Ok(intervals)
}

/// Runs of samples strictly above `border`. A run still open at the end
/// closes at `scores.len()`.
pub fn threshold_runs(scores: &[f64], border: f64) -> Vec<VoicedInterval> {
    let mut out = Vec::new();
    let mut start = None;
    for (i, &v) in scores.iter().enumerate() {
        match (v > border, start) {
            (true, None) => start = Some(i),
            (false, Some(s)) => {
                out.push(VoicedInterval { start: s, stop: i });
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        out.push(VoicedInterval {
            start: s,
            stop: scores.len(),
        });
    }
    out
}

#[cfg(test)]
mod tests {
    use std::f64::consts::PI;

    use super::*;

    /// Silence, a low-pitched tone burst, silence.
    fn burst(sample_rate: u32) -> (Signal, usize, usize) {
        let sr = sample_rate as usize;
        let (start, stop) = (sr / 2, sr);
        let samples = (0..sr * 3 / 2)
            .map(|i| {
                if (start..stop).contains(&i) {
                    0.8 * (2.0 * PI * 150.0 * i as f64 / sample_rate as f64).sin()
                } else {
                    0.0
                }
            })
            .collect();
        (Signal::new(samples, sample_rate), start, stop)
    }

    #[test]
    fn runs_above_border() {
        let scores = [0.0, 6.0, 7.0, 1.0, 5.0, 9.0, 9.0];
        assert_eq!(
            threshold_runs(&scores, 5.0),
            vec![
                VoicedInterval { start: 1, stop: 3 },
                VoicedInterval { start: 5, stop: 7 },
            ]
        );
        assert!(threshold_runs(&[], 5.0).is_empty());
    }

    #[test]
    fn track_is_aligned_with_signal() {
        let (signal, _, _) = burst(8000);
        let track = voice_activity(&signal, &VadConfig::default()).unwrap();
        assert_eq!(track.len(), signal.len());
        assert_eq!(track.sample_rate(), 8000);
    }

    #[test]
    fn finds_tone_burst() {
        let (signal, start, stop) = burst(8000);
        let intervals = voiced_intervals(&signal, &VadConfig::default()).unwrap();
        assert_eq!(intervals.len(), 1, "{intervals:?}");
        let iv = intervals[0];
        // Frame length is 320 samples; allow a frame of slack at each edge.
        assert!(iv.start.abs_diff(start) < 320, "start {}", iv.start);
        assert!(iv.stop.abs_diff(stop) < 320, "stop {}", iv.stop);
    }

    #[test]
    fn silence_has_no_voice() {
        let signal = Signal::new(vec![0.0; 8000], 8000);
        assert!(voiced_intervals(&signal, &VadConfig::default()).unwrap().is_empty());
    }

    #[test]
    fn same_seed_same_result() {
        let (signal, _, _) = burst(8000);
        let config = VadConfig { seed: 9, ..Default::default() };
        assert_eq!(
            voice_activity(&signal, &config).unwrap(),
            voice_activity(&signal, &config).unwrap()
        );
    }

    #[test]
    fn config_fills_missing_fields() {
        let cfg: VadConfig = serde_json::from_str(r#"{"border": 2.5}"#).unwrap();
        assert_eq!(cfg.border, 2.5);
        assert_eq!(cfg.window, 0.04);
        assert_eq!(cfg.low_pass, 300.0);
    }

    #[test]
    fn rejects_bad_framing() {
        let (signal, _, _) = burst(8000);
        let config = VadConfig { overlap: 1.0, ..Default::default() };
        assert!(voice_activity(&signal, &config).is_err());
    }
}
