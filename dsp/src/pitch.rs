//! Pitch tracking.
//!
//! Every analysis frame inside a voiced interval gets two estimates of its
//! fundamental period:
//!
//! - a coarse one from the spectrum: the magnitude spectrum of a voiced frame
//!   is a comb with teeth one fundamental apart, so the first peak of its
//!   autocorrelation gives the fundamental in bins;
//! - a set of precise candidates from the time domain: the local maxima of
//!   the autocorrelation of the band-limited, center-clipped frame.
//!
//! The candidate closest to the coarse estimate wins. A median filter then
//! removes isolated errors, and runs too short to be physical are dropped.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::autocorr::autocorrelation;
use crate::fft::next_pow2;
use crate::filter::{DigitalFilter, GaussianFilter};
use crate::frame::{check_framing, frame_len, hop_len};
use crate::{DspError, Signal, VoicedInterval, WindowFunction};

/// Pitch tracker settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PitchConfig {
    /// Analysis frame length in seconds.
    pub interval: f64,
    /// Fraction of each frame shared with the next, in [0, 1).
    pub overlap: f64,
    /// High-pass cutoff applied before the time-domain search (Hz).
    pub high_pass: f64,
    /// Low-pass cutoff applied before the time-domain search (Hz).
    pub low_pass: f64,
    pub window: WindowFunction,
    /// Center clipping level for the time-domain search. `None` disables it.
    pub central_limitation: Option<f64>,
    /// Width of the spectral blur and of the median filter. Must be odd.
    pub blur_diameter: usize,
    /// Shortest plausible voiced run in seconds.
    pub min_voiced_length: f64,
    /// Largest relative change between neighbouring frames.
    pub max_jump: f64,
    /// Lowest pitch considered (Hz).
    pub min_frequency: f64,
    /// Highest pitch considered (Hz).
    pub max_frequency: f64,
}

impl Default for PitchConfig {
    fn default() -> Self {
        Self {
            interval: 0.04,
            overlap: 0.95,
            high_pass: 60.0,
            low_pass: 600.0,
            window: WindowFunction::Blackman,
            central_limitation: Some(0.3),
            blur_diameter: 9,
            min_voiced_length: 0.04,
            max_jump: 0.15,
            min_frequency: 60.0,
            max_frequency: 600.0,
        }
    }
}

impl PitchConfig {
    /// Checks framing, blur width, clipping level and pitch range.
    pub fn validate(&self) -> Result<(), DspError> {
        check_framing(self.interval, self.overlap)?;
        if self.blur_diameter == 0 || self.blur_diameter % 2 == 0 {
            return Err(DspError::range(
                "blur diameter",
                format!("must be odd and positive, got {}", self.blur_diameter),
            ));
        }
        if let Some(level) = self.central_limitation {
            if !(0.0..=1.0).contains(&level) {
                return Err(DspError::range(
                    "central limitation",
                    format!("level must be in [0, 1], got {level}"),
                ));
            }
        }
        if !(self.min_voiced_length >= 0.0 && self.min_voiced_length.is_finite()) {
            return Err(DspError::range(
                "minimal voiced length",
                format!("must be non-negative, got {}", self.min_voiced_length),
            ));
        }
        if self.max_jump.is_nan() || self.max_jump < 0.0 {
            return Err(DspError::range(
                "max jump",
                format!("must be non-negative, got {}", self.max_jump),
            ));
        }
        if !(self.min_frequency > 0.0 && self.min_frequency < self.max_frequency) {
            return Err(DspError::range(
                "pitch range",
                format!(
                    "need 0 < min < max, got {}..{} Hz",
                    self.min_frequency, self.max_frequency
                ),
            ));
        }
        Ok(())
    }
}

/// Pitch period per analysis frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PitchTrack {
    /// Period in samples for each frame, 0 where unvoiced.
    pub periods: Vec<f64>,
    pub sample_rate: u32,
    /// Distance between frame starts in samples.
    pub hop: usize,
}

impl PitchTrack {
    /// Number of frames.
    pub fn len(&self) -> usize {
        self.periods.len()
    }

    /// Reports whether the track has no frames.
    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }

    /// Pitch of frame `i` in Hz, 0 where unvoiced.
    pub fn frequency(&self, i: usize) -> f64 {
        match self.periods.get(i) {
            Some(&p) if p > 0.0 => self.sample_rate as f64 / p,
            _ => 0.0,
        }
    }

    /// Pitch of every frame in Hz.
    pub fn hz(&self) -> Vec<f64> {
        (0..self.periods.len()).map(|i| self.frequency(i)).collect()
    }

    /// First sample of frame `i`.
    pub fn frame_offset(&self, i: usize) -> usize {
        i * self.hop
    }

    /// Number of frames with a pitch.
    pub fn voiced_frames(&self) -> usize {
        self.periods.iter().filter(|&&p| p > 0.0).count()
    }
}

/// A time-domain period candidate: lag in samples and its ACF value.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Candidate {
    lag: usize,
    amplitude: f64,
}

/// Tracks the pitch of `signal` inside the given voiced intervals.
///
/// Frames lie on a fixed grid `k * hop` from the first sample; a frame is
/// analyzed when its start falls inside a voiced interval.
pub fn track_pitch(
    signal: &Signal,
    intervals: &[VoicedInterval],
    config: &PitchConfig,
) -> Result<PitchTrack, DspError> {
    config.validate()?;

    let sr = signal.sample_rate() as f64;
    let normalized = signal.normalize();
    let filtered = normalized
        .high_pass(config.high_pass)?
        .low_pass(config.low_pass)?;

    let size = frame_len(config.interval, signal.sample_rate());
    let hop = hop_len(size, config.overlap);
    // Twice the enclosing power of two keeps low harmonics apart after the blur.
    let fft_size = 2 * next_pow2(size);
    let lags = (sr / config.max_frequency).round().max(1.0) as usize
        ..=(sr / config.min_frequency).round() as usize;
    let mut blur = GaussianFilter::new(config.blur_diameter)?;

    let mut periods = Vec::new();
    let mut candidates = Vec::new();
    let mut offset = 0;
    while offset + size < signal.len() {
        if intervals.iter().any(|iv| iv.contains(offset)) {
            let data = normalized
                .extract_interval(offset, size)
                .apply_window(config.window);
            let mut band = filtered
                .extract_interval(offset, size)
                .apply_window(config.window);
            if let Some(level) = config.central_limitation {
                band = band.central_limitation(level)?;
            }

            let acf = band.autocorrelation()?;
            candidates.push(local_maxima(acf.samples(), lags.clone()));

            let mags = data.spectrum(fft_size)?.magnitudes();
            let spectral_acf = autocorrelation(&blur.filter(mags.samples()))?;
            let period = first_peak(&spectral_acf)
                .map(|bin| bin as f64 * sr / fft_size as f64)
                .filter(|hz| *hz > config.min_frequency && *hz < config.max_frequency)
                .map_or(0.0, |hz| sr / hz);
            periods.push(period);
        } else {
            periods.push(0.0);
            candidates.push(Vec::new());
        }
        offset += hop;
    }

    let search = (1.2 * sr / fft_size as f64).ceil();
    refine(&mut periods, &candidates, search);

    let min_frames = config.min_voiced_length * sr / hop as f64;
    median_smooth(&mut periods, config.blur_diameter, config.max_jump, min_frames);
    prune_short_runs(&mut periods, min_frames);

    let track = PitchTrack {
        periods,
        sample_rate: signal.sample_rate(),
        hop,
    };
    debug!(
        "tracked pitch over {} frames, {} voiced",
        track.len(),
        track.voiced_frames()
    );
    Ok(track)
}

/// Local maxima of `acf` with lags in `lags`.
fn local_maxima(acf: &[f64], lags: std::ops::RangeInclusive<usize>) -> Vec<Candidate> {
    let last = acf.len().saturating_sub(2);
    let (lo, hi) = ((*lags.start()).max(1), (*lags.end()).min(last));
    (lo..=hi)
        .filter(|&i| acf[i] > acf[i - 1] && acf[i] > acf[i + 1])
        .map(|lag| Candidate {
            lag,
            amplitude: acf[lag],
        })
        .collect()
}

/// Index of the first local maximum, skipping lag zero.
fn first_peak(acf: &[f64]) -> Option<usize> {
    (1..acf.len().saturating_sub(1)).find(|&i| acf[i] > acf[i - 1] && acf[i] > acf[i + 1])
}

/// Snaps every coarse period to the strongest candidate closer than
/// `search` samples. Ties keep the earliest candidate.
fn refine(periods: &mut [f64], candidates: &[Vec<Candidate>], search: f64) {
    for (period, cands) in periods.iter_mut().zip(candidates) {
        if *period <= 0.0 {
            continue;
        }
        let best = cands
            .iter()
            .filter(|c| (c.lag as f64 - *period).abs() < search)
            .fold(None::<Candidate>, |best, c| match best {
                Some(b) if b.amplitude >= c.amplitude => Some(b),
                _ => Some(*c),
            });
        if let Some(c) = best {
            *period = c.lag as f64;
        }
    }
}

/// In-place running median. A median jumping more than `max_jump`
/// (relative) away from the previous frame marks a voicing break: the next
/// `break_frames` frames are zeroed.
fn median_smooth(img: &mut [f64], diameter: usize, max_jump: f64, break_frames: f64) {
    let half = diameter / 2;
    let n = img.len();
    let mut window = Vec::with_capacity(diameter);
    let mut prev = 0.0_f64;
    for i in half..n {
        window.clear();
        window.extend((i - half..=i + half).map(|j| img.get(j).copied().unwrap_or(0.0)));
        window.sort_by(f64::total_cmp);
        let median = window[half];

        let jump = (median - prev).abs() / prev.max(median);
        if prev > 0.0 && jump > max_jump {
            let mut j = i;
            while (j as f64) < i as f64 + break_frames && j < n {
                img[j] = 0.0;
                j += 1;
            }
        } else {
            img[i] = median;
        }
        prev = img[i];
    }
}

/// Zeroes voiced runs shorter than `min_frames`.
fn prune_short_runs(img: &mut [f64], min_frames: f64) {
    let mut i = 0;
    while i < img.len() {
        if img[i] <= 0.0 {
            i += 1;
            continue;
        }
        let run = img[i..].iter().take_while(|&&p| p > 0.0).count();
        if (run as f64) < min_frames {
            img[i..i + run].iter_mut().for_each(|p| *p = 0.0);
        }
        i += run;
    }
}
