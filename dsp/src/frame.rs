use crate::{DspError, Signal, WindowFunction};

/// A windowed slice of a longer signal.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisFrame {
    /// Position of the first sample in the source signal.
    pub offset: usize,
    pub signal: Signal,
}

/// Frame length in samples for an interval in seconds.
pub fn frame_len(interval: f64, sample_rate: u32) -> usize {
    (interval * sample_rate as f64).round() as usize
}

/// Hop between consecutive frames of length `len` at the given overlap.
pub fn hop_len(len: usize, overlap: f64) -> usize {
    ((len as f64 * (1.0 - overlap)).round() as usize).max(1)
}

pub(crate) fn check_framing(interval: f64, overlap: f64) -> Result<(), DspError> {
    if !(interval > 0.0 && interval.is_finite()) {
        return Err(DspError::range(
            "analysis interval",
            format!("must be positive, got {interval}"),
        ));
    }
    if !(0.0..1.0).contains(&overlap) {
        return Err(DspError::range(
            "overlap",
            format!("must be in [0, 1), got {overlap}"),
        ));
    }
    Ok(())
}

/// Cuts `signal` into frames of `interval` seconds, `overlap` apart, each
/// weighted by `window`. Only frames that end strictly before the last
/// sample are produced.
pub fn split(
    signal: &Signal,
    interval: f64,
    overlap: f64,
    window: WindowFunction,
) -> Result<Vec<AnalysisFrame>, DspError> {
    check_framing(interval, overlap)?;
    let len = frame_len(interval, signal.sample_rate());
    if len == 0 {
        return Err(DspError::range(
            "analysis interval",
            format!("{interval}s is shorter than one sample"),
        ));
    }
    let hop = hop_len(len, overlap);
    let samples = signal.samples();

    let mut frames = Vec::with_capacity(samples.len().saturating_sub(len) / hop + 1);
    let mut offset = 0;
    while offset + len < samples.len() {
        let chunk = window.apply(&samples[offset..offset + len]);
        frames.push(AnalysisFrame {
            offset,
            signal: Signal::with_format(chunk, signal.format()),
        });
        offset += hop;
    }
    Ok(frames)
}
