//! Signal processing for speaker verification.
//!
//! # Overview
//!
//! Everything operates on [`Signal`], a sample buffer tagged with its
//! [`SampleFormat`]. Transforms are pure: they return a new signal and
//! leave their input alone.
//!
//! ```text
//! samples -> Signal -> filters / windows / frames
//!                   -> autocorrelation, spectrum, LPC   (per frame)
//!                   -> voiced_intervals -> track_pitch  (per utterance)
//! ```
//!
//! # Building blocks
//!
//! - [`fft`]: radix-2 transform; forward scaled by `1/size`, backward
//!   unscaled
//! - [`filter`]: Butterworth low/high/band-pass and Gaussian smoothing
//! - [`autocorrelation`] via the Wiener-Khinchin theorem
//! - [`linear_prediction`] by the Durbin-Levinson recursion
//! - [`WindowFunction`]: rectangular, Hamming and Blackman tapers
//!
//! # Speech analysis
//!
//! - [`voiced_intervals`]: frame energy and correlation combined into a
//!   voice activity score, thresholded into [`VoicedInterval`]s
//! - [`track_pitch`]: spectral and time-domain period estimates fused per
//!   frame, then median-smoothed into a [`PitchTrack`]

mod autocorr;
mod basic;
mod complex;
mod error;
pub mod fft;
pub mod filter;
mod frame;
mod lpc;
mod pitch;
mod signal;
mod vad;
mod window;

pub use autocorr::autocorrelation;
pub use basic::{NoisySignal, central_limitation, correlation, energy, normalize};
pub use complex::Complex;
pub use error::DspError;
pub use frame::{AnalysisFrame, frame_len, hop_len, split};
pub use lpc::{durbin, linear_prediction};
pub use pitch::{PitchConfig, PitchTrack, track_pitch};
pub use signal::{SampleFormat, Signal, Spectrum};
pub use vad::{VadConfig, VoicedInterval, threshold_runs, voice_activity, voiced_intervals};
pub use window::WindowFunction;
