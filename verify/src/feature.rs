use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;
use voicekey_dsp::{Signal, VoicedInterval, frame_len, hop_len, track_pitch, voiced_intervals};

use crate::{VerifierConfig, VerifyError};

/// Which acoustic features describe a speaker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoiceFeature {
    /// Pitch in Hz, one value per frame.
    Pitch,
    /// Linear prediction coefficients of the voiced region.
    LinearPrediction,
    /// Prediction coefficients followed by the pitch of the same frame.
    #[default]
    PitchAndLp,
}

impl fmt::Display for VoiceFeature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pitch => write!(f, "pitch"),
            Self::LinearPrediction => write!(f, "linear_prediction"),
            Self::PitchAndLp => write!(f, "pitch_and_lp"),
        }
    }
}

impl FromStr for VoiceFeature {
    type Err = VerifyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "pitch" => Ok(Self::Pitch),
            "linear_prediction" | "lpc" | "lp" => Ok(Self::LinearPrediction),
            "pitch_and_lp" | "pitch_lpc" | "fused" => Ok(Self::PitchAndLp),
            _ => Err(VerifyError::UnknownVariant {
                kind: "voice feature",
                value: s.to_string(),
            }),
        }
    }
}

/// Extracts one feature vector per analysis frame of `speech`.
///
/// Fails with [`VerifyError::NoVoicedSpeech`] when the detector finds
/// nothing to analyze.
pub fn extract_features(
    speech: &Signal,
    feature: VoiceFeature,
    config: &VerifierConfig,
) -> Result<Vec<Vec<f64>>, VerifyError> {
    let intervals = voiced_intervals(speech, &config.vad)?;
    let (Some(first), Some(last)) = (intervals.first(), intervals.last()) else {
        return Err(VerifyError::NoVoicedSpeech);
    };
    let region = VoicedInterval {
        start: first.start,
        stop: last.stop,
    };

    let features = match feature {
        VoiceFeature::Pitch => pitch_features(speech, &intervals, config)?
            .into_iter()
            .map(|hz| vec![hz])
            .collect(),
        VoiceFeature::LinearPrediction => lpc_features(speech, region, config)?,
        VoiceFeature::PitchAndLp => {
            let pitch = pitch_features(speech, &intervals, config)?;
            let lpc = lpc_features(speech, region, config)?;
            let hop = hop_len(
                frame_len(config.pitch.interval, speech.sample_rate()),
                config.pitch.overlap,
            );
            let skip = (region.start as f64 / hop as f64).round() as usize;
            fuse(&lpc, &pitch, skip, config.lpc.order)
        }
    };
    debug!(
        "extracted {} {} vectors from {} voiced intervals",
        features.len(),
        feature,
        intervals.len()
    );
    Ok(features)
}

fn pitch_features(
    speech: &Signal,
    intervals: &[VoicedInterval],
    config: &VerifierConfig,
) -> Result<Vec<f64>, VerifyError> {
    Ok(track_pitch(speech, intervals, &config.pitch)?.hz())
}

fn lpc_features(
    speech: &Signal,
    region: VoicedInterval,
    config: &VerifierConfig,
) -> Result<Vec<Vec<f64>>, VerifyError> {
    let lpc = &config.lpc;
    speech
        .extract_interval(region.start, region.len())
        .split(lpc.interval, lpc.overlap, lpc.window)?
        .iter()
        .map(|frame| {
            frame
                .signal
                .linear_prediction(lpc.order)
                .map_err(VerifyError::from)
        })
        .collect()
}

/// Aligns the LPC track, which starts `skip` frames into the signal, with
/// the pitch track, which starts at sample 0. A missing frame on either
/// side contributes zeros.
fn fuse(lpc: &[Vec<f64>], pitch: &[f64], skip: usize, order: usize) -> Vec<Vec<f64>> {
    let n = (skip + lpc.len()).max(pitch.len());
    (0..n)
        .map(|i| {
            let mut v = match i.checked_sub(skip).and_then(|j| lpc.get(j)) {
                Some(coeffs) => coeffs.clone(),
                None => vec![0.0; order],
            };
            v.push(pitch.get(i).copied().unwrap_or(0.0));
            v
        })
        .collect()
}
