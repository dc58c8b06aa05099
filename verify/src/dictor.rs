use std::fmt;
use std::str::FromStr;

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use tracing::debug;
use voicekey_dsp::Signal;
use voicekey_vq::{CancelToken, DistanceMetric};

use crate::{
    FuzzySolver, SolutionState, Verdict, VerifierConfig, VerifyError, VoiceFeature, VoiceKey,
    extract_features,
};

/// Upper bound on the number of codewords in a voice key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeySize {
    Tiny,
    Small,
    #[default]
    Standard,
    Large,
}

impl KeySize {
    pub fn size(&self) -> usize {
        match self {
            Self::Tiny => 16,
            Self::Small => 32,
            Self::Standard => 64,
            Self::Large => 128,
        }
    }
}

impl fmt::Display for KeySize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tiny => write!(f, "tiny"),
            Self::Small => write!(f, "small"),
            Self::Standard => write!(f, "standard"),
            Self::Large => write!(f, "large"),
        }
    }
}

impl FromStr for KeySize {
    type Err = VerifyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "tiny" | "16" => Ok(Self::Tiny),
            "small" | "32" => Ok(Self::Small),
            "standard" | "64" => Ok(Self::Standard),
            "large" | "128" => Ok(Self::Large),
            _ => Err(VerifyError::UnknownVariant {
                kind: "key size",
                value: s.to_string(),
            }),
        }
    }
}

/// An enrolled speaker.
///
/// The voice key is trained from `speech` on first use and never changes
/// afterwards. Enrolling again means building a new `Dictor`.
#[derive(Debug)]
pub struct Dictor {
    name: String,
    speech: Signal,
    feature: VoiceFeature,
    key_size: KeySize,
    metric: DistanceMetric,
    config: VerifierConfig,
    solver: FuzzySolver,
    key: OnceCell<VoiceKey>,
}

impl Dictor {
    /// Creates a dictor with the default analysis settings.
    pub fn new(
        name: impl Into<String>,
        speech: Signal,
        feature: VoiceFeature,
        key_size: KeySize,
    ) -> Self {
        Self::with_config(name, speech, feature, key_size, VerifierConfig::default())
    }

    /// Creates a dictor with the given analysis settings.
    pub fn with_config(
        name: impl Into<String>,
        speech: Signal,
        feature: VoiceFeature,
        key_size: KeySize,
        config: VerifierConfig,
    ) -> Self {
        let solver = FuzzySolver::new(config.solver.clone());
        Self {
            name: name.into(),
            speech,
            feature,
            key_size,
            metric: DistanceMetric::default(),
            config,
            solver,
            key: OnceCell::new(),
        }
    }

    /// Attaches a previously trained key, skipping enrollment.
    pub fn with_key(mut self, key: VoiceKey) -> Self {
        self.metric = key.metric();
        self.key = OnceCell::with_value(key);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn speech(&self) -> &Signal {
        &self.speech
    }

    pub fn feature(&self) -> VoiceFeature {
        self.feature
    }

    pub fn key_size(&self) -> KeySize {
        self.key_size
    }

    pub fn config(&self) -> &VerifierConfig {
        &self.config
    }

    /// The voice key, trained on first access.
    pub fn key(&self) -> Result<&VoiceKey, VerifyError> {
        self.key_with_cancel(&CancelToken::new())
    }

    /// Like [`Dictor::key`], but training stops early once `cancel` fires.
    /// A cancelled attempt leaves the key untrained.
    pub fn key_with_cancel(&self, cancel: &CancelToken) -> Result<&VoiceKey, VerifyError> {
        self.key.get_or_try_init(|| {
            debug!("enrolling {} with {} features", self.name, self.feature);
            let features = extract_features(&self.speech, self.feature, &self.config)?;
            VoiceKey::generate(
                &features,
                self.key_size.size(),
                self.metric,
                &self.config.lbg,
                cancel,
            )
        })
    }

    /// Scores `speech` against this speaker's key.
    ///
    /// `speech` must share the enrollment sample rate. A dictor restored
    /// from a key with no enrollment speech accepts any rate.
    pub fn verdict(&self, speech: &Signal) -> Result<Verdict, VerifyError> {
        if !self.speech.is_empty() {
            self.speech.check_compatible(speech)?;
        }
        let key = self.key()?;
        let features = extract_features(speech, self.feature, &self.config)?;
        let verdict = key.verdict(&features, &self.solver)?;
        debug!(
            "{}: distortion {:.3} own {:.3} foreign {:.3} -> {}",
            self.name, verdict.distortion, verdict.own, verdict.foreign, verdict.state
        );
        Ok(verdict)
    }

    /// Like [`Dictor::verdict`], keeping only the decision.
    pub fn verify(&self, speech: &Signal) -> Result<SolutionState, VerifyError> {
        Ok(self.verdict(speech)?.state)
    }
}

#[cfg(test)]
mod tests {
    use std::f64::consts::PI;

    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use voicekey_dsp::DspError;
    use voicekey_vq::{CodeBook, VqError};

    use super::*;

    /// Half a second of silence around a second of a 110 Hz harmonic voice.
    fn enrollment() -> Signal {
        let sr = 8000.0;
        let voice: Vec<f64> = (0..8000)
            .map(|i| {
                let t = i as f64 / sr;
                (1..=12)
                    .map(|k| (2.0 * PI * 110.0 * k as f64 * t).sin() / k as f64)
                    .sum()
            })
            .collect();
        let peak = voice.iter().fold(0.0f64, |m, x| m.max(x.abs()));
        let mut samples = vec![0.0; 4000];
        samples.extend(voice.iter().map(|x| 0.8 * x / peak));
        samples.resize(16000, 0.0);
        let mut rng = StdRng::seed_from_u64(7);
        Signal::new(samples, 8000)
            .add_noise(1e-3, 4000..12000, &mut rng)
            .unwrap()
            .signal
    }

    #[test]
    fn key_sizes() {
        let sizes: Vec<usize> = [KeySize::Tiny, KeySize::Small, KeySize::Standard, KeySize::Large]
            .iter()
            .map(KeySize::size)
            .collect();
        assert_eq!(sizes, vec![16, 32, 64, 128]);
        assert_eq!(KeySize::default(), KeySize::Standard);
        assert_eq!("64".parse::<KeySize>().unwrap(), KeySize::Standard);
        assert_eq!("Large".parse::<KeySize>().unwrap(), KeySize::Large);
        assert!("huge".parse::<KeySize>().is_err());
    }

    #[test]
    fn silent_enrollment_fails() {
        let dictor = Dictor::new(
            "nobody",
            Signal::new(vec![0.0; 8000], 8000),
            VoiceFeature::default(),
            KeySize::default(),
        );
        assert!(matches!(dictor.key(), Err(VerifyError::NoVoicedSpeech)));
    }

    #[test]
    fn restored_key_is_used_as_is() {
        let codebook = CodeBook::new(1, vec![vec![1.0]]).unwrap();
        let key = VoiceKey::new(codebook, DistanceMetric::Manhattan);
        let dictor = Dictor::new(
            "restored",
            Signal::new(vec![0.0; 10], 8000),
            VoiceFeature::Pitch,
            KeySize::Tiny,
        )
        .with_key(key.clone());
        assert_eq!(dictor.key().unwrap(), &key);
        assert_eq!(dictor.name(), "restored");
        assert_eq!(dictor.feature(), VoiceFeature::Pitch);
    }

    #[test]
    fn failed_enrollment_leaves_key_untrained() {
        let dictor = Dictor::new(
            "nobody",
            Signal::new(vec![0.0; 8000], 8000),
            VoiceFeature::default(),
            KeySize::default(),
        );
        let cancel = CancelToken::new();
        cancel.cancel();
        assert!(dictor.key_with_cancel(&cancel).is_err());
        assert!(dictor.key.get().is_none());
        assert!(dictor.key().is_err());
    }

    #[test]
    fn cancelled_training_can_be_retried() {
        let dictor = Dictor::new(
            "alice",
            enrollment(),
            VoiceFeature::default(),
            KeySize::Tiny,
        );
        let cancel = CancelToken::new();
        cancel.cancel();
        assert!(matches!(
            dictor.key_with_cancel(&cancel),
            Err(VerifyError::Vq(VqError::Cancelled))
        ));
        assert!(dictor.key.get().is_none());

        let key = dictor.key().unwrap();
        assert!(!key.codebook().is_empty());
        assert!(dictor.key.get().is_some());
    }

    #[test]
    fn rejects_speech_at_another_rate() {
        let codebook = CodeBook::new(1, vec![vec![110.0]]).unwrap();
        let dictor = Dictor::new(
            "alice",
            Signal::new(vec![0.0; 10], 8000),
            VoiceFeature::Pitch,
            KeySize::Tiny,
        )
        .with_key(VoiceKey::new(codebook, DistanceMetric::Euclidean));
        let other = Signal::new(vec![0.0; 16000], 16000);
        assert!(matches!(
            dictor.verdict(&other),
            Err(VerifyError::Dsp(DspError::SampleRateMismatch {
                expected: 8000,
                got: 16000
            }))
        ));
    }
}
