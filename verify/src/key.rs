use serde::{Deserialize, Serialize};
use tracing::info;
use voicekey_vq::{CancelToken, CodeBook, DistanceMetric, LbgConfig, LbgTrainer};

use crate::{Solver, Verdict, VerifyError};

/// Current version of the persisted key document.
pub const KEY_FORMAT_VERSION: u32 = 1;

/// A speaker model: a codebook plus the metric it was trained under.
#[derive(Debug, Clone, PartialEq)]
pub struct VoiceKey {
    codebook: CodeBook,
    metric: DistanceMetric,
}

#[derive(Serialize, Deserialize)]
struct KeyDocument {
    version: u32,
    metric: DistanceMetric,
    codebook: CodeBook,
}

impl VoiceKey {
    /// Wraps an already trained codebook.
    pub fn new(codebook: CodeBook, metric: DistanceMetric) -> Self {
        Self { codebook, metric }
    }

    /// Trains a key on `features`. The codebook holds at most
    /// `key_size.next_power_of_two()` codewords.
    pub fn generate(
        features: &[Vec<f64>],
        key_size: usize,
        metric: DistanceMetric,
        lbg: &LbgConfig,
        cancel: &CancelToken,
    ) -> Result<Self, VerifyError> {
        let trainer = LbgTrainer::new(lbg.clone(), metric);
        let (codebook, report) = trainer.train(features, key_size, cancel)?;
        info!(
            "voice key ready: {} codewords of dim {} from {} vectors, distortion {:?}",
            codebook.len(),
            codebook.dim(),
            features.len(),
            report.final_distortion()
        );
        Ok(Self { codebook, metric })
    }

    /// Returns the trained codebook.
    pub fn codebook(&self) -> &CodeBook {
        &self.codebook
    }

    /// Returns the metric the codebook was trained with.
    pub fn metric(&self) -> DistanceMetric {
        self.metric
    }

    /// Distortion energy of `features` against this key.
    pub fn distortion(&self, features: &[Vec<f64>]) -> Result<f64, VerifyError> {
        Ok(self.codebook.distortion_energy(features, self.metric)?)
    }

    pub fn verdict(&self, features: &[Vec<f64>], solver: &dyn Solver) -> Result<Verdict, VerifyError> {
        Ok(solver.verdict(self.distortion(features)?))
    }

    /// Serializes the key as a versioned JSON document.
    pub fn to_json(&self) -> Result<String, VerifyError> {
        let doc = KeyDocument {
            version: KEY_FORMAT_VERSION,
            metric: self.metric,
            codebook: self.codebook.clone(),
        };
        Ok(serde_json::to_string_pretty(&doc)?)
    }

    pub fn from_json(s: &str) -> Result<Self, VerifyError> {
        let doc: KeyDocument = serde_json::from_str(s)?;
        if doc.version != KEY_FORMAT_VERSION {
            return Err(VerifyError::Format(format!(
                "unsupported key version {}, expected {}",
                doc.version, KEY_FORMAT_VERSION
            )));
        }
        Ok(Self {
            codebook: doc.codebook,
            metric: doc.metric,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FuzzySolver, SolutionState};

    fn key() -> VoiceKey {
        let codebook = CodeBook::new(2, vec![vec![0.0, 0.0], vec![10.0, 10.0]]).unwrap();
        VoiceKey::new(codebook, DistanceMetric::Manhattan)
    }

    #[test]
    fn json_keeps_codebook_and_metric() {
        let k = key();
        let json = k.to_json().unwrap();
        assert!(json.contains("\"version\": 1"), "{json}");
        assert!(json.contains("\"manhattan\""), "{json}");
        assert_eq!(VoiceKey::from_json(&json).unwrap(), k);
    }

    #[test]
    fn rejects_other_versions() {
        let json = r#"{"version":2,"metric":"euclidean","codebook":{"dim":1,"codewords":[[1.0]]}}"#;
        assert!(matches!(VoiceKey::from_json(json), Err(VerifyError::Format(_))));
    }

    #[test]
    fn rejects_ragged_codebook() {
        let json = r#"{"version":1,"metric":"euclidean","codebook":{"dim":2,"codewords":[[1.0]]}}"#;
        assert!(matches!(VoiceKey::from_json(json), Err(VerifyError::Format(_))));
    }

    #[test]
    fn distortion_uses_key_metric() {
        // Manhattan distance 3 to the origin codeword, squared.
        assert_eq!(key().distortion(&[vec![1.0, 2.0]]).unwrap(), 9.0);
    }

    #[test]
    fn verdict_goes_through_solver() {
        let v = key()
            .verdict(&[vec![1.0, 2.0]], &FuzzySolver::default())
            .unwrap();
        assert_eq!(v.distortion, 9.0);
        assert_eq!(v.state, SolutionState::Verified);
    }

    #[test]
    fn generate_trains_codebook() {
        let features: Vec<Vec<f64>> = (0..40).map(|i| vec![(i % 2) as f64 * 5.0]).collect();
        let k = VoiceKey::generate(
            &features,
            2,
            DistanceMetric::Euclidean,
            &LbgConfig::default(),
            &CancelToken::new(),
        )
        .unwrap();
        assert_eq!(k.codebook().len(), 2);
        assert_eq!(k.distortion(&features).unwrap(), 0.0);
    }
}
