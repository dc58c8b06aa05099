use serde::{Deserialize, Serialize};
use voicekey_dsp::{PitchConfig, VadConfig, WindowFunction};
use voicekey_vq::LbgConfig;

use crate::FuzzySolverConfig;

/// Linear prediction analysis settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LpcConfig {
    /// Number of predictor coefficients per frame.
    pub order: usize,
    /// Frame length in seconds.
    pub interval: f64,
    /// Fraction of a frame shared with the next one.
    pub overlap: f64,
    pub window: WindowFunction,
}

impl Default for LpcConfig {
    fn default() -> Self {
        Self {
            order: 10,
            interval: 0.04,
            overlap: 0.95,
            window: WindowFunction::Blackman,
        }
    }
}

/// Every tunable of the enrollment and verification pipeline.
///
/// Each section falls back to its defaults when missing, so a YAML file
/// only needs the values it changes:
///
/// ```yaml
/// lbg:
///   seed: 7
/// solver:
///   verify_border: 0.6
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifierConfig {
    pub vad: VadConfig,
    pub pitch: PitchConfig,
    pub lpc: LpcConfig,
    pub lbg: LbgConfig,
    pub solver: FuzzySolverConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_sections_use_defaults() {
        let cfg: VerifierConfig =
            serde_json::from_str(r#"{"lpc":{"order":12},"lbg":{"seed":7}}"#).unwrap();
        assert_eq!(cfg.lpc.order, 12);
        assert_eq!(cfg.lpc.window, WindowFunction::Blackman);
        assert_eq!(cfg.lbg.seed, 7);
        assert_eq!(cfg.lbg.max_iterations, 50);
        assert_eq!(cfg.vad, VadConfig::default());
        assert_eq!(cfg.solver.verify_border, 0.5);
    }
}
