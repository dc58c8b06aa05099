use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::DspError;

/// Taper applied to an analysis frame before spectral analysis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowFunction {
    /// No weighting.
    #[default]
    Rectangular,
    Hamming,
    Blackman,
}

impl WindowFunction {
    /// Returns the weight of sample `i` in a frame of length `n`.
    pub fn coefficient(&self, i: usize, n: usize) -> f64 {
        let phase = 2.0 * PI * i as f64 / n as f64;
        match self {
            Self::Rectangular => 1.0,
            Self::Hamming => 0.54 - 0.46 * phase.cos(),
            Self::Blackman => {
                const A: f64 = 0.16;
                0.5 * (1.0 - A) - 0.5 * phase.cos() + 0.5 * A * (2.0 * phase).cos()
            }
        }
    }

    /// Returns a weighted copy of `samples`.
    pub fn apply(&self, samples: &[f64]) -> Vec<f64> {
        let n = samples.len();
        match self {
            Self::Rectangular => samples.to_vec(),
            _ => samples
                .iter()
                .enumerate()
                .map(|(i, &x)| x * self.coefficient(i, n))
                .collect(),
        }
    }
}

impl fmt::Display for WindowFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rectangular => write!(f, "rectangular"),
            Self::Hamming => write!(f, "hamming"),
            Self::Blackman => write!(f, "blackman"),
        }
    }
}

impl FromStr for WindowFunction {
    type Err = DspError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "rectangular" | "rect" | "none" => Ok(Self::Rectangular),
            "hamming" => Ok(Self::Hamming),
            "blackman" => Ok(Self::Blackman),
            _ => Err(DspError::UnknownVariant {
                kind: "window function",
                value: s.to_string(),
            }),
        }
    }
}
