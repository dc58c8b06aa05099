use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::VqError;

/// Distance between feature vectors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    /// Sum of squared differences (no square root).
    #[default]
    Euclidean,
    /// Sum of absolute differences.
    Manhattan,
}

impl DistanceMetric {
    /// Distance between `a` and `b`. Both must have the same length.
    pub fn distance(&self, a: &[f64], b: &[f64]) -> Result<f64, VqError> {
        if a.len() != b.len() {
            return Err(VqError::DimensionMismatch {
                expected: a.len(),
                got: b.len(),
            });
        }
        Ok(self.distance_unchecked(a, b))
    }

    /// Distance over the common prefix of `a` and `b`.
    pub(crate) fn distance_unchecked(&self, a: &[f64], b: &[f64]) -> f64 {
        let pairs = a.iter().zip(b);
        match self {
            Self::Euclidean => pairs.map(|(x, y)| (x - y) * (x - y)).sum(),
            Self::Manhattan => pairs.map(|(x, y)| (x - y).abs()).sum(),
        }
    }
}

impl fmt::Display for DistanceMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Euclidean => write!(f, "euclidean"),
            Self::Manhattan => write!(f, "manhattan"),
        }
    }
}

impl FromStr for DistanceMetric {
    type Err = VqError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "euclidean" | "euclidian" => Ok(Self::Euclidean),
            "manhattan" => Ok(Self::Manhattan),
            _ => Err(VqError::UnknownVariant {
                kind: "metric",
                value: s.to_string(),
            }),
        }
    }
}
