use serde::{Deserialize, Serialize};

use crate::{DistanceMetric, VqError};

/// A set of codewords sharing one dimension.
///
/// Every codeword has exactly `dim` components. Deserialization enforces
/// the same check as [`CodeBook::new`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCodeBook")]
pub struct CodeBook {
    dim: usize,
    codewords: Vec<Vec<f64>>,
}

#[derive(Deserialize)]
struct RawCodeBook {
    dim: usize,
    codewords: Vec<Vec<f64>>,
}

impl TryFrom<RawCodeBook> for CodeBook {
    type Error = VqError;

    fn try_from(raw: RawCodeBook) -> Result<Self, Self::Error> {
        CodeBook::new(raw.dim, raw.codewords)
    }
}

impl CodeBook {
    /// Creates a codebook, checking that every codeword has `dim` components.
    pub fn new(dim: usize, codewords: Vec<Vec<f64>>) -> Result<Self, VqError> {
        if dim == 0 {
            return Err(VqError::InvalidSize(0));
        }
        if let Some(bad) = codewords.iter().find(|c| c.len() != dim) {
            return Err(VqError::DimensionMismatch {
                expected: dim,
                got: bad.len(),
            });
        }
        Ok(Self { dim, codewords })
    }

    /// Returns the codeword dimension.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Returns the number of codewords.
    pub fn len(&self) -> usize {
        self.codewords.len()
    }

    /// Reports whether the codebook has no codewords.
    pub fn is_empty(&self) -> bool {
        self.codewords.is_empty()
    }

    /// Returns all codewords.
    pub fn codewords(&self) -> &[Vec<f64>] {
        &self.codewords
    }

    /// Returns codeword `i`, if any.
    pub fn codeword(&self, i: usize) -> Option<&[f64]> {
        self.codewords.get(i).map(Vec::as_slice)
    }

    /// Index of the nearest codeword and its distance. Ties go to the lowest
    /// index.
    pub fn nearest(&self, x: &[f64], metric: DistanceMetric) -> Result<(usize, f64), VqError> {
        self.check_dim(x)?;
        self.nearest_unchecked(x, metric)
            .ok_or(VqError::InvalidSize(0))
    }

    pub(crate) fn nearest_unchecked(&self, x: &[f64], metric: DistanceMetric) -> Option<(usize, f64)> {
        let mut best: Option<(usize, f64)> = None;
        for (i, c) in self.codewords.iter().enumerate() {
            let d = metric.distance_unchecked(x, c);
            if best.is_none_or(|(_, b)| d < b) {
                best = Some((i, d));
            }
        }
        best
    }

    /// Index of the codeword nearest to `x`.
    pub fn quantization_index(&self, x: &[f64], metric: DistanceMetric) -> Result<usize, VqError> {
        Ok(self.nearest(x, metric)?.0)
    }

    /// The codeword nearest to `x`.
    pub fn quantize(&self, x: &[f64], metric: DistanceMetric) -> Result<&[f64], VqError> {
        let i = self.quantization_index(x, metric)?;
        Ok(&self.codewords[i])
    }

    /// Mean distance from each vector to its nearest codeword.
    pub fn average_distortion(
        &self,
        set: &[Vec<f64>],
        metric: DistanceMetric,
    ) -> Result<f64, VqError> {
        self.mean_over(set, metric, |d| d)
    }

    /// Mean squared distance from each vector to its nearest codeword.
    pub fn distortion_energy(
        &self,
        set: &[Vec<f64>],
        metric: DistanceMetric,
    ) -> Result<f64, VqError> {
        self.mean_over(set, metric, |d| d * d)
    }

    /// Number of vectors of `set` quantized to each codeword.
    pub fn usage(&self, set: &[Vec<f64>], metric: DistanceMetric) -> Result<Vec<usize>, VqError> {
        let mut counts = vec![0; self.codewords.len()];
        for x in set {
            counts[self.quantization_index(x, metric)?] += 1;
        }
        Ok(counts)
    }

    /// Drops every codeword that no vector of `set` maps to.
    pub fn clear(&self, set: &[Vec<f64>], metric: DistanceMetric) -> Result<CodeBook, VqError> {
        let counts = self.usage(set, metric)?;
        let codewords = self
            .codewords
            .iter()
            .zip(counts)
            .filter(|(_, n)| *n > 0)
            .map(|(c, _)| c.clone())
            .collect();
        Ok(CodeBook {
            dim: self.dim,
            codewords,
        })
    }

    fn mean_over(
        &self,
        set: &[Vec<f64>],
        metric: DistanceMetric,
        f: impl Fn(f64) -> f64,
    ) -> Result<f64, VqError> {
        if set.is_empty() {
            return Err(VqError::EmptyTrainingSet);
        }
        let mut total = 0.0;
        for x in set {
            total += f(self.nearest(x, metric)?.1);
        }
        Ok(total / set.len() as f64)
    }

    fn check_dim(&self, x: &[f64]) -> Result<(), VqError> {
        if x.len() != self.dim {
            return Err(VqError::DimensionMismatch {
                expected: self.dim,
                got: x.len(),
            });
        }
        Ok(())
    }
}
