//! Vector quantization for speaker models.
//!
//! A speaker is modelled by a [`CodeBook`]: a small set of codewords that
//! summarises the speaker's feature vectors. [`LbgTrainer`] builds one by
//! repeated splitting and K-means refinement; the codebook then scores new
//! vectors by how far they land from their nearest codeword.
//!
//! ```
//! use voicekey_vq::{CancelToken, DistanceMetric, LbgConfig, LbgTrainer};
//!
//! let set: Vec<Vec<f64>> = (0..40).map(|i| vec![(i % 4) as f64 * 10.0]).collect();
//! let trainer = LbgTrainer::new(LbgConfig::default(), DistanceMetric::Euclidean);
//! let (codebook, _report) = trainer.train(&set, 4, &CancelToken::new()).unwrap();
//! assert_eq!(codebook.len(), 4);
//! assert_eq!(codebook.distortion_energy(&set, DistanceMetric::Euclidean).unwrap(), 0.0);
//! ```
//!
//! Training is parallel (rayon) but deterministic: per-cluster sums are
//! reduced in a fixed order and every random draw comes from a generator
//! seeded from [`LbgConfig::seed`].

mod cancel;
mod codebook;
mod error;
mod lbg;
mod metric;

pub use cancel::CancelToken;
pub use codebook::CodeBook;
pub use error::VqError;
pub use lbg::{LbgConfig, LbgTrainer, TrainingReport, TrainingStage};
pub use metric::DistanceMetric;
