//! Speaker enrollment and verification.
//!
//! A [`Dictor`] holds one speaker's enrollment speech. On first use it
//! extracts feature vectors, trains a [`VoiceKey`] codebook from them and
//! keeps it. Verifying another utterance measures how well the key
//! quantizes that utterance's features. The resulting distortion energy is
//! mapped to a [`SolutionState`] by a fuzzy [`Solver`].
//!
//! ```text
//! speech -> voiced intervals -> pitch track + LPC frames -> feature vectors
//!        -> VoiceKey (enroll)  |  distortion -> FuzzySolver (verify)
//! ```
//!
//! # Features
//!
//! - [`VoiceFeature::Pitch`]: pitch in Hz per frame
//! - [`VoiceFeature::LinearPrediction`]: LPC coefficients of the voiced region
//! - [`VoiceFeature::PitchAndLp`]: both, aligned frame by frame
//!
//! # Persistence
//!
//! [`VoiceKey::to_json`] writes a versioned document:
//!
//! ```json
//! { "version": 1, "metric": "euclidean", "codebook": { "dim": 11, "codewords": [[...]] } }
//! ```
//!
//! A restored key is attached with [`Dictor::with_key`].

mod config;
mod dictor;
mod error;
mod feature;
mod key;
mod solver;

pub use config::{LpcConfig, VerifierConfig};
pub use dictor::{Dictor, KeySize};
pub use error::VerifyError;
pub use feature::{VoiceFeature, extract_features};
pub use key::{KEY_FORMAT_VERSION, VoiceKey};
pub use solver::{FuzzySolver, FuzzySolverConfig, SolutionState, Solver, Verdict};
