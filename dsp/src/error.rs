use thiserror::Error;

/// Errors returned by signal processing operations.
#[derive(Debug, Error, PartialEq)]
pub enum DspError {
    #[error("transform size must be a power of two, got {0}")]
    InvalidTransformSize(usize),

    #[error("prediction order must be at least 1, got {0}")]
    InvalidOrder(usize),

    #[error("{name} out of range: {reason}")]
    InvalidRange { name: &'static str, reason: String },

    #[error("unknown {kind}: {value:?}")]
    UnknownVariant { kind: &'static str, value: String },

    #[error("sample rate mismatch: expected {expected}, got {got}")]
    SampleRateMismatch { expected: u32, got: u32 },

    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },
}

impl DspError {
    pub(crate) fn range(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidRange {
            name,
            reason: reason.into(),
        }
    }
}
