use thiserror::Error;

/// Errors returned by codebook training and quantization.
#[derive(Debug, Error)]
pub enum VqError {
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("training set is empty")]
    EmptyTrainingSet,

    #[error("invalid codebook size: {0}")]
    InvalidSize(usize),

    #[error("training cancelled")]
    Cancelled,

    #[error("unknown {kind}: {value:?}")]
    UnknownVariant { kind: &'static str, value: String },

    #[error("codebook format: {0}")]
    Format(String),
}

impl From<serde_json::Error> for VqError {
    fn from(e: serde_json::Error) -> Self {
        VqError::Format(e.to_string())
    }
}
