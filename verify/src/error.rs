use thiserror::Error;
use voicekey_dsp::DspError;
use voicekey_vq::VqError;

/// Errors returned by enrollment and verification.
#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("signal processing: {0}")]
    Dsp(#[from] DspError),

    #[error("vector quantization: {0}")]
    Vq(#[from] VqError),

    #[error("no voiced speech found")]
    NoVoicedSpeech,

    #[error("unknown {kind}: {value:?}")]
    UnknownVariant { kind: &'static str, value: String },

    #[error("voice key format: {0}")]
    Format(String),
}

impl From<serde_json::Error> for VerifyError {
    fn from(e: serde_json::Error) -> Self {
        VerifyError::Format(e.to_string())
    }
}
