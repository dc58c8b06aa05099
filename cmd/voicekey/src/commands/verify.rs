//! Verification against a stored voice key.

use anyhow::Context;
use clap::Args;
use tracing::{info, warn};
use voicekey_verify::{Dictor, KeySize, SolutionState, VoiceFeature, VoiceKey};

use super::{get_config, output_result, read_wav};
use crate::Cli;

/// Checks a recording against a voice key.
#[derive(Args)]
pub struct VerifyCommand {
    /// Recording to check (WAV)
    wav: String,

    /// Voice key file produced by `enroll`
    #[arg(short = 'k', long)]
    key: String,

    /// Feature set the key was trained on (default: inferred from the key)
    #[arg(long)]
    feature: Option<VoiceFeature>,
}

impl VerifyCommand {
    pub fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let config = get_config(cli)?;
        let json = std::fs::read_to_string(&self.key)
            .with_context(|| format!("read {}", self.key))?;
        let key = VoiceKey::from_json(&json)?;

        let feature = match self.feature {
            Some(f) => f,
            None => infer_feature(key.codebook().dim(), config.lpc.order).with_context(|| {
                format!(
                    "cannot tell the feature set of a {}-dimensional key, use --feature",
                    key.codebook().dim()
                )
            })?,
        };

        let speech = read_wav(&self.wav)?;
        let dictor = Dictor::with_config(
            self.key.as_str(),
            speech.clone(),
            feature,
            KeySize::default(),
            config,
        )
        .with_key(key);
        let verdict = dictor.verdict(&speech)?;

        output_result(&verdict, None, cli.json)?;
        match verdict.state {
            SolutionState::Verified => info!("{}: verified", self.wav),
            state => warn!("{}: {}", self.wav, state),
        }
        Ok(())
    }
}

/// Feature set implied by the codebook dimension.
fn infer_feature(dim: usize, order: usize) -> Option<VoiceFeature> {
    match dim {
        1 => Some(VoiceFeature::Pitch),
        d if d == order => Some(VoiceFeature::LinearPrediction),
        d if d == order + 1 => Some(VoiceFeature::PitchAndLp),
        _ => None,
    }
}
