//! Speaker enrollment.

use anyhow::Context;
use clap::Args;
use tracing::info;
use voicekey_verify::{Dictor, KeySize, VoiceFeature};

use super::{get_config, read_wav};
use crate::Cli;

/// Trains a voice key from one recording and writes it as JSON.
#[derive(Args)]
pub struct EnrollCommand {
    /// Enrollment recording (WAV)
    wav: String,

    /// Output key file (default: stdout)
    #[arg(short = 'o', long)]
    output: Option<String>,

    /// Speaker name, used in log messages
    #[arg(long, default_value = "speaker")]
    name: String,

    /// Feature set: pitch, lpc or pitch_and_lp
    #[arg(long, default_value_t = VoiceFeature::default())]
    feature: VoiceFeature,

    /// Key size: tiny, small, standard, large (or 16/32/64/128)
    #[arg(long, default_value_t = KeySize::default())]
    key_size: KeySize,
}

impl EnrollCommand {
    pub fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let config = get_config(cli)?;
        let speech = read_wav(&self.wav)?;
        info!(
            "{}: {:.2}s at {} Hz",
            self.wav,
            speech.duration(),
            speech.sample_rate()
        );

        let dictor = Dictor::with_config(&self.name, speech, self.feature, self.key_size, config);
        let key = dictor
            .key()
            .with_context(|| format!("enroll {}", self.name))?;
        let json = key.to_json()?;

        match self.output.as_deref() {
            Some(path) => {
                std::fs::write(path, &json).with_context(|| format!("write {}", path))?;
                info!(
                    "{} codewords of dim {} written to {}",
                    key.codebook().len(),
                    key.codebook().dim(),
                    path
                );
            }
            None => println!("{}", json),
        }
        Ok(())
    }
}
