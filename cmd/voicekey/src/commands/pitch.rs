//! Pitch track of a single recording.

use clap::Args;
use serde::Serialize;
use tracing::info;
use voicekey_dsp::{track_pitch, voiced_intervals};

use super::{get_config, output_result, read_wav};
use crate::Cli;

/// Prints the pitch of every analysis frame.
#[derive(Args)]
pub struct PitchCommand {
    /// Recording to analyze (WAV)
    wav: String,

    /// Output file (default: stdout)
    #[arg(short = 'o', long)]
    output: Option<String>,

    /// Only list frames with a pitch
    #[arg(long)]
    voiced_only: bool,
}

#[derive(Debug, Serialize)]
struct PitchReport {
    sample_rate: u32,
    hop: usize,
    frames: Vec<PitchFrame>,
}

#[derive(Debug, Serialize)]
struct PitchFrame {
    time: f64,
    hz: f64,
}

impl PitchCommand {
    pub fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let config = get_config(cli)?;
        let speech = read_wav(&self.wav)?;
        let intervals = voiced_intervals(&speech, &config.vad)?;
        let track = track_pitch(&speech, &intervals, &config.pitch)?;
        info!("{} of {} frames voiced", track.voiced_frames(), track.len());

        let sr = speech.sample_rate() as f64;
        let frames = (0..track.len())
            .map(|i| PitchFrame {
                time: track.frame_offset(i) as f64 / sr,
                hz: track.frequency(i),
            })
            .filter(|f| !self.voiced_only || f.hz > 0.0)
            .collect();
        let report = PitchReport {
            sample_rate: track.sample_rate,
            hop: track.hop,
            frames,
        };
        output_result(&report, self.output.as_deref(), cli.json)
    }
}
