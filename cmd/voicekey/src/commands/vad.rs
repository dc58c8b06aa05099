//! Voiced intervals of a single recording.

use clap::Args;
use serde::Serialize;
use tracing::info;
use voicekey_dsp::voiced_intervals;

use super::{get_config, output_result, read_wav};
use crate::Cli;

/// Prints the voiced intervals found by the activity detector.
#[derive(Args)]
pub struct VadCommand {
    /// Recording to analyze (WAV)
    wav: String,

    /// Output file (default: stdout)
    #[arg(short = 'o', long)]
    output: Option<String>,
}

#[derive(Debug, Serialize)]
struct Interval {
    start: usize,
    stop: usize,
    start_seconds: f64,
    stop_seconds: f64,
}

impl VadCommand {
    pub fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let config = get_config(cli)?;
        let speech = read_wav(&self.wav)?;
        let intervals = voiced_intervals(&speech, &config.vad)?;

        let sr = speech.sample_rate() as f64;
        let report: Vec<Interval> = intervals
            .iter()
            .map(|iv| Interval {
                start: iv.start,
                stop: iv.stop,
                start_seconds: iv.start as f64 / sr,
                stop_seconds: iv.stop as f64 / sr,
            })
            .collect();
        let voiced: usize = intervals.iter().map(|iv| iv.len()).sum();
        info!(
            "{} intervals, {:.2}s voiced of {:.2}s",
            report.len(),
            voiced as f64 / sr,
            speech.duration()
        );
        output_result(&report, self.output.as_deref(), cli.json)
    }
}
