//! Utility functions for CLI commands.

use std::path::Path;

use anyhow::Context;
use voicekey_dsp::Signal;
use voicekey_verify::VerifierConfig;

use crate::Cli;

/// Loads analysis settings from `--config`, or the defaults.
pub fn get_config(cli: &Cli) -> anyhow::Result<VerifierConfig> {
    match cli.config.as_deref() {
        Some(path) => load_request(path).with_context(|| format!("load config {}", path)),
        None => Ok(VerifierConfig::default()),
    }
}

/// Reads a settings file. `.json` files are parsed as JSON, anything else
/// as YAML.
pub fn load_request<T: serde::de::DeserializeOwned>(path: &str) -> anyhow::Result<T> {
    let text = std::fs::read_to_string(path)?;
    let is_json = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));
    if is_json {
        Ok(serde_json::from_str(&text)?)
    } else {
        Ok(serde_yaml::from_str(&text)?)
    }
}

/// Reads a WAV file as a mono signal in [-1, 1]. Multi-channel audio is
/// averaged down to one channel.
pub fn read_wav(path: &str) -> anyhow::Result<Signal> {
    let mut reader = hound::WavReader::open(path).with_context(|| format!("open {}", path))?;
    let format = reader.spec();
    let channels = format.channels.max(1) as usize;

    let interleaved: Vec<f64> = match format.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .map(|s| s.map(f64::from))
            .collect::<Result<_, _>>()?,
        hound::SampleFormat::Int => {
            let scale = (1i64 << (format.bits_per_sample.max(1) - 1)) as f64;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f64 / scale))
                .collect::<Result<_, _>>()?
        }
    };

    let samples = interleaved
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f64>() / frame.len() as f64)
        .collect();
    Ok(Signal::new(samples, format.sample_rate))
}

/// Writes a report as pretty JSON (`--json`) or YAML, to `path` or stdout.
pub fn output_result<T: serde::Serialize>(
    report: &T,
    path: Option<&str>,
    as_json: bool,
) -> anyhow::Result<()> {
    let text = if as_json {
        serde_json::to_string_pretty(report)? + "\n"
    } else {
        serde_yaml::to_string(report)?
    };
    match path {
        Some(path) => std::fs::write(path, text).with_context(|| format!("write {}", path))?,
        None => print!("{}", text),
    }
    Ok(())
}
