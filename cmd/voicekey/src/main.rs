//! voicekey CLI - speaker enrollment and verification over WAV files.

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{EnrollCommand, PitchCommand, VadCommand, VerifyCommand};

/// voicekey - speaker verification experiments.
///
/// Enroll a speaker from a WAV recording into a JSON voice key, then check
/// other recordings against it. The `pitch` and `vad` commands print the
/// intermediate analysis of a single recording.
#[derive(Parser)]
#[command(name = "voicekey")]
#[command(about = "Speaker enrollment and verification tool")]
#[command(version)]
pub struct Cli {
    /// Analysis settings (YAML or JSON). Missing values use the defaults.
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Output as JSON (for piping)
    #[arg(long, global = true)]
    pub json: bool,

    /// Verbose output
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Train a voice key from an enrollment recording
    Enroll(EnrollCommand),
    /// Check a recording against a voice key
    Verify(VerifyCommand),
    /// Print the pitch track of a recording
    Pitch(PitchCommand),
    /// Print the voiced intervals of a recording
    Vad(VadCommand),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match &cli.command {
        Commands::Enroll(cmd) => cmd.run(&cli),
        Commands::Verify(cmd) => cmd.run(&cli),
        Commands::Pitch(cmd) => cmd.run(&cli),
        Commands::Vad(cmd) => cmd.run(&cli),
    }
}
