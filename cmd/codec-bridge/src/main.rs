//! codec-bridge CLI - encode, decode and resample raw PCM through the
//! native codec libraries.

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{
    CheckCommand, ConfigCommand, G722Command, OpusCommand, ResampleCommand, SpeexCommand,
};

/// codec-bridge CLI - run audio through G.722, Opus and Speex.
///
/// PCM files are raw signed 16-bit little-endian samples. Encoded files are
/// a sequence of packets, each prefixed with its length as a big-endian u16.
///
/// Codec settings are read from ~/.codec-bridge/config.yaml. Each codec
/// family is only available when built with its cargo feature.
#[derive(Parser)]
#[command(name = "codec-bridge")]
#[command(about = "Native audio codec bridge CLI")]
#[command(version)]
pub struct Cli {
    /// Config file (default is ~/.codec-bridge/config.yaml)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Output file (default: stdout)
    #[arg(short = 'o', long, global = true)]
    pub output: Option<String>,

    /// Verbose output
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Probe the linked codec libraries
    Check(CheckCommand),
    /// Manage configuration
    Config(ConfigCommand),
    /// G.722 at 64 kbit/s
    G722(G722Command),
    /// Opus codec
    Opus(OpusCommand),
    /// Speex codec
    Speex(SpeexCommand),
    /// Resample PCM with the speexdsp resampler
    Resample(ResampleCommand),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match &cli.command {
        Commands::Check(cmd) => cmd.run(&cli),
        Commands::Config(cmd) => cmd.run(&cli),
        Commands::G722(cmd) => cmd.run(&cli),
        Commands::Opus(cmd) => cmd.run(&cli),
        Commands::Speex(cmd) => cmd.run(&cli),
        Commands::Resample(cmd) => cmd.run(&cli),
    }
}
