//! G.722 encode and decode commands.

use std::path::PathBuf;

use clap::{Args, Subcommand};
use tracing::debug;

use codec_bridge::g722::{self, Bridge, G722Lib};

use super::{output_bytes, pcm_to_bytes, read_pcm};
use crate::Cli;

/// G.722 at 64 kbit/s.
///
/// Input PCM must be 16 kHz mono. The encoded stream is raw G.722 bytes,
/// one byte per two samples.
#[derive(Args)]
pub struct G722Command {
    #[command(subcommand)]
    command: G722Subcommand,
}

#[derive(Subcommand)]
enum G722Subcommand {
    /// Encode 16 kHz s16le PCM to G.722
    Encode {
        /// Input PCM file
        input: PathBuf,
    },
    /// Decode G.722 to 16 kHz s16le PCM
    Decode {
        /// Input G.722 file
        input: PathBuf,
    },
}

impl G722Command {
    pub fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        #[cfg(feature = "g722")]
        return self.run_with(cli, Bridge::native());

        #[cfg(not(feature = "g722"))]
        {
            let _ = cli;
            Err(super::missing_feature("g722"))
        }
    }

    #[cfg_attr(not(feature = "g722"), allow(dead_code))]
    fn run_with<L: G722Lib>(&self, cli: &Cli, bridge: Bridge<L>) -> anyhow::Result<()> {
        match &self.command {
            G722Subcommand::Encode { input } => {
                let pcm = read_pcm(input)?;
                let mut enc = g722::Encoder::new(bridge)?;
                let data = enc.encode_to_vec(&pcm)?;
                debug!(
                    samples = pcm.len(),
                    duration = ?g722::duration_of_samples(pcm.len()),
                    bytes = data.len(),
                    "g722 encoded"
                );
                output_bytes(&data, cli)
            }
            G722Subcommand::Decode { input } => {
                let data = std::fs::read(input)?;
                let mut dec = g722::Decoder::new(bridge)?;
                let pcm = dec.decode_to_vec(&data)?;
                debug!(bytes = data.len(), samples = pcm.len(), "g722 decoded");
                output_bytes(&pcm_to_bytes(&pcm), cli)
            }
        }
    }
}
