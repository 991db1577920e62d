//! Speex encode and decode commands.

use std::path::PathBuf;

use clap::{Args, Subcommand};
use tracing::debug;

use codec_bridge::speex::{Bridge, Decoder, Encoder, SpeexLib};

use super::{
    frame_packets, get_config, output_bytes, pcm_to_bytes, read_packets, read_pcm,
};
use crate::Cli;

/// Speex codec.
///
/// The sample rate picks the mode: 8000 narrowband, 16000 wideband, 32000
/// ultra-wideband. Each packet holds one codec frame.
#[derive(Args)]
pub struct SpeexCommand {
    #[command(subcommand)]
    command: SpeexSubcommand,
}

#[derive(Subcommand)]
enum SpeexSubcommand {
    /// Encode mono s16le PCM into length-prefixed Speex packets
    Encode {
        /// Input PCM file
        input: PathBuf,
        /// Sample rate
        #[arg(short = 'r', long)]
        rate: Option<i32>,
        /// Quality, 0 to 10
        #[arg(short = 'q', long)]
        quality: Option<i32>,
    },
    /// Decode length-prefixed Speex packets to s16le PCM
    Decode {
        /// Input packet file
        input: PathBuf,
        /// Sample rate
        #[arg(short = 'r', long)]
        rate: Option<i32>,
        /// Disable perceptual enhancement
        #[arg(long)]
        no_enhancement: bool,
    },
}

impl SpeexCommand {
    pub fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        #[cfg(feature = "speex")]
        return self.run_with(cli, Bridge::native());

        #[cfg(not(feature = "speex"))]
        {
            let _ = cli;
            Err(super::missing_feature("speex"))
        }
    }

    #[cfg_attr(not(feature = "speex"), allow(dead_code))]
    fn run_with<L: SpeexLib>(&self, cli: &Cli, bridge: Bridge<L>) -> anyhow::Result<()> {
        let mut config = get_config(cli)?.speex;

        match &self.command {
            SpeexSubcommand::Encode {
                input,
                rate,
                quality,
            } => {
                if let Some(rate) = rate {
                    config.sample_rate = *rate;
                }
                if let Some(quality) = quality {
                    config.quality = *quality;
                }
                let pcm = read_pcm(input)?;
                let mut enc = Encoder::with_config(bridge, &config)?;
                let mut packets = enc.encode(&pcm)?;
                if let Some(last) = enc.flush()? {
                    packets.push(last);
                }
                let bitrate = enc.bitrate()?;
                debug!(
                    samples = pcm.len(),
                    packets = packets.len(),
                    frame = ?enc.frame_duration(),
                    bitrate,
                    "speex encoded"
                );
                output_bytes(&frame_packets(&packets)?, cli)
            }
            SpeexSubcommand::Decode {
                input,
                rate,
                no_enhancement,
            } => {
                if let Some(rate) = rate {
                    config.sample_rate = *rate;
                }
                if *no_enhancement {
                    config.enhancement = false;
                }
                let packets = read_packets(input)?;
                let mut dec = Decoder::with_config(bridge, &config)?;
                let mut pcm = Vec::with_capacity(packets.len() * dec.frame_size());
                for packet in &packets {
                    pcm.extend(dec.decode(packet)?);
                }
                debug!(packets = packets.len(), samples = pcm.len(), "speex decoded");
                output_bytes(&pcm_to_bytes(&pcm), cli)
            }
        }
    }
}
