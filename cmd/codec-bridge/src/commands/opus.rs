//! Opus encode, decode and inspect commands.

use std::path::PathBuf;

use clap::{Args, Subcommand};
use tracing::debug;

use codec_bridge::opus::{Bridge, Decoder, Encoder, FrameDuration, OpusLib};

use super::{
    frame_packets, get_config, output_bytes, pcm_to_bytes, read_packets, read_pcm,
};
use crate::Cli;

/// Opus codec.
///
/// Sample rate, channels and encoder options come from the `opus` section
/// of the config file unless overridden on the command line.
#[derive(Args)]
pub struct OpusCommand {
    #[command(subcommand)]
    command: OpusSubcommand,
}

#[derive(Args)]
struct StreamArgs {
    /// Input file
    input: PathBuf,
    /// Sample rate (8000, 12000, 16000, 24000 or 48000)
    #[arg(short = 'r', long)]
    rate: Option<i32>,
    /// Channel count (1 or 2)
    #[arg(short = 'C', long)]
    channels: Option<i32>,
}

#[derive(Subcommand)]
enum OpusSubcommand {
    /// Encode s16le PCM into length-prefixed Opus packets
    Encode {
        #[command(flatten)]
        stream: StreamArgs,
        /// Bitrate in bits per second
        #[arg(short = 'b', long)]
        bitrate: Option<i32>,
        /// Frame duration in milliseconds (10, 20, 40 or 60)
        #[arg(long, default_value_t = 20)]
        frame_ms: u32,
    },
    /// Decode length-prefixed Opus packets to s16le PCM
    Decode {
        #[command(flatten)]
        stream: StreamArgs,
        /// Treat empty packets as lost and conceal them
        #[arg(long)]
        plc: bool,
    },
    /// Print the TOC details of each packet
    Inspect {
        #[command(flatten)]
        stream: StreamArgs,
    },
}

fn frame_duration(ms: u32) -> anyhow::Result<FrameDuration> {
    Ok(match ms {
        10 => FrameDuration::Duration10ms,
        20 => FrameDuration::Duration20ms,
        40 => FrameDuration::Duration40ms,
        60 => FrameDuration::Duration60ms,
        _ => anyhow::bail!("unsupported frame duration {}ms", ms),
    })
}

impl OpusCommand {
    pub fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        #[cfg(feature = "opus")]
        return self.run_with(cli, Bridge::native());

        #[cfg(not(feature = "opus"))]
        {
            let _ = cli;
            Err(super::missing_feature("opus"))
        }
    }

    #[cfg_attr(not(feature = "opus"), allow(dead_code))]
    fn run_with<L: OpusLib>(&self, cli: &Cli, bridge: Bridge<L>) -> anyhow::Result<()> {
        let mut config = get_config(cli)?.opus;
        let stream = match &self.command {
            OpusSubcommand::Encode { stream, .. }
            | OpusSubcommand::Decode { stream, .. }
            | OpusSubcommand::Inspect { stream } => stream,
        };
        if let Some(rate) = stream.rate {
            config.sample_rate = rate;
        }
        if let Some(channels) = stream.channels {
            config.channels = channels;
        }

        match &self.command {
            OpusSubcommand::Encode {
                bitrate, frame_ms, ..
            } => {
                if bitrate.is_some() {
                    config.bitrate = *bitrate;
                }
                let pcm = read_pcm(&stream.input)?;
                let mut enc = Encoder::with_config(bridge, &config)?;
                let frame_size = enc.frame_size_for_duration(frame_duration(*frame_ms)?);
                let chunk = frame_size as usize * config.channels as usize;

                let mut packets = Vec::new();
                for frame in pcm.chunks(chunk) {
                    let packet = if frame.len() == chunk {
                        enc.encode(frame, frame_size)?
                    } else {
                        let mut padded = frame.to_vec();
                        padded.resize(chunk, 0);
                        enc.encode(&padded, frame_size)?
                    };
                    packets.push(packet);
                }
                debug!(
                    samples = pcm.len(),
                    packets = packets.len(),
                    sample_rate = config.sample_rate,
                    "opus encoded"
                );
                output_bytes(&frame_packets(&packets)?, cli)
            }
            OpusSubcommand::Decode { plc, .. } => {
                let packets = read_packets(&stream.input)?;
                let mut dec = Decoder::new(bridge, config.sample_rate, config.channels)?;
                let mut pcm = Vec::new();
                let mut last_samples = FrameDuration::Duration20ms.samples(config.sample_rate);
                for (i, packet) in packets.iter().enumerate() {
                    if packet.is_empty() {
                        if *plc {
                            pcm.extend(dec.decode_plc(last_samples)?);
                        } else {
                            debug!(index = i, "skipping empty packet");
                        }
                        continue;
                    }
                    let info = dec.packet_info(packet)?;
                    last_samples = info.samples;
                    pcm.extend(dec.decode(packet)?);
                }
                debug!(packets = packets.len(), samples = pcm.len(), "opus decoded");
                output_bytes(&pcm_to_bytes(&pcm), cli)
            }
            OpusSubcommand::Inspect { .. } => {
                let packets = read_packets(&stream.input)?;
                let dec = Decoder::new(bridge, config.sample_rate, config.channels)?;
                println!(
                    "{:<6} {:<6} {:<9} {:<8} {:<7} {}",
                    "INDEX", "BYTES", "BANDWIDTH", "CHANNELS", "FRAMES", "SAMPLES"
                );
                for (i, packet) in packets.iter().enumerate() {
                    if packet.is_empty() {
                        println!("{:<6} {:<6} empty", i, 0);
                        continue;
                    }
                    match dec.packet_info(packet) {
                        Ok(info) => println!(
                            "{:<6} {:<6} {:<9} {:<8} {:<7} {}",
                            i,
                            packet.len(),
                            info.bandwidth
                                .map(|b| b.to_string())
                                .unwrap_or_else(|| "-".to_string()),
                            info.channels,
                            info.frames,
                            info.samples
                        ),
                        Err(err) => println!("{:<6} {:<6} {}", i, packet.len(), err),
                    }
                }
                Ok(())
            }
        }
    }
}
