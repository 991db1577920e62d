//! PCM resampling command.

use std::path::PathBuf;

use clap::Args;
use tracing::debug;

use codec_bridge::speex::{Bridge, Resampler, SpeexLib};

use super::{get_config, output_bytes, pcm_to_bytes, read_pcm};
use crate::Cli;

/// Resample interleaved s16le PCM.
#[derive(Args)]
pub struct ResampleCommand {
    /// Input PCM file
    input: PathBuf,
    /// Input sample rate
    #[arg(long = "from")]
    in_rate: u32,
    /// Output sample rate
    #[arg(long = "to")]
    out_rate: u32,
    /// Channel count
    #[arg(short = 'C', long, default_value_t = 1)]
    channels: u32,
    /// Quality, 0 to 10 (default from config)
    #[arg(short = 'q', long)]
    quality: Option<i32>,
}

impl ResampleCommand {
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
        if self.channels == 0 || self.in_rate == 0 || self.out_rate == 0 {
            anyhow::bail!("channels and rates must be positive");
        }
        let mut config = get_config(cli)?.resampler;
        if let Some(quality) = self.quality {
            config.quality = quality;
        }

        let pcm = read_pcm(&self.input)?;
        let mut rs = Resampler::with_config(bridge, &config);
        let out = rs.process(&pcm, self.channels, self.in_rate, self.out_rate)?;
        debug!(
            input = pcm.len(),
            output = out.len(),
            in_rate = self.in_rate,
            out_rate = self.out_rate,
            quality = config.quality,
            "resampled"
        );
        output_bytes(&pcm_to_bytes(&out), cli)
    }
}
