//! Library probe command.

use clap::Args;
use tracing::{debug, warn};

use crate::Cli;

/// Probe each codec library compiled into this binary.
///
/// Exits with an error if any linked library fails its probe.
#[derive(Args)]
pub struct CheckCommand {}

impl CheckCommand {
    pub fn run(&self, _cli: &Cli) -> anyhow::Result<()> {
        let results = probe_all();
        let mut failed = 0;
        println!("{:<8} {}", "CODEC", "STATUS");
        for (name, status) in &results {
            match status {
                Some(Ok(())) => println!("{:<8} ok", name),
                Some(Err(err)) => {
                    failed += 1;
                    warn!(codec = *name, error = %err, "probe failed");
                    println!("{:<8} FAILED: {}", name, err);
                }
                None => println!("{:<8} not built", name),
            }
        }
        debug!(failed, total = results.len(), "probes finished");
        if failed > 0 {
            anyhow::bail!("{} codec libraries failed their probe", failed);
        }
        Ok(())
    }
}

type Probe = Option<Result<(), String>>;

fn probe_all() -> Vec<(&'static str, Probe)> {
    vec![("g722", probe_g722()), ("opus", probe_opus()), ("speex", probe_speex())]
}

#[cfg(feature = "g722")]
fn probe_g722() -> Probe {
    use codec_bridge::g722::{Bridge, Encoder};
    Some(Encoder::new(Bridge::native()).map(drop).map_err(|e| e.to_string()))
}

#[cfg(not(feature = "g722"))]
fn probe_g722() -> Probe {
    None
}

#[cfg(feature = "opus")]
fn probe_opus() -> Probe {
    use codec_bridge::opus::{Bridge, assert_functional};
    Some(assert_functional(&Bridge::native()).map_err(|e| e.to_string()))
}

#[cfg(not(feature = "opus"))]
fn probe_opus() -> Probe {
    None
}

#[cfg(feature = "speex")]
fn probe_speex() -> Probe {
    use codec_bridge::speex::{Bridge, assert_functional};
    Some(assert_functional(&Bridge::native()).map_err(|e| e.to_string()))
}

#[cfg(not(feature = "speex"))]
fn probe_speex() -> Probe {
    None
}
