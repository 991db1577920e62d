//! Shared helpers for file I/O and output.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use tracing::info;

use codec_bridge::BridgeConfig;

use crate::Cli;

/// Resolves the config file path from the --config flag.
pub fn config_path(cli: &Cli) -> Option<PathBuf> {
    cli.config.as_ref().map(PathBuf::from)
}

/// Loads the bridge configuration, defaults when the file is absent.
pub fn get_config(cli: &Cli) -> anyhow::Result<BridgeConfig> {
    let path = config_path(cli);
    codec_bridge::load_config(path.as_deref()).context("failed to load config")
}

/// Reads a raw s16le PCM file.
pub fn read_pcm(path: &Path) -> anyhow::Result<Vec<i16>> {
    let data =
        std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    pcm_from_bytes(&data).with_context(|| format!("invalid PCM file {}", path.display()))
}

pub fn pcm_from_bytes(data: &[u8]) -> anyhow::Result<Vec<i16>> {
    if data.len() % 2 != 0 {
        bail!("odd byte count {}", data.len());
    }
    Ok(data
        .chunks_exact(2)
        .map(|b| i16::from_le_bytes([b[0], b[1]]))
        .collect())
}

pub fn pcm_to_bytes(pcm: &[i16]) -> Vec<u8> {
    pcm.iter().flat_map(|s| s.to_le_bytes()).collect()
}

/// Reads a file of length-prefixed packets.
pub fn read_packets(path: &Path) -> anyhow::Result<Vec<Vec<u8>>> {
    let data =
        std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    unframe_packets(&data).with_context(|| format!("invalid packet file {}", path.display()))
}

/// Prefixes each packet with its big-endian u16 length.
pub fn frame_packets<P: AsRef<[u8]>>(packets: &[P]) -> anyhow::Result<Vec<u8>> {
    let mut out = Vec::new();
    for packet in packets {
        let packet = packet.as_ref();
        let len = u16::try_from(packet.len())
            .with_context(|| format!("packet of {} bytes too large", packet.len()))?;
        out.extend_from_slice(&len.to_be_bytes());
        out.extend_from_slice(packet);
    }
    Ok(out)
}

pub fn unframe_packets(mut data: &[u8]) -> anyhow::Result<Vec<Vec<u8>>> {
    let mut packets = Vec::new();
    while !data.is_empty() {
        if data.len() < 2 {
            bail!("truncated length prefix");
        }
        let len = u16::from_be_bytes([data[0], data[1]]) as usize;
        data = &data[2..];
        if data.len() < len {
            bail!("packet {} truncated: want {} bytes, have {}", packets.len(), len, data.len());
        }
        packets.push(data[..len].to_vec());
        data = &data[len..];
    }
    Ok(packets)
}

/// Writes bytes to the -o file, or stdout.
pub fn output_bytes(data: &[u8], cli: &Cli) -> anyhow::Result<()> {
    match &cli.output {
        Some(path) => {
            std::fs::write(path, data).with_context(|| format!("failed to write {}", path))?;
            info!(size = %format_bytes(data.len()), path = %path, "wrote output");
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(data)?;
            stdout.flush()?;
        }
    }
    Ok(())
}

pub fn format_bytes(n: usize) -> String {
    const KB: usize = 1024;
    const MB: usize = KB * 1024;
    if n >= MB {
        format!("{:.2} MB", n as f64 / MB as f64)
    } else if n >= KB {
        format!("{:.2} KB", n as f64 / KB as f64)
    } else {
        format!("{} B", n)
    }
}

pub fn print_success(msg: &str) {
    eprintln!("✓ {}", msg);
}

/// Error for a codec family compiled out of this binary.
#[allow(dead_code)]
pub fn missing_feature(family: &str) -> anyhow::Error {
    anyhow::anyhow!("{family} support not built in; rebuild with `--features {family}`")
}
