//! Owned G.722 encoder and decoder.

use std::time::Duration;

use thiserror::Error;
use tracing::debug;

use super::bridge::{Bridge, DecoderHandle, EncoderHandle};
use super::ffi::G722Lib;
use crate::gateway::{SliceSink, SliceSource};

/// Output sample rate of the wideband decoder.
pub const SAMPLE_RATE: u32 = 16000;

/// G.722 error.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum G722Error {
    #[error("g722: encoder open failed")]
    EncoderOpenFailed,
    #[error("g722: decoder open failed")]
    DecoderOpenFailed,
    #[error("g722: output buffer too small: need {need}, have {have}")]
    BufferTooSmall { need: usize, have: usize },
    #[error("g722: {len} elements exceed the native limit of {max}")]
    TooLong { len: usize, max: usize },
}

/// Largest encode call in output bytes; the native sample count is twice this.
const MAX_ENCODE_BYTES: usize = (i32::MAX / 2) as usize;
/// Largest decode call in output samples.
const MAX_DECODE_SAMPLES: usize = i32::MAX as usize;

fn native_len(len: usize, max: usize) -> Result<i32, G722Error> {
    if len > max {
        return Err(G722Error::TooLong { len, max });
    }
    Ok(len as i32)
}

/// Returns the playback duration of `samples` 16 kHz samples.
pub fn duration_of_samples(samples: usize) -> Duration {
    Duration::from_nanos(samples as u64 * 1_000_000 / 16)
}

/// G.722 encoder at 64 kbit/s.
pub struct Encoder<L: G722Lib> {
    bridge: Bridge<L>,
    handle: EncoderHandle,
}

impl<L: G722Lib> Encoder<L> {
    pub fn new(bridge: Bridge<L>) -> Result<Self, G722Error> {
        let handle = bridge.encoder_open();
        if handle.is_null() {
            return Err(G722Error::EncoderOpenFailed);
        }
        debug!(?handle, "g722 encoder opened");
        Ok(Self { bridge, handle })
    }

    /// Encodes `pcm` into `out`, two samples per byte. Returns the number of
    /// bytes written.
    pub fn encode(&mut self, pcm: &[i16], out: &mut [u8]) -> Result<usize, G722Error> {
        let n = pcm.len() / 2;
        if out.len() < n {
            return Err(G722Error::BufferTooSmall {
                need: n,
                have: out.len(),
            });
        }
        let out_length = native_len(n, MAX_ENCODE_BYTES)?;
        let input = SliceSource::new(pcm);
        let output = SliceSink::new(out);
        self.bridge
            .encoder_process(self.handle, &input, 0, &output, 0, out_length);
        Ok(n)
    }

    /// Encodes `pcm` into a new buffer.
    pub fn encode_to_vec(&mut self, pcm: &[i16]) -> Result<Vec<u8>, G722Error> {
        let mut out = vec![0u8; pcm.len() / 2];
        let n = self.encode(pcm, &mut out)?;
        out.truncate(n);
        Ok(out)
    }
}

impl<L: G722Lib> Drop for Encoder<L> {
    fn drop(&mut self) {
        self.bridge.encoder_close(self.handle);
        debug!(handle = ?self.handle, "g722 encoder closed");
    }
}

/// G.722 decoder producing 16 kHz samples.
pub struct Decoder<L: G722Lib> {
    bridge: Bridge<L>,
    handle: DecoderHandle,
}

impl<L: G722Lib> Decoder<L> {
    pub fn new(bridge: Bridge<L>) -> Result<Self, G722Error> {
        let handle = bridge.decoder_open();
        if handle.is_null() {
            return Err(G722Error::DecoderOpenFailed);
        }
        debug!(?handle, "g722 decoder opened");
        Ok(Self { bridge, handle })
    }

    /// Decodes `data` into `pcm`, two samples per byte. Returns the number of
    /// samples written.
    pub fn decode(&mut self, data: &[u8], pcm: &mut [i16]) -> Result<usize, G722Error> {
        let n = data.len() * 2;
        if pcm.len() < n {
            return Err(G722Error::BufferTooSmall {
                need: n,
                have: pcm.len(),
            });
        }
        let out_length = native_len(n, MAX_DECODE_SAMPLES)?;
        let input = SliceSource::new(data);
        let output = SliceSink::new(pcm);
        self.bridge
            .decoder_process(self.handle, &input, 0, &output, 0, out_length);
        Ok(n)
    }

    /// Decodes `data` into a new buffer.
    pub fn decode_to_vec(&mut self, data: &[u8]) -> Result<Vec<i16>, G722Error> {
        let mut pcm = vec![0i16; data.len() * 2];
        let n = self.decode(data, &mut pcm)?;
        pcm.truncate(n);
        Ok(pcm)
    }
}

impl<L: G722Lib> Drop for Decoder<L> {
    fn drop(&mut self) {
        self.bridge.decoder_close(self.handle);
        debug!(handle = ?self.handle, "g722 decoder closed");
    }
}
