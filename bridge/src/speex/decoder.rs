//! Speex decoder.

use std::time::Duration;

use tracing::debug;

use super::bits::Bits;
use super::bridge::{Bridge, DecoderHandle};
use super::ctl::*;
use super::error::SpeexError;
use super::ffi::SpeexLib;
use crate::config::SpeexConfig;
use crate::gateway::SliceSink;

/// Speex decoder over one mode.
pub struct Decoder<L: SpeexLib> {
    bridge: Bridge<L>,
    bits: Bits<L>,
    handle: DecoderHandle,
    sample_rate: i32,
    frame_size: usize,
}

impl<L: SpeexLib> Drop for Decoder<L> {
    fn drop(&mut self) {
        self.bridge.decoder_destroy(self.handle);
        debug!(handle = ?self.handle, "speex decoder destroyed");
    }
}

impl<L: SpeexLib> Decoder<L> {
    /// Creates a decoder with perceptual enhancement on.
    pub fn new(bridge: Bridge<L>, sample_rate: i32) -> Result<Self, SpeexError> {
        Self::with_enhancement(bridge, sample_rate, true)
    }

    pub fn with_config(bridge: Bridge<L>, config: &SpeexConfig) -> Result<Self, SpeexError> {
        Self::with_enhancement(bridge, config.sample_rate, config.enhancement)
    }

    pub fn with_enhancement(
        bridge: Bridge<L>,
        sample_rate: i32,
        enhancement: bool,
    ) -> Result<Self, SpeexError> {
        let mode_id = ModeId::for_sample_rate(sample_rate);
        let mode = bridge.lib_get_mode(mode_id);
        if mode.is_null() {
            return Err(SpeexError::InitFailed("lib_get_mode"));
        }
        let bits = Bits::new(bridge.clone())?;
        let handle = bridge.decoder_init(mode);
        if handle.is_null() {
            return Err(SpeexError::InitFailed("decoder_init"));
        }

        let mut dec = Self {
            bridge,
            bits,
            handle,
            sample_rate,
            frame_size: 0,
        };
        dec.set_parameter(SPEEX_SET_ENH, enhancement as i32)?;
        dec.set_parameter(SPEEX_SET_SAMPLING_RATE, sample_rate)?;
        let frame_size = dec.get_parameter(SPEEX_GET_FRAME_SIZE)?;
        if frame_size <= 0 {
            return Err(SpeexError::Ctl(frame_size));
        }
        dec.frame_size = frame_size as usize;
        debug!(?handle, ?mode_id, sample_rate, enhancement, frame_size, "speex decoder created");
        Ok(dec)
    }

    pub fn handle(&self) -> DecoderHandle {
        self.handle
    }

    pub fn sample_rate(&self) -> i32 {
        self.sample_rate
    }

    /// Samples per decoded frame.
    pub fn frame_size(&self) -> usize {
        self.frame_size
    }

    pub fn frame_duration(&self) -> Duration {
        Duration::from_nanos(self.frame_size as u64 * 1_000_000_000 / self.sample_rate as u64)
    }

    pub fn enhancement(&self) -> Result<bool, SpeexError> {
        self.get_parameter(SPEEX_GET_ENH).map(|v| v != 0)
    }

    /// Loads a packet into the bit buffer, replacing what was left.
    pub fn read_packet(&mut self, packet: &[u8]) -> Result<(), SpeexError> {
        self.bits.read_from(packet)
    }

    /// Decodes one frame from the bit buffer into `out`, which must hold
    /// [`frame_size`](Self::frame_size) samples. Returns whether bits remain.
    pub fn decode_frame(&mut self, out: &mut [i16]) -> Result<bool, SpeexError> {
        if out.len() < self.frame_size {
            return Err(SpeexError::BufferTooSmall {
                need: self.frame_size,
                have: out.len(),
            });
        }
        self.bridge
            .decode_int(self.handle, self.bits.handle(), &SliceSink::new(out), 0)?;
        Ok(self.bits.remaining() > 0)
    }

    /// Decodes every frame in `packet`.
    pub fn decode(&mut self, packet: &[u8]) -> Result<Vec<i16>, SpeexError> {
        self.read_packet(packet)?;
        let mut pcm = vec![0i16; self.frame_size];
        let mut more = self.decode_frame(&mut pcm)?;
        while more {
            let start = pcm.len();
            pcm.resize(start + self.frame_size, 0);
            match self.decode_frame(&mut pcm[start..]) {
                Ok(m) => more = m,
                // Padding after the last frame.
                Err(SpeexError::EndOfStream) => {
                    pcm.truncate(start);
                    break;
                }
                Err(err) => return Err(err),
            }
        }
        Ok(pcm)
    }

    pub fn set_parameter(&mut self, request: i32, value: i32) -> Result<(), SpeexError> {
        self.bridge.decoder_set_parameter(self.handle, request, value)
    }

    pub fn get_parameter(&self, request: i32) -> Result<i32, SpeexError> {
        self.bridge.decoder_get_parameter(self.handle, request)
    }
}
