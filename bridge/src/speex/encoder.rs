//! Speex encoder.

use std::time::Duration;

use tracing::debug;

use super::bits::Bits;
use super::bridge::{Bridge, EncoderHandle};
use super::ctl::*;
use super::error::SpeexError;
use super::ffi::SpeexLib;
use crate::config::SpeexConfig;
use crate::gateway::SliceSource;

/// Quality the encoder is opened with unless told otherwise.
pub const DEFAULT_QUALITY: i32 = 4;

/// Speex encoder over one mode.
///
/// Input is buffered until a whole frame is available; every full frame
/// becomes one packet.
pub struct Encoder<L: SpeexLib> {
    bridge: Bridge<L>,
    bits: Bits<L>,
    handle: EncoderHandle,
    sample_rate: i32,
    frame_size: usize,
    pending: Vec<i16>,
}

impl<L: SpeexLib> Drop for Encoder<L> {
    fn drop(&mut self) {
        self.bridge.encoder_destroy(self.handle);
        debug!(handle = ?self.handle, "speex encoder destroyed");
    }
}

impl<L: SpeexLib> Encoder<L> {
    /// Creates an encoder at [`DEFAULT_QUALITY`].
    ///
    /// 16 kHz selects wideband, 32 kHz ultra-wideband and any other rate
    /// narrowband.
    pub fn new(bridge: Bridge<L>, sample_rate: i32) -> Result<Self, SpeexError> {
        Self::with_quality(bridge, sample_rate, DEFAULT_QUALITY)
    }

    pub fn with_config(bridge: Bridge<L>, config: &SpeexConfig) -> Result<Self, SpeexError> {
        Self::with_quality(bridge, config.sample_rate, config.quality)
    }

    /// Creates an encoder at `quality` (0 to 10).
    pub fn with_quality(
        bridge: Bridge<L>,
        sample_rate: i32,
        quality: i32,
    ) -> Result<Self, SpeexError> {
        let mode_id = ModeId::for_sample_rate(sample_rate);
        let mode = bridge.lib_get_mode(mode_id);
        if mode.is_null() {
            return Err(SpeexError::InitFailed("lib_get_mode"));
        }
        let bits = Bits::new(bridge.clone())?;
        let handle = bridge.encoder_init(mode);
        if handle.is_null() {
            return Err(SpeexError::InitFailed("encoder_init"));
        }

        let mut enc = Self {
            bridge,
            bits,
            handle,
            sample_rate,
            frame_size: 0,
            pending: Vec::new(),
        };
        enc.set_parameter(SPEEX_SET_QUALITY, quality)?;
        enc.set_parameter(SPEEX_SET_SAMPLING_RATE, sample_rate)?;
        let frame_size = enc.get_parameter(SPEEX_GET_FRAME_SIZE)?;
        if frame_size <= 0 {
            return Err(SpeexError::Ctl(frame_size));
        }
        enc.frame_size = frame_size as usize;
        debug!(?handle, ?mode_id, sample_rate, quality, frame_size, "speex encoder created");
        Ok(enc)
    }

    pub fn handle(&self) -> EncoderHandle {
        self.handle
    }

    pub fn sample_rate(&self) -> i32 {
        self.sample_rate
    }

    /// Samples per frame.
    pub fn frame_size(&self) -> usize {
        self.frame_size
    }

    /// Duration of one frame.
    pub fn frame_duration(&self) -> Duration {
        Duration::from_nanos(self.frame_size as u64 * 1_000_000_000 / self.sample_rate as u64)
    }

    /// Samples buffered towards the next frame.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Buffers `pcm` and encodes every frame it completes.
    pub fn encode(&mut self, pcm: &[i16]) -> Result<Vec<Vec<u8>>, SpeexError> {
        self.pending.extend_from_slice(pcm);
        let mut packets = Vec::with_capacity(self.pending.len() / self.frame_size);
        while self.pending.len() >= self.frame_size {
            let frame: Vec<i16> = self.pending.drain(..self.frame_size).collect();
            if let Some(packet) = self.encode_frame(&frame)? {
                packets.push(packet);
            }
        }
        Ok(packets)
    }

    /// Pads buffered samples with silence up to a frame and encodes them.
    pub fn flush(&mut self) -> Result<Option<Vec<u8>>, SpeexError> {
        if self.pending.is_empty() {
            return Ok(None);
        }
        let mut frame = std::mem::take(&mut self.pending);
        frame.resize(self.frame_size, 0);
        self.encode_frame(&frame)
    }

    /// Target bitrate reported by the codec.
    pub fn bitrate(&self) -> Result<i32, SpeexError> {
        self.get_parameter(SPEEX_GET_BITRATE)
    }

    pub fn set_vbr(&mut self, vbr: bool) -> Result<(), SpeexError> {
        self.set_parameter(SPEEX_SET_VBR, vbr as i32)
    }

    pub fn vbr(&self) -> Result<bool, SpeexError> {
        self.get_parameter(SPEEX_GET_VBR).map(|v| v != 0)
    }

    pub fn set_complexity(&mut self, complexity: i32) -> Result<(), SpeexError> {
        self.set_parameter(SPEEX_SET_COMPLEXITY, complexity)
    }

    pub fn complexity(&self) -> Result<i32, SpeexError> {
        self.get_parameter(SPEEX_GET_COMPLEXITY)
    }

    pub fn set_parameter(&mut self, request: i32, value: i32) -> Result<(), SpeexError> {
        self.bridge.encoder_set_parameter(self.handle, request, value)
    }

    pub fn get_parameter(&self, request: i32) -> Result<i32, SpeexError> {
        self.bridge.encoder_get_parameter(self.handle, request)
    }

    fn encode_frame(&mut self, frame: &[i16]) -> Result<Option<Vec<u8>>, SpeexError> {
        self.bits.reset();
        self.bridge
            .encode_int(self.handle, &SliceSource::new(frame), 0, self.bits.handle())?;
        if self.bits.nbytes() == 0 {
            return Ok(None);
        }
        let packet = self.bits.to_vec()?;
        Ok((!packet.is_empty()).then_some(packet))
    }
}
