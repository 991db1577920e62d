//! Opus decoder.

use thiserror::Error;
use tracing::debug;

use super::bridge::{Bridge, DecoderHandle};
use super::ctl::{Bandwidth, SAMPLE_RATES};
use super::error::OpusError;
use super::ffi::OpusLib;
use crate::gateway::{SliceSink, SliceSource};

/// Opus decoder error.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum DecoderError {
    #[error("opus: unsupported sample rate {0}")]
    UnsupportedSampleRate(i32),
    #[error("opus: unsupported channel count {0}")]
    UnsupportedChannels(i32),
    #[error("opus: decoder create failed")]
    CreateFailed,
    #[error("opus: decode failed: {0}")]
    DecodeFailed(#[source] OpusError),
}

/// What the TOC byte and frame count of a packet say about it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketInfo {
    pub bandwidth: Option<Bandwidth>,
    pub channels: i32,
    pub frames: i32,
    /// Samples per channel at the decoder's rate.
    pub samples: i32,
}

/// Opus decoder.
pub struct Decoder<L: OpusLib> {
    bridge: Bridge<L>,
    sample_rate: i32,
    channels: i32,
    handle: DecoderHandle,
}

impl<L: OpusLib> Drop for Decoder<L> {
    fn drop(&mut self) {
        self.bridge.decoder_destroy(self.handle);
        debug!(handle = ?self.handle, "opus decoder destroyed");
    }
}

impl<L: OpusLib> Decoder<L> {
    /// Creates a new Opus decoder.
    ///
    /// # Parameters
    /// - `sample_rate`: Sample rate to decode at (8000, 12000, 16000, 24000, or 48000)
    /// - `channels`: Number of channels (1 or 2)
    pub fn new(bridge: Bridge<L>, sample_rate: i32, channels: i32) -> Result<Self, DecoderError> {
        if !SAMPLE_RATES.contains(&sample_rate) {
            return Err(DecoderError::UnsupportedSampleRate(sample_rate));
        }
        if !(1..=2).contains(&channels) {
            return Err(DecoderError::UnsupportedChannels(channels));
        }

        let handle = bridge.decoder_create(sample_rate, channels);
        if handle.is_null() {
            return Err(DecoderError::CreateFailed);
        }
        debug!(?handle, sample_rate, channels, "opus decoder created");

        Ok(Self {
            bridge,
            sample_rate,
            channels,
            handle,
        })
    }

    /// Returns the sample rate.
    pub fn sample_rate(&self) -> i32 {
        self.sample_rate
    }

    /// Returns the number of channels.
    pub fn channels(&self) -> i32 {
        self.channels
    }

    /// Returns the underlying handle.
    pub fn handle(&self) -> DecoderHandle {
        self.handle
    }

    /// Returns the largest frame size a packet can carry: 120 ms.
    pub fn max_frame_size(&self) -> i32 {
        self.sample_rate * 120 / 1000
    }

    /// Decodes a packet to interleaved PCM samples.
    pub fn decode(&mut self, packet: &[u8]) -> Result<Vec<i16>, DecoderError> {
        let frame_size = self.max_frame_size();
        self.decode_vec(Some(packet), frame_size, false)
    }

    /// Decodes to a provided buffer. Returns number of samples per channel.
    pub fn decode_to(&mut self, packet: &[u8], buf: &mut [i16]) -> Result<usize, DecoderError> {
        let frame_size = (buf.len() / self.channels as usize) as i32;
        self.decode_into(Some(packet), buf, frame_size, false)
    }

    /// Recovers the frame before `packet` from its in-band FEC data.
    ///
    /// `frame_size` must match the duration of the lost frame.
    pub fn decode_fec(&mut self, packet: &[u8], frame_size: i32) -> Result<Vec<i16>, DecoderError> {
        self.decode_vec(Some(packet), frame_size, true)
    }

    /// Performs packet loss concealment (PLC) to generate samples when a packet is lost.
    pub fn decode_plc(&mut self, samples: i32) -> Result<Vec<i16>, DecoderError> {
        self.decode_vec(None, samples, false)
    }

    /// Inspects a packet without decoding it. An empty packet has no TOC
    /// byte and is rejected.
    pub fn packet_info(&self, packet: &[u8]) -> Result<PacketInfo, DecoderError> {
        if packet.is_empty() {
            return Err(DecoderError::DecodeFailed(OpusError::BadArg));
        }
        let src = SliceSource::new(packet);
        let len = packet.len() as i32;
        let bandwidth = self
            .bridge
            .packet_get_bandwidth(Some(&src), 0)
            .map_err(DecoderError::DecodeFailed)?;
        let channels = self
            .bridge
            .packet_get_nb_channels(Some(&src), 0)
            .map_err(DecoderError::DecodeFailed)?;
        let frames = self
            .bridge
            .packet_get_nb_frames(Some(&src), 0, len)
            .map_err(DecoderError::DecodeFailed)?;
        let samples = self
            .bridge
            .decoder_get_nb_samples(self.handle, Some(&src), 0, len)
            .map_err(DecoderError::DecodeFailed)?;
        Ok(PacketInfo {
            bandwidth: Bandwidth::from_ffi(bandwidth),
            channels,
            frames,
            samples,
        })
    }

    fn decode_vec(
        &mut self,
        packet: Option<&[u8]>,
        frame_size: i32,
        fec: bool,
    ) -> Result<Vec<i16>, DecoderError> {
        let mut buf = vec![0i16; (frame_size * self.channels).max(0) as usize];
        let n = self.decode_into(packet, &mut buf, frame_size, fec)?;
        buf.truncate(n * self.channels as usize);
        Ok(buf)
    }

    fn decode_into(
        &mut self,
        packet: Option<&[u8]>,
        buf: &mut [i16],
        frame_size: i32,
        fec: bool,
    ) -> Result<usize, DecoderError> {
        let input = packet.filter(|p| !p.is_empty()).map(SliceSource::new);
        let in_length = input.as_ref().map_or(0, |p| p.len() as i32);
        let output = SliceSink::new(buf);
        self.bridge
            .decode(
                self.handle,
                input.as_ref(),
                0,
                in_length,
                Some(&output),
                0,
                frame_size,
                fec,
            )
            .map_err(DecoderError::DecodeFailed)
    }
}
