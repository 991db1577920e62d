//! Opus encoder.

use thiserror::Error;
use tracing::debug;

use super::bridge::{Bridge, EncoderHandle};
use super::ctl::{
    Application, Bandwidth, Bitrate, ForceChannels, FrameDuration, MAX_PACKET, OPUS_AUTO,
    SAMPLE_RATES,
};
use super::error::OpusError;
use super::ffi::OpusLib;
use crate::config::OpusConfig;
use crate::gateway::{SliceSink, SliceSource};

/// Opus encoder error.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum EncoderError {
    #[error("opus: unsupported sample rate {0}")]
    UnsupportedSampleRate(i32),
    #[error("opus: unsupported channel count {0}")]
    UnsupportedChannels(i32),
    #[error("opus: encoder create failed")]
    CreateFailed,
    #[error("opus: encode failed: {0}")]
    EncodeFailed(#[source] OpusError),
    #[error("opus: set option failed: {0}")]
    SetOptionFailed(#[source] OpusError),
    #[error("opus: get option failed: {0}")]
    GetOptionFailed(#[source] OpusError),
}

/// Opus encoder.
pub struct Encoder<L: OpusLib> {
    bridge: Bridge<L>,
    sample_rate: i32,
    channels: i32,
    handle: EncoderHandle,
}

impl<L: OpusLib> Drop for Encoder<L> {
    fn drop(&mut self) {
        self.bridge.encoder_destroy(self.handle);
        debug!(handle = ?self.handle, "opus encoder destroyed");
    }
}

impl<L: OpusLib> Encoder<L> {
    /// Creates a new Opus encoder.
    ///
    /// # Parameters
    /// - `sample_rate`: Sample rate (8000, 12000, 16000, 24000, or 48000)
    /// - `channels`: Number of channels (1 or 2)
    /// - `application`: Intended application type
    pub fn new(
        bridge: Bridge<L>,
        sample_rate: i32,
        channels: i32,
        application: Application,
    ) -> Result<Self, EncoderError> {
        if !SAMPLE_RATES.contains(&sample_rate) {
            return Err(EncoderError::UnsupportedSampleRate(sample_rate));
        }
        if !(1..=2).contains(&channels) {
            return Err(EncoderError::UnsupportedChannels(channels));
        }

        let handle = bridge.encoder_create_with(sample_rate, channels, application);
        if handle.is_null() {
            return Err(EncoderError::CreateFailed);
        }
        debug!(?handle, sample_rate, channels, ?application, "opus encoder created");

        Ok(Self {
            bridge,
            sample_rate,
            channels,
            handle,
        })
    }

    /// Creates a new VoIP encoder.
    pub fn new_voip(bridge: Bridge<L>, sample_rate: i32, channels: i32) -> Result<Self, EncoderError> {
        Self::new(bridge, sample_rate, channels, Application::VoIP)
    }

    /// Creates a new audio encoder.
    pub fn new_audio(bridge: Bridge<L>, sample_rate: i32, channels: i32) -> Result<Self, EncoderError> {
        Self::new(bridge, sample_rate, channels, Application::Audio)
    }

    /// Creates an encoder and applies every option set in `config`.
    pub fn with_config(bridge: Bridge<L>, config: &OpusConfig) -> Result<Self, EncoderError> {
        let mut enc = Self::new(bridge, config.sample_rate, config.channels, config.application)?;
        if let Some(bitrate) = config.bitrate {
            enc.set_bitrate(Bitrate::Bps(bitrate))?;
        }
        if let Some(complexity) = config.complexity {
            enc.set_complexity(complexity)?;
        }
        if let Some(vbr) = config.vbr {
            enc.set_vbr(vbr)?;
        }
        enc.set_inband_fec(config.inband_fec)?;
        enc.set_packet_loss_perc(config.packet_loss_perc)?;
        enc.set_dtx(config.dtx)?;
        Ok(enc)
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
    pub fn handle(&self) -> EncoderHandle {
        self.handle
    }

    /// Encodes one frame of PCM samples into a new packet.
    ///
    /// # Parameters
    /// - `pcm`: Input PCM samples (frame_size * channels samples)
    /// - `frame_size`: Number of samples per channel
    pub fn encode(&mut self, pcm: &[i16], frame_size: i32) -> Result<Vec<u8>, EncoderError> {
        let mut buf = vec![0u8; MAX_PACKET];
        let n = self.encode_to(pcm, frame_size, &mut buf)?;
        buf.truncate(n);
        Ok(buf)
    }

    /// Encodes to a provided buffer. Returns number of bytes written.
    pub fn encode_to(
        &mut self,
        pcm: &[i16],
        frame_size: i32,
        buf: &mut [u8],
    ) -> Result<usize, EncoderError> {
        if frame_size <= 0 || pcm.len() < (frame_size * self.channels) as usize {
            return Err(EncoderError::EncodeFailed(OpusError::BadArg));
        }
        let out_length = buf.len().min(i32::MAX as usize) as i32;
        let input = SliceSource::new(pcm);
        let output = SliceSink::new(buf);
        self.bridge
            .encode(
                self.handle,
                Some(&input),
                0,
                frame_size,
                Some(&output),
                0,
                out_length,
            )
            .map_err(EncoderError::EncodeFailed)
    }

    /// Sets the target bitrate.
    pub fn set_bitrate(&mut self, bitrate: Bitrate) -> Result<(), EncoderError> {
        self.bridge
            .encoder_set_bitrate(self.handle, bitrate.to_ffi())
            .map_err(EncoderError::SetOptionFailed)
    }

    /// Returns the target bitrate.
    pub fn bitrate(&self) -> Result<Bitrate, EncoderError> {
        self.bridge
            .encoder_get_bitrate(self.handle)
            .map(Bitrate::from_ffi)
            .map_err(EncoderError::GetOptionFailed)
    }

    /// Sets the encoder complexity (0-10).
    pub fn set_complexity(&mut self, complexity: i32) -> Result<(), EncoderError> {
        self.bridge
            .encoder_set_complexity(self.handle, complexity)
            .map_err(EncoderError::SetOptionFailed)
    }

    /// Returns the encoder complexity.
    pub fn complexity(&self) -> Result<i32, EncoderError> {
        self.bridge
            .encoder_get_complexity(self.handle)
            .map_err(EncoderError::GetOptionFailed)
    }

    /// Sets the coded bandwidth. `None` lets the encoder choose.
    pub fn set_bandwidth(&mut self, bandwidth: Option<Bandwidth>) -> Result<(), EncoderError> {
        let value = bandwidth.map_or(OPUS_AUTO, Bandwidth::to_ffi);
        self.bridge
            .encoder_set_bandwidth(self.handle, value)
            .map_err(EncoderError::SetOptionFailed)
    }

    /// Returns the coded bandwidth, or `None` when it is left to the encoder.
    pub fn bandwidth(&self) -> Result<Option<Bandwidth>, EncoderError> {
        self.bridge
            .encoder_get_bandwidth(self.handle)
            .map(Bandwidth::from_ffi)
            .map_err(EncoderError::GetOptionFailed)
    }

    /// Sets the upper bound on the coded bandwidth.
    pub fn set_max_bandwidth(&mut self, bandwidth: Bandwidth) -> Result<(), EncoderError> {
        self.bridge
            .encoder_set_max_bandwidth(self.handle, bandwidth.to_ffi())
            .map_err(EncoderError::SetOptionFailed)
    }

    /// Returns the upper bound on the coded bandwidth.
    pub fn max_bandwidth(&self) -> Result<Option<Bandwidth>, EncoderError> {
        self.bridge
            .encoder_get_max_bandwidth(self.handle)
            .map(Bandwidth::from_ffi)
            .map_err(EncoderError::GetOptionFailed)
    }

    /// Enables or disables variable bitrate.
    pub fn set_vbr(&mut self, vbr: bool) -> Result<(), EncoderError> {
        self.bridge
            .encoder_set_vbr(self.handle, vbr as i32)
            .map_err(EncoderError::SetOptionFailed)
    }

    pub fn vbr(&self) -> Result<bool, EncoderError> {
        self.bridge
            .encoder_get_vbr(self.handle)
            .map(|v| v != 0)
            .map_err(EncoderError::GetOptionFailed)
    }

    /// Enables or disables constrained variable bitrate.
    pub fn set_vbr_constraint(&mut self, constrained: bool) -> Result<(), EncoderError> {
        self.bridge
            .encoder_set_vbr_constraint(self.handle, constrained as i32)
            .map_err(EncoderError::SetOptionFailed)
    }

    pub fn vbr_constraint(&self) -> Result<bool, EncoderError> {
        self.bridge
            .encoder_get_vbr_constraint(self.handle)
            .map(|v| v != 0)
            .map_err(EncoderError::GetOptionFailed)
    }

    /// Enables or disables in-band forward error correction.
    pub fn set_inband_fec(&mut self, fec: bool) -> Result<(), EncoderError> {
        self.bridge
            .encoder_set_inband_fec(self.handle, fec as i32)
            .map_err(EncoderError::SetOptionFailed)
    }

    pub fn inband_fec(&self) -> Result<bool, EncoderError> {
        self.bridge
            .encoder_get_inband_fec(self.handle)
            .map(|v| v != 0)
            .map_err(EncoderError::GetOptionFailed)
    }

    /// Sets the expected packet loss (0-100 percent).
    pub fn set_packet_loss_perc(&mut self, perc: i32) -> Result<(), EncoderError> {
        self.bridge
            .encoder_set_packet_loss_perc(self.handle, perc)
            .map_err(EncoderError::SetOptionFailed)
    }

    pub fn packet_loss_perc(&self) -> Result<i32, EncoderError> {
        self.bridge
            .encoder_get_packet_loss_perc(self.handle)
            .map_err(EncoderError::GetOptionFailed)
    }

    /// Enables or disables discontinuous transmission.
    pub fn set_dtx(&mut self, dtx: bool) -> Result<(), EncoderError> {
        self.bridge
            .encoder_set_dtx(self.handle, dtx as i32)
            .map_err(EncoderError::SetOptionFailed)
    }

    pub fn dtx(&self) -> Result<bool, EncoderError> {
        self.bridge
            .encoder_get_dtx(self.handle)
            .map(|v| v != 0)
            .map_err(EncoderError::GetOptionFailed)
    }

    /// Forces mono or stereo coding.
    pub fn set_force_channels(&mut self, force: ForceChannels) -> Result<(), EncoderError> {
        self.bridge
            .encoder_set_force_channels(self.handle, force.to_ffi())
            .map_err(EncoderError::SetOptionFailed)
    }

    pub fn force_channels(&self) -> Result<Option<ForceChannels>, EncoderError> {
        self.bridge
            .encoder_get_force_channels(self.handle)
            .map(ForceChannels::from_ffi)
            .map_err(EncoderError::GetOptionFailed)
    }

    /// Returns the frame size for a given duration.
    pub fn frame_size_for_duration(&self, fd: FrameDuration) -> i32 {
        fd.samples(self.sample_rate)
    }

    /// Returns the frame size for 20ms frames (recommended default).
    pub fn frame_size_20ms(&self) -> i32 {
        self.sample_rate * 20 / 1000
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeOpus;

    fn encoder(lib: &FakeOpus, sample_rate: i32, channels: i32) -> Encoder<FakeOpus> {
        Encoder::new_voip(Bridge::new(lib.clone()), sample_rate, channels).unwrap()
    }

    #[test]
    fn test_encoder_create() {
        let lib = FakeOpus::default();
        let enc = encoder(&lib, 16000, 1);
        assert_eq!(enc.sample_rate(), 16000);
        assert_eq!(enc.channels(), 1);
        assert!(!enc.handle().is_null());
        assert_eq!(lib.live_states(), 1);
        drop(enc);
        assert_eq!(lib.live_states(), 0);
    }

    #[test]
    fn test_encoder_rejects_bad_config() {
        let lib = FakeOpus::default();
        let bridge = Bridge::new(lib.clone());
        assert_eq!(
            Encoder::new_voip(bridge.clone(), 44100, 1).err(),
            Some(EncoderError::UnsupportedSampleRate(44100))
        );
        assert_eq!(
            Encoder::new_audio(bridge, 48000, 0).err(),
            Some(EncoderError::UnsupportedChannels(0))
        );
        // Validation happens before libopus is asked.
        assert_eq!(lib.calls("encoder_create"), 0);

        let bridge = Bridge::new(FakeOpus::default().refuse_create());
        assert_eq!(
            Encoder::new_voip(bridge, 16000, 1).err(),
            Some(EncoderError::CreateFailed)
        );
    }

    #[test]
    fn test_encoder_encode() {
        let lib = FakeOpus::default();
        let mut enc = encoder(&lib, 16000, 1);
        let pcm = vec![0i16; 320];

        let packet = enc.encode(&pcm, enc.frame_size_20ms()).unwrap();
        assert!(!packet.is_empty());
        assert!(packet.len() <= MAX_PACKET);

        let mut buf = [0u8; 64];
        let n = enc.encode_to(&pcm, 320, &mut buf).unwrap();
        assert_eq!(&buf[..n], &packet[..]);
    }

    #[test]
    fn test_encoder_short_input() {
        let lib = FakeOpus::default();
        let mut enc = encoder(&lib, 16000, 2);
        let pcm = vec![0i16; 320];
        assert_eq!(
            enc.encode(&pcm, 320).err(),
            Some(EncoderError::EncodeFailed(OpusError::BadArg))
        );
        assert_eq!(lib.calls("encode"), 0);
    }

    #[test]
    fn test_encoder_options() {
        let lib = FakeOpus::default();
        let mut enc = encoder(&lib, 48000, 2);

        enc.set_bitrate(Bitrate::Bps(32000)).unwrap();
        assert_eq!(enc.bitrate().unwrap(), Bitrate::Bps(32000));
        enc.set_complexity(5).unwrap();
        assert_eq!(enc.complexity().unwrap(), 5);
        enc.set_bandwidth(Some(Bandwidth::SWB)).unwrap();
        assert_eq!(enc.bandwidth().unwrap(), Some(Bandwidth::SWB));
        enc.set_bandwidth(None).unwrap();
        assert_eq!(enc.bandwidth().unwrap(), None);
        enc.set_max_bandwidth(Bandwidth::WB).unwrap();
        assert_eq!(enc.max_bandwidth().unwrap(), Some(Bandwidth::WB));
        enc.set_vbr(false).unwrap();
        assert!(!enc.vbr().unwrap());
        enc.set_vbr_constraint(true).unwrap();
        assert!(enc.vbr_constraint().unwrap());
        enc.set_inband_fec(true).unwrap();
        assert!(enc.inband_fec().unwrap());
        enc.set_packet_loss_perc(15).unwrap();
        assert_eq!(enc.packet_loss_perc().unwrap(), 15);
        enc.set_dtx(true).unwrap();
        assert!(enc.dtx().unwrap());
        enc.set_force_channels(ForceChannels::Mono).unwrap();
        assert_eq!(enc.force_channels().unwrap(), Some(ForceChannels::Mono));

        assert_eq!(
            enc.set_complexity(42),
            Err(EncoderError::SetOptionFailed(OpusError::BadArg))
        );
    }

    #[test]
    fn test_encoder_with_config() {
        let lib = FakeOpus::default();
        let config = OpusConfig {
            sample_rate: 24000,
            channels: 1,
            bitrate: Some(20000),
            complexity: Some(3),
            inband_fec: true,
            packet_loss_perc: 10,
            ..OpusConfig::default()
        };
        let enc = Encoder::with_config(Bridge::new(lib), &config).unwrap();
        assert_eq!(enc.sample_rate(), 24000);
        assert_eq!(enc.bitrate().unwrap(), Bitrate::Bps(20000));
        assert_eq!(enc.complexity().unwrap(), 3);
        assert!(enc.inband_fec().unwrap());
        assert_eq!(enc.packet_loss_perc().unwrap(), 10);
        assert!(!enc.dtx().unwrap());
    }

    #[test]
    fn test_frame_size() {
        let lib = FakeOpus::default();
        let enc = encoder(&lib, 48000, 1);
        assert_eq!(enc.frame_size_20ms(), 960);
        assert_eq!(enc.frame_size_for_duration(FrameDuration::Duration10ms), 480);
    }
}
