//! Sample rate conversion over the speexdsp resampler.

use tracing::debug;

use super::bridge::{Bridge, ResamplerHandle};
use super::ctl::{RESAMPLER_ERR_SUCCESS, SPEEX_RESAMPLER_QUALITY_VOIP};
use super::error::SpeexError;
use super::ffi::SpeexLib;
use crate::config::ResamplerConfig;
use crate::gateway::{SliceSink, SliceSource};
use crate::handle::Handle;

/// Converts interleaved 16-bit PCM between sample rates.
///
/// The native resampler is created on first use and kept across calls. A
/// change of channel count recreates it; a change of rates only retunes it.
pub struct Resampler<L: SpeexLib> {
    bridge: Bridge<L>,
    handle: ResamplerHandle,
    quality: i32,
    channels: u32,
    in_rate: u32,
    out_rate: u32,
}

impl<L: SpeexLib> Drop for Resampler<L> {
    fn drop(&mut self) {
        self.destroy();
    }
}

impl<L: SpeexLib> Resampler<L> {
    /// Creates a resampler at `SPEEX_RESAMPLER_QUALITY_VOIP`.
    pub fn new(bridge: Bridge<L>) -> Self {
        Self::with_quality(bridge, SPEEX_RESAMPLER_QUALITY_VOIP)
    }

    pub fn with_config(bridge: Bridge<L>, config: &ResamplerConfig) -> Self {
        Self::with_quality(bridge, config.quality)
    }

    pub fn with_quality(bridge: Bridge<L>, quality: i32) -> Self {
        Self {
            bridge,
            handle: Handle::NULL,
            quality,
            channels: 0,
            in_rate: 0,
            out_rate: 0,
        }
    }

    /// Returns the native handle, null until the first conversion.
    pub fn handle(&self) -> ResamplerHandle {
        self.handle
    }

    /// Converts `input` from `in_rate` to `out_rate`.
    ///
    /// Equal rates copy the input through without touching the native
    /// resampler.
    pub fn process(
        &mut self,
        input: &[i16],
        channels: u32,
        in_rate: u32,
        out_rate: u32,
    ) -> Result<Vec<i16>, SpeexError> {
        if in_rate == out_rate {
            return Ok(input.to_vec());
        }
        self.configure(channels, in_rate, out_rate)?;

        let in_samples = input.len() as u64 / channels as u64;
        if in_samples == 0 {
            return Ok(Vec::new());
        }
        let out_samples = in_samples * out_rate as u64 / in_rate as u64;
        let mut output = vec![0i16; (out_samples * channels as u64) as usize];

        let written = self.bridge.resampler_process_interleaved_int(
            self.handle,
            &SliceSource::new(input),
            0,
            in_samples as u32,
            &SliceSink::new(&mut output),
            0,
            out_samples as u32,
        )?;
        output.truncate(written * channels as usize);
        Ok(output)
    }

    fn configure(&mut self, channels: u32, in_rate: u32, out_rate: u32) -> Result<(), SpeexError> {
        let channels_changed = self.channels != channels;
        if !channels_changed && self.in_rate == in_rate && self.out_rate == out_rate {
            return Ok(());
        }

        if channels_changed {
            self.destroy();
        }
        if self.handle.is_null() {
            let mut err = RESAMPLER_ERR_SUCCESS;
            self.handle =
                self.bridge
                    .resampler_init(channels, in_rate, out_rate, self.quality, Some(&mut err));
            if self.handle.is_null() {
                return Err(match err {
                    RESAMPLER_ERR_SUCCESS => SpeexError::InitFailed("resampler_init"),
                    code => SpeexError::Resampler(code),
                });
            }
        } else {
            self.bridge.resampler_set_rate(self.handle, in_rate, out_rate)?;
        }

        debug!(
            handle = ?self.handle,
            channels,
            in_rate,
            out_rate,
            quality = self.quality,
            "speex resampler configured"
        );
        self.channels = channels;
        self.in_rate = in_rate;
        self.out_rate = out_rate;
        Ok(())
    }

    fn destroy(&mut self) {
        if self.handle.is_null() {
            return;
        }
        self.bridge.resampler_destroy(self.handle);
        debug!(handle = ?self.handle, "speex resampler destroyed");
        self.handle = Handle::NULL;
        self.channels = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::speex::ctl::RESAMPLER_ERR_INVALID_ARG;
    use crate::testing::FakeSpeex;

    #[test]
    fn test_pass_through() {
        let lib = FakeSpeex::default();
        let mut rs = Resampler::new(Bridge::new(lib.clone()));
        assert_eq!(rs.process(&[1, 2, 3], 1, 8000, 8000).unwrap(), vec![1, 2, 3]);
        assert!(rs.handle().is_null());
        assert_eq!(lib.calls("resampler_init"), 0);
    }

    #[test]
    fn test_upsample() {
        let lib = FakeSpeex::default();
        let mut rs = Resampler::new(Bridge::new(lib.clone()));
        let out = rs.process(&[1, 2, 3, 4], 1, 8000, 16000).unwrap();
        assert_eq!(out, vec![1, 1, 2, 2, 3, 3, 4, 4]);

        let out = rs.process(&[5, 6, 7, 8], 2, 16000, 8000).unwrap();
        assert_eq!(out, vec![5, 6]);
    }

    #[test]
    fn test_reconfiguration() {
        let lib = FakeSpeex::default();
        let mut rs = Resampler::new(Bridge::new(lib.clone()));

        rs.process(&[0; 160], 1, 8000, 16000).unwrap();
        rs.process(&[0; 160], 1, 8000, 16000).unwrap();
        assert_eq!(lib.calls("resampler_init"), 1);

        // Same channels, new rates: retuned in place.
        rs.process(&[0; 160], 1, 16000, 48000).unwrap();
        assert_eq!(lib.calls("resampler_init"), 1);
        assert_eq!(lib.calls("resampler_set_rate"), 1);

        // New channel count: recreated.
        rs.process(&[0; 160], 2, 16000, 48000).unwrap();
        assert_eq!(lib.calls("resampler_init"), 2);
        assert_eq!(lib.calls("resampler_destroy"), 1);
        assert_eq!(lib.live_allocations(), 1);

        drop(rs);
        assert_eq!(lib.live_allocations(), 0);
    }

    #[test]
    fn test_output_capacity() {
        let lib = FakeSpeex::default();
        let mut rs = Resampler::new(Bridge::new(lib));
        assert_eq!(rs.process(&[0; 441], 1, 44100, 8000).unwrap().len(), 80);
        assert!(rs.process(&[0], 2, 44100, 8000).unwrap().is_empty());
    }

    #[test]
    fn test_init_failure() {
        let lib = FakeSpeex::default();
        let config = ResamplerConfig { quality: 42 };
        let mut rs = Resampler::with_config(Bridge::new(lib), &config);
        assert_eq!(
            rs.process(&[0; 10], 1, 8000, 16000),
            Err(SpeexError::Resampler(RESAMPLER_ERR_INVALID_ARG))
        );
        assert!(rs.handle().is_null());
    }

    #[test]
    fn test_process_ignores_status() {
        let lib = FakeSpeex::default().resample_status(2);
        let mut rs = Resampler::new(Bridge::new(lib));
        let out = rs.process(&[7; 10], 1, 8000, 16000).unwrap();
        assert_eq!(out, vec![7; 20]);
    }
}
