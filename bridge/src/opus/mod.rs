//! Opus codec over libopus.
//!
//! [`Bridge`] exposes libopus one operation per method, with statuses kept
//! as [`OpusError`] codes. [`Encoder`] and [`Decoder`] build on it.
//!
//! # Example
//!
//! ```ignore
//! use codec_bridge::opus::{Bridge, Decoder, Encoder, Bitrate};
//!
//! let bridge = Bridge::native();
//! let mut encoder = Encoder::new_voip(bridge.clone(), 16000, 1)?;
//! encoder.set_bitrate(Bitrate::Bps(24000))?;
//!
//! let pcm = vec![0i16; 320]; // 20ms at 16kHz
//! let packet = encoder.encode(&pcm, 320)?;
//!
//! let mut decoder = Decoder::new(bridge, 16000, 1)?;
//! let decoded = decoder.decode(&packet)?;
//! ```

pub mod ctl;
pub mod ffi;

mod bridge;
mod decoder;
mod encoder;
mod error;

pub use bridge::*;
pub use ctl::{Application, Bandwidth, Bitrate, ForceChannels, FrameDuration, MAX_PACKET};
pub use decoder::*;
pub use encoder::*;
pub use error::*;
pub use ffi::OpusLib;
#[cfg(feature = "opus")]
pub use ffi::LibOpus;

/// Checks that libopus answers the state size queries.
pub fn assert_functional<L: OpusLib>(bridge: &Bridge<L>) -> Result<(), OpusError> {
    if bridge.decoder_get_size(1) == 0 || bridge.encoder_get_size(1) == 0 {
        return Err(OpusError::InternalError);
    }
    Ok(())
}
