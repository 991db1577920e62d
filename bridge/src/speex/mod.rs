//! Speex codec and resampler over libspeex and libspeexdsp.
//!
//! [`Bridge`] mirrors the C API one call per method. [`Encoder`],
//! [`Decoder`] and [`Resampler`] own their native state and release it on
//! drop.

pub mod ctl;
pub mod ffi;

mod bits;
mod bridge;
mod decoder;
mod encoder;
mod error;
mod resampler;

pub use bits::Bits;
pub use bridge::*;
pub use ctl::ModeId;
pub use decoder::Decoder;
pub use encoder::{DEFAULT_QUALITY, Encoder};
pub use error::SpeexError;
pub use ffi::SpeexLib;
#[cfg(feature = "speex")]
pub use ffi::LibSpeex;
pub use resampler::Resampler;

/// Checks that libspeex hands out its narrowband mode.
pub fn assert_functional<L: SpeexLib>(bridge: &Bridge<L>) -> Result<(), SpeexError> {
    if bridge.lib_get_mode(ModeId::Narrowband).is_null() {
        return Err(SpeexError::InitFailed("lib_get_mode"));
    }
    Ok(())
}
