//! Speex error codes.

use thiserror::Error;

use super::ctl::resampler_strerror;

/// Failure reported by libspeex, libspeexdsp or the bridge itself.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpeexError {
    /// `speex_decode_int` returned -1.
    #[error("speex: end of stream")]
    EndOfStream,
    /// `speex_decode_int` returned -2.
    #[error("speex: corrupt stream")]
    CorruptStream,
    /// A ctl request returned a non-zero status.
    #[error("speex: ctl failed with status {0}")]
    Ctl(i32),
    /// A resampler call returned a `RESAMPLER_ERR_*` code.
    #[error("speex: resampler error {0}")]
    Resampler(i32),
    /// A buffer could not be pinned; the library was not called.
    #[error("speex: buffer unavailable")]
    BufferUnavailable,
    /// An init call returned null.
    #[error("speex: {0} failed")]
    InitFailed(&'static str),
    #[error("speex: output buffer too small: need {need}, have {have}")]
    BufferTooSmall { need: usize, have: usize },
}

impl SpeexError {
    /// Returns the native status this error carries, if it came from the
    /// library.
    pub fn code(&self) -> Option<i32> {
        match self {
            Self::EndOfStream => Some(-1),
            Self::CorruptStream => Some(-2),
            Self::Ctl(code) | Self::Resampler(code) => Some(*code),
            Self::BufferUnavailable | Self::InitFailed(_) | Self::BufferTooSmall { .. } => None,
        }
    }

    /// Returns libspeexdsp's description of a resampler error.
    pub fn resampler_message(&self) -> Option<&'static str> {
        match self {
            Self::Resampler(code) => Some(resampler_strerror(*code)),
            _ => None,
        }
    }

    pub(crate) fn from_decode(ret: i32) -> Result<(), Self> {
        match ret {
            0 => Ok(()),
            -1 => Err(Self::EndOfStream),
            _ => Err(Self::CorruptStream),
        }
    }
}
