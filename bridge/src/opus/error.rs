//! libopus error codes.

use thiserror::Error;

pub const OPUS_OK: i32 = 0;
pub const OPUS_BAD_ARG: i32 = -1;
pub const OPUS_BUFFER_TOO_SMALL: i32 = -2;
pub const OPUS_INTERNAL_ERROR: i32 = -3;
pub const OPUS_INVALID_PACKET: i32 = -4;
pub const OPUS_UNIMPLEMENTED: i32 = -5;
pub const OPUS_INVALID_STATE: i32 = -6;
pub const OPUS_ALLOC_FAIL: i32 = -7;

/// A negative libopus status, one variant per documented code.
///
/// The code a variant was built from is always recoverable through
/// [`code`](OpusError::code); unknown codes are kept in [`OpusError::Other`].
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpusError {
    #[error("opus: invalid argument")]
    BadArg,
    #[error("opus: buffer too small")]
    BufferTooSmall,
    #[error("opus: internal error")]
    InternalError,
    #[error("opus: corrupted stream")]
    InvalidPacket,
    #[error("opus: request not implemented")]
    Unimplemented,
    #[error("opus: invalid state")]
    InvalidState,
    #[error("opus: memory allocation failed")]
    AllocFail,
    #[error("opus: unknown error {0}")]
    Other(i32),
}

impl OpusError {
    /// Maps a libopus status to an error. Returns `None` for non-negative
    /// values, which are not errors.
    pub fn from_code(code: i32) -> Option<Self> {
        let err = match code {
            c if c >= OPUS_OK => return None,
            OPUS_BAD_ARG => Self::BadArg,
            OPUS_BUFFER_TOO_SMALL => Self::BufferTooSmall,
            OPUS_INTERNAL_ERROR => Self::InternalError,
            OPUS_INVALID_PACKET => Self::InvalidPacket,
            OPUS_UNIMPLEMENTED => Self::Unimplemented,
            OPUS_INVALID_STATE => Self::InvalidState,
            OPUS_ALLOC_FAIL => Self::AllocFail,
            other => Self::Other(other),
        };
        Some(err)
    }

    /// Returns the libopus status code.
    pub fn code(&self) -> i32 {
        match self {
            Self::BadArg => OPUS_BAD_ARG,
            Self::BufferTooSmall => OPUS_BUFFER_TOO_SMALL,
            Self::InternalError => OPUS_INTERNAL_ERROR,
            Self::InvalidPacket => OPUS_INVALID_PACKET,
            Self::Unimplemented => OPUS_UNIMPLEMENTED,
            Self::InvalidState => OPUS_INVALID_STATE,
            Self::AllocFail => OPUS_ALLOC_FAIL,
            Self::Other(code) => *code,
        }
    }
}

/// Splits a libopus return value into a count or an error.
pub(crate) fn check(ret: i32) -> Result<i32, OpusError> {
    match OpusError::from_code(ret) {
        Some(err) => Err(err),
        None => Ok(ret),
    }
}

/// Collapses an adapter result into the single signed integer a host
/// binding returns: the value on success, the negative code on failure.
pub trait IntoStatus {
    fn into_status(self) -> i32;
}

impl IntoStatus for Result<i32, OpusError> {
    fn into_status(self) -> i32 {
        self.unwrap_or_else(|e| e.code())
    }
}

impl IntoStatus for Result<usize, OpusError> {
    fn into_status(self) -> i32 {
        match self {
            Ok(n) => n as i32,
            Err(e) => e.code(),
        }
    }
}

impl IntoStatus for Result<(), OpusError> {
    fn into_status(self) -> i32 {
        match self {
            Ok(()) => OPUS_OK,
            Err(e) => e.code(),
        }
    }
}
