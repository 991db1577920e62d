//! Speex control requests, mode ids and resampler constants.

/// Enhancement on or off (decoder).
pub const SPEEX_SET_ENH: i32 = 0;
pub const SPEEX_GET_ENH: i32 = 1;
/// Samples per frame.
pub const SPEEX_GET_FRAME_SIZE: i32 = 3;
/// Encoder quality, 0 to 10.
pub const SPEEX_SET_QUALITY: i32 = 4;
pub const SPEEX_SET_VBR: i32 = 12;
pub const SPEEX_GET_VBR: i32 = 13;
pub const SPEEX_SET_COMPLEXITY: i32 = 16;
pub const SPEEX_GET_COMPLEXITY: i32 = 17;
pub const SPEEX_GET_BITRATE: i32 = 19;
pub const SPEEX_SET_SAMPLING_RATE: i32 = 24;
pub const SPEEX_GET_SAMPLING_RATE: i32 = 25;

pub const SPEEX_MODEID_NB: i32 = 0;
pub const SPEEX_MODEID_WB: i32 = 1;
pub const SPEEX_MODEID_UWB: i32 = 2;

pub const SPEEX_RESAMPLER_QUALITY_MAX: i32 = 10;
pub const SPEEX_RESAMPLER_QUALITY_MIN: i32 = 0;
pub const SPEEX_RESAMPLER_QUALITY_DEFAULT: i32 = 4;
pub const SPEEX_RESAMPLER_QUALITY_VOIP: i32 = 3;
pub const SPEEX_RESAMPLER_QUALITY_DESKTOP: i32 = 5;

pub const RESAMPLER_ERR_SUCCESS: i32 = 0;
pub const RESAMPLER_ERR_ALLOC_FAILED: i32 = 1;
pub const RESAMPLER_ERR_BAD_STATE: i32 = 2;
pub const RESAMPLER_ERR_INVALID_ARG: i32 = 3;
pub const RESAMPLER_ERR_PTR_OVERLAP: i32 = 4;
pub const RESAMPLER_ERR_OVERFLOW: i32 = 5;

/// Speex codec mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModeId {
    /// Narrowband, 8 kHz.
    Narrowband,
    /// Wideband, 16 kHz.
    Wideband,
    /// Ultra-wideband, 32 kHz.
    UltraWideband,
}

impl ModeId {
    /// Picks the mode for a sample rate: 16 kHz is wideband, 32 kHz
    /// ultra-wideband, anything else narrowband.
    pub fn for_sample_rate(sample_rate: i32) -> Self {
        match sample_rate {
            16000 => Self::Wideband,
            32000 => Self::UltraWideband,
            _ => Self::Narrowband,
        }
    }

    pub fn to_ffi(self) -> i32 {
        match self {
            Self::Narrowband => SPEEX_MODEID_NB,
            Self::Wideband => SPEEX_MODEID_WB,
            Self::UltraWideband => SPEEX_MODEID_UWB,
        }
    }
}

impl From<ModeId> for i32 {
    fn from(mode: ModeId) -> i32 {
        mode.to_ffi()
    }
}

/// Returns libspeexdsp's description of a resampler error code.
pub fn resampler_strerror(code: i32) -> &'static str {
    match code {
        RESAMPLER_ERR_SUCCESS => "Success.",
        RESAMPLER_ERR_ALLOC_FAILED => "Memory allocation failed.",
        RESAMPLER_ERR_BAD_STATE => "Bad resampler state.",
        RESAMPLER_ERR_INVALID_ARG => "Invalid argument.",
        RESAMPLER_ERR_PTR_OVERLAP => "Input and output buffers overlap.",
        _ => "Unknown error. Bad error code or strange version mismatch.",
    }
}
