//! Encoder control requests and their typed values.

use std::fmt;

use serde::{Deserialize, Serialize};

pub const OPUS_SET_BITRATE_REQUEST: i32 = 4002;
pub const OPUS_GET_BITRATE_REQUEST: i32 = 4003;
pub const OPUS_SET_MAX_BANDWIDTH_REQUEST: i32 = 4004;
pub const OPUS_GET_MAX_BANDWIDTH_REQUEST: i32 = 4005;
pub const OPUS_SET_VBR_REQUEST: i32 = 4006;
pub const OPUS_GET_VBR_REQUEST: i32 = 4007;
pub const OPUS_SET_BANDWIDTH_REQUEST: i32 = 4008;
pub const OPUS_GET_BANDWIDTH_REQUEST: i32 = 4009;
pub const OPUS_SET_COMPLEXITY_REQUEST: i32 = 4010;
pub const OPUS_GET_COMPLEXITY_REQUEST: i32 = 4011;
pub const OPUS_SET_INBAND_FEC_REQUEST: i32 = 4012;
pub const OPUS_GET_INBAND_FEC_REQUEST: i32 = 4013;
pub const OPUS_SET_PACKET_LOSS_PERC_REQUEST: i32 = 4014;
pub const OPUS_GET_PACKET_LOSS_PERC_REQUEST: i32 = 4015;
pub const OPUS_SET_DTX_REQUEST: i32 = 4016;
pub const OPUS_GET_DTX_REQUEST: i32 = 4017;
pub const OPUS_SET_VBR_CONSTRAINT_REQUEST: i32 = 4020;
pub const OPUS_GET_VBR_CONSTRAINT_REQUEST: i32 = 4021;
pub const OPUS_SET_FORCE_CHANNELS_REQUEST: i32 = 4022;
pub const OPUS_GET_FORCE_CHANNELS_REQUEST: i32 = 4023;

pub const OPUS_AUTO: i32 = -1000;
pub const OPUS_BITRATE_MAX: i32 = -1;

pub const OPUS_APPLICATION_VOIP: i32 = 2048;
pub const OPUS_APPLICATION_AUDIO: i32 = 2049;
pub const OPUS_APPLICATION_RESTRICTED_LOWDELAY: i32 = 2051;

pub const OPUS_BANDWIDTH_NARROWBAND: i32 = 1101;
pub const OPUS_BANDWIDTH_MEDIUMBAND: i32 = 1102;
pub const OPUS_BANDWIDTH_WIDEBAND: i32 = 1103;
pub const OPUS_BANDWIDTH_SUPERWIDEBAND: i32 = 1104;
pub const OPUS_BANDWIDTH_FULLBAND: i32 = 1105;

/// Largest packet libopus produces: one TOC byte plus 1275 payload bytes.
pub const MAX_PACKET: usize = 1 + 1275;

/// Sample rates libopus accepts.
pub const SAMPLE_RATES: [i32; 5] = [8000, 12000, 16000, 24000, 48000];

/// Opus application type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Application {
    /// Best quality for voice signals.
    #[default]
    #[serde(rename = "voip")]
    VoIP,
    /// Best quality for non-voice signals.
    Audio,
    /// Minimum possible coding delay.
    RestrictedLowdelay,
}

impl Application {
    pub fn to_ffi(self) -> i32 {
        match self {
            Self::VoIP => OPUS_APPLICATION_VOIP,
            Self::Audio => OPUS_APPLICATION_AUDIO,
            Self::RestrictedLowdelay => OPUS_APPLICATION_RESTRICTED_LOWDELAY,
        }
    }
}

/// Audio bandwidth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bandwidth {
    /// Narrowband (4 kHz).
    NB,
    /// Mediumband (6 kHz).
    MB,
    /// Wideband (8 kHz).
    WB,
    /// Super-wideband (12 kHz).
    SWB,
    /// Fullband (20 kHz).
    FB,
}

impl Bandwidth {
    pub const ALL: [Bandwidth; 5] = [Self::NB, Self::MB, Self::WB, Self::SWB, Self::FB];

    pub fn to_ffi(self) -> i32 {
        match self {
            Self::NB => OPUS_BANDWIDTH_NARROWBAND,
            Self::MB => OPUS_BANDWIDTH_MEDIUMBAND,
            Self::WB => OPUS_BANDWIDTH_WIDEBAND,
            Self::SWB => OPUS_BANDWIDTH_SUPERWIDEBAND,
            Self::FB => OPUS_BANDWIDTH_FULLBAND,
        }
    }

    pub fn from_ffi(value: i32) -> Option<Self> {
        match value {
            OPUS_BANDWIDTH_NARROWBAND => Some(Self::NB),
            OPUS_BANDWIDTH_MEDIUMBAND => Some(Self::MB),
            OPUS_BANDWIDTH_WIDEBAND => Some(Self::WB),
            OPUS_BANDWIDTH_SUPERWIDEBAND => Some(Self::SWB),
            OPUS_BANDWIDTH_FULLBAND => Some(Self::FB),
            _ => None,
        }
    }

    /// Returns the audio bandwidth in Hz.
    pub fn hz(&self) -> i32 {
        match self {
            Self::NB => 4000,
            Self::MB => 6000,
            Self::WB => 8000,
            Self::SWB => 12000,
            Self::FB => 20000,
        }
    }
}

impl fmt::Display for Bandwidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::NB => "NB",
            Self::MB => "MB",
            Self::WB => "WB",
            Self::SWB => "SWB",
            Self::FB => "FB",
        };
        write!(f, "{}", s)
    }
}

/// Target bitrate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bitrate {
    /// Chosen by the encoder.
    Auto,
    /// As high as the packet size allows.
    Max,
    /// Bits per second.
    Bps(i32),
}

impl Bitrate {
    pub fn to_ffi(self) -> i32 {
        match self {
            Self::Auto => OPUS_AUTO,
            Self::Max => OPUS_BITRATE_MAX,
            Self::Bps(bps) => bps,
        }
    }

    pub fn from_ffi(value: i32) -> Self {
        match value {
            OPUS_AUTO => Self::Auto,
            OPUS_BITRATE_MAX => Self::Max,
            bps => Self::Bps(bps),
        }
    }
}

/// Forced channel count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForceChannels {
    Auto,
    Mono,
    Stereo,
}

impl ForceChannels {
    pub fn to_ffi(self) -> i32 {
        match self {
            Self::Auto => OPUS_AUTO,
            Self::Mono => 1,
            Self::Stereo => 2,
        }
    }

    pub fn from_ffi(value: i32) -> Option<Self> {
        match value {
            OPUS_AUTO => Some(Self::Auto),
            1 => Some(Self::Mono),
            2 => Some(Self::Stereo),
            _ => None,
        }
    }
}

/// Frame duration of an Opus packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameDuration {
    Duration2500us,
    Duration5ms,
    Duration10ms,
    Duration20ms,
    Duration40ms,
    Duration60ms,
}

impl FrameDuration {
    /// Returns the duration in microseconds.
    pub fn micros(&self) -> i32 {
        match self {
            Self::Duration2500us => 2500,
            Self::Duration5ms => 5000,
            Self::Duration10ms => 10000,
            Self::Duration20ms => 20000,
            Self::Duration40ms => 40000,
            Self::Duration60ms => 60000,
        }
    }

    /// Returns the number of samples per channel at `sample_rate`.
    pub fn samples(&self, sample_rate: i32) -> i32 {
        (sample_rate as i64 * self.micros() as i64 / 1_000_000) as i32
    }
}
