//! Codec settings loaded from YAML.
//!
//! Configuration is stored in ~/.codec-bridge/config.yaml. Every field has a
//! default, so a missing file or a partial one is fine.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::opus::Application;
use crate::speex::DEFAULT_QUALITY;
use crate::speex::ctl::SPEEX_RESAMPLER_QUALITY_VOIP;

/// Default base configuration directory name.
pub const DEFAULT_BASE_DIR: &str = ".codec-bridge";
/// Default configuration filename.
pub const DEFAULT_CONFIG_FILE: &str = "config.yaml";

/// Configuration error.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config: cannot determine home directory")]
    NoHomeDir,
    #[error("config: {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("config: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Settings for every codec family.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    pub opus: OpusConfig,
    pub speex: SpeexConfig,
    pub resampler: ResamplerConfig,
}

/// Opus encoder settings. Unset options keep the libopus defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpusConfig {
    pub sample_rate: i32,
    pub channels: i32,
    pub application: Application,
    /// Bits per second.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bitrate: Option<i32>,
    /// 0 to 10.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub complexity: Option<i32>,
    pub inband_fec: bool,
    /// Expected packet loss in percent.
    pub packet_loss_perc: i32,
    pub dtx: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vbr: Option<bool>,
}

impl Default for OpusConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16000,
            channels: 1,
            application: Application::VoIP,
            bitrate: None,
            complexity: None,
            inband_fec: false,
            packet_loss_perc: 0,
            dtx: false,
            vbr: None,
        }
    }
}

/// Speex codec settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeexConfig {
    /// 8000, 16000 or 32000; picks the codec mode.
    pub sample_rate: i32,
    /// Encoder quality, 0 to 10.
    pub quality: i32,
    /// Decoder perceptual enhancement.
    pub enhancement: bool,
}

impl Default for SpeexConfig {
    fn default() -> Self {
        Self {
            sample_rate: 8000,
            quality: DEFAULT_QUALITY,
            enhancement: true,
        }
    }
}

/// Resampler settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResamplerConfig {
    /// 0 to 10.
    pub quality: i32,
}

impl Default for ResamplerConfig {
    fn default() -> Self {
        Self {
            quality: SPEEX_RESAMPLER_QUALITY_VOIP,
        }
    }
}

impl BridgeConfig {
    /// Gets the default config directory.
    pub fn default_config_dir() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(DEFAULT_BASE_DIR))
    }

    /// Gets the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        Self::default_config_dir().map(|dir| dir.join(DEFAULT_CONFIG_FILE))
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }
}

fn resolve_path(custom_path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    match custom_path {
        Some(p) => Ok(p.to_path_buf()),
        None => BridgeConfig::default_config_path().ok_or(ConfigError::NoHomeDir),
    }
}

/// Loads the configuration, falling back to defaults when the file does
/// not exist.
pub fn load_config(custom_path: Option<&Path>) -> Result<BridgeConfig, ConfigError> {
    let path = resolve_path(custom_path)?;
    if !path.exists() {
        return Ok(BridgeConfig::default());
    }
    let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
        path: path.clone(),
        source,
    })?;
    BridgeConfig::from_yaml(&content)
}

/// Saves the configuration, creating its directory if needed. Returns the
/// path written.
pub fn save_config(
    config: &BridgeConfig,
    custom_path: Option<&Path>,
) -> Result<PathBuf, ConfigError> {
    let path = resolve_path(custom_path)?;
    let io_err = |source| ConfigError::Io {
        path: path.clone(),
        source,
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }
    std::fs::write(&path, config.to_yaml()?).map_err(io_err)?;
    Ok(path)
}
