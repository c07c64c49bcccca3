//! Configuration for the FEM stream decoder
//!
//! Loaded from a TOML file with a `[decoder]` table:
//!
//! ```toml
//! [decoder]
//! light_slot = 16
//! use_charge_roi = true
//! channel_threshold = [2100, 2100, 2150]
//! pre_samples = 10
//! post_samples = 40
//! ```

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("channel_threshold must be non-empty when use_charge_roi is enabled")]
    MissingThresholds,
}

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub decoder: DecoderSettings,
}

impl Config {
    /// Load and validate configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Load configuration from a TOML string (useful for testing)
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.decoder.validate()?;
        Ok(config)
    }
}

/// Decoder settings
#[derive(Debug, Clone, Deserialize)]
pub struct DecoderSettings {
    /// Slot number of the FEM carrying the light readout; every other slot
    /// is treated as charge. (A third, unrelated slot would silently decode
    /// as charge - known limitation of the slot-based disambiguation.)
    #[serde(default = "default_light_slot")]
    pub light_slot: u16,

    /// Keep only threshold windows of charge traces instead of the full
    /// waveform
    #[serde(default)]
    pub use_charge_roi: bool,

    /// Per-channel ADC thresholds, indexed by the implicit charge channel
    /// number; required when `use_charge_roi` is set
    #[serde(default)]
    pub channel_threshold: Vec<u16>,

    /// Samples kept before a threshold crossing
    #[serde(default = "default_pre_samples")]
    pub pre_samples: usize,

    /// Samples kept from a threshold crossing onwards
    #[serde(default = "default_post_samples")]
    pub post_samples: usize,
}

fn default_light_slot() -> u16 {
    16
}

fn default_pre_samples() -> usize {
    10
}

fn default_post_samples() -> usize {
    40
}

impl Default for DecoderSettings {
    fn default() -> Self {
        Self {
            light_slot: default_light_slot(),
            use_charge_roi: false,
            channel_threshold: Vec::new(),
            pre_samples: default_pre_samples(),
            post_samples: default_post_samples(),
        }
    }
}

impl DecoderSettings {
    /// Check cross-field consistency.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.use_charge_roi && self.channel_threshold.is_empty() {
            return Err(ConfigError::MissingThresholds);
        }
        Ok(())
    }
}
