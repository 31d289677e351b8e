//! Configuration handling.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tch::Device;
use tracing::warn;

use crate::error::{Error, Result};
use crate::model::BackboneConfig;

/// Main configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Backbone architecture and hyperparameters
    pub backbone: BackboneConfig,
    /// Device to place parameters on
    #[serde(default)]
    pub device: DeviceConfig,
    /// Batch size used by the shape check
    #[serde(default = "default_batch_size")]
    pub batch_size: i64,
}

fn default_batch_size() -> i64 {
    8
}

/// Device selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceConfig {
    #[default]
    Cpu,
    /// CUDA device index
    Cuda(usize),
}

impl DeviceConfig {
    /// Resolve to a tch device, falling back to CPU when the CUDA device does not exist.
    pub fn to_device(self) -> Device {
        match self {
            DeviceConfig::Cpu => Device::Cpu,
            DeviceConfig::Cuda(index) if (index as i64) < tch::Cuda::device_count() => {
                Device::Cuda(index)
            }
            DeviceConfig::Cuda(index) => {
                warn!(
                    "CUDA device {} requested but only {} available, using CPU",
                    index,
                    tch::Cuda::device_count()
                );
                Device::Cpu
            }
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backbone: BackboneConfig::default(),
            device: DeviceConfig::Cpu,
            batch_size: default_batch_size(),
        }
    }
}

impl Config {
    /// Default configuration around `backbone`.
    pub fn with_backbone(backbone: BackboneConfig) -> Self {
        Self {
            backbone,
            ..Default::default()
        }
    }

    /// Load configuration from file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file.
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Check values that the backbone constructors do not see.
    pub fn validate(&self) -> Result<()> {
        if self.batch_size < 1 {
            return Err(Error::InvalidConfig(format!(
                "batch_size must be at least 1, got {}",
                self.batch_size
            )));
        }
        Ok(())
    }
}
