//! Utility modules.

mod config;

pub use config::{Config, DeviceConfig};
