//! Configuration for the MAX5820 controller binaries.
//!
//! This module handles loading configuration from a JSON file. Every field
//! has a default, so a partial file (or none at all) works. The library
//! itself never reads configuration; the binary resolves it and passes
//! plain values in.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::dac::DEFAULT_VREF_FALLBACK_MV;
use crate::error::{Error, Result};
use crate::transport::i2cdev;

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct Config {
    /// Where the DAC sits
    pub device: DeviceConfig,

    /// How the reference voltage is resolved
    pub vref: VrefConfig,
}

/// Bus location of the chip.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Bus character device the chip hangs off.
    pub path: PathBuf,

    /// The chip's 7-bit bus address.
    pub address: u8,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("/dev/i2c-1"),
            address: i2cdev::DEFAULT_ADDRESS,
        }
    }
}

/// Reference-voltage resolution policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct VrefConfig {
    /// sysfs attribute exposing the vref regulator's programmed voltage.
    /// Omit when the board has no readable regulator.
    pub regulator_microvolts: Option<PathBuf>,

    /// Millivolts assumed when the regulator is absent or unreadable.
    /// Setting this to null makes a regulator failure fatal.
    pub fallback_mv: Option<u16>,
}

impl Default for VrefConfig {
    fn default() -> Self {
        Self {
            regulator_microvolts: None,
            fallback_mv: Some(DEFAULT_VREF_FALLBACK_MV),
        }
    }
}

impl Config {
    /// Load configuration from a specific file.
    pub fn load_from(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        serde_json::from_str(&text).map_err(|e| {
            Error::Config(format!("cannot parse {}: {e}", path.display()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_a_bare_board() {
        let config = Config::default();
        assert_eq!(config.device.path, PathBuf::from("/dev/i2c-1"));
        assert_eq!(config.device.address, 0x38);
        assert_eq!(config.vref.regulator_microvolts, None);
        assert_eq!(config.vref.fallback_mv, Some(3300));
    }

    #[test]
    fn partial_file_keeps_defaults_for_the_rest() {
        let config: Config =
            serde_json::from_str(r#"{"device": {"address": 57}}"#).unwrap();
        assert_eq!(config.device.address, 0x39);
        assert_eq!(config.device.path, PathBuf::from("/dev/i2c-1"));
        assert_eq!(config.vref.fallback_mv, Some(3300));
    }

    #[test]
    fn full_file_round_trips() {
        let config: Config = serde_json::from_str(
            r#"{
                "device": {"path": "/dev/i2c-4", "address": 56},
                "vref": {
                    "regulator_microvolts":
                        "/sys/class/regulator/regulator.7/microvolts",
                    "fallback_mv": null
                }
            }"#,
        )
        .unwrap();
        assert_eq!(config.device.path, PathBuf::from("/dev/i2c-4"));
        assert_eq!(config.vref.fallback_mv, None);
        assert!(config.vref.regulator_microvolts.is_some());

        let text = serde_json::to_string(&config).unwrap();
        let reparsed: Config = serde_json::from_str(&text).unwrap();
        assert_eq!(reparsed.device.address, config.device.address);
    }

    #[test]
    fn missing_file_is_a_config_error() {
        let err = Config::load_from(Path::new("/nonexistent/max5820.json"))
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
