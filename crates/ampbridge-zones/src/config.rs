//! Bridge configuration.
//!
//! The configuration is built once at startup (normally deserialized from
//! YAML by the runner) and handed to [`crate::Registry::new`] by reference.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Highest controller (amplifier unit) id in a stack.
pub const MAX_CONTROLLERS: u8 = 3;

/// Zones driven by one controller.
pub const ZONES_PER_CONTROLLER: u8 = 6;

/// Default serial speed of the amplifier.
pub const DEFAULT_SPEED: u32 = 9600;

/// Serial link settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerialConfig {
    /// Serial device path, or `tcp://host:port` for a networked serial server.
    pub device: String,
    /// Baud rate.
    #[serde(default = "default_speed")]
    pub speed: u32,
}

fn default_speed() -> u32 {
    DEFAULT_SPEED
}

impl Default for SerialConfig {
    fn default() -> Self {
        SerialConfig {
            device: "/dev/ttyUSB0".to_string(),
            speed: DEFAULT_SPEED,
        }
    }
}

/// One zone of a controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneConfig {
    /// Zone number (1-6).
    pub zone: u8,
    /// Display name.
    #[serde(default)]
    pub name: String,
}

/// One amplifier unit in the stack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerConfig {
    /// Controller number (1-3).
    pub controller: u8,
    /// Zones managed on this controller.
    #[serde(default)]
    pub zones: Vec<ZoneConfig>,
}

/// Complete bridge configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Serial link settings.
    #[serde(default)]
    pub serial: SerialConfig,
    /// Source (input channel) names, first entry is channel 1.
    #[serde(default)]
    pub sources: Vec<String>,
    /// Controllers and their zones.
    #[serde(default)]
    pub controllers: Vec<ControllerConfig>,
}

impl BridgeConfig {
    /// Check id ranges and uniqueness.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut controllers = HashSet::new();
        for controller in &self.controllers {
            let id = controller.controller;
            if !(1..=MAX_CONTROLLERS).contains(&id) {
                return Err(ConfigError::ControllerOutOfRange(id));
            }
            if !controllers.insert(id) {
                return Err(ConfigError::DuplicateController(id));
            }

            let mut zones = HashSet::new();
            for zone in &controller.zones {
                if !(1..=ZONES_PER_CONTROLLER).contains(&zone.zone) {
                    return Err(ConfigError::ZoneOutOfRange {
                        controller: id,
                        zone: zone.zone,
                    });
                }
                if !zones.insert(zone.zone) {
                    return Err(ConfigError::DuplicateZone {
                        controller: id,
                        zone: zone.zone,
                    });
                }
            }
        }
        Ok(())
    }

    /// Number of zones across all controllers.
    pub fn zone_count(&self) -> usize {
        self.controllers.iter().map(|c| c.zones.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controller(id: u8, zones: &[u8]) -> ControllerConfig {
        ControllerConfig {
            controller: id,
            zones: zones
                .iter()
                .map(|&zone| ZoneConfig {
                    zone,
                    name: format!("Zone {}{}", id, zone),
                })
                .collect(),
        }
    }

    #[test]
    fn test_valid_config() {
        let config = BridgeConfig {
            controllers: vec![controller(1, &[1, 2, 3, 4, 5, 6]), controller(2, &[1])],
            ..Default::default()
        };
        assert!(config.validate().is_ok());
        assert_eq!(config.zone_count(), 7);
    }

    #[test]
    fn test_controller_out_of_range() {
        for id in [0, 4] {
            let config = BridgeConfig {
                controllers: vec![controller(id, &[1])],
                ..Default::default()
            };
            assert_eq!(config.validate(), Err(ConfigError::ControllerOutOfRange(id)));
        }
    }

    #[test]
    fn test_zone_out_of_range() {
        let config = BridgeConfig {
            controllers: vec![controller(1, &[7])],
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::ZoneOutOfRange { controller: 1, zone: 7 })
        );
    }

    #[test]
    fn test_duplicates_rejected() {
        let config = BridgeConfig {
            controllers: vec![controller(1, &[1]), controller(1, &[2])],
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::DuplicateController(1)));

        let config = BridgeConfig {
            controllers: vec![controller(2, &[3, 3])],
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::DuplicateZone { controller: 2, zone: 3 })
        );
    }

    #[test]
    fn test_serial_defaults() {
        let serial = SerialConfig::default();
        assert_eq!(serial.speed, DEFAULT_SPEED);
    }
}
