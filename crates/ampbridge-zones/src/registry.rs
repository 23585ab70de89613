//! The set of zones built from configuration.

use std::collections::HashMap;
use std::sync::Arc;

use ampbridge_metrics::{metric_defs, metrics};
use ampbridge_protocol::ZoneAddress;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::BridgeConfig;
use crate::error::{ZoneError, ZoneResult};
use crate::transport::Transport;
use crate::zone::Zone;

/// Discovery entry for one zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ZoneInfo {
    /// Two-digit address id.
    pub id: String,
    /// Controller number.
    pub controller: u8,
    /// Zone number.
    pub zone: u8,
    /// Display name.
    pub name: String,
}

/// Discovery entry for one source channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceInfo {
    /// Channel number, starting at 1.
    pub id: usize,
    /// Display name.
    pub name: String,
}

/// All configured zones, sharing one transport.
#[derive(Debug)]
pub struct Registry {
    zones: Vec<Zone>,
    index: HashMap<ZoneAddress, usize>,
    sources: Arc<[String]>,
}

impl Registry {
    /// Validate the configuration and build one zone per configured
    /// (controller, zone) pair.
    ///
    /// Each zone writes a status query as it is built. A failed write is
    /// logged and the zone is kept; its state simply stays unset until a
    /// later refresh succeeds.
    pub fn new(config: &BridgeConfig, transport: Arc<dyn Transport>) -> ZoneResult<Registry> {
        config.validate()?;

        let sources: Arc<[String]> = config.sources.clone().into();
        let mut zones = Vec::with_capacity(config.zone_count());
        let mut index = HashMap::with_capacity(config.zone_count());

        for controller in &config.controllers {
            for zone_config in &controller.zones {
                let address = ZoneAddress::new(controller.controller, zone_config.zone)?;
                let zone = Zone::new(
                    address,
                    zone_config.name.clone(),
                    sources.clone(),
                    transport.clone(),
                );
                if let Err(e) = zone.refresh_state() {
                    warn!(zone = %address, error = %e, "initial status query failed");
                }
                index.insert(address, zones.len());
                zones.push(zone);
            }
        }

        info!(zones = zones.len(), sources = sources.len(), "registry built");
        metrics::gauge!(metric_defs::ZONES_MANAGED.name).set(zones.len() as f64);

        Ok(Registry {
            zones,
            index,
            sources,
        })
    }

    /// Find a zone by controller and zone number.
    pub fn lookup(&self, controller: u8, zone: u8) -> Option<&Zone> {
        let address = ZoneAddress::new(controller, zone).ok()?;
        self.get(address)
    }

    /// Like [`Registry::lookup`], but reports a miss as an error.
    pub fn zone(&self, controller: u8, zone: u8) -> ZoneResult<&Zone> {
        self.lookup(controller, zone)
            .ok_or(ZoneError::UnknownZone { controller, zone })
    }

    /// Find a zone by bus address.
    pub fn get(&self, address: ZoneAddress) -> Option<&Zone> {
        self.index.get(&address).map(|&i| &self.zones[i])
    }

    /// Zones in configuration order.
    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }

    /// Discovery entries for every zone.
    pub fn zone_infos(&self) -> Vec<ZoneInfo> {
        self.zones
            .iter()
            .map(|zone| ZoneInfo {
                id: zone.id(),
                controller: zone.address().unit(),
                zone: zone.address().zone(),
                name: zone.name().to_string(),
            })
            .collect()
    }

    /// Controller numbers that have at least one zone, in configuration order.
    pub fn controllers(&self) -> Vec<u8> {
        let mut controllers: Vec<u8> = Vec::new();
        for zone in &self.zones {
            let unit = zone.address().unit();
            if !controllers.contains(&unit) {
                controllers.push(unit);
            }
        }
        controllers
    }

    /// Configured sources with their channel numbers.
    pub fn source_names(&self) -> Vec<SourceInfo> {
        source_infos(&self.sources)
    }
}

/// Source discovery entries for a list of names.
pub fn source_infos(sources: &[String]) -> Vec<SourceInfo> {
    sources
        .iter()
        .enumerate()
        .map(|(i, name)| SourceInfo {
            id: i + 1,
            name: name.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ControllerConfig, ZoneConfig};
    use crate::error::ConfigError;
    use crate::transport::MemoryTransport;

    fn config() -> BridgeConfig {
        BridgeConfig {
            sources: vec!["Tuner".into(), "Streamer".into()],
            controllers: vec![
                ControllerConfig {
                    controller: 1,
                    zones: vec![
                        ZoneConfig { zone: 1, name: "Kitchen".into() },
                        ZoneConfig { zone: 2, name: "Den".into() },
                    ],
                },
                ControllerConfig {
                    controller: 2,
                    zones: vec![ZoneConfig { zone: 6, name: "Patio".into() }],
                },
            ],
            ..Default::default()
        }
    }

    #[test]
    fn test_each_zone_queries_on_construction() {
        let transport = Arc::new(MemoryTransport::new());
        let registry = Registry::new(&config(), transport.clone()).unwrap();
        assert_eq!(registry.zones().len(), 3);
        assert_eq!(transport.take(), vec!["?11\r", "?12\r", "?26\r"]);
    }

    #[test]
    fn test_lookup() {
        let registry = Registry::new(&config(), Arc::new(MemoryTransport::new())).unwrap();
        assert_eq!(registry.lookup(1, 2).unwrap().name(), "Den");
        assert_eq!(registry.lookup(2, 6).unwrap().id(), "26");
        assert!(registry.lookup(3, 1).is_none());
        assert!(registry.lookup(12, 1).is_none());
        assert!(matches!(
            registry.zone(2, 1),
            Err(ZoneError::UnknownZone { controller: 2, zone: 1 })
        ));
    }

    #[test]
    fn test_discovery() {
        let registry = Registry::new(&config(), Arc::new(MemoryTransport::new())).unwrap();
        assert_eq!(registry.controllers(), vec![1, 2]);

        let infos = registry.zone_infos();
        assert_eq!(infos[0].id, "11");
        assert_eq!(infos[2].name, "Patio");

        let sources = registry.source_names();
        assert_eq!(sources[0], SourceInfo { id: 1, name: "Tuner".into() });
        assert_eq!(sources[1].id, 2);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = config();
        config.controllers[0].controller = 4;
        let transport = Arc::new(MemoryTransport::new());
        let err = Registry::new(&config, transport.clone()).unwrap_err();
        assert!(matches!(err, ZoneError::Config(ConfigError::ControllerOutOfRange(4))));
        assert!(transport.is_empty());
    }
}
