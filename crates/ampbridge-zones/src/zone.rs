//! One addressable amplifier output.

use std::fmt;
use std::sync::Arc;

use ampbridge_metrics::{metric_defs, metrics, ZoneLabels};
use ampbridge_protocol::{Command, ParamCode, RawValue, Response, ZoneAddress};
use tracing::{debug, error, info};

use crate::capability::{Capability, CapabilityHandle};
use crate::error::{ZoneError, ZoneResult};
use crate::state::{StateSnapshot, ZoneState};
use crate::transport::Transport;

/// Label used for frames that address the whole zone.
const STATUS_LABEL: &str = "status";

/// A zone on one controller, with its cached state and capabilities.
///
/// Every operation writes a single frame and returns at once. State changes
/// only when the dispatcher applies a matching response.
pub struct Zone {
    address: ZoneAddress,
    name: String,
    state: ZoneState,
    capabilities: Vec<Capability>,
    sources: Arc<[String]>,
    transport: Arc<dyn Transport>,
}

impl fmt::Debug for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Zone")
            .field("address", &self.address)
            .field("name", &self.name)
            .field("state", &self.state.snapshot())
            .finish_non_exhaustive()
    }
}

impl Zone {
    pub(crate) fn new(
        address: ZoneAddress,
        name: String,
        sources: Arc<[String]>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Zone {
            address,
            name,
            state: ZoneState::new(),
            capabilities: Capability::zone_set().to_vec(),
            sources,
            transport,
        }
    }

    /// Bus address.
    pub fn address(&self) -> ZoneAddress {
        self.address
    }

    /// Two-digit address id, e.g. `"11"`.
    pub fn id(&self) -> String {
        self.address.to_string()
    }

    /// Display name from the configuration.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Live state store.
    pub fn state(&self) -> &ZoneState {
        &self.state
    }

    /// Copy of the current state.
    pub fn snapshot(&self) -> StateSnapshot {
        self.state.snapshot()
    }

    /// Capabilities bound to this zone.
    pub fn capabilities(&self) -> impl Iterator<Item = CapabilityHandle<'_>> + '_ {
        self.capabilities
            .iter()
            .map(move |c| CapabilityHandle::new(self, *c))
    }

    /// The capability bound to a parameter, if any.
    pub fn capability(&self, param: ParamCode) -> Option<CapabilityHandle<'_>> {
        self.capabilities
            .iter()
            .find(|c| c.param() == param)
            .map(|c| CapabilityHandle::new(self, *c))
    }

    /// Like [`Zone::capability`], but reports a missing binding as an error.
    pub fn require_capability(&self, param: ParamCode) -> ZoneResult<CapabilityHandle<'_>> {
        self.capability(param).ok_or(ZoneError::NoCapability {
            address: self.address,
            param,
        })
    }

    /// Configured name of a source channel (1-based).
    pub fn source_name(&self, channel: i32) -> Option<&str> {
        let index = usize::try_from(channel).ok()?.checked_sub(1)?;
        self.sources.get(index).map(String::as_str)
    }

    /// Ask for a full status report and return the current, possibly stale,
    /// state without waiting for it.
    pub fn refresh_state(&self) -> ZoneResult<StateSnapshot> {
        self.send(&Command::QueryStatus {
            address: self.address,
        })?;
        Ok(self.snapshot())
    }

    /// Ask for a single parameter.
    pub fn query_param(&self, param: ParamCode) -> ZoneResult<()> {
        self.send(&Command::QueryParam {
            address: self.address,
            param,
        })
    }

    pub(crate) fn send_set(&self, param: ParamCode, value: RawValue) -> ZoneResult<()> {
        self.send(&Command::Set {
            address: self.address,
            param,
            value,
        })
    }

    fn send(&self, command: &Command) -> ZoneResult<()> {
        let param = match command {
            Command::QueryStatus { .. } => STATUS_LABEL,
            Command::QueryParam { param, .. } | Command::Set { param, .. } => param.as_str(),
        };
        let labels = ZoneLabels::new(self.id(), param).to_labels();

        debug!(zone = %self.address, frame = %command.to_command_string(), "writing frame");
        match self.transport.write_frame(&command.encode()) {
            Ok(()) => {
                metrics::counter!(metric_defs::FRAMES_WRITTEN.name, &labels).increment(1);
                Ok(())
            }
            Err(e) => {
                error!(zone = %self.address, error = %e, "frame write failed");
                metrics::counter!(metric_defs::FRAME_WRITE_ERRORS.name, &labels).increment(1);
                Err(e.into())
            }
        }
    }

    /// Apply a decoded response addressed to this zone. Returns the number
    /// of parameter fields written.
    pub(crate) fn apply(&self, response: &Response) -> usize {
        let updates = response.updates();
        if let Response::Status { fields: Some(_), address } = response {
            self.state.set_reported_address(*address);
        }

        for (param, value) in &updates {
            let previous = self.state.set(*param, *value);
            if previous != Some(*value) {
                info!(
                    zone = %self.address,
                    name = %self.name,
                    param = %param,
                    value = %value,
                    previous = ?previous.map(|v| v.to_string()),
                    "state changed"
                );
            }
            let labels = ZoneLabels::new(self.id(), param.as_str()).to_labels();
            metrics::counter!(metric_defs::STATE_UPDATES.name, &labels).increment(1);
        }
        updates.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MemoryTransport;

    fn zone(transport: Arc<MemoryTransport>) -> Zone {
        let sources: Arc<[String]> = vec!["Tuner".to_string(), "Streamer".to_string()].into();
        Zone::new(ZoneAddress::new(1, 2).unwrap(), "Kitchen".to_string(), sources, transport)
    }

    #[test]
    fn test_refresh_writes_query() {
        let transport = Arc::new(MemoryTransport::new());
        let zone = zone(transport.clone());
        let snapshot = zone.refresh_state().unwrap();
        assert!(snapshot.is_empty());
        assert_eq!(transport.take(), vec!["?12\r"]);
    }

    #[test]
    fn test_query_param() {
        let transport = Arc::new(MemoryTransport::new());
        let zone = zone(transport.clone());
        zone.query_param(ParamCode::Volume).unwrap();
        assert_eq!(transport.take(), vec!["?12VO\r"]);
    }

    #[test]
    fn test_apply_full_status() {
        let transport = Arc::new(MemoryTransport::new());
        let zone = zone(transport);
        let response = Response::parse("#>1200010000200707100100").unwrap();

        assert_eq!(zone.apply(&response), 10);
        let snapshot = zone.snapshot();
        assert_eq!(snapshot.unit.map(|v| v.value()), Some(1));
        assert_eq!(snapshot.zone.map(|v| v.value()), Some(2));
        assert_eq!(snapshot.get(ParamCode::Power), Some(RawValue::ON));
        assert_eq!(snapshot.get(ParamCode::Volume).unwrap().to_string(), "20");
        assert_eq!(snapshot.get(ParamCode::AllPower), None);
    }

    #[test]
    fn test_apply_empty_status_changes_nothing() {
        let transport = Arc::new(MemoryTransport::new());
        let zone = zone(transport);
        assert_eq!(zone.apply(&Response::parse("#>12").unwrap()), 0);
        assert!(zone.snapshot().is_empty());
    }

    #[test]
    fn test_capability_lookup() {
        let transport = Arc::new(MemoryTransport::new());
        let zone = zone(transport);
        assert_eq!(zone.capability(ParamCode::Volume).unwrap().capability().name(), "audioVolume");
        assert!(zone.capability(ParamCode::PublicAddress).is_none());
        assert!(matches!(
            zone.require_capability(ParamCode::AllPower),
            Err(ZoneError::NoCapability { .. })
        ));
        assert_eq!(zone.capabilities().count(), 9);
    }

    #[test]
    fn test_source_names() {
        let transport = Arc::new(MemoryTransport::new());
        let zone = zone(transport);
        assert_eq!(zone.source_name(1), Some("Tuner"));
        assert_eq!(zone.source_name(2), Some("Streamer"));
        assert_eq!(zone.source_name(3), None);
        assert_eq!(zone.source_name(0), None);
        assert_eq!(zone.source_name(-1), None);
    }
}
