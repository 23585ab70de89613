//! Routes decoded response lines to the zone they address.
//!
//! There is exactly one dispatcher per transport. It processes lines one at
//! a time, in arrival order, and is the only writer of zone state. Nothing
//! about a response ties it to the command that caused it: the address is
//! the sole correlation key.

use std::io::{self, Read};
use std::sync::Arc;

use ampbridge_metrics::{metric_defs, metrics};
use ampbridge_protocol::{Lines, Response, ZoneAddress};
use tracing::{debug, warn};

use crate::registry::Registry;

/// What happened to one inbound line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Values were written to the zone's state.
    Applied {
        /// Target zone.
        address: ZoneAddress,
        /// Number of parameter fields written.
        updated: usize,
    },
    /// The line addressed a known zone but carried no values.
    NoUpdate {
        /// Target zone.
        address: ZoneAddress,
    },
    /// The line decoded but names no configured zone.
    UnknownAddress(ZoneAddress),
    /// The line matched neither response grammar.
    Unmatched,
}

/// The single consumer of inbound lines for one transport.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: Arc<Registry>,
}

impl Dispatcher {
    /// Create a dispatcher over a registry.
    pub fn new(registry: Arc<Registry>) -> Self {
        Dispatcher { registry }
    }

    /// The registry this dispatcher writes to.
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Decode one line and apply it. Never fails: bad or foreign lines are
    /// logged and dropped.
    pub fn on_line(&self, line: &str) -> Dispatch {
        metrics::counter!(metric_defs::LINES_RECEIVED.name).increment(1);

        let response = match Response::parse(line) {
            Ok(response) => response,
            Err(e) => {
                warn!(line = %line.trim(), error = %e, "discarding unmatched line");
                metrics::counter!(metric_defs::LINES_UNMATCHED.name).increment(1);
                return Dispatch::Unmatched;
            }
        };
        debug!(?response, "parsed line");

        let address = response.address();
        let Some(zone) = self.registry.get(address) else {
            warn!(zone = %address, "discarding line for unknown zone");
            metrics::counter!(metric_defs::LINES_UNKNOWN_ADDRESS.name).increment(1);
            return Dispatch::UnknownAddress(address);
        };

        match zone.apply(&response) {
            0 => Dispatch::NoUpdate { address },
            updated => Dispatch::Applied { address, updated },
        }
    }

    /// Feed every line of a byte stream through [`Dispatcher::on_line`].
    ///
    /// Returns the number of lines processed once the stream ends, or the
    /// first read error that is not a timeout or interrupt.
    pub fn run<R: Read>(&self, reader: R) -> io::Result<u64> {
        let mut count = 0;
        for line in Lines::new(reader) {
            self.on_line(&line?);
            count += 1;
        }
        debug!(lines = count, "line stream ended");
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BridgeConfig, ControllerConfig, ZoneConfig};
    use crate::transport::MemoryTransport;
    use ampbridge_protocol::ParamCode;

    fn dispatcher() -> Dispatcher {
        let config = BridgeConfig {
            controllers: vec![ControllerConfig {
                controller: 1,
                zones: vec![
                    ZoneConfig { zone: 1, name: "Kitchen".into() },
                    ZoneConfig { zone: 2, name: "Den".into() },
                ],
            }],
            ..Default::default()
        };
        let registry = Registry::new(&config, Arc::new(MemoryTransport::new())).unwrap();
        Dispatcher::new(Arc::new(registry))
    }

    fn addr(unit: u8, zone: u8) -> ZoneAddress {
        ZoneAddress::new(unit, zone).unwrap()
    }

    #[test]
    fn test_outcomes() {
        let dispatcher = dispatcher();
        assert_eq!(
            dispatcher.on_line("#>1100010000200707100100"),
            Dispatch::Applied { address: addr(1, 1), updated: 10 }
        );
        assert_eq!(
            dispatcher.on_line("#12VO05"),
            Dispatch::Applied { address: addr(1, 2), updated: 1 }
        );
        assert_eq!(dispatcher.on_line("#>12"), Dispatch::NoUpdate { address: addr(1, 2) });
        assert_eq!(dispatcher.on_line("#99VO05"), Dispatch::UnknownAddress(addr(9, 9)));
        assert_eq!(dispatcher.on_line("Command Error."), Dispatch::Unmatched);
    }

    #[test]
    fn test_run_over_stream() {
        let dispatcher = dispatcher();
        let input: &[u8] = b"#11VO20\r\n\r\nnoise\r#12MU01\n#11CH03";
        assert_eq!(dispatcher.run(input).unwrap(), 4);

        let registry = dispatcher.registry();
        let kitchen = registry.lookup(1, 1).unwrap();
        assert_eq!(kitchen.state().get(ParamCode::Volume).unwrap().to_string(), "20");
        assert_eq!(kitchen.state().get(ParamCode::Channel).unwrap().to_string(), "03");
        let den = registry.lookup(1, 2).unwrap();
        assert_eq!(den.state().get(ParamCode::Mute).unwrap().to_string(), "01");
    }
}
