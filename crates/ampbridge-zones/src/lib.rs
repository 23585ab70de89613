//! Zones, capabilities and response dispatch for the amplifier bridge.
//!
//! A [`Registry`] is built once from a [`BridgeConfig`] and a shared
//! [`Transport`]. Callers find a [`Zone`] with [`Registry::lookup`] and drive
//! it through its capabilities; every command is a single fire-and-forget
//! frame. A single [`Dispatcher`] reads response lines from the link and is
//! the only writer of zone state.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use ampbridge_protocol::ParamCode;
//! use ampbridge_zones::{
//!     BridgeConfig, ControllerConfig, Dispatcher, MemoryTransport, Registry, ZoneConfig,
//! };
//!
//! let config = BridgeConfig {
//!     controllers: vec![ControllerConfig {
//!         controller: 1,
//!         zones: vec![ZoneConfig { zone: 1, name: "Kitchen".into() }],
//!     }],
//!     ..Default::default()
//! };
//! let transport = Arc::new(MemoryTransport::new());
//! let registry = Arc::new(Registry::new(&config, transport.clone()).unwrap());
//! let dispatcher = Dispatcher::new(registry.clone());
//!
//! let kitchen = registry.lookup(1, 1).unwrap();
//! kitchen.capability(ParamCode::Volume).unwrap().set_volume(100).unwrap();
//! assert_eq!(transport.take(), vec!["?11\r", "<11VO38\r"]);
//!
//! dispatcher.on_line("#11VO38");
//! assert_eq!(kitchen.state().get(ParamCode::Volume).unwrap().to_string(), "38");
//! ```

mod capability;
mod config;
mod dispatcher;
mod error;
mod registry;
mod state;
mod transport;
mod zone;

pub use capability::*;
pub use config::*;
pub use dispatcher::*;
pub use error::*;
pub use registry::*;
pub use state::*;
pub use transport::*;
pub use zone::*;
