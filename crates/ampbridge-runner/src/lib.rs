//! Runner for the amplifier bridge.
//!
//! Loads the YAML configuration, opens the serial link (a local device or a
//! `tcp://` serial server), builds the zone registry and drives the response
//! dispatcher on a dedicated reader thread.

pub mod link;

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use ampbridge_zones::{BridgeConfig, ConfigError, Dispatcher, Registry, ZoneError};
use thiserror::Error;
use tracing::{error, info};

pub use link::{open_link, Endpoint, Link};

/// Errors that can occur while running the bridge.
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("cannot read config {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("serial port error: {0}")]
    Serial(#[from] serialport::Error),

    #[error("cannot connect to {address}: {source}")]
    Connect {
        address: String,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Zone(#[from] ZoneError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Read and validate a YAML configuration file.
pub fn load_config(path: &Path) -> Result<BridgeConfig, RunnerError> {
    let text = std::fs::read_to_string(path).map_err(|source| RunnerError::ConfigRead {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&text)
}

/// Parse and validate a YAML configuration document.
pub fn parse_config(text: &str) -> Result<BridgeConfig, RunnerError> {
    let config: BridgeConfig = serde_yaml::from_str(text)?;
    config.validate()?;
    Ok(config)
}

/// A running bridge: the registry plus the thread feeding its dispatcher.
pub struct Bridge {
    registry: Arc<Registry>,
    reader: JoinHandle<io::Result<u64>>,
}

impl Bridge {
    /// Build the registry over the link's transport and start dispatching
    /// the link's inbound lines.
    pub fn start(config: &BridgeConfig, link: Link) -> Result<Bridge, RunnerError> {
        let Link { reader, transport } = link;
        let registry = Arc::new(Registry::new(config, transport)?);
        let dispatcher = Dispatcher::new(registry.clone());

        let reader = thread::Builder::new()
            .name("ampbridge-dispatch".to_string())
            .spawn(move || {
                let result = dispatcher.run(reader);
                match &result {
                    Ok(lines) => info!(lines, "link closed"),
                    Err(e) => error!(error = %e, "link read failed"),
                }
                result
            })?;

        Ok(Bridge { registry, reader })
    }

    /// The zone registry.
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Whether the reader thread is still consuming the link.
    pub fn is_running(&self) -> bool {
        !self.reader.is_finished()
    }

    /// Wait for the reader thread to end and return its outcome.
    pub fn join(self) -> io::Result<u64> {
        self.reader
            .join()
            .unwrap_or_else(|_| Err(io::Error::other("dispatcher thread panicked")))
    }
}
