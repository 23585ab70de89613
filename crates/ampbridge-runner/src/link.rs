//! Serial link bootstrap.
//!
//! The amplifier is reached either through a local serial device or through
//! a networked serial server speaking raw TCP. Either way the link is split
//! into a reader for the dispatcher thread and a shared writer for the zones.

use std::io::Read;
use std::net::TcpStream;
use std::sync::Arc;
use std::time::Duration;

use ampbridge_zones::{SerialConfig, Transport, WriterTransport};
use serialport::{DataBits, FlowControl, Parity, StopBits};
use tracing::info;

use crate::RunnerError;

/// Prefix selecting a TCP serial server instead of a local device.
const TCP_SCHEME: &str = "tcp://";

/// Serial read timeout. Timeouts are retried by the line reader; a short
/// value keeps the reader thread responsive.
const READ_TIMEOUT: Duration = Duration::from_millis(100);

/// Where the amplifier is reached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// Local serial device, 8N1 at the given speed.
    Serial {
        /// Device path.
        path: String,
        /// Baud rate.
        speed: u32,
    },
    /// Networked serial server at `host:port`.
    Tcp(String),
}

impl Endpoint {
    /// Interpret the configured device string.
    pub fn from_config(serial: &SerialConfig) -> Endpoint {
        match serial.device.strip_prefix(TCP_SCHEME) {
            Some(address) => Endpoint::Tcp(address.to_string()),
            None => Endpoint::Serial {
                path: serial.device.clone(),
                speed: serial.speed,
            },
        }
    }
}

/// An open link, split into its two directions.
pub struct Link {
    /// Inbound byte stream.
    pub reader: Box<dyn Read + Send>,
    /// Outbound frame sink shared by every zone.
    pub transport: Arc<dyn Transport>,
}

/// Open the configured link.
pub fn open_link(serial: &SerialConfig) -> Result<Link, RunnerError> {
    match Endpoint::from_config(serial) {
        Endpoint::Serial { path, speed } => open_serial(&path, speed),
        Endpoint::Tcp(address) => open_tcp(&address),
    }
}

fn open_serial(path: &str, speed: u32) -> Result<Link, RunnerError> {
    let port = serialport::new(path, speed)
        .data_bits(DataBits::Eight)
        .parity(Parity::None)
        .stop_bits(StopBits::One)
        .flow_control(FlowControl::None)
        .timeout(READ_TIMEOUT)
        .open()?;
    let writer = port.try_clone()?;
    info!(device = path, speed, "serial port open");

    Ok(Link {
        reader: Box::new(port),
        transport: Arc::new(WriterTransport::new(writer)),
    })
}

fn open_tcp(address: &str) -> Result<Link, RunnerError> {
    let stream = TcpStream::connect(address).map_err(|source| RunnerError::Connect {
        address: address.to_string(),
        source,
    })?;
    stream.set_nodelay(true)?;
    let writer = stream.try_clone()?;
    info!(address, "serial server connected");

    Ok(Link {
        reader: Box::new(stream),
        transport: Arc::new(WriterTransport::new(writer)),
    })
}
