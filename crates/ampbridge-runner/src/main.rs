//! Amplifier bridge binary.
//!
//! # Usage
//!
//! ```bash
//! # Keep the bridge running and log every state change
//! ampbridge --config config.yaml run
//!
//! # Discovery, no link needed
//! ampbridge zones
//! ampbridge sources
//!
//! # One-shot operations against a zone
//! ampbridge status 1 2
//! ampbridge call 1 2 VO setVolume 40
//! ampbridge --device tcp://amp.local:4999 get 1 2 CH tvChannelName
//! ```

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use ampbridge_protocol::ParamCode;
use ampbridge_runner::{load_config, open_link, Bridge, RunnerError};
use ampbridge_zones::{Attribute, BridgeConfig, CapabilityCommand, MemoryTransport, Registry};
use clap::{Parser, Subcommand};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Serial bridge for multi-zone amplifiers
#[derive(Parser, Debug)]
#[command(name = "ampbridge")]
#[command(about = "Serial bridge for multi-zone amplifiers")]
#[command(version)]
struct Cli {
    /// Path to the YAML configuration
    #[arg(short, long, global = true, default_value = "config.yaml")]
    config: PathBuf,

    /// Serial device or tcp://host:port, overriding the configuration
    #[arg(short, long, global = true)]
    device: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Time to wait for responses before reading state, in milliseconds
    #[arg(long, global = true, default_value_t = 250)]
    settle_ms: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the bridge until interrupted
    Run,

    /// List configured zones as JSON
    Zones,

    /// List configured sources as JSON
    Sources,

    /// Refresh a zone and print its state
    Status {
        /// Controller number (1-3)
        controller: u8,
        /// Zone number (1-6)
        zone: u8,
    },

    /// Invoke a capability command on a zone
    Call {
        /// Controller number (1-3)
        controller: u8,
        /// Zone number (1-6)
        zone: u8,
        /// Parameter code the capability is bound to (e.g. VO, CH)
        param: ParamCode,
        /// Command name (e.g. on, setVolume, channelUp)
        command: String,
        /// Command argument
        arg: Option<String>,
    },

    /// Refresh a zone and read a capability attribute
    Get {
        /// Controller number (1-3)
        controller: u8,
        /// Zone number (1-6)
        zone: u8,
        /// Parameter code the capability is bound to
        param: ParamCode,
        /// Attribute name (e.g. volume, tvChannelName)
        attribute: String,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    match execute(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn execute(cli: Cli) -> Result<(), RunnerError> {
    let mut config = load_config(&cli.config)?;
    if let Some(device) = &cli.device {
        config.serial.device = device.clone();
    }
    let settle = Duration::from_millis(cli.settle_ms);

    match cli.command {
        Commands::Run => run(&config),
        Commands::Zones => {
            // Offline registry: construction-time queries go nowhere.
            let registry = Registry::new(&config, Arc::new(MemoryTransport::new()))?;
            print_json(&registry.zone_infos())
        }
        Commands::Sources => print_json(&ampbridge_zones::source_infos(&config.sources)),
        Commands::Status { controller, zone } => {
            let bridge = Bridge::start(&config, open_link(&config.serial)?)?;
            let zone = bridge.registry().zone(controller, zone)?;
            zone.refresh_state()?;
            thread::sleep(settle);
            print_json(&zone.snapshot())
        }
        Commands::Call {
            controller,
            zone,
            param,
            command,
            arg,
        } => {
            let command = CapabilityCommand::parse(&command, arg.as_deref())?;
            let bridge = Bridge::start(&config, open_link(&config.serial)?)?;
            let zone = bridge.registry().zone(controller, zone)?;
            zone.require_capability(param)?.invoke(command)?;
            thread::sleep(settle);
            print_json(&zone.snapshot())
        }
        Commands::Get {
            controller,
            zone,
            param,
            attribute,
        } => {
            let attribute = Attribute::parse(&attribute)?;
            let bridge = Bridge::start(&config, open_link(&config.serial)?)?;
            let zone = bridge.registry().zone(controller, zone)?;
            let capability = zone.require_capability(param)?;
            zone.refresh_state()?;
            thread::sleep(settle);
            let value = serde_json::json!({
                "zone": zone.id(),
                "capability": capability.capability().descriptor(),
                "attribute": attribute.name(),
                "value": capability.attribute(attribute)?,
            });
            print_json(&value)
        }
    }
}

fn run(config: &BridgeConfig) -> Result<(), RunnerError> {
    ampbridge_metrics::describe_metrics();

    let running = Arc::new(AtomicBool::new(true));
    let flag = running.clone();
    if let Err(e) = ctrlc::set_handler(move || flag.store(false, Ordering::SeqCst)) {
        warn!(error = %e, "cannot install Ctrl-C handler");
    }

    let bridge = Bridge::start(config, open_link(&config.serial)?)?;
    info!(
        zones = bridge.registry().zones().len(),
        controllers = ?bridge.registry().controllers(),
        "bridge running"
    );

    while running.load(Ordering::SeqCst) && bridge.is_running() {
        thread::sleep(Duration::from_millis(100));
    }

    if bridge.is_running() {
        info!("interrupted, shutting down");
        return Ok(());
    }
    bridge.join()?;
    Ok(())
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<(), RunnerError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
