//! Integration tests for the bridge core.
//!
//! These drive a registry through its public API with an in-memory
//! transport, feeding response lines to the dispatcher the way the serial
//! reader thread would.

use std::sync::Arc;
use std::thread;

use ampbridge_protocol::{ParamCode, RawValue};
use ampbridge_zones::{
    Attribute, AttributeValue, BridgeConfig, CapabilityCommand, ControllerConfig, Dispatch,
    Dispatcher, MemoryTransport, MuteState, Registry, Transport, TransportError, ZoneConfig,
    ZoneError,
};

// ============================================================================
// Helpers
// ============================================================================

fn test_config() -> BridgeConfig {
    BridgeConfig {
        sources: (1..=6).map(|i| format!("Source {}", i)).collect(),
        controllers: vec![ControllerConfig {
            controller: 1,
            zones: vec![
                ZoneConfig { zone: 1, name: "Kitchen".into() },
                ZoneConfig { zone: 2, name: "Den".into() },
            ],
        }],
        ..Default::default()
    }
}

/// Build a registry and dispatcher, with the construction-time queries
/// already drained from the transport.
fn setup() -> (Arc<MemoryTransport>, Arc<Registry>, Dispatcher) {
    let transport = Arc::new(MemoryTransport::new());
    let registry = Arc::new(Registry::new(&test_config(), transport.clone()).expect("valid config"));
    transport.take();
    let dispatcher = Dispatcher::new(registry.clone());
    (transport, registry, dispatcher)
}

fn raw(registry: &Registry, zone: u8, param: ParamCode) -> Option<String> {
    registry
        .lookup(1, zone)
        .expect("zone exists")
        .state()
        .get(param)
        .map(|v| v.to_string())
}

// ============================================================================
// Response handling
// ============================================================================

#[test]
fn test_empty_status_updates_nothing() {
    let (_, registry, dispatcher) = setup();
    let zone = registry.lookup(1, 1).unwrap();
    dispatcher.on_line("#11VO05");
    let before = zone.snapshot();

    assert_eq!(dispatcher.on_line("#>11"), Dispatch::NoUpdate { address: zone.address() });
    assert_eq!(zone.snapshot(), before);
    assert_eq!(before.unit, None);
}

#[test]
fn test_whitespace_does_not_change_decoding() {
    let (_, registry, dispatcher) = setup();
    dispatcher.on_line("  #11VO12 \t");
    assert_eq!(raw(&registry, 1, ParamCode::Volume).as_deref(), Some("12"));
}

#[test]
fn test_unknown_address_is_discarded() {
    let (_, registry, dispatcher) = setup();
    dispatcher.on_line("#>1100010000200707100100");
    let kitchen = registry.lookup(1, 1).unwrap().snapshot();
    let den = registry.lookup(1, 2).unwrap().snapshot();

    assert!(matches!(dispatcher.on_line("#99VO10"), Dispatch::UnknownAddress(_)));
    assert!(matches!(dispatcher.on_line("#>9900010000200707100100"), Dispatch::UnknownAddress(_)));

    assert_eq!(registry.lookup(1, 1).unwrap().snapshot(), kitchen);
    assert_eq!(registry.lookup(1, 2).unwrap().snapshot(), den);
}

#[test]
fn test_status_for_one_zone_leaves_other_alone() {
    let (_, registry, dispatcher) = setup();
    dispatcher.on_line("#>1100010000200707100100");

    assert_eq!(raw(&registry, 1, ParamCode::Power).as_deref(), Some("01"));
    assert!(registry.lookup(1, 2).unwrap().snapshot().is_empty());
}

// ============================================================================
// Capabilities
// ============================================================================

#[test]
fn test_set_volume_bounds() {
    let (transport, registry, dispatcher) = setup();
    let zone = registry.lookup(1, 1).unwrap();
    let volume = zone.capability(ParamCode::Volume).unwrap();

    volume.set_volume(0).unwrap();
    assert_eq!(transport.take(), vec!["<11VO00\r"]);
    dispatcher.on_line("#11VO00");
    assert_eq!(raw(&registry, 1, ParamCode::Volume).as_deref(), Some("00"));

    volume.set_volume(100).unwrap();
    assert_eq!(transport.take(), vec!["<11VO38\r"]);
    dispatcher.on_line("#11VO38");
    assert_eq!(raw(&registry, 1, ParamCode::Volume).as_deref(), Some("38"));
    assert_eq!(volume.volume().unwrap(), Some(100));
}

#[test]
fn test_commands_do_not_touch_state() {
    let (transport, registry, _) = setup();
    let zone = registry.lookup(1, 1).unwrap();

    let returned = zone.capability(ParamCode::Power).unwrap().on().unwrap();
    assert_eq!(transport.take(), vec!["<11PR01\r"]);
    assert_eq!(returned.get(ParamCode::Power), None);
    assert_eq!(zone.state().get(ParamCode::Power), None);
}

#[test]
fn test_channel_wraps() {
    let (transport, registry, dispatcher) = setup();
    let channel = registry.lookup(1, 1).unwrap().capability(ParamCode::Channel).unwrap();

    dispatcher.on_line("#11CH06");
    channel.channel_up().unwrap();
    assert_eq!(transport.take(), vec!["<11CH01\r"]);

    dispatcher.on_line("#11CH01");
    channel.channel_down().unwrap();
    assert_eq!(transport.take(), vec!["<11CH06\r"]);

    dispatcher.on_line("#11CH03");
    channel.channel_up().unwrap();
    assert_eq!(transport.take(), vec!["<11CH04\r"]);
}

#[test]
fn test_set_tv_channel_validates_range() {
    let (transport, registry, dispatcher) = setup();
    let channel = registry.lookup(1, 1).unwrap().capability(ParamCode::Channel).unwrap();
    dispatcher.on_line("#11CH02");

    for bad in [0, 7, -1] {
        assert!(matches!(
            channel.set_tv_channel(bad),
            Err(ZoneError::OutOfRange { param: ParamCode::Channel, .. })
        ));
    }
    assert!(transport.is_empty());
    assert_eq!(raw(&registry, 1, ParamCode::Channel).as_deref(), Some("02"));

    channel.set_tv_channel(3).unwrap();
    assert_eq!(transport.take(), vec!["<11CH03\r"]);
}

#[test]
fn test_volume_steps_clamp() {
    let (transport, registry, dispatcher) = setup();
    let volume = registry.lookup(1, 2).unwrap().capability(ParamCode::Volume).unwrap();

    dispatcher.on_line("#12VO38");
    volume.volume_up().unwrap();
    assert_eq!(transport.take(), vec!["<12VO38\r"]);

    dispatcher.on_line("#12VO00");
    volume.volume_down().unwrap();
    assert_eq!(transport.take(), vec!["<12VO00\r"]);

    dispatcher.on_line("#12VO09");
    volume.volume_up().unwrap();
    assert_eq!(transport.take(), vec!["<12VO10\r"]);
}

#[test]
fn test_relative_command_needs_known_state() {
    let (transport, registry, _) = setup();
    let zone = registry.lookup(1, 1).unwrap();

    assert!(matches!(
        zone.capability(ParamCode::Volume).unwrap().volume_up(),
        Err(ZoneError::StateUnknown(ParamCode::Volume))
    ));
    assert!(matches!(
        zone.capability(ParamCode::Channel).unwrap().channel_down(),
        Err(ZoneError::StateUnknown(ParamCode::Channel))
    ));
    assert!(transport.is_empty());
}

#[test]
fn test_levels_use_offset_encoding() {
    let (transport, registry, dispatcher) = setup();
    let zone = registry.lookup(1, 1).unwrap();
    let bass = zone.capability(ParamCode::Bass).unwrap();

    bass.set_level(0).unwrap();
    bass.set_level(50).unwrap();
    bass.set_level(100).unwrap();
    zone.capability(ParamCode::Balance).unwrap().set_level(50).unwrap();
    assert_eq!(
        transport.take(),
        vec!["<11BS00\r", "<11BS10\r", "<11BS20\r", "<11BL10\r"]
    );

    dispatcher.on_line("#11BS15");
    assert_eq!(bass.level().unwrap(), Some(75));

    assert!(matches!(bass.set_level(101), Err(ZoneError::OutOfRange { .. })));
    assert!(transport.is_empty());
}

#[test]
fn test_unsupported_command_sends_nothing() {
    let (transport, registry, _) = setup();
    let zone = registry.lookup(1, 1).unwrap();

    let keypad = zone.capability(ParamCode::Keypad).unwrap();
    assert!(matches!(keypad.on(), Err(ZoneError::Unsupported { .. })));
    let mute = zone.capability(ParamCode::Mute).unwrap();
    assert!(matches!(mute.set_volume(10), Err(ZoneError::Unsupported { .. })));
    assert!(transport.is_empty());
}

#[test]
fn test_invoke_by_name() {
    let (transport, registry, _) = setup();
    let zone = registry.lookup(1, 2).unwrap();

    let mute = zone.capability(ParamCode::Mute).unwrap();
    mute.invoke(CapabilityCommand::parse("setMute", Some("muted")).unwrap()).unwrap();
    mute.set_mute(MuteState::Unmuted).unwrap();
    zone.capability(ParamCode::DoNotDisturb)
        .unwrap()
        .invoke(CapabilityCommand::parse("on", None).unwrap())
        .unwrap();
    zone.capability(ParamCode::Treble)
        .unwrap()
        .invoke(CapabilityCommand::parse("setLevel", Some("25")).unwrap())
        .unwrap();

    assert_eq!(
        transport.take(),
        vec!["<12MU01\r", "<12MU00\r", "<12DT01\r", "<12TR05\r"]
    );
}

#[test]
fn test_attributes() {
    let (_, registry, dispatcher) = setup();
    let zone = registry.lookup(1, 1).unwrap();
    let read = |param: ParamCode, name: &str| {
        zone.capability(param)
            .unwrap()
            .attribute(Attribute::parse(name).unwrap())
            .unwrap()
    };

    assert_eq!(read(ParamCode::Power, "switch"), AttributeValue::Text("off".into()));
    assert_eq!(read(ParamCode::Volume, "volume"), AttributeValue::Unset);
    assert_eq!(read(ParamCode::Channel, "tvChannelName"), AttributeValue::Unset);

    // PA PR MU DT VO TR BS BL CH LS
    dispatcher.on_line("#>1100010100190710100301");

    assert_eq!(read(ParamCode::Power, "switch"), AttributeValue::Text("on".into()));
    assert_eq!(read(ParamCode::Mute, "mute"), AttributeValue::Text("muted".into()));
    assert_eq!(read(ParamCode::Volume, "volume"), AttributeValue::Number(50));
    assert_eq!(read(ParamCode::Bass, "level"), AttributeValue::Number(50));
    assert_eq!(read(ParamCode::Channel, "tvChannel"), AttributeValue::Number(3));
    assert_eq!(read(ParamCode::Channel, "tvChannelName"), AttributeValue::Text("Source 3".into()));
    assert_eq!(read(ParamCode::Keypad, "remoteControlEnabled"), AttributeValue::Flag(true));

    let power = zone.capability(ParamCode::Power).unwrap();
    assert!(matches!(
        power.attribute(Attribute::Volume),
        Err(ZoneError::Unsupported { .. })
    ));
}

#[test]
fn test_refresh_returns_immediately() {
    let (transport, registry, dispatcher) = setup();
    let zone = registry.lookup(1, 1).unwrap();
    dispatcher.on_line("#11VO07");

    let snapshot = zone.refresh_state().unwrap();
    assert_eq!(transport.take(), vec!["?11\r"]);
    assert_eq!(snapshot.get(ParamCode::Volume), Some(RawValue::new(7).unwrap()));
}

// ============================================================================
// Transport failure
// ============================================================================

struct BrokenTransport;

impl Transport for BrokenTransport {
    fn write_frame(&self, _frame: &[u8]) -> Result<(), TransportError> {
        Err(TransportError::Closed)
    }
}

#[test]
fn test_transport_failure_propagates() {
    // Construction-time queries fail but the registry is still built.
    let registry = Arc::new(Registry::new(&test_config(), Arc::new(BrokenTransport)).unwrap());
    let dispatcher = Dispatcher::new(registry.clone());
    let zone = registry.lookup(1, 1).unwrap();

    assert!(matches!(
        zone.capability(ParamCode::Power).unwrap().on(),
        Err(ZoneError::Transport(TransportError::Closed))
    ));
    assert!(matches!(zone.refresh_state(), Err(ZoneError::Transport(_))));

    // Inbound processing is unaffected.
    dispatcher.on_line("#11PR01");
    assert_eq!(zone.state().get(ParamCode::Power), Some(RawValue::ON));
}

// ============================================================================
// Threading
// ============================================================================

#[test]
fn test_dispatcher_on_reader_thread() {
    let (transport, registry, dispatcher) = setup();

    let stream: Vec<u8> = (0..=38)
        .map(|v| format!("#11VO{:02}\r\n#12VO{:02}\r", v, 38 - v))
        .collect::<String>()
        .into_bytes();
    let handle = thread::spawn(move || dispatcher.run(stream.as_slice()));

    // Commands can be issued while the reader thread is applying lines.
    let den = registry.lookup(1, 2).unwrap();
    den.capability(ParamCode::Power).unwrap().on().unwrap();

    assert_eq!(handle.join().unwrap().unwrap(), 78);
    assert_eq!(raw(&registry, 1, ParamCode::Volume).as_deref(), Some("38"));
    assert_eq!(raw(&registry, 2, ParamCode::Volume).as_deref(), Some("00"));
    assert_eq!(transport.take(), vec!["<12PR01\r"]);
}
