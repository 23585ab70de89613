//! Semantic capabilities bound to zone parameters.
//!
//! Each zone exposes its hardware parameters through a small set of
//! SmartThings-style capabilities (switch, audioMute, audioVolume,
//! switchLevel, tvChannel, remoteControlStatus). A capability is a view over
//! the zone state plus a fixed [`Constraint`]; commands encode a set frame and
//! return immediately. The new value becomes visible only once the amplifier
//! acknowledges it and the dispatcher applies the acknowledgement.

use ampbridge_metrics::{metric_defs, metrics, ZoneLabels};
use ampbridge_protocol::{ParamCode, ProtocolResult, RawValue};
use serde::Serialize;
use tracing::warn;

use crate::error::{ZoneError, ZoneResult};
use crate::state::StateSnapshot;
use crate::zone::Zone;

/// Upper end of the canonical level scale accepted by `setVolume`/`setLevel`.
pub const LEVEL_MAX: i32 = 100;

/// Volume range of the amplifier.
pub const VOLUME_RANGE: Constraint = Constraint::new(0, 38);

/// Bass and treble range.
pub const TONE_RANGE: Constraint = Constraint::new(-10, 10);

/// Balance range (10 is centre).
pub const BALANCE_RANGE: Constraint = Constraint::new(0, 20);

/// Source channel range.
pub const CHANNEL_RANGE: Constraint = Constraint::new(1, 6);

/// The device range of a parameter.
///
/// A range with a negative minimum cannot travel as two unsigned digits, so
/// it is offset-encoded on the wire: the minimum maps to `00`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Constraint {
    /// Lowest device value.
    pub minimum: i32,
    /// Highest device value.
    pub maximum: i32,
}

impl Constraint {
    /// Create a constraint.
    pub const fn new(minimum: i32, maximum: i32) -> Self {
        Constraint { minimum, maximum }
    }

    /// Whether a device value lies within the range.
    pub fn contains(&self, value: i32) -> bool {
        (self.minimum..=self.maximum).contains(&value)
    }

    /// Map a level on the 0-100 scale linearly into the range, truncating
    /// toward zero.
    pub fn normalize(&self, level: i32) -> i32 {
        let span = f64::from(self.maximum - self.minimum);
        (f64::from(self.minimum) + f64::from(level) * span / f64::from(LEVEL_MAX)).trunc() as i32
    }

    /// Map a device value back onto the 0-100 scale, rounding down.
    pub fn denormalize(&self, value: i32) -> i32 {
        let span = self.maximum - self.minimum;
        if span == 0 {
            return 0;
        }
        ((value - self.minimum) * LEVEL_MAX)
            .div_euclid(span)
            .clamp(0, LEVEL_MAX)
    }

    fn wire_offset(&self) -> i32 {
        if self.minimum < 0 {
            -self.minimum
        } else {
            0
        }
    }

    /// Encode a device value as a raw wire value.
    pub fn to_raw(&self, value: i32) -> ProtocolResult<RawValue> {
        RawValue::from_i32(value + self.wire_offset())
    }

    /// Decode a raw wire value into a device value.
    pub fn from_raw(&self, raw: RawValue) -> i32 {
        i32::from(raw.value()) - self.wire_offset()
    }
}

/// Lifecycle status reported in a capability descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CapabilityStatus {
    /// Stable capability.
    Live,
    /// Capability still under proposal.
    Proposed,
}

/// Static description of a bound capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CapabilityDescriptor {
    /// Capability name.
    pub name: &'static str,
    /// Bound parameter code.
    pub param: &'static str,
    /// Capability version.
    pub version: u8,
    /// Capability status.
    pub status: CapabilityStatus,
    /// Device range, for ranged capabilities.
    pub constraint: Option<Constraint>,
}

/// One capability variant with the parameter and range it needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Boolean on/off over any `00`/`01` parameter.
    Switch {
        /// Bound parameter.
        param: ParamCode,
    },
    /// Mute over `MU`.
    AudioMute,
    /// Volume over `VO`.
    AudioVolume {
        /// Device range.
        constraint: Constraint,
    },
    /// A 0-100 level over a ranged parameter.
    SwitchLevel {
        /// Bound parameter.
        param: ParamCode,
        /// Device range.
        constraint: Constraint,
    },
    /// Source selection over `CH`.
    TvChannel {
        /// Device range.
        constraint: Constraint,
    },
    /// Read-only keypad presence over `LS`.
    RemoteControlStatus,
}

impl Capability {
    /// The capability set every zone carries.
    pub fn zone_set() -> [Capability; 9] {
        [
            Capability::Switch { param: ParamCode::Power },
            Capability::AudioMute,
            Capability::AudioVolume { constraint: VOLUME_RANGE },
            Capability::TvChannel { constraint: CHANNEL_RANGE },
            Capability::RemoteControlStatus,
            Capability::Switch { param: ParamCode::DoNotDisturb },
            Capability::SwitchLevel { param: ParamCode::Bass, constraint: TONE_RANGE },
            Capability::SwitchLevel { param: ParamCode::Treble, constraint: TONE_RANGE },
            Capability::SwitchLevel { param: ParamCode::Balance, constraint: BALANCE_RANGE },
        ]
    }

    /// The parameter this capability reads and writes.
    pub fn param(&self) -> ParamCode {
        match self {
            Capability::Switch { param } | Capability::SwitchLevel { param, .. } => *param,
            Capability::AudioMute => ParamCode::Mute,
            Capability::AudioVolume { .. } => ParamCode::Volume,
            Capability::TvChannel { .. } => ParamCode::Channel,
            Capability::RemoteControlStatus => ParamCode::Keypad,
        }
    }

    /// Capability name.
    pub fn name(&self) -> &'static str {
        match self {
            Capability::Switch { .. } => "switch",
            Capability::AudioMute => "audioMute",
            Capability::AudioVolume { .. } => "audioVolume",
            Capability::SwitchLevel { .. } => "switchLevel",
            Capability::TvChannel { .. } => "tvChannel",
            Capability::RemoteControlStatus => "remoteControlStatus",
        }
    }

    /// Device range, for ranged capabilities.
    pub fn constraint(&self) -> Option<Constraint> {
        match self {
            Capability::AudioVolume { constraint }
            | Capability::SwitchLevel { constraint, .. }
            | Capability::TvChannel { constraint } => Some(*constraint),
            _ => None,
        }
    }

    /// Describe this capability.
    pub fn descriptor(&self) -> CapabilityDescriptor {
        let status = match self {
            Capability::TvChannel { .. } => CapabilityStatus::Proposed,
            _ => CapabilityStatus::Live,
        };
        CapabilityDescriptor {
            name: self.name(),
            param: self.param().as_str(),
            version: 1,
            status,
            constraint: self.constraint(),
        }
    }
}

/// Target of `setMute`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MuteState {
    /// Muted.
    Muted,
    /// Not muted.
    Unmuted,
}

impl MuteState {
    /// Attribute text for this state.
    pub fn as_str(&self) -> &'static str {
        match self {
            MuteState::Muted => "muted",
            MuteState::Unmuted => "unmuted",
        }
    }
}

/// A capability command, as named at the API boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapabilityCommand {
    /// `on`
    On,
    /// `off`
    Off,
    /// `mute`
    Mute,
    /// `unmute`
    Unmute,
    /// `setMute <muted|unmuted>`
    SetMute(MuteState),
    /// `volumeUp`
    VolumeUp,
    /// `volumeDown`
    VolumeDown,
    /// `setVolume <0-100>`
    SetVolume(i32),
    /// `setLevel <0-100>`
    SetLevel(i32),
    /// `channelUp`
    ChannelUp,
    /// `channelDown`
    ChannelDown,
    /// `setTvChannel <n>`
    SetTvChannel(i32),
}

impl CapabilityCommand {
    /// Parse a command name with its optional argument.
    pub fn parse(name: &str, arg: Option<&str>) -> ZoneResult<CapabilityCommand> {
        let command = match name {
            "on" => CapabilityCommand::On,
            "off" => CapabilityCommand::Off,
            "mute" => CapabilityCommand::Mute,
            "unmute" => CapabilityCommand::Unmute,
            "setMute" => match required_arg(name, arg)? {
                "muted" => CapabilityCommand::SetMute(MuteState::Muted),
                "unmuted" => CapabilityCommand::SetMute(MuteState::Unmuted),
                other => {
                    return Err(ZoneError::InvalidArgument {
                        command: name.to_string(),
                        value: other.to_string(),
                    })
                }
            },
            "volumeUp" => CapabilityCommand::VolumeUp,
            "volumeDown" => CapabilityCommand::VolumeDown,
            "setVolume" => CapabilityCommand::SetVolume(int_arg(name, arg)?),
            "setLevel" => CapabilityCommand::SetLevel(int_arg(name, arg)?),
            "channelUp" => CapabilityCommand::ChannelUp,
            "channelDown" => CapabilityCommand::ChannelDown,
            "setTvChannel" => CapabilityCommand::SetTvChannel(int_arg(name, arg)?),
            _ => return Err(ZoneError::UnknownCommand(name.to_string())),
        };
        Ok(command)
    }

    /// Command name.
    pub fn name(&self) -> &'static str {
        match self {
            CapabilityCommand::On => "on",
            CapabilityCommand::Off => "off",
            CapabilityCommand::Mute => "mute",
            CapabilityCommand::Unmute => "unmute",
            CapabilityCommand::SetMute(_) => "setMute",
            CapabilityCommand::VolumeUp => "volumeUp",
            CapabilityCommand::VolumeDown => "volumeDown",
            CapabilityCommand::SetVolume(_) => "setVolume",
            CapabilityCommand::SetLevel(_) => "setLevel",
            CapabilityCommand::ChannelUp => "channelUp",
            CapabilityCommand::ChannelDown => "channelDown",
            CapabilityCommand::SetTvChannel(_) => "setTvChannel",
        }
    }
}

fn required_arg<'a>(command: &str, arg: Option<&'a str>) -> ZoneResult<&'a str> {
    arg.map(str::trim)
        .ok_or_else(|| ZoneError::MissingArgument(command.to_string()))
}

fn int_arg(command: &str, arg: Option<&str>) -> ZoneResult<i32> {
    let text = required_arg(command, arg)?;
    text.parse().map_err(|_| ZoneError::InvalidArgument {
        command: command.to_string(),
        value: text.to_string(),
    })
}

/// A readable capability attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attribute {
    /// `switch`: "on" / "off"
    Switch,
    /// `mute`: "muted" / "unmuted"
    Mute,
    /// `volume`: 0-100
    Volume,
    /// `level`: 0-100
    Level,
    /// `tvChannel`: raw channel number
    TvChannel,
    /// `tvChannelName`: configured source name
    TvChannelName,
    /// `remoteControlEnabled`: keypad present
    RemoteControlEnabled,
}

impl Attribute {
    /// Parse an attribute name.
    pub fn parse(name: &str) -> ZoneResult<Attribute> {
        match name {
            "switch" => Ok(Attribute::Switch),
            "mute" => Ok(Attribute::Mute),
            "volume" => Ok(Attribute::Volume),
            "level" => Ok(Attribute::Level),
            "tvChannel" => Ok(Attribute::TvChannel),
            "tvChannelName" => Ok(Attribute::TvChannelName),
            "remoteControlEnabled" => Ok(Attribute::RemoteControlEnabled),
            _ => Err(ZoneError::UnknownAttribute(name.to_string())),
        }
    }

    /// Attribute name.
    pub fn name(&self) -> &'static str {
        match self {
            Attribute::Switch => "switch",
            Attribute::Mute => "mute",
            Attribute::Volume => "volume",
            Attribute::Level => "level",
            Attribute::TvChannel => "tvChannel",
            Attribute::TvChannelName => "tvChannelName",
            Attribute::RemoteControlEnabled => "remoteControlEnabled",
        }
    }
}

/// The value of an attribute read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum AttributeValue {
    /// Text value.
    Text(String),
    /// Numeric value.
    Number(i32),
    /// Boolean value.
    Flag(bool),
    /// Not reported yet.
    Unset,
}

/// A capability bound to a zone.
#[derive(Debug, Clone, Copy)]
pub struct CapabilityHandle<'a> {
    zone: &'a Zone,
    capability: Capability,
}

impl<'a> CapabilityHandle<'a> {
    pub(crate) fn new(zone: &'a Zone, capability: Capability) -> Self {
        CapabilityHandle { zone, capability }
    }

    /// The bound capability.
    pub fn capability(&self) -> Capability {
        self.capability
    }

    /// The zone this capability belongs to.
    pub fn zone(&self) -> &'a Zone {
        self.zone
    }

    /// Run a command.
    ///
    /// On success a set frame has been written and the current (not yet
    /// updated) state is returned. A rejected command writes nothing.
    pub fn invoke(&self, command: CapabilityCommand) -> ZoneResult<StateSnapshot> {
        let param = self.capability.param();
        let value = match self.plan(command) {
            Ok(value) => value,
            Err(e) => {
                warn!(
                    zone = %self.zone.address(),
                    capability = self.capability.name(),
                    command = command.name(),
                    error = %e,
                    "request rejected"
                );
                let labels = ZoneLabels::new(self.zone.id(), param.as_str()).to_labels();
                metrics::counter!(metric_defs::REQUESTS_REJECTED.name, &labels).increment(1);
                return Err(e);
            }
        };
        self.zone.send_set(param, value)?;
        Ok(self.zone.snapshot())
    }

    /// Work out the raw value a command should send.
    fn plan(&self, command: CapabilityCommand) -> ZoneResult<RawValue> {
        use CapabilityCommand as C;

        match (self.capability, command) {
            (Capability::Switch { .. }, C::On) => Ok(RawValue::ON),
            (Capability::Switch { .. }, C::Off) => Ok(RawValue::OFF),

            (Capability::AudioMute, C::Mute | C::SetMute(MuteState::Muted)) => Ok(RawValue::ON),
            (Capability::AudioMute, C::Unmute | C::SetMute(MuteState::Unmuted)) => Ok(RawValue::OFF),

            (Capability::AudioVolume { constraint }, C::VolumeUp) => {
                let next = (self.current(constraint)? + 1).clamp(constraint.minimum, constraint.maximum);
                Ok(constraint.to_raw(next)?)
            }
            (Capability::AudioVolume { constraint }, C::VolumeDown) => {
                let next = (self.current(constraint)? - 1).clamp(constraint.minimum, constraint.maximum);
                Ok(constraint.to_raw(next)?)
            }
            (Capability::AudioVolume { constraint }, C::SetVolume(level))
            | (Capability::SwitchLevel { constraint, .. }, C::SetLevel(level)) => {
                if !(0..=LEVEL_MAX).contains(&level) {
                    return Err(self.out_of_range(level, Constraint::new(0, LEVEL_MAX)));
                }
                Ok(constraint.to_raw(constraint.normalize(level))?)
            }

            (Capability::TvChannel { constraint }, C::ChannelUp) => {
                let mut next = self.current(constraint)? + 1;
                if !constraint.contains(next) {
                    next = constraint.minimum;
                }
                Ok(constraint.to_raw(next)?)
            }
            (Capability::TvChannel { constraint }, C::ChannelDown) => {
                let mut next = self.current(constraint)? - 1;
                if !constraint.contains(next) {
                    next = constraint.maximum;
                }
                Ok(constraint.to_raw(next)?)
            }
            (Capability::TvChannel { constraint }, C::SetTvChannel(channel)) => {
                if !constraint.contains(channel) {
                    return Err(self.out_of_range(channel, constraint));
                }
                Ok(constraint.to_raw(channel)?)
            }

            (_, command) => Err(self.unsupported(command.name())),
        }
    }

    fn current(&self, constraint: Constraint) -> ZoneResult<i32> {
        let param = self.capability.param();
        self.zone
            .state()
            .get(param)
            .map(|raw| constraint.from_raw(raw))
            .ok_or(ZoneError::StateUnknown(param))
    }

    fn raw(&self) -> Option<RawValue> {
        self.zone.state().get(self.capability.param())
    }

    fn out_of_range(&self, value: i32, range: Constraint) -> ZoneError {
        ZoneError::OutOfRange {
            param: self.capability.param(),
            value,
            minimum: range.minimum,
            maximum: range.maximum,
        }
    }

    fn unsupported(&self, name: &str) -> ZoneError {
        ZoneError::Unsupported {
            capability: self.capability.name(),
            name: name.to_string(),
        }
    }

    /// Turn a switch on.
    pub fn on(&self) -> ZoneResult<StateSnapshot> {
        self.invoke(CapabilityCommand::On)
    }

    /// Turn a switch off.
    pub fn off(&self) -> ZoneResult<StateSnapshot> {
        self.invoke(CapabilityCommand::Off)
    }

    /// Mute the zone.
    pub fn mute(&self) -> ZoneResult<StateSnapshot> {
        self.invoke(CapabilityCommand::Mute)
    }

    /// Unmute the zone.
    pub fn unmute(&self) -> ZoneResult<StateSnapshot> {
        self.invoke(CapabilityCommand::Unmute)
    }

    /// Set the mute state.
    pub fn set_mute(&self, state: MuteState) -> ZoneResult<StateSnapshot> {
        self.invoke(CapabilityCommand::SetMute(state))
    }

    /// Raise the volume one device step.
    pub fn volume_up(&self) -> ZoneResult<StateSnapshot> {
        self.invoke(CapabilityCommand::VolumeUp)
    }

    /// Lower the volume one device step.
    pub fn volume_down(&self) -> ZoneResult<StateSnapshot> {
        self.invoke(CapabilityCommand::VolumeDown)
    }

    /// Set the volume from a 0-100 level.
    pub fn set_volume(&self, level: i32) -> ZoneResult<StateSnapshot> {
        self.invoke(CapabilityCommand::SetVolume(level))
    }

    /// Set a ranged parameter from a 0-100 level.
    pub fn set_level(&self, level: i32) -> ZoneResult<StateSnapshot> {
        self.invoke(CapabilityCommand::SetLevel(level))
    }

    /// Select the next source, wrapping to the first.
    pub fn channel_up(&self) -> ZoneResult<StateSnapshot> {
        self.invoke(CapabilityCommand::ChannelUp)
    }

    /// Select the previous source, wrapping to the last.
    pub fn channel_down(&self) -> ZoneResult<StateSnapshot> {
        self.invoke(CapabilityCommand::ChannelDown)
    }

    /// Select a source by number.
    pub fn set_tv_channel(&self, channel: i32) -> ZoneResult<StateSnapshot> {
        self.invoke(CapabilityCommand::SetTvChannel(channel))
    }

    /// `"on"` if the parameter reads `01`, otherwise `"off"`.
    pub fn switch(&self) -> ZoneResult<&'static str> {
        match self.capability {
            Capability::Switch { .. } => Ok(if self.raw().is_some_and(|v| v.is_on()) { "on" } else { "off" }),
            _ => Err(self.unsupported(Attribute::Switch.name())),
        }
    }

    /// Current mute state.
    pub fn mute_state(&self) -> ZoneResult<MuteState> {
        match self.capability {
            Capability::AudioMute => Ok(if self.raw().is_some_and(|v| v.is_on()) {
                MuteState::Muted
            } else {
                MuteState::Unmuted
            }),
            _ => Err(self.unsupported(Attribute::Mute.name())),
        }
    }

    /// Current volume on the 0-100 scale.
    pub fn volume(&self) -> ZoneResult<Option<i32>> {
        match self.capability {
            Capability::AudioVolume { constraint } => Ok(self.scaled(constraint)),
            _ => Err(self.unsupported(Attribute::Volume.name())),
        }
    }

    /// Current level on the 0-100 scale.
    pub fn level(&self) -> ZoneResult<Option<i32>> {
        match self.capability {
            Capability::SwitchLevel { constraint, .. } => Ok(self.scaled(constraint)),
            _ => Err(self.unsupported(Attribute::Level.name())),
        }
    }

    fn scaled(&self, constraint: Constraint) -> Option<i32> {
        self.raw()
            .map(|raw| constraint.denormalize(constraint.from_raw(raw)))
    }

    /// Current source number.
    pub fn tv_channel(&self) -> ZoneResult<Option<i32>> {
        match self.capability {
            Capability::TvChannel { constraint } => Ok(self.raw().map(|raw| constraint.from_raw(raw))),
            _ => Err(self.unsupported(Attribute::TvChannel.name())),
        }
    }

    /// Configured name of the current source.
    pub fn tv_channel_name(&self) -> ZoneResult<Option<String>> {
        match self.capability {
            Capability::TvChannel { .. } => Ok(self
                .tv_channel()?
                .and_then(|channel| self.zone.source_name(channel))
                .map(str::to_string)),
            _ => Err(self.unsupported(Attribute::TvChannelName.name())),
        }
    }

    /// Whether a keypad is connected.
    pub fn remote_control_enabled(&self) -> ZoneResult<bool> {
        match self.capability {
            Capability::RemoteControlStatus => Ok(self.raw().is_some_and(|v| v.is_on())),
            _ => Err(self.unsupported(Attribute::RemoteControlEnabled.name())),
        }
    }

    /// Read an attribute by kind.
    pub fn attribute(&self, attribute: Attribute) -> ZoneResult<AttributeValue> {
        let number = |v: Option<i32>| v.map_or(AttributeValue::Unset, AttributeValue::Number);
        let value = match attribute {
            Attribute::Switch => AttributeValue::Text(self.switch()?.to_string()),
            Attribute::Mute => AttributeValue::Text(self.mute_state()?.as_str().to_string()),
            Attribute::Volume => number(self.volume()?),
            Attribute::Level => number(self.level()?),
            Attribute::TvChannel => number(self.tv_channel()?),
            Attribute::TvChannelName => self
                .tv_channel_name()?
                .map_or(AttributeValue::Unset, AttributeValue::Text),
            Attribute::RemoteControlEnabled => AttributeValue::Flag(self.remote_control_enabled()?),
        };
        Ok(value)
    }
}
