//! Addresses, parameter codes and raw values.

use std::fmt;
use std::str::FromStr;

use crate::error::{ProtocolError, ProtocolResult};

/// Two-letter hardware parameter codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ParamCode {
    /// Public address / paging (`PA`)
    PublicAddress,
    /// Whole-unit power, only seen in acknowledgements (`PP`)
    AllPower,
    /// Zone power (`PR`)
    Power,
    /// Mute (`MU`)
    Mute,
    /// Do not disturb (`DT`)
    DoNotDisturb,
    /// Volume (`VO`)
    Volume,
    /// Treble (`TR`)
    Treble,
    /// Bass (`BS`)
    Bass,
    /// Balance (`BL`)
    Balance,
    /// Source channel (`CH`)
    Channel,
    /// Keypad connected (`LS`)
    Keypad,
}

impl ParamCode {
    /// Every code, in state-store order.
    pub const ALL: [ParamCode; 11] = [
        ParamCode::PublicAddress,
        ParamCode::AllPower,
        ParamCode::Power,
        ParamCode::Mute,
        ParamCode::DoNotDisturb,
        ParamCode::Volume,
        ParamCode::Treble,
        ParamCode::Bass,
        ParamCode::Balance,
        ParamCode::Channel,
        ParamCode::Keypad,
    ];

    /// Field order of a zone status response.
    pub const STATUS_ORDER: [ParamCode; 10] = [
        ParamCode::PublicAddress,
        ParamCode::Power,
        ParamCode::Mute,
        ParamCode::DoNotDisturb,
        ParamCode::Volume,
        ParamCode::Treble,
        ParamCode::Bass,
        ParamCode::Balance,
        ParamCode::Channel,
        ParamCode::Keypad,
    ];

    /// Number of distinct codes.
    pub const COUNT: usize = Self::ALL.len();

    /// Get the two-letter code used on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            ParamCode::PublicAddress => "PA",
            ParamCode::AllPower => "PP",
            ParamCode::Power => "PR",
            ParamCode::Mute => "MU",
            ParamCode::DoNotDisturb => "DT",
            ParamCode::Volume => "VO",
            ParamCode::Treble => "TR",
            ParamCode::Bass => "BS",
            ParamCode::Balance => "BL",
            ParamCode::Channel => "CH",
            ParamCode::Keypad => "LS",
        }
    }

    /// Parse a parameter code from its two-letter representation.
    pub fn from_code(s: &str) -> Option<ParamCode> {
        match s {
            "PA" => Some(ParamCode::PublicAddress),
            "PP" => Some(ParamCode::AllPower),
            "PR" => Some(ParamCode::Power),
            "MU" => Some(ParamCode::Mute),
            "DT" => Some(ParamCode::DoNotDisturb),
            "VO" => Some(ParamCode::Volume),
            "TR" => Some(ParamCode::Treble),
            "BS" => Some(ParamCode::Bass),
            "BL" => Some(ParamCode::Balance),
            "CH" => Some(ParamCode::Channel),
            "LS" => Some(ParamCode::Keypad),
            _ => None,
        }
    }

    /// Position of this code in [`ParamCode::ALL`].
    pub fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for ParamCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParamCode {
    type Err = ProtocolError;

    fn from_str(s: &str) -> ProtocolResult<Self> {
        ParamCode::from_code(&s.to_ascii_uppercase())
            .ok_or_else(|| ProtocolError::InvalidParamCode(s.to_string()))
    }
}

/// A device-native parameter value: always exactly two decimal digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RawValue(u8);

impl RawValue {
    /// Largest value representable in two digits.
    pub const MAX: u8 = 99;

    /// Boolean-like "off" (`00`).
    pub const OFF: RawValue = RawValue(0);

    /// Boolean-like "on" (`01`).
    pub const ON: RawValue = RawValue(1);

    /// Create a raw value, rejecting anything that needs more than two digits.
    pub fn new(value: u8) -> ProtocolResult<RawValue> {
        if value > Self::MAX {
            return Err(ProtocolError::InvalidRawValue(value.to_string()));
        }
        Ok(RawValue(value))
    }

    /// Create a raw value from a signed integer.
    pub fn from_i32(value: i32) -> ProtocolResult<RawValue> {
        u8::try_from(value)
            .map_err(|_| ProtocolError::InvalidRawValue(value.to_string()))
            .and_then(RawValue::new)
    }

    /// Parse exactly two ASCII digits.
    pub fn from_digits(digits: &[u8]) -> Option<RawValue> {
        match digits {
            [tens, ones] if tens.is_ascii_digit() && ones.is_ascii_digit() => {
                Some(RawValue((tens - b'0') * 10 + (ones - b'0')))
            }
            _ => None,
        }
    }

    /// The numeric value (0-99).
    pub fn value(&self) -> u8 {
        self.0
    }

    /// Whether this is the boolean-like "on" value.
    pub fn is_on(&self) -> bool {
        *self == RawValue::ON
    }
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}", self.0)
    }
}

impl FromStr for RawValue {
    type Err = ProtocolError;

    fn from_str(s: &str) -> ProtocolResult<Self> {
        RawValue::from_digits(s.as_bytes()).ok_or_else(|| ProtocolError::InvalidRawValue(s.to_string()))
    }
}

/// The bus address of one zone: amplifier unit plus zone number.
///
/// Each part travels as a single digit, so the address string is always two
/// characters (`"11"` for unit 1 zone 1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ZoneAddress {
    unit: u8,
    zone: u8,
}

impl ZoneAddress {
    /// Create an address. Both parts must fit in one decimal digit.
    pub fn new(unit: u8, zone: u8) -> ProtocolResult<ZoneAddress> {
        if unit > 9 || zone > 9 {
            return Err(ProtocolError::InvalidAddress { unit, zone });
        }
        Ok(ZoneAddress { unit, zone })
    }

    /// Build an address from two ASCII digits.
    pub(crate) fn from_digits(unit: u8, zone: u8) -> Option<ZoneAddress> {
        if unit.is_ascii_digit() && zone.is_ascii_digit() {
            Some(ZoneAddress {
                unit: unit - b'0',
                zone: zone - b'0',
            })
        } else {
            None
        }
    }

    /// Amplifier unit (controller) number.
    pub fn unit(&self) -> u8 {
        self.unit
    }

    /// Zone number within the unit.
    pub fn zone(&self) -> u8 {
        self.zone
    }
}

impl fmt::Display for ZoneAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.unit, self.zone)
    }
}
