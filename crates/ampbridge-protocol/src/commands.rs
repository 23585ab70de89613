//! Commands that can be sent to the amplifier.
//!
//! There are only three outbound frame shapes:
//! - Zone status query: `?` + address
//! - Parameter query: `?` + address + code
//! - Set parameter: `<` + address + code + two-digit value

use crate::codec::LineCodec;
use crate::types::{ParamCode, RawValue, ZoneAddress};

/// Commands that can be sent to an amplifier zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Ask the zone for its full status bundle.
    QueryStatus {
        /// Target zone.
        address: ZoneAddress,
    },

    /// Ask the zone for a single parameter.
    QueryParam {
        /// Target zone.
        address: ZoneAddress,
        /// Parameter to report.
        param: ParamCode,
    },

    /// Set a parameter to a raw value.
    Set {
        /// Target zone.
        address: ZoneAddress,
        /// Parameter to change.
        param: ParamCode,
        /// New device-native value.
        value: RawValue,
    },
}

impl Command {
    /// Encode the command as a line to send to the amplifier.
    /// Returns the bytes to send (including the `\r` terminator).
    pub fn encode(&self) -> Vec<u8> {
        LineCodec::encode_command(&self.to_command_string())
    }

    /// Get the command string without the terminator.
    pub fn to_command_string(&self) -> String {
        match self {
            Command::QueryStatus { address } => format!("?{}", address),
            Command::QueryParam { address, param } => format!("?{}{}", address, param),
            Command::Set { address, param, value } => format!("<{}{}{}", address, param, value),
        }
    }

    /// The zone this command targets.
    pub fn address(&self) -> ZoneAddress {
        match self {
            Command::QueryStatus { address }
            | Command::QueryParam { address, .. }
            | Command::Set { address, .. } => *address,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(unit: u8, zone: u8) -> ZoneAddress {
        ZoneAddress::new(unit, zone).unwrap()
    }

    #[test]
    fn test_encode_query_status() {
        let cmd = Command::QueryStatus { address: addr(1, 1) };
        assert_eq!(cmd.encode(), b"?11\r");
    }

    #[test]
    fn test_encode_query_param() {
        let cmd = Command::QueryParam {
            address: addr(2, 4),
            param: ParamCode::Channel,
        };
        assert_eq!(cmd.encode(), b"?24CH\r");
    }

    #[test]
    fn test_encode_set_pads_value() {
        let cmd = Command::Set {
            address: addr(3, 6),
            param: ParamCode::Volume,
            value: RawValue::new(5).unwrap(),
        };
        assert_eq!(cmd.encode(), b"<36VO05\r");
    }

    #[test]
    fn test_encode_set_power_on() {
        let cmd = Command::Set {
            address: addr(1, 2),
            param: ParamCode::Power,
            value: RawValue::ON,
        };
        assert_eq!(cmd.to_command_string(), "<12PR01");
        assert_eq!(cmd.address(), addr(1, 2));
    }
}
