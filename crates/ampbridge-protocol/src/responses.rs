//! Response parsing for the amplifier protocol.
//!
//! Every inbound line may start with any run of the markers `#`, `>` and `?`
//! (the amplifier prompts with `#` and echoes queries). After the markers a
//! line is one of:
//! - Zone status: `<unit><zone>` optionally followed by ten two-digit fields
//! - Parameter acknowledgement: `<unit><zone><CODE><VAL>`
//!
//! Anything else is a [`ProtocolError::NoMatch`].

use crate::error::{ProtocolError, ProtocolResult};
use crate::types::{ParamCode, RawValue, ZoneAddress};

/// Length of the status field block (10 fields × 2 digits).
const STATUS_BLOCK_LEN: usize = ParamCode::STATUS_ORDER.len() * 2;

/// The ten fields of a full zone status, in wire order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusFields([RawValue; 10]);

impl StatusFields {
    /// Parse the 20-digit status block.
    fn parse(block: &[u8]) -> Option<StatusFields> {
        if block.len() != STATUS_BLOCK_LEN {
            return None;
        }
        let mut fields = [RawValue::OFF; 10];
        for (field, digits) in fields.iter_mut().zip(block.chunks_exact(2)) {
            *field = RawValue::from_digits(digits)?;
        }
        Some(StatusFields(fields))
    }

    /// Get the value reported for a parameter, if it is part of the status block.
    pub fn get(&self, param: ParamCode) -> Option<RawValue> {
        ParamCode::STATUS_ORDER
            .iter()
            .position(|p| *p == param)
            .map(|i| self.0[i])
    }

    /// Iterate `(code, value)` pairs in wire order.
    pub fn iter(&self) -> impl Iterator<Item = (ParamCode, RawValue)> + '_ {
        ParamCode::STATUS_ORDER.iter().copied().zip(self.0.iter().copied())
    }
}

/// A decoded inbound line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Response {
    /// Zone status report. `fields` is `None` for the bare `<unit><zone>`
    /// form, which names the zone but carries no parameter values.
    Status {
        /// Reporting zone.
        address: ZoneAddress,
        /// The status block, if present.
        fields: Option<StatusFields>,
    },

    /// Acknowledgement of a single parameter.
    ParamAck {
        /// Reporting zone.
        address: ZoneAddress,
        /// Parameter code.
        param: ParamCode,
        /// Reported value.
        value: RawValue,
    },
}

impl Response {
    /// Parse a response line.
    ///
    /// Leading and trailing whitespace is ignored. The status grammar is
    /// tried first and must match the whole line; only then is the
    /// acknowledgement grammar tried.
    pub fn parse(text: &str) -> ProtocolResult<Response> {
        let text = text.trim();
        let body = text
            .trim_start_matches(|c| matches!(c, '#' | '>' | '?'))
            .as_bytes();

        if let Some(response) = Self::try_parse_status(body) {
            return Ok(response);
        }

        if let Some(response) = Self::try_parse_ack(body) {
            return Ok(response);
        }

        Err(ProtocolError::NoMatch(text.to_string()))
    }

    /// Try to parse a zone status: two address digits plus an optional block.
    fn try_parse_status(body: &[u8]) -> Option<Response> {
        let (address, rest) = Self::split_address(body)?;
        let fields = match rest.len() {
            0 => None,
            _ => Some(StatusFields::parse(rest)?),
        };
        Some(Response::Status { address, fields })
    }

    /// Try to parse a single-parameter acknowledgement.
    fn try_parse_ack(body: &[u8]) -> Option<Response> {
        let (address, rest) = Self::split_address(body)?;
        let [c1, c2, d1, d2] = rest else {
            return None;
        };
        let code = [*c1, *c2];
        let param = ParamCode::from_code(std::str::from_utf8(&code).ok()?)?;
        let value = RawValue::from_digits(&[*d1, *d2])?;
        Some(Response::ParamAck { address, param, value })
    }

    fn split_address(body: &[u8]) -> Option<(ZoneAddress, &[u8])> {
        match body {
            [unit, zone, rest @ ..] => Some((ZoneAddress::from_digits(*unit, *zone)?, rest)),
            _ => None,
        }
    }

    /// The zone that produced this response.
    pub fn address(&self) -> ZoneAddress {
        match self {
            Response::Status { address, .. } | Response::ParamAck { address, .. } => *address,
        }
    }

    /// Check if this is a status report without a field block.
    pub fn is_empty_status(&self) -> bool {
        matches!(self, Response::Status { fields: None, .. })
    }

    /// The state writes this response implies, in wire order.
    pub fn updates(&self) -> Vec<(ParamCode, RawValue)> {
        match self {
            Response::Status { fields: Some(fields), .. } => fields.iter().collect(),
            Response::Status { fields: None, .. } => Vec::new(),
            Response::ParamAck { param, value, .. } => vec![(*param, *value)],
        }
    }
}
