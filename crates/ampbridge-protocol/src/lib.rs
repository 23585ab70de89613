//! Multi-zone Amplifier Serial Protocol
//!
//! This crate provides types and utilities for talking to a stack of
//! multi-zone audio amplifiers over their shared RS-232 port. Up to three
//! amplifier units can be chained, each driving six zones, and every zone is
//! addressed by the two digits `<unit><zone>` (e.g. `11`, `36`).
//!
//! # Protocol Overview
//!
//! The protocol is line-based ASCII:
//!
//! - **Commands** (host → amplifier): terminated with `\r`
//! - **Responses** (amplifier → host): terminated with `\r` and/or `\n`,
//!   optionally prefixed with any of the markers `#`, `>` or `?`
//!
//! # Frame Types
//!
//! | Direction | Frame | Example |
//! |-----------|-------|---------|
//! | out | Zone status query | `?11\r` |
//! | out | Parameter query | `?11VO\r` |
//! | out | Set parameter | `<11VO20\r` |
//! | in | Zone status | `#>1100010000200707100100` |
//! | in | Parameter acknowledgement | `#11VO20` |
//!
//! A zone status carries ten two-digit fields in fixed order:
//! `PA PR MU DT VO TR BS BL CH LS`.
//!
//! # Example
//!
//! ```rust
//! use ampbridge_protocol::{Command, ParamCode, RawValue, Response, ZoneAddress};
//!
//! let address = ZoneAddress::new(1, 1).unwrap();
//! let cmd = Command::Set { address, param: ParamCode::Volume, value: RawValue::new(20).unwrap() };
//! assert_eq!(cmd.encode(), b"<11VO20\r");
//!
//! let response = Response::parse("#11VO20").unwrap();
//! assert_eq!(response.address(), address);
//! ```

mod codec;
mod commands;
mod error;
mod responses;
mod types;

pub use codec::*;
pub use commands::*;
pub use error::*;
pub use responses::*;
pub use types::*;
