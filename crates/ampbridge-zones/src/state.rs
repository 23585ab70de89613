//! Per-zone parameter cache.
//!
//! Values are kept as atomics so readers never block: the dispatcher thread
//! is the only writer, and a reader may see a value that is stale relative
//! to a command whose acknowledgement has not arrived yet.

use std::sync::atomic::{AtomicU8, Ordering};

use ampbridge_protocol::{ParamCode, RawValue, ZoneAddress};
use serde::ser::{Serialize, SerializeMap, Serializer};

/// Marker for a slot that has never been reported.
const UNSET: u8 = u8::MAX;

fn load(slot: &AtomicU8) -> Option<RawValue> {
    match slot.load(Ordering::Acquire) {
        UNSET => None,
        v => RawValue::new(v).ok(),
    }
}

/// The raw parameter values last reported by one zone.
#[derive(Debug)]
pub struct ZoneState {
    unit: AtomicU8,
    zone: AtomicU8,
    params: [AtomicU8; ParamCode::COUNT],
}

impl Default for ZoneState {
    fn default() -> Self {
        Self::new()
    }
}

impl ZoneState {
    /// Create a state with every slot unset.
    pub fn new() -> Self {
        ZoneState {
            unit: AtomicU8::new(UNSET),
            zone: AtomicU8::new(UNSET),
            params: std::array::from_fn(|_| AtomicU8::new(UNSET)),
        }
    }

    /// Last reported value of a parameter.
    pub fn get(&self, param: ParamCode) -> Option<RawValue> {
        load(&self.params[param.index()])
    }

    /// Store a reported value, returning the previous one.
    pub(crate) fn set(&self, param: ParamCode, value: RawValue) -> Option<RawValue> {
        match self.params[param.index()].swap(value.value(), Ordering::AcqRel) {
            UNSET => None,
            v => RawValue::new(v).ok(),
        }
    }

    /// Record the unit and zone digits echoed by a full status report.
    pub(crate) fn set_reported_address(&self, address: ZoneAddress) {
        self.unit.store(address.unit(), Ordering::Release);
        self.zone.store(address.zone(), Ordering::Release);
    }

    /// Copy every slot. Slots are read independently, so a snapshot taken
    /// while a status report is being applied may mix old and new values.
    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            unit: load(&self.unit),
            zone: load(&self.zone),
            params: std::array::from_fn(|i| load(&self.params[i])),
        }
    }
}

/// A point-in-time copy of a [`ZoneState`].
///
/// Serializes as a flat map of code to two-digit string (or `null` when
/// unset), e.g. `{"UNIT": "01", "ZONE": "02", "PA": "00", ..., "LS": null}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateSnapshot {
    /// Unit digit from the last full status report.
    pub unit: Option<RawValue>,
    /// Zone digit from the last full status report.
    pub zone: Option<RawValue>,
    params: [Option<RawValue>; ParamCode::COUNT],
}

impl StateSnapshot {
    /// Value of a parameter at snapshot time.
    pub fn get(&self, param: ParamCode) -> Option<RawValue> {
        self.params[param.index()]
    }

    /// Iterate every parameter with its value.
    pub fn iter(&self) -> impl Iterator<Item = (ParamCode, Option<RawValue>)> + '_ {
        ParamCode::ALL.iter().map(move |p| (*p, self.get(*p)))
    }

    /// Whether nothing at all has been reported.
    pub fn is_empty(&self) -> bool {
        self.unit.is_none() && self.zone.is_none() && self.params.iter().all(Option::is_none)
    }
}

impl Serialize for StateSnapshot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let text = |v: Option<RawValue>| v.map(|v| v.to_string());
        let mut map = serializer.serialize_map(Some(ParamCode::COUNT + 2))?;
        map.serialize_entry("UNIT", &text(self.unit))?;
        map.serialize_entry("ZONE", &text(self.zone))?;
        for (param, value) in self.iter() {
            map.serialize_entry(param.as_str(), &text(value))?;
        }
        map.end()
    }
}
