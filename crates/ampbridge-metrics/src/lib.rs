//! Metrics for the amplifier bridge.
//!
//! This crate declares every metric the bridge emits as a structured
//! [`Metric`] constant and re-exports the `metrics` crate for convenience.
//! Without an installed recorder, emission is a no-op.
//!
//! # Example
//!
//! ```rust,ignore
//! use ampbridge_metrics::{ZoneLabels, metric_defs, describe_metrics};
//!
//! describe_metrics();
//!
//! let labels = ZoneLabels::new("11", "VO");
//! metrics::counter!(metric_defs::FRAMES_WRITTEN.name, &labels.to_labels()).increment(1);
//! ```

pub use metrics;

use metrics::{describe_counter, describe_gauge, Unit};

/// Whether a metric only counts up or can move both ways.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    /// Monotonic count of events.
    Counter,
    /// Current level of something.
    Gauge,
}

impl MetricKind {
    /// Lowercase name of the kind.
    pub const fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Counter => "counter",
            MetricKind::Gauge => "gauge",
        }
    }
}

impl std::fmt::Display for MetricKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A metric declaration with its metadata.
///
/// # Example
///
/// ```rust
/// use ampbridge_metrics::{Metric, MetricKind};
///
/// const FRAMES: Metric = Metric::counter("ampbridge.frames")
///     .with_description("Frames seen")
///     .with_labels(&["zone"]);
///
/// assert_eq!(FRAMES.name, "ampbridge.frames");
/// assert_eq!(FRAMES.kind, MetricKind::Counter);
/// ```
#[derive(Debug, Clone)]
pub struct Metric {
    /// Dotted metric name, e.g. `ampbridge.serial.frames_written`.
    pub name: &'static str,
    /// Counter or gauge.
    pub kind: MetricKind,
    /// One-line description.
    pub description: &'static str,
    /// Unit of measurement. Everything the bridge emits is a count unless
    /// stated otherwise.
    pub unit: Unit,
    /// Label keys attached on emission.
    pub labels: &'static [&'static str],
}

impl Metric {
    const fn new(name: &'static str, kind: MetricKind) -> Self {
        Self {
            name,
            kind,
            description: "",
            unit: Unit::Count,
            labels: &[],
        }
    }

    /// Declare a counter.
    pub const fn counter(name: &'static str) -> Self {
        Self::new(name, MetricKind::Counter)
    }

    /// Declare a gauge.
    pub const fn gauge(name: &'static str) -> Self {
        Self::new(name, MetricKind::Gauge)
    }

    /// Set the description.
    pub const fn with_description(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    /// Set the unit.
    pub const fn with_unit(mut self, unit: Unit) -> Self {
        self.unit = unit;
        self
    }

    /// Set the label keys.
    pub const fn with_labels(mut self, labels: &'static [&'static str]) -> Self {
        self.labels = labels;
        self
    }

    /// Register the description with the installed recorder.
    pub fn describe(&self) {
        match self.kind {
            MetricKind::Counter => describe_counter!(self.name, self.unit, self.description),
            MetricKind::Gauge => describe_gauge!(self.name, self.unit, self.description),
        }
    }
}

/// All metric definitions for the bridge.
pub mod metric_defs {
    use super::Metric;

    /// Labels present on all zone-scoped metrics.
    pub const ZONE_LABELS: &[&str] = &["zone", "param"];

    // ========================================================================
    // Serial Link
    // ========================================================================

    /// Frames written to the transport.
    ///
    /// Labels: zone, param (`status` for full-status queries)
    pub const FRAMES_WRITTEN: Metric = Metric::counter("ampbridge.serial.frames_written")
        .with_description("Frames written to the amplifier")
        .with_labels(ZONE_LABELS);

    /// Frames whose write failed.
    pub const FRAME_WRITE_ERRORS: Metric = Metric::counter("ampbridge.serial.write_errors")
        .with_description("Frames that could not be written to the amplifier")
        .with_labels(ZONE_LABELS);

    /// Lines received from the transport.
    pub const LINES_RECEIVED: Metric = Metric::counter("ampbridge.serial.lines_received")
        .with_description("Response lines received from the amplifier");

    /// Lines matching neither response grammar.
    pub const LINES_UNMATCHED: Metric = Metric::counter("ampbridge.serial.lines_unmatched")
        .with_description("Response lines that matched no grammar");

    /// Decoded lines naming a zone that is not configured.
    pub const LINES_UNKNOWN_ADDRESS: Metric = Metric::counter("ampbridge.serial.lines_unknown_address")
        .with_description("Response lines addressed to an unmanaged zone");

    // ========================================================================
    // Zone State
    // ========================================================================

    /// State fields written by the dispatcher.
    ///
    /// Labels: zone, param
    pub const STATE_UPDATES: Metric = Metric::counter("ampbridge.zone.state_updates")
        .with_description("Zone state fields updated from responses")
        .with_labels(ZONE_LABELS);

    /// Capability requests rejected before reaching the wire.
    ///
    /// Labels: zone, param
    pub const REQUESTS_REJECTED: Metric = Metric::counter("ampbridge.zone.requests_rejected")
        .with_description("Capability requests rejected locally")
        .with_labels(ZONE_LABELS);

    /// Number of zones managed by the registry.
    pub const ZONES_MANAGED: Metric = Metric::gauge("ampbridge.zone.managed")
        .with_description("Zones built from configuration");

    /// All metric definitions.
    pub const ALL: &[&Metric] = &[
        &FRAMES_WRITTEN,
        &FRAME_WRITE_ERRORS,
        &LINES_RECEIVED,
        &LINES_UNMATCHED,
        &LINES_UNKNOWN_ADDRESS,
        &STATE_UPDATES,
        &REQUESTS_REJECTED,
        &ZONES_MANAGED,
    ];
}

/// Metric labels identifying a zone and the parameter involved.
///
/// # Example
///
/// ```rust
/// use ampbridge_metrics::ZoneLabels;
///
/// let labels = ZoneLabels::new("11", "VO");
/// let label_array = labels.to_labels();
///
/// assert!(label_array.iter().any(|(k, v)| *k == "zone" && v == "11"));
/// assert!(label_array.iter().any(|(k, v)| *k == "param" && v == "VO"));
/// ```
#[derive(Debug, Clone)]
pub struct ZoneLabels {
    /// Two-digit zone address.
    pub zone: String,
    /// Parameter code, or `status` for whole-zone frames.
    pub param: String,
}

impl ZoneLabels {
    /// Creates labels for a zone and parameter.
    pub fn new(zone: impl Into<String>, param: impl Into<String>) -> Self {
        Self {
            zone: zone.into(),
            param: param.into(),
        }
    }

    /// Converts the labels to the metrics crate label format.
    pub fn to_labels(&self) -> [(&'static str, String); 2] {
        [("zone", self.zone.clone()), ("param", self.param.clone())]
    }
}

/// Describes all metrics used by the bridge.
///
/// Call once at startup, after installing a recorder.
pub fn describe_metrics() {
    for metric in metric_defs::ALL {
        metric.describe();
    }
}
