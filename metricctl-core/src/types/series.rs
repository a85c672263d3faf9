//! Time series domain types.

use crate::types::descriptor::{MetricKind, ValueType};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

const NANOS_PER_SECOND: i32 = 1_000_000_000;

/// Absolute point in time, seconds and nanos since the Unix epoch.
///
/// Well-formed iff `seconds >= 0` and `0 <= nanos < 1_000_000_000`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp {
    pub seconds: i64,
    pub nanos: i32,
}

impl Timestamp {
    pub fn new(seconds: i64, nanos: i32) -> Self {
        Self { seconds, nanos }
    }

    pub fn from_seconds(seconds: i64) -> Self {
        Self { seconds, nanos: 0 }
    }

    /// Convert a `SystemTime`; times before the epoch clamp to the epoch.
    pub fn from_system_time(time: SystemTime) -> Self {
        let since_epoch = time.duration_since(UNIX_EPOCH).unwrap_or_default();
        Self {
            seconds: since_epoch.as_secs() as i64,
            nanos: since_epoch.subsec_nanos() as i32,
        }
    }

    pub fn is_well_formed(&self) -> bool {
        self.seconds >= 0 && (0..NANOS_PER_SECOND).contains(&self.nanos)
    }

    /// `None` if not well-formed.
    pub fn to_system_time(&self) -> Option<SystemTime> {
        if !self.is_well_formed() {
            return None;
        }
        UNIX_EPOCH.checked_add(Duration::new(self.seconds as u64, self.nanos as u32))
    }

    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        if !self.is_well_formed() {
            return None;
        }
        DateTime::from_timestamp(self.seconds, self.nanos as u32)
    }

    /// Move back by `duration`, saturating at the epoch.
    pub fn saturating_sub(&self, duration: Duration) -> Self {
        let total = Duration::new(self.seconds.max(0) as u64, self.nanos.clamp(0, 999_999_999) as u32);
        let earlier = total.saturating_sub(duration);
        Self { seconds: earlier.as_secs() as i64, nanos: earlier.subsec_nanos() as i32 }
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_datetime() {
            Some(dt) => f.write_str(&dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            None => write!(f, "{}s+{}ns", self.seconds, self.nanos),
        }
    }
}

/// Interval attached to a written or returned point.
///
/// `end_time` is required by the backend; `start_time` is only meaningful for
/// DELTA and CUMULATIVE metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TimeInterval {
    pub start_time: Option<Timestamp>,
    pub end_time: Option<Timestamp>,
}

impl TimeInterval {
    /// Interval for a GAUGE point at `end`.
    pub fn at(end: Timestamp) -> Self {
        Self { start_time: None, end_time: Some(end) }
    }

    pub fn between(start: Timestamp, end: Timestamp) -> Self {
        Self { start_time: Some(start), end_time: Some(end) }
    }
}

/// Read window for a time series query: `start` inclusive, both absolute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryInterval {
    pub start: Timestamp,
    pub end: Timestamp,
}

impl QueryInterval {
    pub fn new(start: Timestamp, end: Timestamp) -> Self {
        Self { start, end }
    }

    /// The `window` leading up to `now`.
    pub fn trailing(now: SystemTime, window: Duration) -> Self {
        let end = Timestamp::from_system_time(now);
        Self { start: end.saturating_sub(window), end }
    }
}

/// Summary of a distribution-valued point.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Distribution {
    pub count: i64,
    pub mean: f64,
    pub sum_of_squared_deviation: f64,
    #[serde(default)]
    pub bucket_counts: Vec<i64>,
}

/// A single point value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TypedValue {
    #[serde(rename = "boolValue")]
    Bool(bool),
    #[serde(rename = "int64Value")]
    Int64(i64),
    #[serde(rename = "doubleValue")]
    Double(f64),
    #[serde(rename = "stringValue")]
    String(String),
    #[serde(rename = "distributionValue")]
    Distribution(Distribution),
}

impl fmt::Display for TypedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{}", v),
            Self::Int64(v) => write!(f, "{}", v),
            Self::Double(v) => write!(f, "{}", v),
            Self::String(v) => write!(f, "{:?}", v),
            Self::Distribution(d) => {
                write!(f, "distribution(count={}, mean={})", d.count, d.mean)
            }
        }
    }
}

/// A (interval, value) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub interval: TimeInterval,
    pub value: TypedValue,
}

impl Point {
    pub fn new(interval: TimeInterval, value: TypedValue) -> Self {
        Self { interval, value }
    }
}

/// Metric reference: type plus label values.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Metric {
    pub metric_type: String,
    pub labels: BTreeMap<String, String>,
}

impl Metric {
    pub fn new(metric_type: impl Into<String>) -> Self {
        Self { metric_type: metric_type.into(), labels: BTreeMap::new() }
    }

    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }
}

/// Monitored resource reference: type plus label values.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MonitoredResource {
    pub resource_type: String,
    pub labels: BTreeMap<String, String>,
}

impl MonitoredResource {
    pub fn new(resource_type: impl Into<String>) -> Self {
        Self { resource_type: resource_type.into(), labels: BTreeMap::new() }
    }

    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }
}

/// A metric attached to a resource, with its points most-recent-first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    pub metric: Metric,
    pub resource: MonitoredResource,
    pub metric_kind: MetricKind,
    pub value_type: ValueType,
    pub points: Vec<Point>,
    #[serde(default)]
    pub unit: String,
}

impl TimeSeries {
    pub fn metric_label(&self, key: &str) -> Option<&str> {
        self.metric.labels.get(key).map(String::as_str)
    }

    pub fn resource_label(&self, key: &str) -> Option<&str> {
        self.resource.labels.get(key).map(String::as_str)
    }
}
