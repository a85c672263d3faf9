//! Metric descriptor domain types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How a metric's values relate to time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MetricKind {
    /// Not set; only seen on data read back from the backend
    Unspecified,

    /// Instantaneous measurement
    Gauge,

    /// Change since the previous point
    Delta,

    /// Running total since a fixed start time
    Cumulative,
}

impl MetricKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unspecified => "METRIC_KIND_UNSPECIFIED",
            Self::Gauge => "GAUGE",
            Self::Delta => "DELTA",
            Self::Cumulative => "CUMULATIVE",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetricKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "GAUGE" => Ok(Self::Gauge),
            "DELTA" => Ok(Self::Delta),
            "CUMULATIVE" => Ok(Self::Cumulative),
            other => Err(format!(
                "unknown metric kind '{}'; expected one of GAUGE, DELTA, CUMULATIVE",
                other
            )),
        }
    }
}

/// Type of the values a metric carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValueType {
    Unspecified,
    Bool,
    Int64,
    Double,
    String,
    Distribution,
}

impl ValueType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unspecified => "VALUE_TYPE_UNSPECIFIED",
            Self::Bool => "BOOL",
            Self::Int64 => "INT64",
            Self::Double => "DOUBLE",
            Self::String => "STRING",
            Self::Distribution => "DISTRIBUTION",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ValueType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "BOOL" => Ok(Self::Bool),
            "INT64" => Ok(Self::Int64),
            "DOUBLE" => Ok(Self::Double),
            "STRING" => Ok(Self::String),
            "DISTRIBUTION" => Ok(Self::Distribution),
            other => Err(format!(
                "unknown value type '{}'; expected one of BOOL, INT64, DOUBLE, STRING, DISTRIBUTION",
                other
            )),
        }
    }
}

/// Type of a label's values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LabelValueType {
    #[default]
    String,
    Bool,
    Int64,
}

impl LabelValueType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "STRING",
            Self::Bool => "BOOL",
            Self::Int64 => "INT64",
        }
    }
}

impl fmt::Display for LabelValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LabelValueType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "STRING" => Ok(Self::String),
            "BOOL" => Ok(Self::Bool),
            "INT64" => Ok(Self::Int64),
            other => Err(format!(
                "unknown label value type '{}'; expected one of STRING, BOOL, INT64",
                other
            )),
        }
    }
}

/// Schema of a single label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelDescriptor {
    /// Label key (e.g., "store_id")
    pub key: String,

    /// Type of the label's values
    pub value_type: LabelValueType,

    /// Human-readable description
    pub description: String,
}

impl LabelDescriptor {
    pub fn new(
        key: impl Into<String>,
        value_type: LabelValueType,
        description: impl Into<String>,
    ) -> Self {
        Self { key: key.into(), value_type, description: description.into() }
    }
}

/// Schema definition for a named metric.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricDescriptor {
    /// Resource name assigned by the backend; `None` on descriptors built locally
    #[serde(default)]
    pub name: Option<String>,

    /// Namespaced metric type (e.g., "custom.googleapis.com/stores/daily_sales")
    pub metric_type: String,

    /// Short display name
    pub display_name: String,

    /// Human-readable description
    pub description: String,

    /// Metric kind
    pub metric_kind: MetricKind,

    /// Value type
    pub value_type: ValueType,

    /// Unit in UCUM notation (e.g., "{USD}", "s", "By")
    pub unit: String,

    /// Label schema, in declaration order
    pub labels: Vec<LabelDescriptor>,
}

/// Whether `metric_type` falls under one of the user-defined prefixes.
pub fn is_user_defined_type<S: AsRef<str>>(metric_type: &str, prefixes: &[S]) -> bool {
    prefixes.iter().any(|p| metric_type.starts_with(p.as_ref()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_kind_parse() {
        assert_eq!("gauge".parse::<MetricKind>().unwrap(), MetricKind::Gauge);
        assert_eq!("CUMULATIVE".parse::<MetricKind>().unwrap(), MetricKind::Cumulative);
        assert!("METRIC_KIND_UNSPECIFIED".parse::<MetricKind>().is_err());
        assert!("histogram".parse::<MetricKind>().is_err());
    }

    #[test]
    fn test_value_type_display_round_trip() {
        for vt in [
            ValueType::Bool,
            ValueType::Int64,
            ValueType::Double,
            ValueType::String,
            ValueType::Distribution,
        ] {
            assert_eq!(vt.to_string().parse::<ValueType>().unwrap(), vt);
        }
    }

    #[test]
    fn test_user_defined_prefixes() {
        let prefixes = ["custom.googleapis.com/", "external.googleapis.com/"];
        assert!(is_user_defined_type("custom.googleapis.com/stores/daily_sales", &prefixes));
        assert!(is_user_defined_type("external.googleapis.com/prometheus/up", &prefixes));
        assert!(!is_user_defined_type("compute.googleapis.com/instance/cpu/utilization", &prefixes));
    }
}
