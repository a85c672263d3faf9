//! Aggregation request model.
//!
//! The backend buckets the query interval into windows of `alignment_period`,
//! applies `per_series_aligner` inside each window, then collapses the aligned
//! series of each `group_by_fields` group with `cross_series_reducer`. Nothing
//! here computes values; the parameters are forwarded as-is.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Per-series alignment function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Aligner {
    #[default]
    None,
    Delta,
    Rate,
    Interpolate,
    NextOlder,
    Min,
    Max,
    Mean,
    Count,
    Sum,
    Stddev,
    CountTrue,
    CountFalse,
    FractionTrue,
    Percentile99,
    Percentile95,
    Percentile50,
    Percentile05,
    PercentChange,
}

impl Aligner {
    pub const ALL: [Aligner; 19] = [
        Self::None,
        Self::Delta,
        Self::Rate,
        Self::Interpolate,
        Self::NextOlder,
        Self::Min,
        Self::Max,
        Self::Mean,
        Self::Count,
        Self::Sum,
        Self::Stddev,
        Self::CountTrue,
        Self::CountFalse,
        Self::FractionTrue,
        Self::Percentile99,
        Self::Percentile95,
        Self::Percentile50,
        Self::Percentile05,
        Self::PercentChange,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "ALIGN_NONE",
            Self::Delta => "ALIGN_DELTA",
            Self::Rate => "ALIGN_RATE",
            Self::Interpolate => "ALIGN_INTERPOLATE",
            Self::NextOlder => "ALIGN_NEXT_OLDER",
            Self::Min => "ALIGN_MIN",
            Self::Max => "ALIGN_MAX",
            Self::Mean => "ALIGN_MEAN",
            Self::Count => "ALIGN_COUNT",
            Self::Sum => "ALIGN_SUM",
            Self::Stddev => "ALIGN_STDDEV",
            Self::CountTrue => "ALIGN_COUNT_TRUE",
            Self::CountFalse => "ALIGN_COUNT_FALSE",
            Self::FractionTrue => "ALIGN_FRACTION_TRUE",
            Self::Percentile99 => "ALIGN_PERCENTILE_99",
            Self::Percentile95 => "ALIGN_PERCENTILE_95",
            Self::Percentile50 => "ALIGN_PERCENTILE_50",
            Self::Percentile05 => "ALIGN_PERCENTILE_05",
            Self::PercentChange => "ALIGN_PERCENT_CHANGE",
        }
    }

    pub fn is_none(&self) -> bool {
        *self == Self::None
    }
}

impl fmt::Display for Aligner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Aligner {
    type Err = String;

    /// Accepts `ALIGN_MEAN`, `mean` or `MEAN`.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let upper = value.trim().to_ascii_uppercase();
        let wanted = if upper.starts_with("ALIGN_") { upper } else { format!("ALIGN_{}", upper) };
        Self::ALL
            .iter()
            .copied()
            .find(|a| a.as_str() == wanted)
            .ok_or_else(|| format!("unknown aligner '{}'", value))
    }
}

/// Cross-series reduction function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Reducer {
    #[default]
    None,
    Mean,
    Min,
    Max,
    Sum,
    Stddev,
    Count,
    CountTrue,
    CountFalse,
    FractionTrue,
    Percentile99,
    Percentile95,
    Percentile50,
    Percentile05,
}

impl Reducer {
    pub const ALL: [Reducer; 14] = [
        Self::None,
        Self::Mean,
        Self::Min,
        Self::Max,
        Self::Sum,
        Self::Stddev,
        Self::Count,
        Self::CountTrue,
        Self::CountFalse,
        Self::FractionTrue,
        Self::Percentile99,
        Self::Percentile95,
        Self::Percentile50,
        Self::Percentile05,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "REDUCE_NONE",
            Self::Mean => "REDUCE_MEAN",
            Self::Min => "REDUCE_MIN",
            Self::Max => "REDUCE_MAX",
            Self::Sum => "REDUCE_SUM",
            Self::Stddev => "REDUCE_STDDEV",
            Self::Count => "REDUCE_COUNT",
            Self::CountTrue => "REDUCE_COUNT_TRUE",
            Self::CountFalse => "REDUCE_COUNT_FALSE",
            Self::FractionTrue => "REDUCE_FRACTION_TRUE",
            Self::Percentile99 => "REDUCE_PERCENTILE_99",
            Self::Percentile95 => "REDUCE_PERCENTILE_95",
            Self::Percentile50 => "REDUCE_PERCENTILE_50",
            Self::Percentile05 => "REDUCE_PERCENTILE_05",
        }
    }

    pub fn is_none(&self) -> bool {
        *self == Self::None
    }
}

impl fmt::Display for Reducer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Reducer {
    type Err = String;

    /// Accepts `REDUCE_MEAN`, `mean` or `MEAN`.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let upper = value.trim().to_ascii_uppercase();
        let wanted = if upper.starts_with("REDUCE_") { upper } else { format!("REDUCE_{}", upper) };
        Self::ALL
            .iter()
            .copied()
            .find(|r| r.as_str() == wanted)
            .ok_or_else(|| format!("unknown reducer '{}'", value))
    }
}

/// Alignment and reduction parameters for a read.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Aggregation {
    /// Bucket width; required when an aligner or reducer is set
    pub alignment_period: Option<Duration>,

    /// Applied within each bucket, per series
    pub per_series_aligner: Aligner,

    /// Applied across aligned series
    pub cross_series_reducer: Reducer,

    /// Series labels to group by before reducing
    #[serde(default)]
    pub group_by_fields: Vec<String>,
}

impl Aggregation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alignment_period(mut self, period: Duration) -> Self {
        self.alignment_period = Some(period);
        self
    }

    pub fn per_series_aligner(mut self, aligner: Aligner) -> Self {
        self.per_series_aligner = aligner;
        self
    }

    pub fn cross_series_reducer(mut self, reducer: Reducer) -> Self {
        self.cross_series_reducer = reducer;
        self
    }

    pub fn group_by(mut self, fields: &[&str]) -> Self {
        self.group_by_fields = fields.iter().map(|f| f.to_string()).collect();
        self
    }
}

/// How much of each series a read returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TimeSeriesView {
    /// Metadata and points
    #[default]
    Full,
    /// Metadata only
    Headers,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aligner_parse_forms() {
        assert_eq!("ALIGN_MEAN".parse::<Aligner>().unwrap(), Aligner::Mean);
        assert_eq!("mean".parse::<Aligner>().unwrap(), Aligner::Mean);
        assert_eq!("percentile_99".parse::<Aligner>().unwrap(), Aligner::Percentile99);
        assert!("median".parse::<Aligner>().is_err());
    }

    #[test]
    fn test_reducer_parse_forms() {
        assert_eq!("REDUCE_SUM".parse::<Reducer>().unwrap(), Reducer::Sum);
        assert_eq!("count_false".parse::<Reducer>().unwrap(), Reducer::CountFalse);
        assert!("ALIGN_MEAN".parse::<Reducer>().is_err());
    }

    #[test]
    fn test_aggregation_builder() {
        let agg = Aggregation::new()
            .alignment_period(Duration::from_secs(600))
            .per_series_aligner(Aligner::Mean)
            .cross_series_reducer(Reducer::Mean)
            .group_by(&["resource.zone"]);

        assert_eq!(agg.alignment_period, Some(Duration::from_secs(600)));
        assert_eq!(agg.per_series_aligner, Aligner::Mean);
        assert_eq!(agg.cross_series_reducer, Reducer::Mean);
        assert_eq!(agg.group_by_fields, vec!["resource.zone".to_string()]);
    }
}
