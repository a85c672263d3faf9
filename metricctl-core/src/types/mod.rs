//! Core domain types for metricctl.

pub mod aggregation;
pub mod descriptor;
pub mod resource;
pub mod series;

// Re-exports
pub use aggregation::{Aggregation, Aligner, Reducer, TimeSeriesView};
pub use descriptor::{
    is_user_defined_type, LabelDescriptor, LabelValueType, MetricDescriptor, MetricKind, ValueType,
};
pub use resource::MonitoredResourceDescriptor;
pub use series::{
    Distribution, Metric, MonitoredResource, Point, QueryInterval, TimeInterval, TimeSeries,
    Timestamp, TypedValue,
};
