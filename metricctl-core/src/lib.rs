//! metricctl core library
//!
//! Request building and validation, domain types, and the backend seam for
//! the metricctl client.

pub mod backend;
pub mod clock;
pub mod config;
pub mod error;
pub mod names;
pub mod observability;
pub mod paths;
pub mod proto_convert;
pub mod query;
pub mod service;
pub mod types;

// Re-export commonly used items
pub use backend::MetricBackend;
pub use clock::{Clock, MockClock, SystemClock};
pub use config::Config;
pub use error::{MonitoringError, Result};
pub use names::{MetricDescriptorName, MonitoredResourceDescriptorName, ProjectName};
pub use observability::{
    init as init_observability, shutdown as shutdown_observability, ServiceInfo,
};
pub use query::QueryBuilder;
pub use service::{MetricsService, ReadOptions};
pub use types::{
    Aggregation, Aligner, LabelDescriptor, LabelValueType, MetricDescriptor, MetricKind,
    MonitoredResource, MonitoredResourceDescriptor, Point, QueryInterval, Reducer, TimeInterval,
    TimeSeries, TimeSeriesView, Timestamp, TypedValue, ValueType,
};
