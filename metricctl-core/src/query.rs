//! Request construction and validation.
//!
//! [`QueryBuilder`] turns user-level parameters into typed requests and
//! rejects malformed ones before anything is sent. It holds configuration
//! only; every `build_*` call is an independent pure transformation, apart
//! from reading the clock when a read has no explicit interval.

use crate::clock::Clock;
use crate::config::{Config, DEFAULT_USER_METRIC_PREFIXES, DEFAULT_WINDOW_SECS};
use crate::error::{MonitoringError, Result};
use crate::names::{MetricDescriptorName, MonitoredResourceDescriptorName, ProjectName};
use crate::proto_convert::v1;
use crate::types::{
    is_user_defined_type, Aggregation, MetricDescriptor, MetricKind, MonitoredResource, Point,
    Metric, QueryInterval, TimeSeries, TimeSeriesView, Timestamp, ValueType,
};
use std::collections::{BTreeMap, HashSet};
use std::iter::FusedIterator;
use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// Requests
// ============================================================================

/// Create a metric descriptor under a project.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateMetricDescriptorRequest {
    pub name: ProjectName,
    pub metric_descriptor: MetricDescriptor,
}

/// List metric descriptors, optionally filtered.
#[derive(Debug, Clone, PartialEq)]
pub struct ListMetricDescriptorsRequest {
    pub name: ProjectName,
    pub filter: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GetMetricDescriptorRequest {
    pub name: MetricDescriptorName,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeleteMetricDescriptorRequest {
    pub name: MetricDescriptorName,
}

/// Write points.
///
/// Built requests always hold exactly one series with exactly one point.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateTimeSeriesRequest {
    pub name: ProjectName,
    pub time_series: Vec<TimeSeries>,
}

/// Read time series matching a filter over an interval.
#[derive(Debug, Clone, PartialEq)]
pub struct ListTimeSeriesRequest {
    pub name: ProjectName,
    pub filter: String,
    pub interval: QueryInterval,
    pub aggregation: Option<Aggregation>,
    pub order_by: Option<String>,
    pub view: TimeSeriesView,
}

impl ListTimeSeriesRequest {
    /// Select how much of each series is returned.
    pub fn with_view(mut self, view: TimeSeriesView) -> Self {
        self.view = view;
        self
    }

    pub fn with_order_by(mut self, order_by: impl Into<String>) -> Self {
        self.order_by = Some(order_by.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListMonitoredResourceDescriptorsRequest {
    pub name: ProjectName,
    pub filter: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GetMonitoredResourceDescriptorRequest {
    pub name: MonitoredResourceDescriptorName,
}

// ============================================================================
// Builder
// ============================================================================

/// Builds validated requests.
pub struct QueryBuilder {
    clock: Arc<dyn Clock>,
    default_window: Duration,
    user_metric_prefixes: Vec<String>,
}

impl QueryBuilder {
    /// Builder with a 20 minute default window and the standard user-defined
    /// metric prefixes.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            default_window: Duration::from_secs(DEFAULT_WINDOW_SECS),
            user_metric_prefixes: DEFAULT_USER_METRIC_PREFIXES
                .iter()
                .map(|p| (*p).to_string())
                .collect(),
        }
    }

    pub fn from_config(config: &Config, clock: Arc<dyn Clock>) -> Self {
        Self::new(clock)
            .with_default_window(config.default_window())
            .with_user_metric_prefixes(config.user_metric_prefixes.clone())
    }

    pub fn with_default_window(mut self, window: Duration) -> Self {
        self.default_window = window;
        self
    }

    pub fn with_user_metric_prefixes(mut self, prefixes: Vec<String>) -> Self {
        self.user_metric_prefixes = prefixes;
        self
    }

    /// Current time from the injected clock.
    pub fn now(&self) -> Timestamp {
        Timestamp::from_system_time(self.clock.now())
    }

    /// Validate a descriptor and wrap it, unchanged, in a create request.
    pub fn build_descriptor_create_request(
        &self,
        scope: &ProjectName,
        descriptor: MetricDescriptor,
    ) -> Result<CreateMetricDescriptorRequest> {
        require_non_empty("metric type", &descriptor.metric_type)?;
        require_non_empty("display name", &descriptor.display_name)?;
        require_non_empty("description", &descriptor.description)?;

        if descriptor.metric_kind == MetricKind::Unspecified {
            return Err(MonitoringError::invalid_argument("metric kind must be specified"));
        }
        if descriptor.value_type == ValueType::Unspecified {
            return Err(MonitoringError::invalid_argument("value type must be specified"));
        }

        let mut seen = HashSet::with_capacity(descriptor.labels.len());
        for label in &descriptor.labels {
            require_non_empty("label key", &label.key)?;
            if !seen.insert(label.key.as_str()) {
                return Err(MonitoringError::invalid_argument(format!(
                    "duplicate label key '{}'",
                    label.key
                )));
            }
        }

        Ok(CreateMetricDescriptorRequest { name: scope.clone(), metric_descriptor: descriptor })
    }

    /// Wrap one point in a one-series write request.
    ///
    /// Whether the value type matches the descriptor is left to the backend.
    pub fn build_write_request(
        &self,
        scope: &ProjectName,
        metric_type: &str,
        labels: BTreeMap<String, String>,
        resource: MonitoredResource,
        point: Point,
    ) -> Result<CreateTimeSeriesRequest> {
        require_non_empty("metric type", metric_type)?;
        require_non_empty("resource type", &resource.resource_type)?;
        if labels.keys().any(|k| k.trim().is_empty()) {
            return Err(MonitoringError::invalid_argument("metric label keys must not be empty"));
        }

        let end = point
            .interval
            .end_time
            .ok_or_else(|| MonitoringError::invalid_argument("point end time is required"))?;
        if !end.is_well_formed() {
            return Err(MonitoringError::invalid_argument(format!(
                "point end time is malformed ({}s, {}ns)",
                end.seconds, end.nanos
            )));
        }
        if let Some(start) = point.interval.start_time {
            if !start.is_well_formed() {
                return Err(MonitoringError::invalid_argument(format!(
                    "point start time is malformed ({}s, {}ns)",
                    start.seconds, start.nanos
                )));
            }
            if start > end {
                return Err(MonitoringError::invalid_argument(
                    "point start time must not be after its end time",
                ));
            }
        }

        let series = TimeSeries {
            metric: Metric { metric_type: metric_type.to_string(), labels },
            resource,
            metric_kind: MetricKind::Unspecified,
            value_type: ValueType::Unspecified,
            points: vec![point],
            unit: String::new(),
        };

        Ok(CreateTimeSeriesRequest { name: scope.clone(), time_series: vec![series] })
    }

    /// Validate a read and fill in the default window when no interval is given.
    ///
    /// The aggregation is forwarded unchanged; nothing is computed locally.
    pub fn build_read_request(
        &self,
        scope: &ProjectName,
        filter: &str,
        interval: Option<QueryInterval>,
        aggregation: Option<Aggregation>,
    ) -> Result<ListTimeSeriesRequest> {
        require_non_empty("filter", filter)?;

        let interval = match interval {
            Some(interval) => {
                if !interval.start.is_well_formed() || !interval.end.is_well_formed() {
                    return Err(MonitoringError::invalid_argument(
                        "interval timestamps must be well-formed",
                    ));
                }
                if interval.start > interval.end {
                    return Err(MonitoringError::invalid_argument(format!(
                        "interval start {} is after end {}",
                        interval.start, interval.end
                    )));
                }
                interval
            }
            None => QueryInterval::trailing(self.clock.now(), self.default_window),
        };

        if let Some(aggregation) = &aggregation {
            validate_aggregation(aggregation)?;
        }

        Ok(ListTimeSeriesRequest {
            name: scope.clone(),
            filter: filter.to_string(),
            interval,
            aggregation,
            order_by: None,
            view: TimeSeriesView::Full,
        })
    }

    /// Lazily convert raw series into domain series, one pass, order kept.
    pub fn normalize_time_series_result<I>(&self, raw: I) -> TimeSeriesStream<I::IntoIter>
    where
        I: IntoIterator<Item = v1::TimeSeries>,
    {
        TimeSeriesStream { inner: raw.into_iter() }
    }

    pub fn build_list_descriptors_request(
        &self,
        scope: &ProjectName,
        filter: Option<&str>,
    ) -> Result<ListMetricDescriptorsRequest> {
        Ok(ListMetricDescriptorsRequest {
            name: scope.clone(),
            filter: non_blank(filter),
        })
    }

    pub fn build_get_descriptor_request(
        &self,
        scope: &ProjectName,
        metric_type: &str,
    ) -> Result<GetMetricDescriptorRequest> {
        require_non_empty("metric type", metric_type)?;
        Ok(GetMetricDescriptorRequest { name: scope.metric_descriptor(metric_type)? })
    }

    /// Only user-defined descriptors may be deleted.
    pub fn build_delete_descriptor_request(
        &self,
        scope: &ProjectName,
        metric_type: &str,
    ) -> Result<DeleteMetricDescriptorRequest> {
        require_non_empty("metric type", metric_type)?;
        if !is_user_defined_type(metric_type, &self.user_metric_prefixes) {
            return Err(MonitoringError::invalid_argument(format!(
                "'{}' is not a user-defined metric type (expected prefix {})",
                metric_type,
                self.user_metric_prefixes.join(" or ")
            )));
        }
        Ok(DeleteMetricDescriptorRequest { name: scope.metric_descriptor(metric_type)? })
    }

    pub fn build_list_resources_request(
        &self,
        scope: &ProjectName,
        filter: Option<&str>,
    ) -> Result<ListMonitoredResourceDescriptorsRequest> {
        Ok(ListMonitoredResourceDescriptorsRequest {
            name: scope.clone(),
            filter: non_blank(filter),
        })
    }

    pub fn build_get_resource_request(
        &self,
        scope: &ProjectName,
        resource_type: &str,
    ) -> Result<GetMonitoredResourceDescriptorRequest> {
        require_non_empty("resource type", resource_type)?;
        Ok(GetMonitoredResourceDescriptorRequest {
            name: scope.monitored_resource_descriptor(resource_type)?,
        })
    }
}

fn validate_aggregation(aggregation: &Aggregation) -> Result<()> {
    match aggregation.alignment_period {
        Some(period) if period.is_zero() => {
            Err(MonitoringError::invalid_argument("alignment period must be greater than zero"))
        }
        Some(_) => Ok(()),
        None if !aggregation.cross_series_reducer.is_none() => Err(
            MonitoringError::invalid_argument("cross-series reduction requires an alignment period"),
        ),
        None if !aggregation.per_series_aligner.is_none() => Err(MonitoringError::invalid_argument(
            format!("{} requires an alignment period", aggregation.per_series_aligner),
        )),
        None => Ok(()),
    }
}

fn require_non_empty(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(MonitoringError::invalid_argument(format!("{} must not be empty", field)));
    }
    Ok(())
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}

// ============================================================================
// Result stream
// ============================================================================

/// Single-pass iterator over converted series.
///
/// A series that fails to convert yields an `InvalidResponse` error in its
/// place; iteration continues with the next one.
#[derive(Debug)]
pub struct TimeSeriesStream<I> {
    inner: I,
}

impl<I> Iterator for TimeSeriesStream<I>
where
    I: Iterator<Item = v1::TimeSeries>,
{
    type Item = Result<TimeSeries>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(TimeSeries::try_from)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<I> FusedIterator for TimeSeriesStream<I> where I: FusedIterator<Item = v1::TimeSeries> {}
