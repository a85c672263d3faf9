//! Type conversions between domain types and protobuf types.
//!
//! Outbound conversions are infallible. Inbound conversions validate enum
//! values and required sub-messages and fail with `InvalidResponse`.

use crate::error::{MonitoringError, Result};
use crate::query::{
    CreateMetricDescriptorRequest, CreateTimeSeriesRequest, DeleteMetricDescriptorRequest,
    GetMetricDescriptorRequest, GetMonitoredResourceDescriptorRequest,
    ListMetricDescriptorsRequest, ListMonitoredResourceDescriptorsRequest, ListTimeSeriesRequest,
};
use crate::types::{
    Aggregation, Aligner, Distribution, LabelDescriptor, LabelValueType, Metric, MetricDescriptor,
    MetricKind, MonitoredResource, MonitoredResourceDescriptor, Point, QueryInterval, Reducer,
    TimeInterval, TimeSeries, TimeSeriesView, Timestamp, TypedValue, ValueType,
};
use std::time::Duration;

// Re-export proto types for convenience
pub use metricctl_api::v1;

use v1::aggregation::{Aligner as ProtoAligner, Reducer as ProtoReducer};
use v1::list_time_series_request::TimeSeriesView as ProtoTimeSeriesView;
use v1::typed_value::Value as ProtoValue;

// Type aliases for proto types
type ProtoMetricKind = v1::MetricKind;
type ProtoValueType = v1::ValueType;
type ProtoLabelValueType = v1::LabelValueType;
type ProtoLabelDescriptor = v1::LabelDescriptor;
type ProtoMetricDescriptor = v1::MetricDescriptor;
type ProtoResourceDescriptor = v1::MonitoredResourceDescriptor;
type ProtoTimeInterval = v1::TimeInterval;
type ProtoDistribution = v1::Distribution;
type ProtoTypedValue = v1::TypedValue;
type ProtoPoint = v1::Point;
type ProtoMetric = v1::Metric;
type ProtoMonitoredResource = v1::MonitoredResource;
type ProtoTimeSeries = v1::TimeSeries;
type ProtoAggregation = v1::Aggregation;

// ============================================================================
// Enum Conversions
// ============================================================================

impl From<MetricKind> for ProtoMetricKind {
    fn from(kind: MetricKind) -> Self {
        match kind {
            MetricKind::Unspecified => Self::Unspecified,
            MetricKind::Gauge => Self::Gauge,
            MetricKind::Delta => Self::Delta,
            MetricKind::Cumulative => Self::Cumulative,
        }
    }
}

impl From<ProtoMetricKind> for MetricKind {
    fn from(kind: ProtoMetricKind) -> Self {
        match kind {
            ProtoMetricKind::Unspecified => Self::Unspecified,
            ProtoMetricKind::Gauge => Self::Gauge,
            ProtoMetricKind::Delta => Self::Delta,
            ProtoMetricKind::Cumulative => Self::Cumulative,
        }
    }
}

impl From<ValueType> for ProtoValueType {
    fn from(value_type: ValueType) -> Self {
        match value_type {
            ValueType::Unspecified => Self::Unspecified,
            ValueType::Bool => Self::Bool,
            ValueType::Int64 => Self::Int64,
            ValueType::Double => Self::Double,
            ValueType::String => Self::String,
            ValueType::Distribution => Self::Distribution,
        }
    }
}

impl From<ProtoValueType> for ValueType {
    fn from(value_type: ProtoValueType) -> Self {
        match value_type {
            ProtoValueType::Unspecified => Self::Unspecified,
            ProtoValueType::Bool => Self::Bool,
            ProtoValueType::Int64 => Self::Int64,
            ProtoValueType::Double => Self::Double,
            ProtoValueType::String => Self::String,
            ProtoValueType::Distribution => Self::Distribution,
        }
    }
}

impl From<LabelValueType> for ProtoLabelValueType {
    fn from(value_type: LabelValueType) -> Self {
        match value_type {
            LabelValueType::String => Self::String,
            LabelValueType::Bool => Self::Bool,
            LabelValueType::Int64 => Self::Int64,
        }
    }
}

impl From<ProtoLabelValueType> for LabelValueType {
    fn from(value_type: ProtoLabelValueType) -> Self {
        match value_type {
            ProtoLabelValueType::String => Self::String,
            ProtoLabelValueType::Bool => Self::Bool,
            ProtoLabelValueType::Int64 => Self::Int64,
        }
    }
}

impl From<Aligner> for ProtoAligner {
    fn from(aligner: Aligner) -> Self {
        match aligner {
            Aligner::None => Self::AlignNone,
            Aligner::Delta => Self::AlignDelta,
            Aligner::Rate => Self::AlignRate,
            Aligner::Interpolate => Self::AlignInterpolate,
            Aligner::NextOlder => Self::AlignNextOlder,
            Aligner::Min => Self::AlignMin,
            Aligner::Max => Self::AlignMax,
            Aligner::Mean => Self::AlignMean,
            Aligner::Count => Self::AlignCount,
            Aligner::Sum => Self::AlignSum,
            Aligner::Stddev => Self::AlignStddev,
            Aligner::CountTrue => Self::AlignCountTrue,
            Aligner::CountFalse => Self::AlignCountFalse,
            Aligner::FractionTrue => Self::AlignFractionTrue,
            Aligner::Percentile99 => Self::AlignPercentile99,
            Aligner::Percentile95 => Self::AlignPercentile95,
            Aligner::Percentile50 => Self::AlignPercentile50,
            Aligner::Percentile05 => Self::AlignPercentile05,
            Aligner::PercentChange => Self::AlignPercentChange,
        }
    }
}

impl From<Reducer> for ProtoReducer {
    fn from(reducer: Reducer) -> Self {
        match reducer {
            Reducer::None => Self::ReduceNone,
            Reducer::Mean => Self::ReduceMean,
            Reducer::Min => Self::ReduceMin,
            Reducer::Max => Self::ReduceMax,
            Reducer::Sum => Self::ReduceSum,
            Reducer::Stddev => Self::ReduceStddev,
            Reducer::Count => Self::ReduceCount,
            Reducer::CountTrue => Self::ReduceCountTrue,
            Reducer::CountFalse => Self::ReduceCountFalse,
            Reducer::FractionTrue => Self::ReduceFractionTrue,
            Reducer::Percentile99 => Self::ReducePercentile99,
            Reducer::Percentile95 => Self::ReducePercentile95,
            Reducer::Percentile50 => Self::ReducePercentile50,
            Reducer::Percentile05 => Self::ReducePercentile05,
        }
    }
}

impl From<TimeSeriesView> for ProtoTimeSeriesView {
    fn from(view: TimeSeriesView) -> Self {
        match view {
            TimeSeriesView::Full => Self::Full,
            TimeSeriesView::Headers => Self::Headers,
        }
    }
}

fn metric_kind_from_wire(raw: i32) -> Result<MetricKind> {
    ProtoMetricKind::try_from(raw)
        .map(MetricKind::from)
        .map_err(|_| MonitoringError::invalid_response(format!("unknown metric kind {}", raw)))
}

fn value_type_from_wire(raw: i32) -> Result<ValueType> {
    ProtoValueType::try_from(raw)
        .map(ValueType::from)
        .map_err(|_| MonitoringError::invalid_response(format!("unknown value type {}", raw)))
}

fn label_value_type_from_wire(raw: i32) -> Result<LabelValueType> {
    ProtoLabelValueType::try_from(raw).map(LabelValueType::from).map_err(|_| {
        MonitoringError::invalid_response(format!("unknown label value type {}", raw))
    })
}

// ============================================================================
// Time Conversions
// ============================================================================

impl From<Timestamp> for prost_types::Timestamp {
    fn from(ts: Timestamp) -> Self {
        Self { seconds: ts.seconds, nanos: ts.nanos }
    }
}

impl From<prost_types::Timestamp> for Timestamp {
    fn from(ts: prost_types::Timestamp) -> Self {
        Self { seconds: ts.seconds, nanos: ts.nanos }
    }
}

/// Convert a `std::time::Duration` to its wire form.
pub fn duration_to_proto(duration: Duration) -> prost_types::Duration {
    prost_types::Duration {
        seconds: duration.as_secs().min(i64::MAX as u64) as i64,
        nanos: duration.subsec_nanos() as i32,
    }
}

impl From<TimeInterval> for ProtoTimeInterval {
    fn from(interval: TimeInterval) -> Self {
        Self {
            start_time: interval.start_time.map(Into::into),
            end_time: interval.end_time.map(Into::into),
        }
    }
}

impl From<ProtoTimeInterval> for TimeInterval {
    fn from(proto: ProtoTimeInterval) -> Self {
        Self {
            start_time: proto.start_time.map(Into::into),
            end_time: proto.end_time.map(Into::into),
        }
    }
}

impl From<QueryInterval> for ProtoTimeInterval {
    fn from(interval: QueryInterval) -> Self {
        Self { start_time: Some(interval.start.into()), end_time: Some(interval.end.into()) }
    }
}

// ============================================================================
// Descriptor Conversions
// ============================================================================

impl From<LabelDescriptor> for ProtoLabelDescriptor {
    fn from(label: LabelDescriptor) -> Self {
        Self {
            key: label.key,
            value_type: ProtoLabelValueType::from(label.value_type) as i32,
            description: label.description,
        }
    }
}

impl TryFrom<ProtoLabelDescriptor> for LabelDescriptor {
    type Error = MonitoringError;

    fn try_from(proto: ProtoLabelDescriptor) -> Result<Self> {
        Ok(Self {
            key: proto.key,
            value_type: label_value_type_from_wire(proto.value_type)?,
            description: proto.description,
        })
    }
}

impl From<MetricDescriptor> for ProtoMetricDescriptor {
    fn from(descriptor: MetricDescriptor) -> Self {
        Self {
            name: descriptor.name.unwrap_or_default(),
            r#type: descriptor.metric_type,
            labels: descriptor.labels.into_iter().map(Into::into).collect(),
            metric_kind: ProtoMetricKind::from(descriptor.metric_kind) as i32,
            value_type: ProtoValueType::from(descriptor.value_type) as i32,
            unit: descriptor.unit,
            description: descriptor.description,
            display_name: descriptor.display_name,
        }
    }
}

impl TryFrom<ProtoMetricDescriptor> for MetricDescriptor {
    type Error = MonitoringError;

    fn try_from(proto: ProtoMetricDescriptor) -> Result<Self> {
        let labels = proto
            .labels
            .into_iter()
            .map(LabelDescriptor::try_from)
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            name: Some(proto.name).filter(|n| !n.is_empty()),
            metric_type: proto.r#type,
            display_name: proto.display_name,
            description: proto.description,
            metric_kind: metric_kind_from_wire(proto.metric_kind)?,
            value_type: value_type_from_wire(proto.value_type)?,
            unit: proto.unit,
            labels,
        })
    }
}

impl From<MonitoredResourceDescriptor> for ProtoResourceDescriptor {
    fn from(descriptor: MonitoredResourceDescriptor) -> Self {
        Self {
            name: descriptor.name,
            r#type: descriptor.resource_type,
            display_name: descriptor.display_name,
            description: descriptor.description,
            labels: descriptor.labels.into_iter().map(Into::into).collect(),
        }
    }
}

impl TryFrom<ProtoResourceDescriptor> for MonitoredResourceDescriptor {
    type Error = MonitoringError;

    fn try_from(proto: ProtoResourceDescriptor) -> Result<Self> {
        let labels = proto
            .labels
            .into_iter()
            .map(LabelDescriptor::try_from)
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            name: proto.name,
            resource_type: proto.r#type,
            display_name: proto.display_name,
            description: proto.description,
            labels,
        })
    }
}

// ============================================================================
// Time Series Conversions
// ============================================================================

impl From<Distribution> for ProtoDistribution {
    fn from(d: Distribution) -> Self {
        Self {
            count: d.count,
            mean: d.mean,
            sum_of_squared_deviation: d.sum_of_squared_deviation,
            bucket_counts: d.bucket_counts,
        }
    }
}

impl From<ProtoDistribution> for Distribution {
    fn from(d: ProtoDistribution) -> Self {
        Self {
            count: d.count,
            mean: d.mean,
            sum_of_squared_deviation: d.sum_of_squared_deviation,
            bucket_counts: d.bucket_counts,
        }
    }
}

impl From<TypedValue> for ProtoTypedValue {
    fn from(value: TypedValue) -> Self {
        let value = match value {
            TypedValue::Bool(v) => ProtoValue::BoolValue(v),
            TypedValue::Int64(v) => ProtoValue::Int64Value(v),
            TypedValue::Double(v) => ProtoValue::DoubleValue(v),
            TypedValue::String(v) => ProtoValue::StringValue(v),
            TypedValue::Distribution(d) => ProtoValue::DistributionValue(d.into()),
        };
        Self { value: Some(value) }
    }
}

impl TryFrom<ProtoTypedValue> for TypedValue {
    type Error = MonitoringError;

    fn try_from(proto: ProtoTypedValue) -> Result<Self> {
        match proto.value {
            Some(ProtoValue::BoolValue(v)) => Ok(Self::Bool(v)),
            Some(ProtoValue::Int64Value(v)) => Ok(Self::Int64(v)),
            Some(ProtoValue::DoubleValue(v)) => Ok(Self::Double(v)),
            Some(ProtoValue::StringValue(v)) => Ok(Self::String(v)),
            Some(ProtoValue::DistributionValue(d)) => Ok(Self::Distribution(d.into())),
            None => Err(MonitoringError::invalid_response("point has no value")),
        }
    }
}

impl From<Point> for ProtoPoint {
    fn from(point: Point) -> Self {
        Self { interval: Some(point.interval.into()), value: Some(point.value.into()) }
    }
}

impl TryFrom<ProtoPoint> for Point {
    type Error = MonitoringError;

    fn try_from(proto: ProtoPoint) -> Result<Self> {
        let value = proto
            .value
            .ok_or_else(|| MonitoringError::invalid_response("point has no value"))?
            .try_into()?;

        Ok(Self { interval: proto.interval.map(Into::into).unwrap_or_default(), value })
    }
}

impl From<Metric> for ProtoMetric {
    fn from(metric: Metric) -> Self {
        Self { r#type: metric.metric_type, labels: metric.labels }
    }
}

impl From<ProtoMetric> for Metric {
    fn from(proto: ProtoMetric) -> Self {
        Self { metric_type: proto.r#type, labels: proto.labels }
    }
}

impl From<MonitoredResource> for ProtoMonitoredResource {
    fn from(resource: MonitoredResource) -> Self {
        Self { r#type: resource.resource_type, labels: resource.labels }
    }
}

impl From<ProtoMonitoredResource> for MonitoredResource {
    fn from(proto: ProtoMonitoredResource) -> Self {
        Self { resource_type: proto.r#type, labels: proto.labels }
    }
}

impl From<TimeSeries> for ProtoTimeSeries {
    fn from(series: TimeSeries) -> Self {
        Self {
            metric: Some(series.metric.into()),
            resource: Some(series.resource.into()),
            metric_kind: ProtoMetricKind::from(series.metric_kind) as i32,
            value_type: ProtoValueType::from(series.value_type) as i32,
            points: series.points.into_iter().map(Into::into).collect(),
            unit: series.unit,
        }
    }
}

impl TryFrom<ProtoTimeSeries> for TimeSeries {
    type Error = MonitoringError;

    fn try_from(proto: ProtoTimeSeries) -> Result<Self> {
        let metric = proto
            .metric
            .ok_or_else(|| MonitoringError::invalid_response("time series has no metric"))?;

        // Point order is the backend's (most recent first) and is kept as-is.
        let points =
            proto.points.into_iter().map(Point::try_from).collect::<Result<Vec<_>>>()?;

        Ok(Self {
            metric: metric.into(),
            resource: proto.resource.map(Into::into).unwrap_or_default(),
            metric_kind: metric_kind_from_wire(proto.metric_kind)?,
            value_type: value_type_from_wire(proto.value_type)?,
            points,
            unit: proto.unit,
        })
    }
}

impl From<Aggregation> for ProtoAggregation {
    fn from(aggregation: Aggregation) -> Self {
        Self {
            alignment_period: aggregation.alignment_period.map(duration_to_proto),
            per_series_aligner: ProtoAligner::from(aggregation.per_series_aligner) as i32,
            cross_series_reducer: ProtoReducer::from(aggregation.cross_series_reducer) as i32,
            group_by_fields: aggregation.group_by_fields,
        }
    }
}

// ============================================================================
// Request Conversions
// ============================================================================

impl From<CreateMetricDescriptorRequest> for v1::CreateMetricDescriptorRequest {
    fn from(request: CreateMetricDescriptorRequest) -> Self {
        Self {
            name: request.name.to_string(),
            metric_descriptor: Some(request.metric_descriptor.into()),
        }
    }
}

impl From<ListMetricDescriptorsRequest> for v1::ListMetricDescriptorsRequest {
    fn from(request: ListMetricDescriptorsRequest) -> Self {
        Self {
            name: request.name.to_string(),
            filter: request.filter.unwrap_or_default(),
            page_size: 0,
            page_token: String::new(),
        }
    }
}

impl From<GetMetricDescriptorRequest> for v1::GetMetricDescriptorRequest {
    fn from(request: GetMetricDescriptorRequest) -> Self {
        Self { name: request.name.to_string() }
    }
}

impl From<DeleteMetricDescriptorRequest> for v1::DeleteMetricDescriptorRequest {
    fn from(request: DeleteMetricDescriptorRequest) -> Self {
        Self { name: request.name.to_string() }
    }
}

impl From<CreateTimeSeriesRequest> for v1::CreateTimeSeriesRequest {
    fn from(request: CreateTimeSeriesRequest) -> Self {
        Self {
            name: request.name.to_string(),
            time_series: request.time_series.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<ListTimeSeriesRequest> for v1::ListTimeSeriesRequest {
    fn from(request: ListTimeSeriesRequest) -> Self {
        Self {
            name: request.name.to_string(),
            filter: request.filter,
            interval: Some(request.interval.into()),
            aggregation: request.aggregation.map(Into::into),
            order_by: request.order_by.unwrap_or_default(),
            view: ProtoTimeSeriesView::from(request.view) as i32,
            page_size: 0,
            page_token: String::new(),
        }
    }
}

impl From<ListMonitoredResourceDescriptorsRequest> for v1::ListMonitoredResourceDescriptorsRequest {
    fn from(request: ListMonitoredResourceDescriptorsRequest) -> Self {
        Self {
            name: request.name.to_string(),
            filter: request.filter.unwrap_or_default(),
            page_size: 0,
            page_token: String::new(),
        }
    }
}

impl From<GetMonitoredResourceDescriptorRequest> for v1::GetMonitoredResourceDescriptorRequest {
    fn from(request: GetMonitoredResourceDescriptorRequest) -> Self {
        Self { name: request.name.to_string() }
    }
}
