//! Metrics service facade.
//!
//! Every operation validates locally through the [`QueryBuilder`], dispatches
//! exactly one backend call, and converts the wire result into domain types.
//! A request that fails validation is never dispatched.

use crate::backend::MetricBackend;
use crate::error::{MonitoringError, Result};
use crate::names::ProjectName;
use crate::observability::metrics;
use crate::query::QueryBuilder;
use crate::types::{
    Aggregation, MetricDescriptor, MonitoredResource, MonitoredResourceDescriptor, Point,
    QueryInterval, TimeSeries, TimeSeriesView,
};
use std::collections::BTreeMap;
use tracing::{debug, instrument};

/// Validate → dispatch → normalize.
pub struct MetricsService<B> {
    builder: QueryBuilder,
    backend: B,
}

/// Parameters of a time series read.
#[derive(Debug, Clone, Default)]
pub struct ReadOptions {
    pub interval: Option<QueryInterval>,
    pub aggregation: Option<Aggregation>,
    pub view: TimeSeriesView,
    pub order_by: Option<String>,
}

impl<B: MetricBackend> MetricsService<B> {
    pub fn new(builder: QueryBuilder, backend: B) -> Self {
        Self { builder, backend }
    }

    pub fn builder(&self) -> &QueryBuilder {
        &self.builder
    }

    #[instrument(skip(self, scope, descriptor), fields(project = %scope, backend = self.backend.name(), metric_type = %descriptor.metric_type))]
    pub async fn create_metric_descriptor(
        &self,
        scope: &ProjectName,
        descriptor: MetricDescriptor,
    ) -> Result<MetricDescriptor> {
        let request = validated(
            "create_metric_descriptor",
            self.builder.build_descriptor_create_request(scope, descriptor),
        )?;

        let created = self.backend.create_metric_descriptor(request.into()).await?;
        debug!(name = %created.name, "Metric descriptor created");
        created.try_into()
    }

    #[instrument(skip(self, scope), fields(project = %scope, backend = self.backend.name()))]
    pub async fn list_metric_descriptors(
        &self,
        scope: &ProjectName,
        filter: Option<&str>,
    ) -> Result<Vec<MetricDescriptor>> {
        let request = validated(
            "list_metric_descriptors",
            self.builder.build_list_descriptors_request(scope, filter),
        )?;

        let descriptors = self.backend.list_metric_descriptors(request.into()).await?;
        debug!(count = descriptors.len(), "Listed metric descriptors");
        descriptors.into_iter().map(MetricDescriptor::try_from).collect()
    }

    #[instrument(skip(self, scope), fields(project = %scope, backend = self.backend.name()))]
    pub async fn get_metric_descriptor(
        &self,
        scope: &ProjectName,
        metric_type: &str,
    ) -> Result<MetricDescriptor> {
        let request = validated(
            "get_metric_descriptor",
            self.builder.build_get_descriptor_request(scope, metric_type),
        )?;

        self.backend.get_metric_descriptor(request.into()).await?.try_into()
    }

    #[instrument(skip(self, scope), fields(project = %scope, backend = self.backend.name()))]
    pub async fn delete_metric_descriptor(
        &self,
        scope: &ProjectName,
        metric_type: &str,
    ) -> Result<()> {
        let request = validated(
            "delete_metric_descriptor",
            self.builder.build_delete_descriptor_request(scope, metric_type),
        )?;

        self.backend.delete_metric_descriptor(request.into()).await?;
        debug!("Metric descriptor deleted");
        Ok(())
    }

    /// Write a single point.
    #[instrument(skip(self, scope, labels, resource, point), fields(project = %scope, backend = self.backend.name()))]
    pub async fn write_point(
        &self,
        scope: &ProjectName,
        metric_type: &str,
        labels: BTreeMap<String, String>,
        resource: MonitoredResource,
        point: Point,
    ) -> Result<()> {
        let request = validated(
            "write_point",
            self.builder.build_write_request(scope, metric_type, labels, resource, point),
        )?;

        self.backend.create_time_series(request.into()).await
    }

    /// Read time series matching `filter`.
    ///
    /// Series and their points come back in backend order.
    #[instrument(skip(self, scope, options), fields(project = %scope, backend = self.backend.name(), view = ?options.view))]
    pub async fn read_time_series(
        &self,
        scope: &ProjectName,
        filter: &str,
        options: ReadOptions,
    ) -> Result<Vec<TimeSeries>> {
        let mut request = validated(
            "read_time_series",
            self.builder.build_read_request(scope, filter, options.interval, options.aggregation),
        )?
        .with_view(options.view);
        if let Some(order_by) = options.order_by {
            request = request.with_order_by(order_by);
        }
        debug!(start = %request.interval.start, end = %request.interval.end, "Reading time series");

        let raw = self.backend.list_time_series(request.into()).await?;
        self.builder.normalize_time_series_result(raw).collect()
    }

    #[instrument(skip(self, scope), fields(project = %scope, backend = self.backend.name()))]
    pub async fn list_resource_descriptors(
        &self,
        scope: &ProjectName,
        filter: Option<&str>,
    ) -> Result<Vec<MonitoredResourceDescriptor>> {
        let request = validated(
            "list_resource_descriptors",
            self.builder.build_list_resources_request(scope, filter),
        )?;

        let descriptors = self.backend.list_monitored_resource_descriptors(request.into()).await?;
        descriptors.into_iter().map(MonitoredResourceDescriptor::try_from).collect()
    }

    #[instrument(skip(self, scope), fields(project = %scope, backend = self.backend.name()))]
    pub async fn get_resource_descriptor(
        &self,
        scope: &ProjectName,
        resource_type: &str,
    ) -> Result<MonitoredResourceDescriptor> {
        let request = validated(
            "get_resource_descriptor",
            self.builder.build_get_resource_request(scope, resource_type),
        )?;

        self.backend.get_monitored_resource_descriptor(request.into()).await?.try_into()
    }
}

fn validated<T>(operation: &'static str, result: Result<T>) -> Result<T> {
    result.map_err(|e: MonitoringError| {
        metrics::record_validation_failure(operation);
        debug!(operation, error = %e, "Rejected before dispatch");
        e
    })
}
