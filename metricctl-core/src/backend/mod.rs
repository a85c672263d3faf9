//! Metrics backend abstraction.
//!
//! `MetricBackend` is the RPC boundary: one method per remote call, speaking
//! wire messages. Implementations:
//! - `GrpcBackend` in metricctl-cli (tonic client)
//! - [`fake::FakeBackend`] for tests (`test-util` feature)

use crate::error::Result;
use crate::proto_convert::v1;
use async_trait::async_trait;
use std::sync::Arc;

#[cfg(any(test, feature = "test-util"))]
pub mod fake;

/// Remote metrics service.
///
/// Each method is exactly one logical round trip. List methods return every
/// page concatenated. Implementations do not retry and surface backend
/// failures unchanged.
#[async_trait]
pub trait MetricBackend: Send + Sync {
    async fn create_metric_descriptor(
        &self,
        request: v1::CreateMetricDescriptorRequest,
    ) -> Result<v1::MetricDescriptor>;

    async fn list_metric_descriptors(
        &self,
        request: v1::ListMetricDescriptorsRequest,
    ) -> Result<Vec<v1::MetricDescriptor>>;

    async fn get_metric_descriptor(
        &self,
        request: v1::GetMetricDescriptorRequest,
    ) -> Result<v1::MetricDescriptor>;

    async fn delete_metric_descriptor(
        &self,
        request: v1::DeleteMetricDescriptorRequest,
    ) -> Result<()>;

    async fn create_time_series(&self, request: v1::CreateTimeSeriesRequest) -> Result<()>;

    async fn list_time_series(
        &self,
        request: v1::ListTimeSeriesRequest,
    ) -> Result<Vec<v1::TimeSeries>>;

    async fn list_monitored_resource_descriptors(
        &self,
        request: v1::ListMonitoredResourceDescriptorsRequest,
    ) -> Result<Vec<v1::MonitoredResourceDescriptor>>;

    async fn get_monitored_resource_descriptor(
        &self,
        request: v1::GetMonitoredResourceDescriptorRequest,
    ) -> Result<v1::MonitoredResourceDescriptor>;

    /// Backend name (for logging/metrics).
    fn name(&self) -> &str;
}

#[async_trait]
impl<B: MetricBackend + ?Sized> MetricBackend for Arc<B> {
    async fn create_metric_descriptor(
        &self,
        request: v1::CreateMetricDescriptorRequest,
    ) -> Result<v1::MetricDescriptor> {
        (**self).create_metric_descriptor(request).await
    }

    async fn list_metric_descriptors(
        &self,
        request: v1::ListMetricDescriptorsRequest,
    ) -> Result<Vec<v1::MetricDescriptor>> {
        (**self).list_metric_descriptors(request).await
    }

    async fn get_metric_descriptor(
        &self,
        request: v1::GetMetricDescriptorRequest,
    ) -> Result<v1::MetricDescriptor> {
        (**self).get_metric_descriptor(request).await
    }

    async fn delete_metric_descriptor(
        &self,
        request: v1::DeleteMetricDescriptorRequest,
    ) -> Result<()> {
        (**self).delete_metric_descriptor(request).await
    }

    async fn create_time_series(&self, request: v1::CreateTimeSeriesRequest) -> Result<()> {
        (**self).create_time_series(request).await
    }

    async fn list_time_series(
        &self,
        request: v1::ListTimeSeriesRequest,
    ) -> Result<Vec<v1::TimeSeries>> {
        (**self).list_time_series(request).await
    }

    async fn list_monitored_resource_descriptors(
        &self,
        request: v1::ListMonitoredResourceDescriptorsRequest,
    ) -> Result<Vec<v1::MonitoredResourceDescriptor>> {
        (**self).list_monitored_resource_descriptors(request).await
    }

    async fn get_monitored_resource_descriptor(
        &self,
        request: v1::GetMonitoredResourceDescriptorRequest,
    ) -> Result<v1::MonitoredResourceDescriptor> {
        (**self).get_monitored_resource_descriptor(request).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
