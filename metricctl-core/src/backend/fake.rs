//! In-memory backend for tests.
//!
//! Stores descriptors, serves canned time series and records every call it
//! receives, so tests can assert both on results and on what was dispatched.

use crate::backend::MetricBackend;
use crate::error::{MonitoringError, Result};
use crate::proto_convert::v1;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};
use tonic::Status;

/// A dispatched request, as received.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCall {
    CreateMetricDescriptor(v1::CreateMetricDescriptorRequest),
    ListMetricDescriptors(v1::ListMetricDescriptorsRequest),
    GetMetricDescriptor(v1::GetMetricDescriptorRequest),
    DeleteMetricDescriptor(v1::DeleteMetricDescriptorRequest),
    CreateTimeSeries(v1::CreateTimeSeriesRequest),
    ListTimeSeries(v1::ListTimeSeriesRequest),
    ListMonitoredResourceDescriptors(v1::ListMonitoredResourceDescriptorsRequest),
    GetMonitoredResourceDescriptor(v1::GetMonitoredResourceDescriptorRequest),
}

#[derive(Default)]
struct State {
    calls: Vec<RecordedCall>,
    descriptors: BTreeMap<String, v1::MetricDescriptor>,
    resources: BTreeMap<String, v1::MonitoredResourceDescriptor>,
    series: Vec<v1::TimeSeries>,
    written: Vec<v1::TimeSeries>,
    fail_next: Option<Status>,
}

/// Recording in-memory backend.
#[derive(Default)]
pub struct FakeBackend {
    state: Mutex<State>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a stored descriptor; its `name` is the lookup key.
    pub fn with_metric_descriptor(self, descriptor: v1::MetricDescriptor) -> Self {
        self.lock().descriptors.insert(descriptor.name.clone(), descriptor);
        self
    }

    /// Seed a resource descriptor; its `name` is the lookup key.
    pub fn with_resource_descriptor(self, descriptor: v1::MonitoredResourceDescriptor) -> Self {
        self.lock().resources.insert(descriptor.name.clone(), descriptor);
        self
    }

    /// Series returned, in order, by every `list_time_series` call.
    pub fn with_time_series(self, series: Vec<v1::TimeSeries>) -> Self {
        self.lock().series = series;
        self
    }

    /// Make the next call fail with `status`.
    pub fn fail_next(&self, status: Status) {
        self.lock().fail_next = Some(status);
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.lock().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.lock().calls.len()
    }

    /// Every series received by `create_time_series`.
    pub fn written(&self) -> Vec<v1::TimeSeries> {
        self.lock().written.clone()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Record `call` and return the guard unless a failure was queued.
    fn begin(&self, call: RecordedCall) -> Result<MutexGuard<'_, State>> {
        let mut state = self.lock();
        state.calls.push(call);
        match state.fail_next.take() {
            Some(status) => Err(MonitoringError::from(status)),
            None => Ok(state),
        }
    }
}

fn under_project(name: &str, project: &str) -> bool {
    name.strip_prefix(project).is_some_and(|rest| rest.starts_with('/'))
}

#[async_trait]
impl MetricBackend for FakeBackend {
    async fn create_metric_descriptor(
        &self,
        request: v1::CreateMetricDescriptorRequest,
    ) -> Result<v1::MetricDescriptor> {
        let mut state = self.begin(RecordedCall::CreateMetricDescriptor(request.clone()))?;
        let mut descriptor = request
            .metric_descriptor
            .ok_or_else(|| {
                MonitoringError::from(Status::invalid_argument("metric descriptor is required"))
            })?;
        descriptor.name = format!("{}/metricDescriptors/{}", request.name, descriptor.r#type);

        if state.descriptors.contains_key(&descriptor.name) {
            return Err(MonitoringError::from(Status::already_exists(format!(
                "metric descriptor {} already exists",
                descriptor.name
            ))));
        }
        state.descriptors.insert(descriptor.name.clone(), descriptor.clone());
        Ok(descriptor)
    }

    async fn list_metric_descriptors(
        &self,
        request: v1::ListMetricDescriptorsRequest,
    ) -> Result<Vec<v1::MetricDescriptor>> {
        let state = self.begin(RecordedCall::ListMetricDescriptors(request.clone()))?;
        Ok(state
            .descriptors
            .values()
            .filter(|d| under_project(&d.name, &request.name))
            .cloned()
            .collect())
    }

    async fn get_metric_descriptor(
        &self,
        request: v1::GetMetricDescriptorRequest,
    ) -> Result<v1::MetricDescriptor> {
        let state = self.begin(RecordedCall::GetMetricDescriptor(request.clone()))?;
        state.descriptors.get(&request.name).cloned().ok_or_else(|| {
            MonitoringError::from(Status::not_found(format!("{} not found", request.name)))
        })
    }

    async fn delete_metric_descriptor(
        &self,
        request: v1::DeleteMetricDescriptorRequest,
    ) -> Result<()> {
        let mut state = self.begin(RecordedCall::DeleteMetricDescriptor(request.clone()))?;
        state.descriptors.remove(&request.name).map(|_| ()).ok_or_else(|| {
            MonitoringError::from(Status::not_found(format!("{} not found", request.name)))
        })
    }

    async fn create_time_series(&self, request: v1::CreateTimeSeriesRequest) -> Result<()> {
        let mut state = self.begin(RecordedCall::CreateTimeSeries(request.clone()))?;
        state.written.extend(request.time_series);
        Ok(())
    }

    async fn list_time_series(
        &self,
        request: v1::ListTimeSeriesRequest,
    ) -> Result<Vec<v1::TimeSeries>> {
        let headers_only =
            request.view == v1::list_time_series_request::TimeSeriesView::Headers as i32;
        let state = self.begin(RecordedCall::ListTimeSeries(request))?;

        Ok(state
            .series
            .iter()
            .cloned()
            .map(|mut series| {
                if headers_only {
                    series.points.clear();
                }
                series
            })
            .collect())
    }

    async fn list_monitored_resource_descriptors(
        &self,
        request: v1::ListMonitoredResourceDescriptorsRequest,
    ) -> Result<Vec<v1::MonitoredResourceDescriptor>> {
        let state = self.begin(RecordedCall::ListMonitoredResourceDescriptors(request.clone()))?;
        Ok(state
            .resources
            .values()
            .filter(|d| under_project(&d.name, &request.name))
            .cloned()
            .collect())
    }

    async fn get_monitored_resource_descriptor(
        &self,
        request: v1::GetMonitoredResourceDescriptorRequest,
    ) -> Result<v1::MonitoredResourceDescriptor> {
        let state = self.begin(RecordedCall::GetMonitoredResourceDescriptor(request.clone()))?;
        state.resources.get(&request.name).cloned().ok_or_else(|| {
            MonitoringError::from(Status::not_found(format!("{} not found", request.name)))
        })
    }

    fn name(&self) -> &str {
        "fake"
    }
}
