//! `metricctl write|read|read-fields|read-aggregate|read-reduce` commands

use anyhow::{Context, Result};
use colored::Colorize;
use metricctl_core::{
    Aggregation, Aligner, MetricBackend, MetricsService, MonitoredResource, Point, ProjectName,
    ReadOptions, Reducer, TimeInterval, TimeSeries, TimeSeriesView, TypedValue,
};
use std::collections::BTreeMap;
use std::io::Write;
use std::time::Duration;

/// Filter used by the read-fields/aggregate/reduce demonstrations.
pub const CPU_UTILIZATION_FILTER: &str =
    r#"metric.type="compute.googleapis.com/instance/cpu/utilization""#;

/// Bucket width for read-aggregate and read-reduce.
pub const ALIGNMENT_PERIOD: Duration = Duration::from_secs(600);

/// A single point to write.
#[derive(Debug, Clone)]
pub struct WriteArgs {
    pub metric_type: String,
    pub value: f64,
    pub labels: BTreeMap<String, String>,
    pub resource_type: String,
    pub resource_labels: BTreeMap<String, String>,
}

/// Write one DOUBLE point stamped with the current time.
pub async fn write<B: MetricBackend>(
    service: &MetricsService<B>,
    project: &ProjectName,
    args: WriteArgs,
    out: &mut impl Write,
) -> Result<()> {
    let point =
        Point::new(TimeInterval::at(service.builder().now()), TypedValue::Double(args.value));
    let resource = MonitoredResource { resource_type: args.resource_type, labels: args.resource_labels };

    service
        .write_point(project, &args.metric_type, args.labels, resource, point)
        .await
        .with_context(|| format!("Failed to write time series data to {}", args.metric_type))?;

    writeln!(out, "{} Done writing time series data.", "✓".green().bold())?;
    Ok(())
}

/// Print each matching series followed by its point values.
pub async fn read<B: MetricBackend>(
    service: &MetricsService<B>,
    project: &ProjectName,
    filter: &str,
    out: &mut impl Write,
) -> Result<()> {
    let series = service
        .read_time_series(project, filter, ReadOptions::default())
        .await
        .context("Failed to read time series data")?;

    if series.is_empty() {
        writeln!(out, "{}", "No data".dimmed())?;
        return Ok(());
    }

    for s in &series {
        writeln!(out, "{}:", instance_name(s))?;
        for point in &s.points {
            writeln!(out, "{}", serde_json::to_string(&point.value)?)?;
        }
    }
    Ok(())
}

/// Headers only: which instances have data.
pub async fn read_fields<B: MetricBackend>(
    service: &MetricsService<B>,
    project: &ProjectName,
    filter: &str,
    out: &mut impl Write,
) -> Result<()> {
    let options = ReadOptions { view: TimeSeriesView::Headers, ..Default::default() };
    let series = service
        .read_time_series(project, filter, options)
        .await
        .context("Failed to read time series headers")?;

    writeln!(out, "Found data points for the following instances:")?;
    for s in &series {
        writeln!(out, "{}", instance_name(s))?;
    }
    Ok(())
}

/// Per-instance 10 minute means.
pub async fn read_aggregate<B: MetricBackend>(
    service: &MetricsService<B>,
    project: &ProjectName,
    filter: &str,
    out: &mut impl Write,
) -> Result<()> {
    let options = ReadOptions {
        aggregation: Some(
            Aggregation::new()
                .alignment_period(ALIGNMENT_PERIOD)
                .per_series_aligner(Aligner::Mean),
        ),
        ..Default::default()
    };
    let series = service
        .read_time_series(project, filter, options)
        .await
        .context("Failed to read aggregated time series data")?;

    writeln!(out, "CPU utilization:")?;
    for s in &series {
        writeln!(out, "{}", instance_name(s).bold())?;
        writeln!(out, "  Now: {}", point_value(&s.points, 0))?;
        writeln!(out, "  10 min ago: {}", point_value(&s.points, 1))?;
    }
    Ok(())
}

/// Mean across all instances of the per-instance 10 minute means.
pub async fn read_reduce<B: MetricBackend>(
    service: &MetricsService<B>,
    project: &ProjectName,
    filter: &str,
    out: &mut impl Write,
) -> Result<()> {
    let options = ReadOptions {
        aggregation: Some(
            Aggregation::new()
                .alignment_period(ALIGNMENT_PERIOD)
                .per_series_aligner(Aligner::Mean)
                .cross_series_reducer(Reducer::Mean),
        ),
        ..Default::default()
    };
    let series = service
        .read_time_series(project, filter, options)
        .await
        .context("Failed to read reduced time series data")?;

    let Some(reduced) = series.first() else {
        writeln!(out, "No data")?;
        return Ok(());
    };

    writeln!(out, "Average CPU utilization across all GCE instances:")?;
    writeln!(out, "  Last 10 min: {}", point_value(&reduced.points, 0))?;
    writeln!(out, "  10-20 min ago: {}", point_value(&reduced.points, 1))?;
    Ok(())
}

fn instance_name(series: &TimeSeries) -> &str {
    series
        .metric_label("instance_name")
        .or_else(|| series.resource_label("instance_id"))
        .unwrap_or(&series.metric.metric_type)
}

/// Points arrive most recent first; `index` 1 is the previous bucket.
fn point_value(points: &[Point], index: usize) -> String {
    points.get(index).map(|p| p.value.to_string()).unwrap_or_else(|| "-".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use metricctl_core::backend::fake::{FakeBackend, RecordedCall};
    use metricctl_core::proto_convert::v1;
    use metricctl_core::{MockClock, MonitoringError, QueryBuilder};
    use std::sync::Arc;
    use std::time::UNIX_EPOCH;

    const NOW: u64 = 1_700_000_000;

    fn service(fake: Arc<FakeBackend>) -> MetricsService<Arc<FakeBackend>> {
        colored::control::set_override(false);
        let clock = Arc::new(MockClock::with_time(UNIX_EPOCH + Duration::from_secs(NOW)));
        MetricsService::new(QueryBuilder::new(clock), fake)
    }

    fn project() -> ProjectName {
        ProjectName::new("p1").unwrap()
    }

    fn cpu_series(instance: &str, values: &[f64]) -> v1::TimeSeries {
        v1::TimeSeries {
            metric: Some(v1::Metric {
                r#type: "compute.googleapis.com/instance/cpu/utilization".to_string(),
                labels: BTreeMap::from([("instance_name".to_string(), instance.to_string())]),
            }),
            resource: Some(v1::MonitoredResource {
                r#type: "gce_instance".to_string(),
                labels: BTreeMap::new(),
            }),
            metric_kind: v1::MetricKind::Gauge as i32,
            value_type: v1::ValueType::Double as i32,
            points: values
                .iter()
                .map(|v| v1::Point {
                    interval: None,
                    value: Some(v1::TypedValue {
                        value: Some(v1::typed_value::Value::DoubleValue(*v)),
                    }),
                })
                .collect(),
            unit: String::new(),
        }
    }

    async fn run<F, Fut>(fake: Arc<FakeBackend>, f: F) -> String
    where
        F: FnOnce(MetricsService<Arc<FakeBackend>>, Vec<u8>) -> Fut,
        Fut: std::future::Future<Output = Vec<u8>>,
    {
        String::from_utf8(f(service(fake), Vec::new()).await).unwrap()
    }

    #[tokio::test]
    async fn test_write_stamps_now() {
        let fake = Arc::new(FakeBackend::new());
        let args = WriteArgs {
            metric_type: "custom.googleapis.com/stores/daily_sales".to_string(),
            value: 123.45,
            labels: BTreeMap::from([("store_id".to_string(), "Pittsburgh".to_string())]),
            resource_type: "global".to_string(),
            resource_labels: BTreeMap::from([("project_id".to_string(), "p1".to_string())]),
        };

        let text = run(fake.clone(), |service, mut out| async move {
            write(&service, &project(), args, &mut out).await.unwrap();
            out
        })
        .await;
        assert!(text.contains("Done writing time series data."));

        let written = fake.written();
        let point = &written[0].points[0];
        let end = point.interval.as_ref().unwrap().end_time.as_ref().unwrap();
        assert_eq!(end.seconds, NOW as i64);
        assert_eq!(
            point.value.as_ref().unwrap().value,
            Some(v1::typed_value::Value::DoubleValue(123.45))
        );
    }

    #[tokio::test]
    async fn test_read_prints_instance_then_values() {
        let fake = Arc::new(FakeBackend::new().with_time_series(vec![cpu_series("vm-1", &[0.25, 0.5])]));

        let text = run(fake, |service, mut out| async move {
            read(&service, &project(), CPU_UTILIZATION_FILTER, &mut out).await.unwrap();
            out
        })
        .await;
        assert_eq!(text, "vm-1:\n{\"doubleValue\":0.25}\n{\"doubleValue\":0.5}\n");
    }

    #[tokio::test]
    async fn test_read_fields_requests_headers() {
        let fake = Arc::new(
            FakeBackend::new()
                .with_time_series(vec![cpu_series("vm-1", &[0.1]), cpu_series("vm-2", &[0.2])]),
        );

        let text = run(fake.clone(), |service, mut out| async move {
            read_fields(&service, &project(), CPU_UTILIZATION_FILTER, &mut out).await.unwrap();
            out
        })
        .await;
        assert_eq!(text, "Found data points for the following instances:\nvm-1\nvm-2\n");

        let calls = fake.calls();
        let RecordedCall::ListTimeSeries(request) = &calls[0] else {
            panic!("expected a ListTimeSeries call");
        };
        assert_eq!(request.view, v1::list_time_series_request::TimeSeriesView::Headers as i32);
    }

    #[tokio::test]
    async fn test_read_aggregate_now_and_previous() {
        let fake = Arc::new(FakeBackend::new().with_time_series(vec![cpu_series("vm-1", &[0.4, 0.3])]));

        let text = run(fake, |service, mut out| async move {
            read_aggregate(&service, &project(), CPU_UTILIZATION_FILTER, &mut out).await.unwrap();
            out
        })
        .await;
        assert_eq!(text, "CPU utilization:\nvm-1\n  Now: 0.4\n  10 min ago: 0.3\n");
    }

    #[tokio::test]
    async fn test_read_reduce_uses_second_bucket() {
        let fake = Arc::new(FakeBackend::new().with_time_series(vec![cpu_series("", &[0.6, 0.2])]));

        let text = run(fake, |service, mut out| async move {
            read_reduce(&service, &project(), CPU_UTILIZATION_FILTER, &mut out).await.unwrap();
            out
        })
        .await;
        assert!(text.contains("  Last 10 min: 0.6\n"));
        assert!(text.contains("  10-20 min ago: 0.2\n"));
    }

    #[tokio::test]
    async fn test_read_reduce_no_data() {
        let text = run(Arc::new(FakeBackend::new()), |service, mut out| async move {
            read_reduce(&service, &project(), CPU_UTILIZATION_FILTER, &mut out).await.unwrap();
            out
        })
        .await;
        assert_eq!(text, "No data\n");
    }

    #[tokio::test]
    async fn test_read_empty_filter_is_rejected_locally() {
        let fake = Arc::new(FakeBackend::new());
        let service = service(fake.clone());

        let mut out = Vec::new();
        let err = read(&service, &project(), "", &mut out).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<MonitoringError>(),
            Some(MonitoringError::InvalidArgument { .. })
        ));
        assert_eq!(fake.call_count(), 0);
    }
}
