//! `metricctl create|list|get|delete` commands
//!
//! Metric descriptor management.

use anyhow::{Context, Result};
use colored::Colorize;
use metricctl_core::{
    LabelDescriptor, MetricBackend, MetricDescriptor, MetricsService, ProjectName,
};
use std::io::Write;
use tabled::{settings::Style, Table, Tabled};

/// Create a metric descriptor and print what the backend stored.
pub async fn create<B: MetricBackend>(
    service: &MetricsService<B>,
    project: &ProjectName,
    descriptor: MetricDescriptor,
    out: &mut impl Write,
) -> Result<()> {
    let metric_type = descriptor.metric_type.clone();
    let created = service
        .create_metric_descriptor(project, descriptor)
        .await
        .with_context(|| format!("Failed to create metric descriptor {}", metric_type))?;

    writeln!(out, "{} Created custom metric:", "✓".green().bold())?;
    writeln!(out)?;
    write_descriptor(&created, out)?;
    Ok(())
}

#[derive(Tabled)]
struct DescriptorRow {
    #[tabled(rename = "TYPE")]
    metric_type: String,
    #[tabled(rename = "KIND")]
    kind: String,
    #[tabled(rename = "VALUE TYPE")]
    value_type: String,
    #[tabled(rename = "UNIT")]
    unit: String,
}

/// List metric descriptors.
pub async fn list<B: MetricBackend>(
    service: &MetricsService<B>,
    project: &ProjectName,
    filter: Option<&str>,
    out: &mut impl Write,
) -> Result<()> {
    let descriptors = service
        .list_metric_descriptors(project, filter)
        .await
        .context("Failed to list metric descriptors")?;

    if descriptors.is_empty() {
        writeln!(out, "{}", "No metric descriptors found".dimmed())?;
        return Ok(());
    }

    writeln!(out, "Metric Descriptors:")?;
    let rows: Vec<DescriptorRow> = descriptors
        .into_iter()
        .map(|d| DescriptorRow {
            metric_type: d.metric_type,
            kind: d.metric_kind.to_string(),
            value_type: d.value_type.to_string(),
            unit: if d.unit.is_empty() { "-".to_string() } else { d.unit },
        })
        .collect();

    let mut table = Table::new(rows);
    table.with(Style::modern());
    writeln!(out, "{}", table)?;
    Ok(())
}

/// Print one metric descriptor.
pub async fn get<B: MetricBackend>(
    service: &MetricsService<B>,
    project: &ProjectName,
    metric_type: &str,
    out: &mut impl Write,
) -> Result<()> {
    let descriptor = service
        .get_metric_descriptor(project, metric_type)
        .await
        .with_context(|| format!("Failed to get metric descriptor {}", metric_type))?;

    write_descriptor(&descriptor, out)?;
    Ok(())
}

/// Delete a user-defined metric descriptor.
pub async fn delete<B: MetricBackend>(
    service: &MetricsService<B>,
    project: &ProjectName,
    metric_type: &str,
    out: &mut impl Write,
) -> Result<()> {
    service
        .delete_metric_descriptor(project, metric_type)
        .await
        .with_context(|| format!("Failed to delete metric descriptor {}", metric_type))?;

    writeln!(out, "{} Deleted {}", "✓".green().bold(), metric_type.bold())?;
    Ok(())
}

fn write_descriptor(descriptor: &MetricDescriptor, out: &mut impl Write) -> Result<()> {
    if let Some(name) = &descriptor.name {
        writeln!(out, "{}: {}", "Resource".bold(), name)?;
    }
    writeln!(out, "{}: {}", "Name".bold(), descriptor.display_name)?;
    writeln!(out, "{}: {}", "Description".bold(), descriptor.description)?;
    writeln!(out, "{}: {}", "Type".bold(), descriptor.metric_type)?;
    writeln!(out, "{}: {}", "Kind".bold(), descriptor.metric_kind)?;
    writeln!(out, "{}: {}", "Value Type".bold(), descriptor.value_type)?;
    writeln!(out, "{}: {}", "Unit".bold(), descriptor.unit)?;
    write_labels(&descriptor.labels, "", out)
}

/// `Labels:` followed by `  key (TYPE) - description` lines, all shifted by `indent`.
pub(crate) fn write_labels(
    labels: &[LabelDescriptor],
    indent: &str,
    out: &mut impl Write,
) -> Result<()> {
    writeln!(out, "{}Labels:", indent)?;
    if labels.is_empty() {
        writeln!(out, "{}  {}", indent, "(none)".dimmed())?;
    }
    for label in labels {
        writeln!(out, "{}  {} ({}) - {}", indent, label.key, label.value_type, label.description)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use metricctl_core::backend::fake::FakeBackend;
    use metricctl_core::{
        LabelValueType, MetricKind, MockClock, MonitoringError, QueryBuilder, ValueType,
    };
    use std::sync::Arc;

    fn service(fake: Arc<FakeBackend>) -> MetricsService<Arc<FakeBackend>> {
        colored::control::set_override(false);
        MetricsService::new(QueryBuilder::new(Arc::new(MockClock::new())), fake)
    }

    fn daily_sales() -> MetricDescriptor {
        MetricDescriptor {
            name: None,
            metric_type: "custom.googleapis.com/stores/daily_sales".to_string(),
            display_name: "Daily Sales".to_string(),
            description: "Daily sales records from all branch stores.".to_string(),
            metric_kind: MetricKind::Gauge,
            value_type: ValueType::Double,
            unit: "{USD}".to_string(),
            labels: vec![LabelDescriptor::new(
                "store_id",
                LabelValueType::String,
                "The ID of the store.",
            )],
        }
    }

    #[tokio::test]
    async fn test_create_then_list_get_delete() {
        let fake = Arc::new(FakeBackend::new());
        let service = service(fake.clone());
        let project = ProjectName::new("p1").unwrap();

        let mut out = Vec::new();
        create(&service, &project, daily_sales(), &mut out).await.unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Created custom metric:"));
        assert!(text.contains("Kind: GAUGE"));
        assert!(text.contains("Unit: {USD}"));
        assert!(text.contains("  store_id (STRING) - The ID of the store."));

        let mut out = Vec::new();
        list(&service, &project, None, &mut out).await.unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("custom.googleapis.com/stores/daily_sales"));

        let mut out = Vec::new();
        get(&service, &project, "custom.googleapis.com/stores/daily_sales", &mut out)
            .await
            .unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains(
            "Resource: projects/p1/metricDescriptors/custom.googleapis.com/stores/daily_sales"
        ));

        let mut out = Vec::new();
        delete(&service, &project, "custom.googleapis.com/stores/daily_sales", &mut out)
            .await
            .unwrap();
        assert!(String::from_utf8(out).unwrap().contains("Deleted"));
        assert_eq!(fake.call_count(), 4);
    }

    #[tokio::test]
    async fn test_list_empty() {
        let service = service(Arc::new(FakeBackend::new()));
        let project = ProjectName::new("p1").unwrap();

        let mut out = Vec::new();
        list(&service, &project, None, &mut out).await.unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "No metric descriptors found\n");
    }

    #[tokio::test]
    async fn test_builtin_descriptor_listed_but_not_deleted() {
        let fake = Arc::new(FakeBackend::new().with_metric_descriptor(
            metricctl_core::proto_convert::v1::MetricDescriptor {
                name: "projects/p1/metricDescriptors/compute.googleapis.com/instance/cpu/utilization"
                    .to_string(),
                r#type: "compute.googleapis.com/instance/cpu/utilization".to_string(),
                display_name: "CPU utilization".to_string(),
                metric_kind: metricctl_core::proto_convert::v1::MetricKind::Gauge as i32,
                value_type: metricctl_core::proto_convert::v1::ValueType::Double as i32,
                unit: "10^2.%".to_string(),
                ..Default::default()
            },
        ));
        let service = service(fake.clone());
        let project = ProjectName::new("p1").unwrap();

        let mut out = Vec::new();
        list(&service, &project, None, &mut out).await.unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("compute.googleapis.com/instance/cpu/utilization"));
        assert!(text.contains("10^2.%"));

        let mut out = Vec::new();
        let err = delete(
            &service,
            &project,
            "compute.googleapis.com/instance/cpu/utilization",
            &mut out,
        )
        .await
        .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<MonitoringError>(),
            Some(MonitoringError::InvalidArgument { .. })
        ));
        assert_eq!(fake.call_count(), 1);
    }

    #[tokio::test]
    async fn test_get_missing_keeps_cause() {
        let service = service(Arc::new(FakeBackend::new()));
        let project = ProjectName::new("p1").unwrap();

        let mut out = Vec::new();
        let err = get(&service, &project, "custom.googleapis.com/none", &mut out)
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<MonitoringError>(),
            Some(MonitoringError::NotFound { .. })
        ));
        assert!(out.is_empty());
    }
}
