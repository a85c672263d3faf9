//! `metricctl list-resources|get-resource` commands

use crate::commands::descriptors::write_labels;
use anyhow::{Context, Result};
use colored::Colorize;
use metricctl_core::{MetricBackend, MetricsService, ProjectName};
use std::io::Write;

/// List monitored resource descriptors with their label schemas.
pub async fn list_resources<B: MetricBackend>(
    service: &MetricsService<B>,
    project: &ProjectName,
    filter: Option<&str>,
    out: &mut impl Write,
) -> Result<()> {
    let descriptors = service
        .list_resource_descriptors(project, filter)
        .await
        .context("Failed to list monitored resource descriptors")?;

    writeln!(out, "Monitored Resource Descriptors:")?;
    for descriptor in &descriptors {
        writeln!(out, "{}", descriptor.name.bold())?;
        writeln!(out, "  Type: {}", descriptor.resource_type)?;
        if !descriptor.labels.is_empty() {
            write_labels(&descriptor.labels, "  ", out)?;
        }
        writeln!(out)?;
    }
    Ok(())
}

/// Print one monitored resource descriptor.
pub async fn get_resource<B: MetricBackend>(
    service: &MetricsService<B>,
    project: &ProjectName,
    resource_type: &str,
    out: &mut impl Write,
) -> Result<()> {
    let descriptor = service
        .get_resource_descriptor(project, resource_type)
        .await
        .with_context(|| format!("Failed to get monitored resource descriptor {}", resource_type))?;

    writeln!(out, "{}: {}", "Name".bold(), descriptor.display_name)?;
    writeln!(out, "{}: {}", "Description".bold(), descriptor.description)?;
    writeln!(out, "{}: {}", "Type".bold(), descriptor.resource_type)?;
    write_labels(&descriptor.labels, "", out)
}
