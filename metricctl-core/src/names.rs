//! Resource names.
//!
//! - `projects/{project}`
//! - `projects/{project}/metricDescriptors/{metric_type}`
//! - `projects/{project}/monitoredResourceDescriptors/{resource_type}`
//!
//! Metric types contain slashes (`custom.googleapis.com/stores/daily_sales`),
//! so only the project id is restricted.

use crate::error::{MonitoringError, Result};
use std::fmt;

const PROJECTS: &str = "projects/";
const METRIC_DESCRIPTORS: &str = "metricDescriptors/";
const RESOURCE_DESCRIPTORS: &str = "monitoredResourceDescriptors/";

/// The scope every request is issued against.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProjectName {
    project_id: String,
}

impl ProjectName {
    /// Build from a bare project id.
    pub fn new(project_id: impl Into<String>) -> Result<Self> {
        let project_id = project_id.into();
        let trimmed = project_id.trim();
        if trimmed.is_empty() {
            return Err(MonitoringError::invalid_argument("project id must not be empty"));
        }
        if trimmed.contains('/') {
            return Err(MonitoringError::invalid_argument(format!(
                "project id '{}' must not contain '/'",
                trimmed
            )));
        }
        Ok(Self { project_id: trimmed.to_string() })
    }

    /// Accept either `p1` or `projects/p1`.
    pub fn parse(value: &str) -> Result<Self> {
        Self::new(value.strip_prefix(PROJECTS).unwrap_or(value))
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn metric_descriptor(&self, metric_type: &str) -> Result<MetricDescriptorName> {
        MetricDescriptorName::new(self.clone(), metric_type)
    }

    pub fn monitored_resource_descriptor(
        &self,
        resource_type: &str,
    ) -> Result<MonitoredResourceDescriptorName> {
        MonitoredResourceDescriptorName::new(self.clone(), resource_type)
    }
}

impl fmt::Display for ProjectName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", PROJECTS, self.project_id)
    }
}

/// Full name of a metric descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MetricDescriptorName {
    project: ProjectName,
    metric_type: String,
}

impl MetricDescriptorName {
    pub fn new(project: ProjectName, metric_type: &str) -> Result<Self> {
        let metric_type = metric_type.trim();
        if metric_type.is_empty() {
            return Err(MonitoringError::invalid_argument("metric type must not be empty"));
        }
        Ok(Self { project, metric_type: metric_type.to_string() })
    }

    /// Parse `projects/{project}/metricDescriptors/{metric_type}`.
    pub fn parse(value: &str) -> Result<Self> {
        let (project, rest) = split_project(value)?;
        let metric_type = rest.strip_prefix(METRIC_DESCRIPTORS).ok_or_else(|| {
            MonitoringError::invalid_argument(format!("'{}' is not a metric descriptor name", value))
        })?;
        Self::new(project, metric_type)
    }

    pub fn project(&self) -> &ProjectName {
        &self.project
    }

    pub fn metric_type(&self) -> &str {
        &self.metric_type
    }
}

impl fmt::Display for MetricDescriptorName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}{}", self.project, METRIC_DESCRIPTORS, self.metric_type)
    }
}

/// Full name of a monitored resource descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MonitoredResourceDescriptorName {
    project: ProjectName,
    resource_type: String,
}

impl MonitoredResourceDescriptorName {
    pub fn new(project: ProjectName, resource_type: &str) -> Result<Self> {
        let resource_type = resource_type.trim();
        if resource_type.is_empty() {
            return Err(MonitoringError::invalid_argument("resource type must not be empty"));
        }
        if resource_type.contains('/') {
            return Err(MonitoringError::invalid_argument(format!(
                "resource type '{}' must not contain '/'",
                resource_type
            )));
        }
        Ok(Self { project, resource_type: resource_type.to_string() })
    }

    /// Parse `projects/{project}/monitoredResourceDescriptors/{resource_type}`.
    pub fn parse(value: &str) -> Result<Self> {
        let (project, rest) = split_project(value)?;
        let resource_type = rest.strip_prefix(RESOURCE_DESCRIPTORS).ok_or_else(|| {
            MonitoringError::invalid_argument(format!(
                "'{}' is not a monitored resource descriptor name",
                value
            ))
        })?;
        Self::new(project, resource_type)
    }

    pub fn project(&self) -> &ProjectName {
        &self.project
    }

    pub fn resource_type(&self) -> &str {
        &self.resource_type
    }
}

impl fmt::Display for MonitoredResourceDescriptorName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}{}", self.project, RESOURCE_DESCRIPTORS, self.resource_type)
    }
}

fn split_project(value: &str) -> Result<(ProjectName, &str)> {
    let rest = value.strip_prefix(PROJECTS).ok_or_else(|| {
        MonitoringError::invalid_argument(format!("'{}' does not start with projects/", value))
    })?;
    let (project_id, rest) = rest.split_once('/').ok_or_else(|| {
        MonitoringError::invalid_argument(format!("'{}' has no collection segment", value))
    })?;
    Ok((ProjectName::new(project_id)?, rest))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_name_forms() {
        assert_eq!(ProjectName::parse("p1").unwrap().to_string(), "projects/p1");
        assert_eq!(ProjectName::parse("projects/p1").unwrap().to_string(), "projects/p1");
        assert_eq!(ProjectName::parse("projects/p1").unwrap().project_id(), "p1");
    }

    #[test]
    fn test_project_name_rejects_bad_ids() {
        assert!(ProjectName::new("").is_err());
        assert!(ProjectName::new("   ").is_err());
        assert!(ProjectName::new("a/b").is_err());
        assert!(ProjectName::parse("projects/").is_err());
    }

    #[test]
    fn test_metric_descriptor_name_keeps_slashes() {
        let project = ProjectName::new("p1").unwrap();
        let name = project.metric_descriptor("custom.googleapis.com/stores/daily_sales").unwrap();
        assert_eq!(
            name.to_string(),
            "projects/p1/metricDescriptors/custom.googleapis.com/stores/daily_sales"
        );

        let parsed = MetricDescriptorName::parse(&name.to_string()).unwrap();
        assert_eq!(parsed, name);
        assert_eq!(parsed.metric_type(), "custom.googleapis.com/stores/daily_sales");
    }

    #[test]
    fn test_resource_descriptor_name() {
        let project = ProjectName::new("p1").unwrap();
        let name = project.monitored_resource_descriptor("cloudsql_database").unwrap();
        assert_eq!(name.to_string(), "projects/p1/monitoredResourceDescriptors/cloudsql_database");
        assert_eq!(MonitoredResourceDescriptorName::parse(&name.to_string()).unwrap(), name);
    }

    #[test]
    fn test_parse_rejects_wrong_collection() {
        assert!(MetricDescriptorName::parse("projects/p1/monitoredResourceDescriptors/x").is_err());
        assert!(MonitoredResourceDescriptorName::parse("projects/p1/metricDescriptors/x").is_err());
        assert!(MetricDescriptorName::parse("folders/f1/metricDescriptors/x").is_err());
        assert!(MetricDescriptorName::parse("projects/p1").is_err());
    }
}
