//! Monitored resource descriptor domain types.

use crate::types::descriptor::LabelDescriptor;
use serde::{Deserialize, Serialize};

/// Schema of an entity metrics can be attached to (a VM instance, a database).
///
/// Enumerated by the backend; read-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitoredResourceDescriptor {
    /// Resource name (e.g., "projects/p1/monitoredResourceDescriptors/gce_instance")
    pub name: String,

    /// Resource type (e.g., "gce_instance")
    pub resource_type: String,

    /// Short display name
    pub display_name: String,

    /// Human-readable description
    pub description: String,

    /// Label schema
    pub labels: Vec<LabelDescriptor>,
}
