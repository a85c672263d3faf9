//! Observability infrastructure: tracing and metrics.
//!
//! Logs go to stderr so command output on stdout stays clean. OTLP export is
//! opt-in.

use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::trace::{self, RandomIdGenerator, Sampler};
use opentelemetry_sdk::Resource;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub mod metrics;

/// Check if OTLP tracing is enabled via environment variable.
/// Set METRICCTL_OTLP_ENABLED=1 or OTEL_EXPORTER_OTLP_ENDPOINT to enable.
fn otlp_enabled() -> bool {
    std::env::var("METRICCTL_OTLP_ENABLED").is_ok()
        || std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT").is_ok()
}

/// Get the OTLP endpoint (default: http://localhost:4317)
fn otlp_endpoint() -> String {
    std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT")
        .unwrap_or_else(|_| "http://localhost:4317".to_string())
}

/// Identity reported on exported spans.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceInfo {
    pub name: &'static str,
    pub version: &'static str,
}

impl ServiceInfo {
    fn resource(&self) -> Resource {
        Resource::new(vec![
            opentelemetry::KeyValue::new("service.name", self.name),
            opentelemetry::KeyValue::new("service.version", self.version),
        ])
    }
}

/// Initialize tracing and register metric descriptions.
///
/// `RUST_LOG` wins over `default_level`. Call once at startup.
pub fn init(service: ServiceInfo, default_level: &str) -> Result<(), Box<dyn std::error::Error>> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_level)?,
    };

    let subscriber = tracing_subscriber::registry().with(filter).with(
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_level(true),
    );

    if otlp_enabled() {
        let endpoint = otlp_endpoint();

        let tracer = opentelemetry_otlp::new_pipeline()
            .tracing()
            .with_exporter(opentelemetry_otlp::new_exporter().tonic().with_endpoint(&endpoint))
            .with_trace_config(
                trace::config()
                    .with_sampler(Sampler::AlwaysOn)
                    .with_id_generator(RandomIdGenerator::default())
                    .with_resource(service.resource()),
            )
            .install_batch(opentelemetry_sdk::runtime::Tokio)?;

        subscriber.with(tracing_opentelemetry::layer().with_tracer(tracer)).try_init()?;
        tracing::debug!(service = service.name, endpoint = %endpoint, "OTLP tracing enabled");
    } else {
        subscriber.try_init()?;
    }

    metrics::register_metrics();

    Ok(())
}

/// Flush pending spans.
pub fn shutdown() {
    opentelemetry::global::shutdown_tracer_provider();
}

#[cfg(test)]
mod tests {
    use super::*;
    use opentelemetry::{Key, Value};

    #[test]
    fn test_service_resource_attributes() {
        let resource = ServiceInfo { name: "metricctl", version: "1.2.3" }.resource();
        assert_eq!(resource.get(Key::from_static_str("service.name")), Some(Value::from("metricctl")));
        assert_eq!(resource.get(Key::from_static_str("service.version")), Some(Value::from("1.2.3")));
    }
}
