use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use metricctl_core::{
    init_observability, shutdown_observability, Config, LabelDescriptor, LabelValueType,
    MetricDescriptor, MetricKind, MetricsService, QueryBuilder, ServiceInfo, SystemClock,
    ValueType,
};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

mod client;
mod commands;

use commands::timeseries::{WriteArgs, CPU_UTILIZATION_FILTER};

#[derive(Parser)]
#[command(name = "metricctl")]
#[command(about = "Manage metric descriptors and read/write time series", long_about = None)]
struct Cli {
    /// Project to operate on
    #[arg(short, long, global = true, env = "GCLOUD_PROJECT")]
    project_id: Option<String>,

    /// Service endpoint (http://, https:// or unix:<path>)
    #[arg(long, global = true)]
    endpoint: Option<String>,

    /// Path to a JSON config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a custom metric descriptor
    Create {
        /// Metric type
        #[arg(long = "type", default_value = "custom.googleapis.com/stores/daily_sales")]
        metric_type: String,

        /// Display name
        #[arg(long, default_value = "Daily Sales")]
        display_name: String,

        /// Description
        #[arg(long, default_value = "Daily sales records from all branch stores.")]
        description: String,

        /// Metric kind (GAUGE, DELTA, CUMULATIVE)
        #[arg(long, default_value = "GAUGE")]
        kind: MetricKind,

        /// Value type (BOOL, INT64, DOUBLE, STRING, DISTRIBUTION)
        #[arg(long, default_value = "DOUBLE")]
        value_type: ValueType,

        /// Unit of measure
        #[arg(long, default_value = "{USD}")]
        unit: String,

        /// Label schema (KEY[:TYPE][=DESCRIPTION])
        #[arg(short, long, default_value = "store_id:STRING=The ID of the store.")]
        label: Vec<String>,
    },

    /// List metric descriptors
    List {
        /// Filter expression
        #[arg(short, long)]
        filter: Option<String>,
    },

    /// Show a metric descriptor
    Get {
        /// Metric type
        metric_id: String,
    },

    /// Delete a custom metric descriptor
    Delete {
        /// Metric type
        metric_id: String,
    },

    /// Write one data point
    Write {
        /// Metric type
        #[arg(long, default_value = "custom.googleapis.com/stores/daily_sales")]
        metric_type: String,

        /// Point value
        #[arg(long, default_value = "123.45")]
        value: f64,

        /// Metric labels (KEY=VALUE)
        #[arg(short, long, default_value = "store_id=Pittsburgh")]
        label: Vec<String>,

        /// Monitored resource type
        #[arg(long, default_value = "global")]
        resource_type: String,

        /// Monitored resource labels (KEY=VALUE); defaults to project_id
        #[arg(long)]
        resource_label: Vec<String>,
    },

    /// Read the last 20 minutes of matching time series
    Read {
        /// Filter expression
        filter: String,
    },

    /// List which instances have data, without point values
    ReadFields {
        #[arg(short, long, default_value = CPU_UTILIZATION_FILTER)]
        filter: String,
    },

    /// Read per-instance 10 minute means
    ReadAggregate {
        #[arg(short, long, default_value = CPU_UTILIZATION_FILTER)]
        filter: String,
    },

    /// Read the mean across instances of 10 minute means
    ReadReduce {
        #[arg(short, long, default_value = CPU_UTILIZATION_FILTER)]
        filter: String,
    },

    /// List monitored resource descriptors
    ListResources {
        #[arg(short, long)]
        filter: Option<String>,
    },

    /// Show a monitored resource descriptor
    GetResource {
        /// Resource type (e.g., "gce_instance")
        resource_type: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = load_config(&cli)?;
    let service_info = ServiceInfo { name: "metricctl", version: env!("CARGO_PKG_VERSION") };
    init_observability(service_info, &config.log_level)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    let result = run(cli, config).await;
    shutdown_observability();
    result
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::load().context("Failed to load config")?,
    };
    config.apply_env();
    if let Some(endpoint) = &cli.endpoint {
        config.endpoint = endpoint.clone();
    }
    config.validate()?;
    Ok(config)
}

async fn run(cli: Cli, config: Config) -> Result<()> {
    let project = config.project(cli.project_id.as_deref())?;
    let backend = client::GrpcBackend::connect(&config).await?;
    let builder = QueryBuilder::from_config(&config, Arc::new(SystemClock));
    let service = MetricsService::new(builder, backend);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Commands::Create {
            metric_type,
            display_name,
            description,
            kind,
            value_type,
            unit,
            label,
        } => {
            let labels =
                label.iter().map(|l| parse_label_descriptor(l)).collect::<Result<Vec<_>>>()?;
            let descriptor = MetricDescriptor {
                name: None,
                metric_type,
                display_name,
                description,
                metric_kind: kind,
                value_type,
                unit,
                labels,
            };
            commands::descriptors::create(&service, &project, descriptor, &mut out).await?;
        }

        Commands::List { filter } => {
            commands::descriptors::list(&service, &project, filter.as_deref(), &mut out).await?;
        }

        Commands::Get { metric_id } => {
            commands::descriptors::get(&service, &project, &metric_id, &mut out).await?;
        }

        Commands::Delete { metric_id } => {
            commands::descriptors::delete(&service, &project, &metric_id, &mut out).await?;
        }

        Commands::Write { metric_type, value, label, resource_type, resource_label } => {
            let labels = parse_pairs(&label)?;
            let mut resource_labels = parse_pairs(&resource_label)?;
            if resource_labels.is_empty() {
                resource_labels.insert("project_id".to_string(), project.project_id().to_string());
            }
            let args = WriteArgs { metric_type, value, labels, resource_type, resource_labels };
            commands::timeseries::write(&service, &project, args, &mut out).await?;
        }

        Commands::Read { filter } => {
            commands::timeseries::read(&service, &project, &filter, &mut out).await?;
        }

        Commands::ReadFields { filter } => {
            commands::timeseries::read_fields(&service, &project, &filter, &mut out).await?;
        }

        Commands::ReadAggregate { filter } => {
            commands::timeseries::read_aggregate(&service, &project, &filter, &mut out).await?;
        }

        Commands::ReadReduce { filter } => {
            commands::timeseries::read_reduce(&service, &project, &filter, &mut out).await?;
        }

        Commands::ListResources { filter } => {
            commands::resources::list_resources(&service, &project, filter.as_deref(), &mut out)
                .await?;
        }

        Commands::GetResource { resource_type } => {
            commands::resources::get_resource(&service, &project, &resource_type, &mut out)
                .await?;
        }
    }

    out.flush()?;
    Ok(())
}

/// Parse `KEY=VALUE` pairs.
fn parse_pairs(values: &[String]) -> Result<BTreeMap<String, String>> {
    values
        .iter()
        .map(|v| match v.split_once('=') {
            Some((key, value)) => Ok((key.to_string(), value.to_string())),
            None => Err(anyhow::anyhow!("Invalid label format: {}", v)),
        })
        .collect()
}

/// Parse `KEY[:TYPE][=DESCRIPTION]`; the type defaults to STRING.
fn parse_label_descriptor(value: &str) -> Result<LabelDescriptor> {
    let (head, description) = value.split_once('=').unwrap_or((value, ""));
    let (key, value_type) = match head.split_once(':') {
        Some((key, ty)) => {
            (key, ty.parse::<LabelValueType>().map_err(|e| anyhow::anyhow!(e))?)
        }
        None => (head, LabelValueType::String),
    };
    Ok(LabelDescriptor::new(key, value_type, description))
}
