//! metricctl gRPC API
//!
//! Wire contract for the hosted time-series metrics service.
//! The protobuf definitions are in `proto/metricctl/v1/metric_service.proto`
//! and code-generated via `tonic-build` (client and server stubs).

// Include the generated code
pub mod metricctl {
    pub mod v1 {
        tonic::include_proto!("metricctl.v1");
    }
}

pub use metricctl::v1;
