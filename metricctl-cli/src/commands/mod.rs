//! CLI command implementations
//!
//! Each command takes the service facade and an output sink; nothing here
//! talks to the network directly.

pub mod descriptors;
pub mod resources;
pub mod timeseries;
