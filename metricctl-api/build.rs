// Code generation for the metric service protobuf definitions

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("cargo:rerun-if-changed=proto/metricctl/v1/metric_service.proto");

    tonic_build::configure()
        .build_server(true)
        .build_client(true)
        // Label maps are ordered so identical requests encode identically.
        .btree_map(["."])
        .compile(&["proto/metricctl/v1/metric_service.proto"], &["proto"])?;
    Ok(())
}
