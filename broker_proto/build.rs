//! Compile the broker's `ConsumerService` definition into the client stub
//! used by `taskbroker-client`.

fn main() -> Result<(), Box<dyn std::error::Error>> {
    std::env::set_var("PROTOC", protoc_bin_vendored::protoc_bin_path()?);

    tonic_build::configure()
        .build_server(false)
        .build_client(true)
        .compile_protos(
            &["proto/sentry_protos/taskbroker/v1/taskbroker.proto"],
            &["proto/"],
        )?;
    Ok(())
}
