use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    drip_client::run().await
}
