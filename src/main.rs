//! Delego broker entry point.

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    delego_broker::server::run().await
}
