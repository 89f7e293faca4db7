//! StreamKey Registry server binary.

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    streamkey_registry::server::run().await
}
