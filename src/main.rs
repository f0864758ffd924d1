use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    gateway_auth::app::run().await
}
