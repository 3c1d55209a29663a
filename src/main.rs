#[tokio::main]
async fn main() -> anyhow::Result<()> {
    bloodtrack_lib::run().await
}
