#[tokio::main]
async fn main() -> eyre::Result<()> {
    floodcast::run().start().await
}
