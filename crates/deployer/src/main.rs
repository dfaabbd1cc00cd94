#[tokio::main]
async fn main() -> anyhow::Result<()> {
    deployer::start(std::env::args()).await?;
    Ok(())
}
