#[tokio::main]
pub async fn main() -> Result<(), anyhow::Error> {
    xian_analysis::start_server().await?;
    Ok(())
}
