use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    lens_cli::main_entry().await
}
