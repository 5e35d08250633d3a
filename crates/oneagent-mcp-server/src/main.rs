use clap::Parser;
use oneagent_mcp_server::{observability, run, ServerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::parse();
    observability::init(&config.log_level, config.stdio)?;
    run(config).await
}
