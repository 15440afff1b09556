use std::sync::Arc;

use agentlink_server::config::{Cli, ServerConfig};
use agentlink_server::{agent_side, Bridge};
use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("agentlink_server=debug,info")
        .init();

    let cli = Cli::parse();
    let config = ServerConfig::load(&cli.config)?;
    info!("Loaded config from {:?}", cli.config);

    let bridge = Arc::new(Bridge::new(config.bridge.clone()));

    let addr = config.listen_addr();
    let listener = TcpListener::bind(&addr).await?;
    info!("Agent WebSocket server listening on {addr}");

    agent_side::run(listener, bridge).await
}
