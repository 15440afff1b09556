use std::sync::Arc;

use agentlink_agent::config::{AgentConfig, Cli};
use agentlink_agent::{client, CommandHandler};
use clap::Parser;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("agentlink_agent=debug,info")
        .init();

    let cli = Cli::parse();
    let cfg = AgentConfig::load(&cli.config)?;
    info!(
        "agent: server={}, name={}",
        cfg.agent.server_url,
        cfg.agent.name.as_deref().unwrap_or("<generated>")
    );

    // Echoes every command body straight back; stands in for a real local
    // command executor.
    let handler: CommandHandler = Arc::new(|_event: &str, body: serde_json::Value| body);

    let mut backoff = cfg.agent.reconnect_base_ms;

    loop {
        match client::run_agent(
            &cfg.agent.server_url,
            cfg.agent.name.as_deref(),
            handler.clone(),
        )
        .await
        {
            Ok(()) => {
                info!("agent: connection closed, reconnecting...");
                backoff = cfg.agent.reconnect_base_ms;
            }
            Err(e) => {
                error!("agent: connection error: {e}");
            }
        }

        info!("agent: reconnecting in {backoff}ms");
        tokio::time::sleep(std::time::Duration::from_millis(backoff)).await;
        backoff = (backoff * 2).min(cfg.agent.reconnect_max_ms);
    }
}
