use std::path::PathBuf;
use std::time::Duration;

use agentlink_common::protocol::DEFAULT_COMMAND_EVENT;
use clap::Parser;
use serde::Deserialize;

#[derive(Parser, Debug)]
#[command(name = "agentlink-server", about = "AgentLink command bridge server")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "config/server.toml")]
    pub config: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub server: ListenConfig,
    #[serde(default)]
    pub bridge: BridgeSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListenConfig {
    pub host: String,
    pub port: u16,
}

/// Tunables for the dispatch path.
#[derive(Debug, Clone, Deserialize)]
pub struct BridgeSettings {
    /// Event name stamped on outbound command frames.
    #[serde(default = "default_event_name")]
    pub event_name: String,
    /// How long a new connection may take to answer the challenge.
    #[serde(default = "default_handshake_timeout_ms")]
    pub handshake_timeout_ms: u64,
    /// How long a dispatched command may wait for its reply.
    #[serde(default = "default_response_timeout_ms")]
    pub response_timeout_ms: u64,
}

fn default_event_name() -> String {
    DEFAULT_COMMAND_EVENT.to_string()
}

fn default_handshake_timeout_ms() -> u64 {
    5_000
}

fn default_response_timeout_ms() -> u64 {
    30_000
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self {
            event_name: default_event_name(),
            handshake_timeout_ms: default_handshake_timeout_ms(),
            response_timeout_ms: default_response_timeout_ms(),
        }
    }
}

impl BridgeSettings {
    pub fn handshake_timeout(&self) -> Duration {
        Duration::from_millis(self.handshake_timeout_ms)
    }

    pub fn response_timeout(&self) -> Duration {
        Duration::from_millis(self.response_timeout_ms)
    }
}

impl ServerConfig {
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
