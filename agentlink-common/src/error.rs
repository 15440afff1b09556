use std::fmt;

#[derive(Debug)]
pub enum AgentLinkError {
    /// Target name is unknown, or its connection is no longer live.
    AgentNotFound(String),
    /// Connect validator rejected the identification reply.
    HandshakeRejected,
    /// The connection backing a pending transaction went away first.
    PeerDisconnected(String),
    /// No reply arrived for the transaction within the configured bound.
    ResponseTimeout(String),
    WebSocket(String),
    Io(std::io::Error),
    Json(serde_json::Error),
}

impl fmt::Display for AgentLinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AgentNotFound(name) => write!(f, "agent not found: {name}"),
            Self::HandshakeRejected => write!(f, "handshake rejected"),
            Self::PeerDisconnected(detail) => write!(f, "peer disconnected: {detail}"),
            Self::ResponseTimeout(id) => write!(f, "no response for transaction {id}"),
            Self::WebSocket(msg) => write!(f, "WebSocket error: {msg}"),
            Self::Io(e) => write!(f, "IO error: {e}"),
            Self::Json(e) => write!(f, "JSON error: {e}"),
        }
    }
}

impl std::error::Error for AgentLinkError {}

impl From<std::io::Error> for AgentLinkError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<serde_json::Error> for AgentLinkError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}
