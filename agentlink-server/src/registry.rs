use std::collections::HashMap;

use agentlink_common::AgentLinkError;
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, info};

/// Outbound half of one agent connection; the connection's writer drains it.
pub type Tx = mpsc::UnboundedSender<String>;

/// Live connection handle stored per agent name.
#[derive(Debug, Clone)]
pub struct AgentHandle {
    pub connection_id: String,
    pub tx: Tx,
}

impl AgentHandle {
    pub fn is_live(&self) -> bool {
        !self.tx.is_closed()
    }
}

/// Agent name → live connection handle. A reconnect under the same name
/// overwrites the previous mapping.
pub struct AgentRegistry {
    inner: RwLock<HashMap<String, AgentHandle>>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }

    pub async fn put(&self, name: String, handle: AgentHandle) {
        info!("assigning '{name}' to connection {}", handle.connection_id);
        self.inner.write().await.insert(name, handle);
    }

    /// Current live handle for `name`. A name mapped to a dead connection
    /// behaves exactly like an unmapped name.
    pub async fn get(&self, name: &str) -> Result<AgentHandle, AgentLinkError> {
        match self.inner.read().await.get(name) {
            Some(handle) if handle.is_live() => Ok(handle.clone()),
            _ => Err(AgentLinkError::AgentNotFound(name.to_string())),
        }
    }

    /// Drop whatever name still maps to `connection_id`. An entry already
    /// superseded by a reconnect is left alone.
    pub async fn remove_connection(&self, connection_id: &str) {
        self.inner.write().await.retain(|name, handle| {
            if handle.connection_id == connection_id {
                debug!("removing '{name}' for closed connection {connection_id}");
                false
            } else {
                true
            }
        });
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle(connection_id: &str) -> (AgentHandle, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            AgentHandle {
                connection_id: connection_id.to_string(),
                tx,
            },
            rx,
        )
    }

    #[tokio::test]
    async fn later_connect_supersedes_earlier_one() {
        let registry = AgentRegistry::new();
        let (first, _rx1) = handle("c1");
        let (second, _rx2) = handle("c2");

        registry.put("agentA".into(), first).await;
        registry.put("agentA".into(), second).await;

        let current = registry.get("agentA").await.unwrap();
        assert_eq!(current.connection_id, "c2");
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn missing_name_is_not_found() {
        let registry = AgentRegistry::new();
        let err = registry.get("nobody").await.unwrap_err();
        assert!(matches!(err, AgentLinkError::AgentNotFound(name) if name == "nobody"));
    }

    #[tokio::test]
    async fn dead_connection_behaves_like_missing_name() {
        let registry = AgentRegistry::new();
        let (stale, rx) = handle("c1");
        registry.put("agentA".into(), stale).await;

        drop(rx);
        let err = registry.get("agentA").await.unwrap_err();
        assert!(matches!(err, AgentLinkError::AgentNotFound(_)));
    }

    #[tokio::test]
    async fn teardown_of_superseded_connection_keeps_new_entry() {
        let registry = AgentRegistry::new();
        let (first, _rx1) = handle("c1");
        let (second, _rx2) = handle("c2");
        registry.put("agentA".into(), first).await;
        registry.put("agentA".into(), second).await;

        // c1's lifecycle task cleaning up after itself must not evict c2
        registry.remove_connection("c1").await;
        assert_eq!(registry.get("agentA").await.unwrap().connection_id, "c2");

        registry.remove_connection("c2").await;
        assert!(registry.get("agentA").await.is_err());
    }
}
