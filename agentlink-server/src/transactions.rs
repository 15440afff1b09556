use std::collections::HashMap;

use serde_json::Value;
use tokio::sync::{oneshot, Mutex};
use tracing::debug;

/// Pending transactions keyed by transaction id.
///
/// Each entry is completed at most once: `resolve` removes the entry under
/// the map lock before firing the sender, so a duplicate reply finds nothing
/// left to complete.
pub struct PendingTransactions {
    inner: Mutex<HashMap<String, PendingEntry>>,
}

struct PendingEntry {
    reply_tx: oneshot::Sender<Value>,
    connection_id: String,
}

impl PendingTransactions {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
        }
    }

    /// Park a completion sender under a fresh transaction id. The
    /// connection id records which connection the reply must come over, so
    /// a disconnect can fail the right entries.
    pub async fn register(
        &self,
        transaction_id: String,
        connection_id: String,
        reply_tx: oneshot::Sender<Value>,
    ) {
        self.inner.lock().await.insert(
            transaction_id,
            PendingEntry {
                reply_tx,
                connection_id,
            },
        );
    }

    /// Complete a transaction with its reply payload. Unknown ids (late,
    /// duplicate, or never issued) are dropped without effect.
    pub async fn resolve(&self, transaction_id: &str, payload: Value) {
        let entry = self.inner.lock().await.remove(transaction_id);
        match entry {
            Some(entry) => {
                if entry.reply_tx.send(payload).is_err() {
                    debug!("transaction {transaction_id} expired before its reply arrived");
                }
            }
            None => debug!("no pending transaction for {transaction_id}, dropping reply"),
        }
    }

    /// Remove a pending entry without completing it.
    pub async fn discard(&self, transaction_id: &str) {
        self.inner.lock().await.remove(transaction_id);
    }

    /// Drop every entry waiting on `connection_id`. Dropping the senders
    /// wakes the matching dispatches with a closed-channel error. Returns
    /// how many entries were failed.
    pub async fn fail_connection(&self, connection_id: &str) -> usize {
        let mut pending = self.inner.lock().await;
        let before = pending.len();
        pending.retain(|_, entry| entry.connection_id != connection_id);
        before - pending.len()
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn resolve_completes_exactly_once() {
        let pending = PendingTransactions::new();
        let (tx, rx) = oneshot::channel();
        pending.register("t1".into(), "c1".into(), tx).await;

        pending.resolve("t1", json!({"ok": true})).await;
        assert_eq!(rx.await.unwrap(), json!({"ok": true}));

        // second resolve finds nothing and must not panic
        pending.resolve("t1", json!({"ok": false})).await;
        assert!(pending.is_empty().await);
    }

    #[tokio::test]
    async fn unknown_transaction_is_a_noop() {
        let pending = PendingTransactions::new();
        let (tx, rx) = oneshot::channel();
        pending.register("t1".into(), "c1".into(), tx).await;

        pending.resolve("never-issued", json!(null)).await;

        assert_eq!(pending.len().await, 1);
        pending.resolve("t1", json!(1)).await;
        assert_eq!(rx.await.unwrap(), json!(1));
    }

    #[tokio::test]
    async fn fail_connection_drops_only_matching_entries() {
        let pending = PendingTransactions::new();
        let (tx_a1, rx_a1) = oneshot::channel();
        let (tx_a2, rx_a2) = oneshot::channel();
        let (tx_b, rx_b) = oneshot::channel();
        pending.register("a1".into(), "conn-a".into(), tx_a1).await;
        pending.register("a2".into(), "conn-a".into(), tx_a2).await;
        pending.register("b1".into(), "conn-b".into(), tx_b).await;

        assert_eq!(pending.fail_connection("conn-a").await, 2);
        assert!(rx_a1.await.is_err());
        assert!(rx_a2.await.is_err());

        assert_eq!(pending.len().await, 1);
        pending.resolve("b1", json!("still fine")).await;
        assert_eq!(rx_b.await.unwrap(), json!("still fine"));
    }

    #[tokio::test]
    async fn discard_removes_without_completing() {
        let pending = PendingTransactions::new();
        let (tx, mut rx) = oneshot::channel();
        pending.register("t1".into(), "c1".into(), tx).await;

        pending.discard("t1").await;
        assert!(pending.is_empty().await);
        assert!(rx.try_recv().is_err());
    }
}
