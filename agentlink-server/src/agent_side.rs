use std::sync::Arc;

use agentlink_common::protocol::{self, Frame, Reply};
use anyhow::Result;
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::bridge::Bridge;
use crate::registry::AgentHandle;

/// Accept agent connections and run one lifecycle task per connection.
pub async fn run(listener: TcpListener, bridge: Arc<Bridge>) -> Result<()> {
    loop {
        let (stream, peer) = listener.accept().await?;
        debug!("incoming agent connection from {peer}");
        let bridge = bridge.clone();
        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, bridge).await {
                warn!("agent connection {peer} error: {e}");
            }
        });
    }
}

async fn handle_connection(stream: TcpStream, bridge: Arc<Bridge>) -> Result<()> {
    let ws = accept_async(stream).await?;
    let (mut sink, mut stream) = ws.split();
    let socket_id = Uuid::new_v4().to_string();

    // --- Challenge round-trip ---
    let challenge = Frame::challenge(&socket_id)?.to_text()?;
    sink.send(Message::Text(challenge)).await?;

    let identification =
        match timeout(bridge.settings.handshake_timeout(), stream.next()).await {
            Ok(Some(Ok(Message::Text(text)))) => text,
            Ok(_) => {
                debug!("connection {socket_id} closed before identifying");
                return Ok(());
            }
            Err(_) => {
                warn!("connection {socket_id} never identified, dropping");
                return Ok(());
            }
        };

    let reply: Value = match serde_json::from_str(&identification) {
        Ok(value) => value,
        Err(e) => {
            warn!("connection {socket_id} sent unreadable identification: {e}");
            return Ok(());
        }
    };

    if !(bridge.validator)(&reply) {
        info!("rejecting connection {socket_id}");
        let _ = sink.send(Message::Close(None)).await;
        return Ok(());
    }

    let name = reply
        .get("name")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<String>();
    bridge
        .agents
        .put(
            name.clone(),
            AgentHandle {
                connection_id: socket_id.clone(),
                tx,
            },
        )
        .await;

    // --- Frame pump ---
    loop {
        tokio::select! {
            msg = stream.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        handle_frame(&text, &bridge).await;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if sink.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        warn!("connection {socket_id} ('{name}') WS error: {e}");
                        break;
                    }
                    _ => {}
                }
            }
            Some(outbound) = rx.recv() => {
                if sink.send(Message::Text(outbound)).await.is_err() {
                    warn!("connection {socket_id} ('{name}') write failed");
                    break;
                }
            }
        }
    }

    let failed = bridge.transactions.fail_connection(&socket_id).await;
    if failed > 0 {
        warn!("connection {socket_id} ('{name}') closed with {failed} pending transaction(s)");
    }
    bridge.agents.remove_connection(&socket_id).await;
    info!("agent '{name}' disconnected");
    Ok(())
}

/// Route one inbound frame. Only `CLIENT_RESPONSE` means anything to the
/// bridge; everything else is logged and dropped.
async fn handle_frame(text: &str, bridge: &Bridge) {
    let frame = match Frame::parse(text) {
        Ok(frame) => frame,
        Err(e) => {
            warn!("dropping malformed frame: {e}");
            return;
        }
    };

    if frame.event != protocol::CLIENT_RESPONSE {
        debug!("ignoring unexpected '{}' frame from agent", frame.event);
        return;
    }

    match frame.decode::<Reply>() {
        Ok(reply) => {
            bridge
                .transactions
                .resolve(&reply.transaction_id, reply.payload)
                .await;
        }
        Err(e) => warn!("dropping CLIENT_RESPONSE without a transaction id: {e}"),
    }
}
