use std::sync::Arc;

use agentlink_common::protocol::{self, Challenge, Envelope, Frame, Identification, Reply};
use anyhow::Result;
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

/// Invoked once per inbound command with the event name and the command
/// body; the returned value is sent back as the reply payload under the
/// command's transaction id. Runs inline on the connection task.
pub type CommandHandler = Arc<dyn Fn(&str, Value) -> Value + Send + Sync>;

/// Connect to the server, answer its challenge, then serve commands until
/// the connection closes.
pub async fn run_agent(
    server_url: &str,
    name: Option<&str>,
    handler: CommandHandler,
) -> Result<()> {
    info!("connecting to {server_url}");
    let (ws, _) = connect_async(server_url).await?;
    let (mut sink, mut stream) = ws.split();

    // --- Challenge round-trip ---
    let text = match stream.next().await {
        Some(Ok(Message::Text(text))) => text,
        other => anyhow::bail!("connection closed before challenge: {other:?}"),
    };
    let frame = Frame::parse(&text)?;
    if frame.event != protocol::CLIENT_CONNECTED {
        anyhow::bail!("expected challenge, got '{}' frame", frame.event);
    }
    let challenge: Challenge = frame.decode()?;
    if !challenge.is_set_socket_id() {
        anyhow::bail!("unexpected challenge type: {}", challenge.kind);
    }
    info!("assigned socket id {}", challenge.payload.socket_id);

    let identification = match name {
        Some(name) => Identification::named(name),
        None => Identification::default(),
    };
    sink.send(Message::Text(serde_json::to_string(&identification)?))
        .await?;

    // --- Serve commands ---
    while let Some(msg) = stream.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                let frame = match Frame::parse(&text) {
                    Ok(frame) => frame,
                    Err(e) => {
                        warn!("dropping malformed frame: {e}");
                        continue;
                    }
                };
                let envelope: Envelope = match frame.decode() {
                    Ok(envelope) => envelope,
                    Err(e) => {
                        warn!("dropping '{}' frame without an envelope: {e}", frame.event);
                        continue;
                    }
                };
                debug!("handling '{}' command {}", frame.event, envelope.transaction_id);
                let payload = handler(&frame.event, envelope.body);
                let reply = Frame::response(&Reply::new(envelope.transaction_id, payload))?;
                sink.send(Message::Text(reply.to_text()?)).await?;
            }
            Ok(Message::Ping(data)) => {
                sink.send(Message::Pong(data)).await?;
            }
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                warn!("WS error: {e}");
                break;
            }
        }
    }

    Ok(())
}
