use agentlink_common::{AgentLinkError, Envelope, Frame};
use serde_json::Value;
use tokio::sync::oneshot;
use tokio::time::timeout;
use tracing::debug;

use crate::bridge::Bridge;

/// One inbound request: which agent, and what to send it.
#[derive(Debug, Clone)]
pub struct Request {
    pub target: String,
    pub body: Value,
}

/// Correlated command produced from a request, ready to emit.
#[derive(Debug, Clone)]
pub struct Command {
    pub event: String,
    pub envelope: Envelope,
}

impl Bridge {
    /// First stage: wrap the request body in an envelope under a fresh
    /// transaction id. Infallible; target resolution happens at send time.
    pub fn build_command(&self, request: &Request) -> Command {
        Command {
            event: self.settings.event_name.clone(),
            envelope: Envelope::new(request.body.clone()),
        }
    }

    /// Second stage: emit the command on the target's connection and wait
    /// for the correlated reply.
    ///
    /// Fails fast with `AgentNotFound` before anything is registered. Once
    /// the command is on the wire, exactly one of reply payload,
    /// `PeerDisconnected`, or `ResponseTimeout` comes back.
    pub async fn send_command(
        &self,
        request: &Request,
        command: Command,
    ) -> Result<Value, AgentLinkError> {
        let handle = self.agents.get(&request.target).await?;

        let transaction_id = command.envelope.transaction_id.clone();
        let (reply_tx, reply_rx) = oneshot::channel();
        self.transactions
            .register(
                transaction_id.clone(),
                handle.connection_id.clone(),
                reply_tx,
            )
            .await;

        let text = Frame::command(&command.event, &command.envelope)?.to_text()?;
        if handle.tx.send(text).is_err() {
            // lost the race against a disconnect between lookup and emit
            self.transactions.discard(&transaction_id).await;
            return Err(AgentLinkError::PeerDisconnected(request.target.clone()));
        }
        debug!(
            "dispatched '{}' {transaction_id} to '{}'",
            command.event, request.target
        );

        match timeout(self.settings.response_timeout(), reply_rx).await {
            Ok(Ok(payload)) => Ok(payload),
            Ok(Err(_)) => Err(AgentLinkError::PeerDisconnected(request.target.clone())),
            Err(_) => {
                self.transactions.discard(&transaction_id).await;
                Err(AgentLinkError::ResponseTimeout(transaction_id))
            }
        }
    }

    /// Both stages composed: the awaitable request/response API.
    pub async fn dispatch(&self, request: Request) -> Result<Value, AgentLinkError> {
        let command = self.build_command(&request);
        self.send_command(&request, command).await
    }
}
