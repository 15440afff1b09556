use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Event of the challenge frame sent to every freshly accepted connection.
pub const CLIENT_CONNECTED: &str = "CLIENT_CONNECTED";
/// Event of every reply frame an agent sends back to the server.
pub const CLIENT_RESPONSE: &str = "CLIENT_RESPONSE";
/// Default event name for outbound command frames.
pub const DEFAULT_COMMAND_EVENT: &str = "ACTION";
/// Discriminator inside the challenge payload.
pub const SERVER_SET_SOCKET_ID: &str = "SERVER_SET_SOCKET_ID";

/// Generic wire frame. Everything exchanged after the WS upgrade is a JSON
/// text frame of the shape `{"event": ..., "payload": ...}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Frame {
    pub event: String,
    pub payload: Value,
}

/// Payload of the `CLIENT_CONNECTED` challenge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Challenge {
    #[serde(rename = "type")]
    pub kind: String,
    pub payload: SocketRef,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SocketRef {
    pub socket_id: String,
}

/// Identification an agent sends back after the challenge. The server
/// accepts any JSON object here; `name` is the one field it looks at.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Identification {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Payload of an outbound command frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    pub transaction_id: String,
    pub body: Value,
}

/// Payload of an inbound `CLIENT_RESPONSE` frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reply {
    pub transaction_id: String,
    pub payload: Value,
}

impl Challenge {
    pub fn new(socket_id: impl Into<String>) -> Self {
        Self {
            kind: SERVER_SET_SOCKET_ID.into(),
            payload: SocketRef {
                socket_id: socket_id.into(),
            },
        }
    }

    pub fn is_set_socket_id(&self) -> bool {
        self.kind == SERVER_SET_SOCKET_ID
    }
}

impl Identification {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
        }
    }
}

impl Envelope {
    /// Wrap a request body under a fresh transaction id.
    pub fn new(body: Value) -> Self {
        Self {
            transaction_id: Uuid::new_v4().to_string(),
            body,
        }
    }
}

impl Reply {
    pub fn new(transaction_id: impl Into<String>, payload: Value) -> Self {
        Self {
            transaction_id: transaction_id.into(),
            payload,
        }
    }
}

impl Frame {
    pub fn new(event: impl Into<String>, payload: &impl Serialize) -> serde_json::Result<Self> {
        Ok(Self {
            event: event.into(),
            payload: serde_json::to_value(payload)?,
        })
    }

    pub fn challenge(socket_id: &str) -> serde_json::Result<Self> {
        Self::new(CLIENT_CONNECTED, &Challenge::new(socket_id))
    }

    pub fn command(event: &str, envelope: &Envelope) -> serde_json::Result<Self> {
        Self::new(event, envelope)
    }

    pub fn response(reply: &Reply) -> serde_json::Result<Self> {
        Self::new(CLIENT_RESPONSE, reply)
    }

    pub fn to_text(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn parse(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    /// Deserialize the payload into a typed view.
    pub fn decode<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_value(self.payload.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn challenge_frame_matches_wire_shape() {
        let frame = Frame::challenge("sock-1").unwrap();
        assert_eq!(frame.event, CLIENT_CONNECTED);
        assert_eq!(
            frame.payload,
            json!({"type": "SERVER_SET_SOCKET_ID", "payload": {"socket_id": "sock-1"}})
        );
    }

    #[test]
    fn envelope_carries_body_under_fresh_id() {
        let envelope = Envelope::new(json!({"cmd": "ping"}));
        assert!(!envelope.transaction_id.is_empty());
        let frame = Frame::command(DEFAULT_COMMAND_EVENT, &envelope).unwrap();
        assert_eq!(frame.event, "ACTION");
        assert_eq!(frame.payload["transaction_id"], envelope.transaction_id);
        assert_eq!(frame.payload["body"], json!({"cmd": "ping"}));
    }

    #[test]
    fn anonymous_identification_omits_name() {
        let text = serde_json::to_string(&Identification::default()).unwrap();
        assert_eq!(text, "{}");
        let id: Identification = serde_json::from_str("{\"name\":\"agentA\"}").unwrap();
        assert_eq!(id.name.as_deref(), Some("agentA"));
    }
}
