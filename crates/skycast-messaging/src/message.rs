use std::collections::BTreeMap;

use serde::Serialize;
use serde::de::DeserializeOwned;
use uuid::Uuid;

/// Header carrying the idempotence key of a message.
pub const MESSAGE_ID_HEADER: &str = "message_id";

pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Transport-neutral message as it travels over the bus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusMessage {
    pub headers: BTreeMap<String, String>,
    pub content_type: String,
    pub body: Vec<u8>,
}

impl BusMessage {
    /// A JSON message from an already-encoded body.
    pub fn from_json_bytes(body: Vec<u8>) -> Self {
        Self {
            headers: BTreeMap::new(),
            content_type: JSON_CONTENT_TYPE.to_owned(),
            body,
        }
    }

    pub fn json<T: Serialize>(value: &T) -> Result<Self, serde_json::Error> {
        Ok(Self::from_json_bytes(serde_json::to_vec(value)?))
    }

    pub fn with_message_id(self, id: Uuid) -> Self {
        self.with_header(MESSAGE_ID_HEADER, id.to_string())
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// The `message_id` header, if present and non-blank.
    pub fn message_id(&self) -> Option<&str> {
        self.headers
            .get(MESSAGE_ID_HEADER)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}
