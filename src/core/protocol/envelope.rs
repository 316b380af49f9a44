// src/core/protocol/envelope.rs

//! Envelopes exchanged with the host over its message channel.
//!
//! Inbound envelopes are newline-delimited JSON objects tagged by `type`:
//!
//! ```text
//! {"id":"c1","type":"request","payload":{"method":"GET","path":"/"}}
//! {"id":"c1","type":"message","payload":{"msg":"slept","ms":10}}
//! {"id":"c1","type":"interop_result","key":3,"value":"..."}
//! ```

use super::http::Response;
use crate::connection::ConnectionId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A message delivered by the host for one connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboundEnvelope {
    pub id: ConnectionId,
    #[serde(flatten)]
    pub kind: InboundKind,
}

/// What an inbound envelope carries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundKind {
    /// A raw request record for a new connection.
    Request { payload: Value },
    /// The result of a side effect, to be decoded into an application message.
    Message { payload: Value },
    /// The result of an interop call, routed by its correlation key.
    InteropResult { key: u64, value: Value },
}

impl InboundEnvelope {
    pub fn request(id: impl Into<ConnectionId>, payload: Value) -> Self {
        Self {
            id: id.into(),
            kind: InboundKind::Request { payload },
        }
    }

    pub fn message(id: impl Into<ConnectionId>, payload: Value) -> Self {
        Self {
            id: id.into(),
            kind: InboundKind::Message { payload },
        }
    }

    pub fn interop_result(id: impl Into<ConnectionId>, key: u64, value: Value) -> Self {
        Self {
            id: id.into(),
            kind: InboundKind::InteropResult { key, value },
        }
    }

    /// Short name of the envelope kind, for logging.
    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            InboundKind::Request { .. } => "request",
            InboundKind::Message { .. } => "message",
            InboundKind::InteropResult { .. } => "interop_result",
        }
    }
}

/// Everything the dispatcher hands back to the host.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Outbound<E> {
    /// The final response for a connection. Emitted exactly once per id.
    Respond { id: ConnectionId, response: Response },
    /// A side effect for the host to execute. Its result comes back as a
    /// `message` envelope with the same id.
    Effect { id: ConnectionId, effect: E },
    /// An interop call. Its result comes back as an `interop_result` envelope
    /// carrying the same id and key.
    Interop {
        id: ConnectionId,
        key: u64,
        name: String,
        args: Value,
    },
}

impl<E> Outbound<E> {
    pub fn id(&self) -> &ConnectionId {
        match self {
            Outbound::Respond { id, .. } => id,
            Outbound::Effect { id, .. } => id,
            Outbound::Interop { id, .. } => id,
        }
    }

    /// The response, if this is a `Respond` message.
    pub fn response(&self) -> Option<&Response> {
        match self {
            Outbound::Respond { response, .. } => Some(response),
            _ => None,
        }
    }
}
