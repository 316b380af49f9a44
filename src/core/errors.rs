// src/core/errors.rs

//! Defines the primary error type for the runtime.

use crate::connection::ConnectionId;
use std::sync::Arc;
use thiserror::Error;

/// Every failure the runtime can produce.
///
/// Most variants are per-request: the dispatcher turns them into a response for
/// the offending connection and carries on. The fatal ones (see
/// [`RuntimeError::is_fatal`]) mean the host or the runtime itself misbehaved and
/// are returned from `Dispatcher::step` instead.
#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("Application configuration failed to decode: {0}")]
    ConfigDecode(String),

    #[error(
        "Failed to decode the request payload ({0}). The host and the runtime are probably running mismatched versions."
    )]
    RequestDecode(String),

    #[error("No route matches path '{0}'")]
    RouteNotFound(String),

    #[error("Failed to decode message for the application: {0}")]
    MessageDecode(String),

    #[error("No connection with id '{0}'")]
    UnknownConnection(ConnectionId),

    #[error("No pending interop call with key {0}")]
    UnknownInteropKey(u64),

    #[error("Interop key {key} belongs to connection '{owner}', not '{id}'")]
    InteropOwnerMismatch {
        key: u64,
        owner: ConnectionId,
        id: ConnectionId,
    },

    #[error("Application returned connection '{actual}' while handling '{expected}'")]
    ConnectionIdChanged {
        expected: ConnectionId,
        actual: ConnectionId,
    },

    #[error("Connection id '{0}' is already in flight")]
    DuplicateConnection(ConnectionId),

    #[error("Connection '{0}' is not in the pool")]
    NotInPool(ConnectionId),

    #[error("Interop key space exhausted")]
    InteropKeysExhausted,

    #[error("Channel closed")]
    ChannelClosed,

    #[error("IO Error: {0}")]
    Io(Arc<std::io::Error>),

    #[error("JSON error: {0}")]
    Json(String),
}

impl RuntimeError {
    /// True for errors that indicate host or runtime misbehavior rather than a bad
    /// request. These stop the worker instead of producing a response.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            RuntimeError::DuplicateConnection(_)
                | RuntimeError::NotInPool(_)
                | RuntimeError::InteropKeysExhausted
                | RuntimeError::ChannelClosed
                | RuntimeError::Io(_)
        )
    }

    /// The HTTP status used when this error is answered on behalf of a request.
    pub fn status(&self) -> u16 {
        match self {
            RuntimeError::RouteNotFound(_) => 404,
            _ => 500,
        }
    }

    /// Internal errors never show their detail to the caller.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            RuntimeError::ConfigDecode(_) | RuntimeError::ConnectionIdChanged { .. }
        )
    }

    /// A short, stable label for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            RuntimeError::ConfigDecode(_) => "config_decode",
            RuntimeError::RequestDecode(_) => "request_decode",
            RuntimeError::RouteNotFound(_) => "route_not_found",
            RuntimeError::MessageDecode(_) => "message_decode",
            RuntimeError::UnknownConnection(_) => "unknown_connection",
            RuntimeError::UnknownInteropKey(_) => "unknown_interop_key",
            RuntimeError::InteropOwnerMismatch { .. } => "interop_owner_mismatch",
            RuntimeError::ConnectionIdChanged { .. } => "connection_id_changed",
            RuntimeError::DuplicateConnection(_) => "duplicate_connection",
            RuntimeError::NotInPool(_) => "not_in_pool",
            RuntimeError::InteropKeysExhausted => "interop_keys_exhausted",
            RuntimeError::ChannelClosed => "channel_closed",
            RuntimeError::Io(_) => "io",
            RuntimeError::Json(_) => "json",
        }
    }
}

// Manual implementation of Clone because `std::io::Error` is not cloneable.
impl Clone for RuntimeError {
    fn clone(&self) -> Self {
        match self {
            RuntimeError::ConfigDecode(s) => RuntimeError::ConfigDecode(s.clone()),
            RuntimeError::RequestDecode(s) => RuntimeError::RequestDecode(s.clone()),
            RuntimeError::RouteNotFound(s) => RuntimeError::RouteNotFound(s.clone()),
            RuntimeError::MessageDecode(s) => RuntimeError::MessageDecode(s.clone()),
            RuntimeError::UnknownConnection(id) => RuntimeError::UnknownConnection(id.clone()),
            RuntimeError::UnknownInteropKey(key) => RuntimeError::UnknownInteropKey(*key),
            RuntimeError::InteropOwnerMismatch { key, owner, id } => {
                RuntimeError::InteropOwnerMismatch {
                    key: *key,
                    owner: owner.clone(),
                    id: id.clone(),
                }
            }
            RuntimeError::ConnectionIdChanged { expected, actual } => {
                RuntimeError::ConnectionIdChanged {
                    expected: expected.clone(),
                    actual: actual.clone(),
                }
            }
            RuntimeError::DuplicateConnection(id) => RuntimeError::DuplicateConnection(id.clone()),
            RuntimeError::NotInPool(id) => RuntimeError::NotInPool(id.clone()),
            RuntimeError::InteropKeysExhausted => RuntimeError::InteropKeysExhausted,
            RuntimeError::ChannelClosed => RuntimeError::ChannelClosed,
            RuntimeError::Io(e) => RuntimeError::Io(Arc::clone(e)),
            RuntimeError::Json(s) => RuntimeError::Json(s.clone()),
        }
    }
}

impl PartialEq for RuntimeError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (RuntimeError::Io(e1), RuntimeError::Io(e2)) => e1.to_string() == e2.to_string(),
            (RuntimeError::ConfigDecode(s1), RuntimeError::ConfigDecode(s2)) => s1 == s2,
            (RuntimeError::RequestDecode(s1), RuntimeError::RequestDecode(s2)) => s1 == s2,
            (RuntimeError::RouteNotFound(s1), RuntimeError::RouteNotFound(s2)) => s1 == s2,
            (RuntimeError::MessageDecode(s1), RuntimeError::MessageDecode(s2)) => s1 == s2,
            (RuntimeError::UnknownConnection(a), RuntimeError::UnknownConnection(b)) => a == b,
            (RuntimeError::UnknownInteropKey(a), RuntimeError::UnknownInteropKey(b)) => a == b,
            (
                RuntimeError::InteropOwnerMismatch {
                    key: k1,
                    owner: o1,
                    id: i1,
                },
                RuntimeError::InteropOwnerMismatch {
                    key: k2,
                    owner: o2,
                    id: i2,
                },
            ) => k1 == k2 && o1 == o2 && i1 == i2,
            (
                RuntimeError::ConnectionIdChanged {
                    expected: e1,
                    actual: a1,
                },
                RuntimeError::ConnectionIdChanged {
                    expected: e2,
                    actual: a2,
                },
            ) => e1 == e2 && a1 == a2,
            (RuntimeError::DuplicateConnection(a), RuntimeError::DuplicateConnection(b)) => a == b,
            (RuntimeError::NotInPool(a), RuntimeError::NotInPool(b)) => a == b,
            (RuntimeError::Json(s1), RuntimeError::Json(s2)) => s1 == s2,
            _ => core::mem::discriminant(self) == core::mem::discriminant(other),
        }
    }
}

// --- From trait implementations for easy error conversion ---

impl From<std::io::Error> for RuntimeError {
    fn from(e: std::io::Error) -> Self {
        RuntimeError::Io(Arc::new(e))
    }
}

impl From<serde_json::Error> for RuntimeError {
    fn from(e: serde_json::Error) -> Self {
        RuntimeError::Json(e.to_string())
    }
}
