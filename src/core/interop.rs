// src/core/interop.rs

//! The correlation table for interop calls.
//!
//! When the application asks the host to run a named call, its continuation is
//! parked here under a fresh key. The key travels with the outbound `interop`
//! message and comes back on the matching `interop_result`, so results can be
//! routed to the exact caller regardless of the order they arrive in.
//!
//! There is no timeout: a result that never arrives leaves its entry resident
//! for the lifetime of the table.

use super::app::Continuation;
use super::errors::RuntimeError;
use crate::connection::ConnectionId;
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;

/// A parked interop call.
pub struct PendingCall<M> {
    /// The connection that issued the call.
    pub owner: ConnectionId,
    pub name: String,
    continuation: Continuation<M>,
}

impl<M> PendingCall<M> {
    /// Feeds the call's result to its continuation.
    pub fn complete(self, value: Value) -> M {
        (self.continuation)(value)
    }
}

/// Key → pending continuation, with a key generator that never repeats.
pub struct CorrelationTable<M> {
    pending: HashMap<u64, PendingCall<M>>,
    last_key: u64,
}

impl<M> CorrelationTable<M> {
    /// Creates an empty table. The first key handed out is `1`.
    pub fn new() -> Self {
        Self::starting_after(0)
    }

    /// Creates an empty table whose first key is `last_key + 1`.
    pub fn starting_after(last_key: u64) -> Self {
        Self {
            pending: HashMap::new(),
            last_key,
        }
    }

    /// Parks a continuation and returns its key.
    ///
    /// Fails only when the key space is exhausted. Keys are never reused.
    pub fn reserve(
        &mut self,
        owner: ConnectionId,
        name: impl Into<String>,
        continuation: Continuation<M>,
    ) -> Result<u64, RuntimeError> {
        let key = self.bump()?;
        let name = name.into();
        debug!("Interop: reserved key {} for '{}' on {}", key, name, owner);
        self.pending.insert(
            key,
            PendingCall {
                owner,
                name,
                continuation,
            },
        );
        Ok(key)
    }

    /// Removes and returns the call parked under `key`.
    pub fn resolve(&mut self, key: u64) -> Result<PendingCall<M>, RuntimeError> {
        self.pending
            .remove(&key)
            .ok_or(RuntimeError::UnknownInteropKey(key))
    }

    /// The connection that owns `key`, without consuming it.
    pub fn owner(&self, key: u64) -> Option<&ConnectionId> {
        self.pending.get(&key).map(|call| &call.owner)
    }

    pub fn contains(&self, key: u64) -> bool {
        self.pending.contains_key(&key)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    fn bump(&mut self) -> Result<u64, RuntimeError> {
        self.last_key = self
            .last_key
            .checked_add(1)
            .ok_or(RuntimeError::InteropKeysExhausted)?;
        Ok(self.last_key)
    }
}

impl<M> Default for CorrelationTable<M> {
    fn default() -> Self {
        Self::new()
    }
}
