// src/connection/pool.rs

//! Defines `ConnectionPool`, the live set of pending connections.

use super::conn::Conn;
use super::id::ConnectionId;
use crate::core::{Application, RuntimeError};
use std::collections::HashMap;
use tracing::debug;

/// Maps connection ids to their pending `Conn`.
///
/// At most one entity lives under an id. Every operation is a single
/// transformation of the map; the pool is owned by one dispatcher and only
/// touched from inside a dispatch step, so no locking is involved.
pub struct ConnectionPool<A: Application> {
    conns: HashMap<ConnectionId, Conn<A>>,
}

impl<A: Application> ConnectionPool<A> {
    pub fn new() -> Self {
        Self {
            conns: HashMap::new(),
        }
    }

    /// Inserts a new connection. Fails if the id is already in flight.
    pub fn add(&mut self, conn: Conn<A>) -> Result<(), RuntimeError> {
        if self.conns.contains_key(conn.id()) {
            return Err(RuntimeError::DuplicateConnection(conn.id().clone()));
        }
        debug!("Pool: adding connection {}", conn.id());
        self.conns.insert(conn.id().clone(), conn);
        Ok(())
    }

    pub fn get(&self, id: &ConnectionId) -> Result<&Conn<A>, RuntimeError> {
        self.conns
            .get(id)
            .ok_or_else(|| RuntimeError::UnknownConnection(id.clone()))
    }

    /// Overwrites the entry for `conn.id()`. The id must already be present.
    pub fn replace(&mut self, conn: Conn<A>) -> Result<(), RuntimeError> {
        match self.conns.get_mut(conn.id()) {
            Some(slot) => {
                *slot = conn;
                Ok(())
            }
            None => Err(RuntimeError::NotInPool(conn.id().clone())),
        }
    }

    /// Removes and returns the entry for `id`. Removing an absent id is an error.
    pub fn remove(&mut self, id: &ConnectionId) -> Result<Conn<A>, RuntimeError> {
        let conn = self
            .conns
            .remove(id)
            .ok_or_else(|| RuntimeError::NotInPool(id.clone()))?;
        debug!("Pool: removed connection {}", id);
        Ok(conn)
    }

    pub fn contains(&self, id: &ConnectionId) -> bool {
        self.conns.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.conns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conns.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &ConnectionId> {
        self.conns.keys()
    }
}

impl<A: Application> Default for ConnectionPool<A> {
    fn default() -> Self {
        Self::new()
    }
}
