// src/connection/mod.rs

//! In-flight request state: the per-request `Conn` entity and the pool that
//! tracks every connection until it is finalized.

mod conn;
mod id;
mod pool;

pub use conn::Conn;
pub use id::ConnectionId;
pub use pool::ConnectionPool;
