// src/lib.rs

pub mod config;
pub mod connection;
pub mod core;
pub mod demo;
pub mod server;

// Re-export
pub use crate::connection::{Conn, ConnectionId};
pub use crate::core::{Application, Cmd, Dispatcher, RuntimeError};
