// src/core/mod.rs

//! The central module containing the dispatch logic and its supporting types.

pub mod app;
pub mod classifier;
pub mod dispatcher;
pub mod errors;
pub mod interop;
pub mod metrics;
pub mod protocol;

pub use app::{Application, Cmd, Commands, ConfigResult, Step};
pub use classifier::{Command, ProcessingError};
pub use dispatcher::Dispatcher;
pub use errors::RuntimeError;
pub use interop::CorrelationTable;
pub use protocol::{Body, InboundEnvelope, Outbound, Request, Response};
