// src/core/protocol/mod.rs

//! Wire-level types exchanged with the host: request/response records and the
//! inbound/outbound envelopes that carry them.

pub mod envelope;
pub mod http;
pub use envelope::{InboundEnvelope, InboundKind, Outbound};
pub use http::{Body, Headers, Method, QueryMap, Request, Response};
