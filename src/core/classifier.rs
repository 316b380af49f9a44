// src/core/classifier.rs

//! Turns an inbound envelope into exactly one internal [`Command`].
//!
//! Classification never fails outright: anything malformed becomes a
//! [`Command::ProcessingError`] for the envelope's id.

use super::app::{Application, ConfigResult};
use super::errors::RuntimeError;
use super::interop::CorrelationTable;
use super::protocol::{Body, InboundEnvelope, InboundKind, Request, Response};
use crate::connection::{Conn, ConnectionId};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Body used for internal errors in place of their detail.
pub const INTERNAL_ERROR_BODY: &str = "Internal Server Error";

/// The internal command produced for one inbound envelope.
pub enum Command<A: Application> {
    /// A fully decoded new request, ready for the application's `endpoint`.
    NewRequest(Conn<A>),
    /// A message for the pending connection `id`.
    Continue { id: ConnectionId, msg: A::Msg },
    /// The envelope could not be processed; answer `id` with an error.
    ProcessingError {
        id: ConnectionId,
        error: ProcessingError,
    },
}

impl<A: Application> Command<A> {
    pub fn id(&self) -> &ConnectionId {
        match self {
            Command::NewRequest(conn) => conn.id(),
            Command::Continue { id, .. } => id,
            Command::ProcessingError { id, .. } => id,
        }
    }
}

impl<A: Application> fmt::Debug for Command<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::NewRequest(conn) => f.debug_tuple("NewRequest").field(conn).finish(),
            Command::Continue { id, msg } => f
                .debug_struct("Continue")
                .field("id", id)
                .field("msg", msg)
                .finish(),
            Command::ProcessingError { id, error } => f
                .debug_struct("ProcessingError")
                .field("id", id)
                .field("error", error)
                .finish(),
        }
    }
}

/// A per-request failure, already mapped to the response it produces.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessingError {
    pub status: u16,
    /// Internal errors hide `detail` from the caller.
    pub internal: bool,
    pub detail: String,
    /// Stable label of the underlying error, for metrics.
    pub kind: &'static str,
}

impl ProcessingError {
    /// The response sent to the caller for this error.
    pub fn to_response(&self) -> Response {
        let text = if self.internal {
            INTERNAL_ERROR_BODY.to_string()
        } else {
            self.detail.clone()
        };
        Response::new(self.status, Body::Text(text))
    }
}

impl From<&RuntimeError> for ProcessingError {
    fn from(error: &RuntimeError) -> Self {
        Self {
            status: error.status(),
            internal: error.is_internal(),
            detail: error.to_string(),
            kind: error.kind(),
        }
    }
}

impl From<RuntimeError> for ProcessingError {
    fn from(error: RuntimeError) -> Self {
        Self::from(&error)
    }
}

/// Classifies inbound envelopes against the current configuration.
pub struct Classifier<'a, A: Application> {
    app: &'a A,
    config: &'a ConfigResult<A::Config>,
    interop: &'a mut CorrelationTable<A::Msg>,
}

impl<'a, A: Application> Classifier<'a, A> {
    pub fn new(
        app: &'a A,
        config: &'a ConfigResult<A::Config>,
        interop: &'a mut CorrelationTable<A::Msg>,
    ) -> Self {
        Self {
            app,
            config,
            interop,
        }
    }

    pub fn classify(&mut self, envelope: InboundEnvelope) -> Command<A> {
        let InboundEnvelope { id, kind } = envelope;
        let result = match kind {
            InboundKind::Request { payload } => self.new_request(id.clone(), payload),
            InboundKind::Message { payload } => self.message(id.clone(), &payload),
            InboundKind::InteropResult { key, value } => self.interop_result(&id, key, value),
        };

        result.unwrap_or_else(|error| {
            debug!("Classifier: {} rejected: {}", id, error);
            Command::ProcessingError {
                id,
                error: ProcessingError::from(error),
            }
        })
    }

    fn new_request(&self, id: ConnectionId, payload: Value) -> Result<Command<A>, RuntimeError> {
        let config = match self.config {
            Ok(config) => Arc::clone(config),
            Err(e) => return Err(RuntimeError::ConfigDecode(e.clone())),
        };

        let request: Request = serde_json::from_value(payload)
            .map_err(|e| RuntimeError::RequestDecode(e.to_string()))?;

        let route = self
            .app
            .parse_route(&request.path, &request.query)
            .ok_or_else(|| RuntimeError::RouteNotFound(request.path.clone()))?;

        let model = self.app.initial_model();
        Ok(Command::NewRequest(Conn::new(
            id, config, model, route, request,
        )))
    }

    fn message(&self, id: ConnectionId, payload: &Value) -> Result<Command<A>, RuntimeError> {
        let msg = self
            .app
            .decode_msg(payload)
            .map_err(RuntimeError::MessageDecode)?;
        Ok(Command::Continue { id, msg })
    }

    fn interop_result(
        &mut self,
        id: &ConnectionId,
        key: u64,
        value: Value,
    ) -> Result<Command<A>, RuntimeError> {
        // Check ownership before consuming so a misaddressed result does not
        // strand the real caller.
        match self.interop.owner(key) {
            None => return Err(RuntimeError::UnknownInteropKey(key)),
            Some(owner) if owner != id => {
                return Err(RuntimeError::InteropOwnerMismatch {
                    key,
                    owner: owner.clone(),
                    id: id.clone(),
                });
            }
            Some(_) => {}
        }

        let call = self.interop.resolve(key)?;
        debug!("Classifier: interop '{}' (key {}) resolved for {}", call.name, key, id);
        Ok(Command::Continue {
            id: id.clone(),
            msg: call.complete(value),
        })
    }
}
