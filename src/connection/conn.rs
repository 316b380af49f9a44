// src/connection/conn.rs

//! Defines `Conn`, the full state of one in-flight request.

use super::id::ConnectionId;
use crate::core::Application;
use crate::core::protocol::{Body, Request, Response};
use std::fmt;
use std::sync::Arc;

/// One in-flight request.
///
/// A `Conn` is handed to the application's `endpoint` and `update` functions by
/// value and handed back, possibly changed. Nothing else writes to it. Once
/// [`Conn::is_sent`] is true the dispatcher removes it from the pool and emits
/// its response.
pub struct Conn<A: Application> {
    /// Host-supplied id. Private so the application cannot re-key a connection.
    id: ConnectionId,
    /// Deployment-wide configuration shared by every connection.
    pub config: Arc<A::Config>,
    /// Application state private to this request.
    pub model: A::Model,
    /// The route parsed from the request path and query.
    pub route: A::Route,
    /// The inbound request. Read-only after construction.
    request: Request,
    /// The response under construction.
    pub response: Response,
    /// True once the application has finalized the response.
    sent: bool,
}

impl<A: Application> Conn<A> {
    /// Creates a pending connection with a default `200` response.
    pub fn new(
        id: ConnectionId,
        config: Arc<A::Config>,
        model: A::Model,
        route: A::Route,
        request: Request,
    ) -> Self {
        Self {
            id,
            config,
            model,
            route,
            request,
            response: Response::default(),
            sent: false,
        }
    }

    pub fn id(&self) -> &ConnectionId {
        &self.id
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    pub fn is_sent(&self) -> bool {
        self.sent
    }

    /// Sets status and body and finalizes the response.
    pub fn respond(mut self, status: u16, body: Body) -> Self {
        self.response.status = status;
        self.response.set_body(body);
        self.sent = true;
        self
    }

    /// Finalizes whatever response has been built so far.
    pub fn send(mut self) -> Self {
        self.sent = true;
        self
    }

    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.response.headers.insert(name.into(), value.into());
    }

    pub fn update_model(mut self, f: impl FnOnce(A::Model) -> A::Model) -> Self {
        self.model = f(self.model);
        self
    }
}

// Manual impls: deriving would put `Clone`/`Debug` bounds on the application type
// itself rather than on its associated types.
impl<A: Application> Clone for Conn<A> {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            config: Arc::clone(&self.config),
            model: self.model.clone(),
            route: self.route.clone(),
            request: self.request.clone(),
            response: self.response.clone(),
            sent: self.sent,
        }
    }
}

impl<A: Application> fmt::Debug for Conn<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Conn")
            .field("id", &self.id)
            .field("model", &self.model)
            .field("route", &self.route)
            .field("request", &self.request)
            .field("response", &self.response)
            .field("sent", &self.sent)
            .finish_non_exhaustive()
    }
}
