// src/core/app.rs

//! The capability set an embedding application supplies to the runtime.
//!
//! The runtime is generic over an [`Application`]: it decodes the deployment
//! configuration once, parses a route for every new request, and then drives
//! the application's `endpoint`/`update` state machine one message at a time.
//! Anything asynchronous the application wants done is returned as a [`Cmd`]
//! and executed by the host; the result re-enters as a later message.

use crate::connection::Conn;
use crate::core::protocol::QueryMap;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::error;

/// Turns the raw result of an interop call into an application message.
pub type Continuation<M> = Box<dyn FnOnce(Value) -> M + Send>;

/// A side effect requested by the application.
pub enum Cmd<M, E> {
    /// An opaque effect executed by the host. Its result arrives as a `message`
    /// envelope for the same connection and is decoded with `decode_msg`.
    Effect(E),
    /// A named call delegated to the host. The continuation is parked in the
    /// correlation table until the matching `interop_result` arrives.
    Interop {
        name: String,
        args: Value,
        continuation: Continuation<M>,
    },
}

impl<M, E> Cmd<M, E> {
    pub fn effect(effect: E) -> Self {
        Cmd::Effect(effect)
    }

    pub fn interop<F>(name: impl Into<String>, args: Value, continuation: F) -> Self
    where
        F: FnOnce(Value) -> M + Send + 'static,
    {
        Cmd::Interop {
            name: name.into(),
            args,
            continuation: Box::new(continuation),
        }
    }
}

impl<M, E: fmt::Debug> fmt::Debug for Cmd<M, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cmd::Effect(effect) => f.debug_tuple("Effect").field(effect).finish(),
            Cmd::Interop { name, args, .. } => f
                .debug_struct("Interop")
                .field("name", name)
                .field("args", args)
                .finish_non_exhaustive(),
        }
    }
}

/// The commands produced by one `endpoint` or `update` call.
pub type Commands<A> = Vec<Cmd<<A as Application>::Msg, <A as Application>::Effect>>;

/// What `endpoint` and `update` return: the updated connection and its commands.
pub type Step<A> = (Conn<A>, Commands<A>);

/// The user-supplied half of the runtime.
pub trait Application: Send + Sized + 'static {
    /// Deployment-wide configuration, decoded once at startup.
    type Config: fmt::Debug + Send + Sync + 'static;
    /// Per-request application state.
    type Model: Clone + fmt::Debug + Send + 'static;
    /// Parsed route value.
    type Route: Clone + fmt::Debug + Send + 'static;
    /// Messages fed to `update`.
    type Msg: fmt::Debug + Send + 'static;
    /// Opaque side-effect instructions for the host.
    type Effect: Serialize + fmt::Debug + Send + 'static;

    fn decode_config(&self, raw: &Value) -> Result<Self::Config, String>;

    /// Parses a route, or returns `None` when nothing matches (404).
    fn parse_route(&self, path: &str, query: &QueryMap) -> Option<Self::Route>;

    fn initial_model(&self) -> Self::Model;

    /// Decodes the payload of a `message` envelope.
    fn decode_msg(&self, raw: &Value) -> Result<Self::Msg, String>;

    /// Called once for every new request.
    fn endpoint(&self, conn: Conn<Self>) -> Step<Self>;

    /// Called for every message addressed to a pending connection.
    fn update(&self, msg: Self::Msg, conn: Conn<Self>) -> Step<Self>;
}

/// The outcome of decoding the deployment configuration. Held for the lifetime
/// of the dispatcher and consulted by every request classification.
pub type ConfigResult<C> = Result<Arc<C>, String>;

/// Decodes the deployment configuration. A failure is logged and kept, not
/// propagated: every later request is answered with an internal error instead.
pub fn load_config<A: Application>(app: &A, raw: &Value) -> ConfigResult<A::Config> {
    app.decode_config(raw).map(Arc::new).map_err(|e| {
        error!("Application configuration failed to decode; all requests will fail: {e}");
        e
    })
}
