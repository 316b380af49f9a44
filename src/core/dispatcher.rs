// src/core/dispatcher.rs

//! The dispatcher: applies one inbound envelope to the pool and the
//! application, and reports what the host must do next.
//!
//! Each connection is either **pending** (in the pool, not yet sent) or
//! **finalized** (removed from the pool, response emitted). A call to
//! [`Dispatcher::step`] runs classification, the user's `endpoint`/`update` and
//! the resulting pool mutation as one unit. There are no suspension points;
//! waiting on the host is represented only by entries sitting in the pool or
//! the correlation table.

use super::app::{Application, Cmd, Commands, ConfigResult, load_config};
use super::classifier::{Classifier, Command, ProcessingError};
use super::errors::RuntimeError;
use super::interop::CorrelationTable;
use super::metrics;
use super::protocol::{InboundEnvelope, InboundKind, Outbound};
use crate::connection::{Conn, ConnectionId, ConnectionPool};
use serde_json::Value;
use std::time::Instant;
use tracing::{debug, error, info_span, warn};

/// Owns the application, the decoded configuration, the connection pool and the
/// interop correlation table for one worker.
pub struct Dispatcher<A: Application> {
    app: A,
    config: ConfigResult<A::Config>,
    pool: ConnectionPool<A>,
    interop: CorrelationTable<A::Msg>,
}

impl<A: Application> Dispatcher<A> {
    /// Creates a dispatcher, decoding the raw application configuration once.
    /// A decode failure is kept and answered with a 500 on every request.
    pub fn new(app: A, raw_config: &Value) -> Self {
        let config = load_config(&app, raw_config);
        Self::with_config(app, config)
    }

    /// Creates a dispatcher from an already decoded configuration result.
    pub fn with_config(app: A, config: ConfigResult<A::Config>) -> Self {
        Self {
            app,
            config,
            pool: ConnectionPool::new(),
            interop: CorrelationTable::new(),
        }
    }

    pub fn app(&self) -> &A {
        &self.app
    }

    pub fn config(&self) -> &ConfigResult<A::Config> {
        &self.config
    }

    pub fn pool(&self) -> &ConnectionPool<A> {
        &self.pool
    }

    pub fn interop(&self) -> &CorrelationTable<A::Msg> {
        &self.interop
    }

    /// Processes one inbound envelope.
    ///
    /// Per-request failures are answered inside the returned messages. An `Err`
    /// is returned only for fatal conditions (a reused live id, an exhausted key
    /// space, or a pool invariant violation); the caller should stop feeding
    /// this dispatcher.
    pub fn step(
        &mut self,
        envelope: InboundEnvelope,
    ) -> Result<Vec<Outbound<A::Effect>>, RuntimeError> {
        let span = info_span!("dispatch", conn.id = %envelope.id, kind = envelope.kind_name());
        let _enter = span.enter();
        let start_time = Instant::now();
        metrics::ENVELOPES_PROCESSED_TOTAL.inc();

        let result = if self.is_duplicate_request(&envelope) {
            // Fatal even when the new request would not classify.
            Err(RuntimeError::DuplicateConnection(envelope.id))
        } else {
            let command =
                Classifier::new(&self.app, &self.config, &mut self.interop).classify(envelope);
            self.apply(command)
        };

        metrics::IN_FLIGHT_CONNECTIONS.set(self.pool.len() as f64);
        metrics::PENDING_INTEROP_CALLS.set(self.interop.len() as f64);
        metrics::STEP_LATENCY_SECONDS.observe(start_time.elapsed().as_secs_f64());

        if let Err(e) = &result {
            error!("Fatal dispatch error: {}", e);
        }
        result
    }

    fn is_duplicate_request(&self, envelope: &InboundEnvelope) -> bool {
        matches!(envelope.kind, InboundKind::Request { .. }) && self.pool.contains(&envelope.id)
    }

    /// Applies a classified command.
    fn apply(
        &mut self,
        command: Command<A>,
    ) -> Result<Vec<Outbound<A::Effect>>, RuntimeError> {
        match command {
            Command::NewRequest(conn) => {
                // Reused live id: the endpoint must not run.
                self.pool.add(conn.clone())?;
                metrics::REQUESTS_ACCEPTED_TOTAL.inc();
                debug!(
                    "New request {} {:?} {}",
                    conn.id(),
                    conn.request().method,
                    conn.request().path
                );
                let id = conn.id().clone();
                let (conn, cmds) = self.app.endpoint(conn);
                self.settle(id, conn, cmds)
            }
            Command::Continue { id, msg } => {
                let conn = match self.pool.get(&id) {
                    Ok(conn) => conn.clone(),
                    Err(e) => return self.fail(id, ProcessingError::from(e)),
                };
                debug!("Continuing {} with {:?}", id, msg);
                let (conn, cmds) = self.app.update(msg, conn);
                self.settle(id, conn, cmds)
            }
            Command::ProcessingError { id, error } => self.fail(id, error),
        }
    }

    /// Finalizes or re-pools a connection after the application has run.
    fn settle(
        &mut self,
        id: ConnectionId,
        conn: Conn<A>,
        cmds: Commands<A>,
    ) -> Result<Vec<Outbound<A::Effect>>, RuntimeError> {
        if conn.id() != &id {
            let error = RuntimeError::ConnectionIdChanged {
                expected: id.clone(),
                actual: conn.id().clone(),
            };
            return self.fail(id, ProcessingError::from(error));
        }

        if conn.is_sent() {
            self.pool.remove(&id)?;
            if !cmds.is_empty() {
                debug!(
                    "Discarding {} command(s) for finalized connection {}",
                    cmds.len(),
                    id
                );
                metrics::COMMANDS_DISCARDED_TOTAL.inc_by(cmds.len() as f64);
            }
            let response = conn.response;
            metrics::RESPONSES_SENT_TOTAL
                .with_label_values(&[response.status_class()])
                .inc();
            debug!("Finalized {} with status {}", id, response.status);
            return Ok(vec![Outbound::Respond { id, response }]);
        }

        self.pool.replace(conn)?;
        self.forward(id, cmds)
    }

    /// Hands a pending connection's commands to the host, tagged with its id.
    fn forward(
        &mut self,
        id: ConnectionId,
        cmds: Commands<A>,
    ) -> Result<Vec<Outbound<A::Effect>>, RuntimeError> {
        let mut outbound = Vec::with_capacity(cmds.len());
        for cmd in cmds {
            match cmd {
                Cmd::Effect(effect) => {
                    metrics::EFFECTS_FORWARDED_TOTAL.inc();
                    outbound.push(Outbound::Effect {
                        id: id.clone(),
                        effect,
                    });
                }
                Cmd::Interop {
                    name,
                    args,
                    continuation,
                } => {
                    let key = self.interop.reserve(id.clone(), name.clone(), continuation)?;
                    metrics::INTEROP_CALLS_TOTAL.inc();
                    outbound.push(Outbound::Interop {
                        id: id.clone(),
                        key,
                        name,
                        args,
                    });
                }
            }
        }
        if outbound.is_empty() {
            warn!("Connection {} is pending with no outstanding commands", id);
        }
        Ok(outbound)
    }

    /// Answers `id` with an error response and drops any live state for it.
    fn fail(
        &mut self,
        id: ConnectionId,
        error: ProcessingError,
    ) -> Result<Vec<Outbound<A::Effect>>, RuntimeError> {
        if error.internal {
            warn!("Request {} failed with an internal error: {}", id, error.detail);
        } else {
            warn!("Request {} failed ({}): {}", id, error.status, error.detail);
        }
        metrics::PROCESSING_ERRORS_TOTAL
            .with_label_values(&[error.kind])
            .inc();

        if self.pool.contains(&id) {
            self.pool.remove(&id)?;
        }

        let response = error.to_response();
        metrics::RESPONSES_SENT_TOTAL
            .with_label_values(&[response.status_class()])
            .inc();
        Ok(vec![Outbound::Respond { id, response }])
    }
}
