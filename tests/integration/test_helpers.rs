// tests/integration/test_helpers.rs

//! Test helpers: a scriptable `TestApp` and a `TestContext` wrapping a
//! dispatcher built for it.

#![allow(dead_code)]

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;
use switchyard::connection::{Conn, ConnectionId};
use switchyard::core::protocol::{Body, InboundEnvelope, Outbound, QueryMap, Response};
use switchyard::core::{Application, Cmd, Dispatcher, RuntimeError, Step};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

#[derive(Debug, Clone, Deserialize)]
pub struct TestConfig {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TestRoute {
    /// Responds inside the endpoint.
    Instant,
    /// Issues one `work` effect and waits for a `done` message.
    Effect,
    /// Issues one `lookup` interop call and responds with its result.
    Interop,
    /// Issues two interop calls and responds once both have come back.
    TwoInterops,
    /// Issues `tick` effects until it has seen `n` tick messages.
    Count(usize),
    /// Responds inside the endpoint while also requesting commands.
    Discard,
    /// Stays pending without requesting anything.
    Hang,
    /// Hands back a fresh connection keyed by `impostor` instead of its own.
    Impostor,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "msg", rename_all = "snake_case")]
pub enum TestMsg {
    Done { status: u16, body: String },
    Tick { value: String },
    #[serde(skip)]
    Reply(Value),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestEffect {
    pub label: String,
}

impl TestEffect {
    pub fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TestApp;

impl Application for TestApp {
    type Config = TestConfig;
    type Model = Vec<String>;
    type Route = TestRoute;
    type Msg = TestMsg;
    type Effect = TestEffect;

    fn decode_config(&self, raw: &Value) -> Result<TestConfig, String> {
        serde_json::from_value(raw.clone()).map_err(|e| e.to_string())
    }

    fn parse_route(&self, path: &str, _query: &QueryMap) -> Option<TestRoute> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        match segments.as_slice() {
            ["instant"] => Some(TestRoute::Instant),
            ["effect"] => Some(TestRoute::Effect),
            ["interop"] => Some(TestRoute::Interop),
            ["two-interops"] => Some(TestRoute::TwoInterops),
            ["count", n] => n.parse().ok().map(TestRoute::Count),
            ["discard"] => Some(TestRoute::Discard),
            ["hang"] => Some(TestRoute::Hang),
            ["impostor"] => Some(TestRoute::Impostor),
            _ => None,
        }
    }

    fn initial_model(&self) -> Vec<String> {
        Vec::new()
    }

    fn decode_msg(&self, raw: &Value) -> Result<TestMsg, String> {
        serde_json::from_value(raw.clone()).map_err(|e| e.to_string())
    }

    fn endpoint(&self, conn: Conn<Self>) -> Step<Self> {
        match conn.route.clone() {
            TestRoute::Instant => {
                let body = format!("instant from {}", conn.config.name);
                (conn.respond(200, Body::text(body)), vec![])
            }
            TestRoute::Effect => (conn, vec![Cmd::effect(TestEffect::new("work"))]),
            TestRoute::Interop => {
                let args = json!({ "path": conn.request().path.clone() });
                (conn, vec![Cmd::interop("lookup", args, TestMsg::Reply)])
            }
            TestRoute::TwoInterops => (
                conn,
                vec![
                    Cmd::interop("first", Value::Null, TestMsg::Reply),
                    Cmd::interop("second", Value::Null, TestMsg::Reply),
                ],
            ),
            TestRoute::Count(_) => (conn, vec![Cmd::effect(TestEffect::new("tick"))]),
            TestRoute::Discard => (
                conn.respond(200, Body::text("done early")),
                vec![
                    Cmd::effect(TestEffect::new("ignored")),
                    Cmd::interop("ignored", Value::Null, TestMsg::Reply),
                ],
            ),
            TestRoute::Hang => (conn, vec![]),
            TestRoute::Impostor => {
                let other = Conn::new(
                    ConnectionId::from("impostor"),
                    Arc::clone(&conn.config),
                    Vec::new(),
                    TestRoute::Hang,
                    conn.request().clone(),
                );
                (other, vec![Cmd::effect(TestEffect::new("stolen"))])
            }
        }
    }

    fn update(&self, msg: TestMsg, conn: Conn<Self>) -> Step<Self> {
        match msg {
            TestMsg::Done { status, body } => (conn.respond(status, Body::text(body)), vec![]),
            TestMsg::Tick { value } => {
                let conn = conn.update_model(|mut history| {
                    history.push(value);
                    history
                });
                match conn.route.clone() {
                    TestRoute::Count(n) if conn.model.len() >= n => {
                        let body = conn.model.join(",");
                        (conn.respond(200, Body::text(body)), vec![])
                    }
                    _ => (conn, vec![Cmd::effect(TestEffect::new("tick"))]),
                }
            }
            TestMsg::Reply(value) => match conn.route {
                TestRoute::TwoInterops => {
                    let conn = conn.update_model(|mut history| {
                        history.push(value.to_string());
                        history
                    });
                    if conn.model.len() >= 2 {
                        let body = conn.model.join(",");
                        (conn.respond(200, Body::text(body)), vec![])
                    } else {
                        (conn, vec![])
                    }
                }
                _ => (conn.respond(200, Body::Json(value)), vec![]),
            },
        }
    }
}

/// Installs a test-friendly tracing subscriber once per test binary.
pub fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(EnvFilter::new("warn"))
        .with(tracing_subscriber::fmt::layer().with_test_writer())
        .try_init();
}

/// A well-formed request payload for `path`.
pub fn request_payload(path: &str) -> Value {
    json!({ "method": "GET", "path": path })
}

pub fn done_payload(status: u16, body: &str) -> Value {
    json!({ "msg": "done", "status": status, "body": body })
}

pub fn tick_payload(value: &str) -> Value {
    json!({ "msg": "tick", "value": value })
}

pub fn valid_config() -> Value {
    json!({ "name": "tests" })
}

/// Extracts every `Respond` message as `(id, response)`.
pub fn responses(messages: &[Outbound<TestEffect>]) -> Vec<(ConnectionId, Response)> {
    messages
        .iter()
        .filter_map(|m| match m {
            Outbound::Respond { id, response } => Some((id.clone(), response.clone())),
            _ => None,
        })
        .collect()
}

/// Extracts the key of every `Interop` message.
pub fn interop_keys(messages: &[Outbound<TestEffect>]) -> Vec<u64> {
    messages
        .iter()
        .filter_map(|m| match m {
            Outbound::Interop { key, .. } => Some(*key),
            _ => None,
        })
        .collect()
}

/// TestContext wraps a dispatcher running `TestApp`.
pub struct TestContext {
    pub dispatcher: Dispatcher<TestApp>,
}

impl TestContext {
    /// Creates a context with a valid configuration.
    pub fn new() -> Self {
        Self::with_raw_config(valid_config())
    }

    pub fn with_raw_config(raw: Value) -> Self {
        init_tracing();
        Self {
            dispatcher: Dispatcher::new(TestApp, &raw),
        }
    }

    pub fn step(
        &mut self,
        envelope: InboundEnvelope,
    ) -> Result<Vec<Outbound<TestEffect>>, RuntimeError> {
        self.dispatcher.step(envelope)
    }

    pub fn request(&mut self, id: &str, path: &str) -> Vec<Outbound<TestEffect>> {
        self.step(InboundEnvelope::request(id, request_payload(path)))
            .expect("request step should not be fatal")
    }

    pub fn message(&mut self, id: &str, payload: Value) -> Vec<Outbound<TestEffect>> {
        self.step(InboundEnvelope::message(id, payload))
            .expect("message step should not be fatal")
    }

    pub fn interop_result(
        &mut self,
        id: &str,
        key: u64,
        value: Value,
    ) -> Vec<Outbound<TestEffect>> {
        self.step(InboundEnvelope::interop_result(id, key, value))
            .expect("interop step should not be fatal")
    }

    pub fn is_pending(&self, id: &str) -> bool {
        self.dispatcher.pool().contains(&ConnectionId::from(id))
    }

    /// Asserts `messages` is exactly one response for `id` and returns it.
    pub fn single_response(messages: &[Outbound<TestEffect>], id: &str) -> Response {
        let responses = responses(messages);
        assert_eq!(
            responses.len(),
            1,
            "expected exactly one response, got {:?}",
            messages
        );
        assert_eq!(responses[0].0, ConnectionId::from(id));
        responses[0].1.clone()
    }
}
