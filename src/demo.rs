// src/demo.rs

//! A small built-in application served by the `switchyard` binary.
//!
//! Routes:
//! - `/` answers immediately with the configured greeting.
//! - `/greet/<name>` answers immediately with a personal greeting.
//! - `/quote` asks the host for a quote through the `quote` interop call and
//!   answers with whatever comes back.
//! - `/slow?ms=N` asks the host to sleep for `N` milliseconds (the `sleep`
//!   effect) and answers once the host reports `{"msg":"slept","ms":N}`.

use crate::connection::Conn;
use crate::core::protocol::{Body, QueryMap};
use crate::core::{Application, Cmd, Step};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

const DEFAULT_SLEEP_MS: u64 = 100;

#[derive(Debug, Clone, Deserialize)]
pub struct DemoConfig {
    #[serde(default = "default_greeting")]
    pub greeting: String,
}

fn default_greeting() -> String {
    "Hello".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DemoRoute {
    Home,
    Greet(String),
    Quote,
    Slow(u64),
}

/// Per-request state: how many host round-trips this request has made.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DemoModel {
    pub round_trips: u32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "msg", rename_all = "snake_case")]
pub enum DemoMsg {
    Slept { ms: u64 },
    Quoted { text: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum DemoEffect {
    Sleep { ms: u64 },
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DemoApp;

impl Application for DemoApp {
    type Config = DemoConfig;
    type Model = DemoModel;
    type Route = DemoRoute;
    type Msg = DemoMsg;
    type Effect = DemoEffect;

    fn decode_config(&self, raw: &Value) -> Result<DemoConfig, String> {
        serde_json::from_value(raw.clone()).map_err(|e| e.to_string())
    }

    fn parse_route(&self, path: &str, query: &QueryMap) -> Option<DemoRoute> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        match segments.as_slice() {
            [] => Some(DemoRoute::Home),
            ["greet", name] => Some(DemoRoute::Greet((*name).to_string())),
            ["quote"] => Some(DemoRoute::Quote),
            ["slow"] => {
                let ms = match query.get("ms") {
                    Some(ms) => ms.parse().ok()?,
                    None => DEFAULT_SLEEP_MS,
                };
                Some(DemoRoute::Slow(ms))
            }
            _ => None,
        }
    }

    fn initial_model(&self) -> DemoModel {
        DemoModel::default()
    }

    fn decode_msg(&self, raw: &Value) -> Result<DemoMsg, String> {
        serde_json::from_value(raw.clone()).map_err(|e| e.to_string())
    }

    fn endpoint(&self, conn: Conn<Self>) -> Step<Self> {
        let greeting = conn.config.greeting.clone();
        match conn.route.clone() {
            DemoRoute::Home => {
                let body = Body::text(format!("{greeting}, world"));
                (conn.respond(200, body), vec![])
            }
            DemoRoute::Greet(name) => {
                let body = Body::text(format!("{greeting}, {name}"));
                (conn.respond(200, body), vec![])
            }
            DemoRoute::Quote => (
                conn,
                vec![Cmd::interop("quote", json!({}), |value| DemoMsg::Quoted {
                    text: match value {
                        Value::String(s) => s,
                        other => other.to_string(),
                    },
                })],
            ),
            DemoRoute::Slow(ms) => (conn, vec![Cmd::effect(DemoEffect::Sleep { ms })]),
        }
    }

    fn update(&self, msg: DemoMsg, conn: Conn<Self>) -> Step<Self> {
        let conn = conn.update_model(|model| DemoModel {
            round_trips: model.round_trips + 1,
        });
        match msg {
            DemoMsg::Slept { ms } => {
                let mut conn = conn;
                let body = json!({ "slept_ms": ms, "round_trips": conn.model.round_trips });
                conn.set_header("cache-control", "no-store");
                conn.response.set_body(Body::Json(body));
                (conn.send(), vec![])
            }
            DemoMsg::Quoted { text } => (conn.respond(200, Body::Text(text)), vec![]),
        }
    }
}
