// src/core/protocol/http.rs

//! The request and response records the dispatcher works with.
//!
//! Only the fields the runtime and the application need are modelled here; the
//! host owns the real HTTP encoding.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Header mapping. Insertion order is preserved so responses go out the way the
/// application wrote them.
pub type Headers = IndexMap<String, String>;

/// Decoded query string parameters.
pub type QueryMap = IndexMap<String, String>;

pub const CONTENT_TYPE: &str = "content-type";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

/// The immutable inbound request record delivered by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub method: Method,
    pub path: String,
    #[serde(default)]
    pub query: QueryMap,
    #[serde(default)]
    pub headers: Headers,
    #[serde(default)]
    pub body: Option<String>,
}

impl Request {
    /// Creates a bodiless request with no headers or query parameters.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: QueryMap::new(),
            headers: Headers::new(),
            body: None,
        }
    }

    /// Looks up a request header, ignoring ASCII case.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }
}

/// A response body. The host turns this into bytes on the wire.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum Body {
    #[default]
    Empty,
    Text(String),
    Json(Value),
}

impl Body {
    pub fn text(text: impl Into<String>) -> Self {
        Body::Text(text.into())
    }

    /// The content type implied by this body, if any.
    pub fn content_type(&self) -> Option<&'static str> {
        match self {
            Body::Empty => None,
            Body::Text(_) => Some("text/plain; charset=utf-8"),
            Body::Json(_) => Some("application/json"),
        }
    }

    /// The body rendered as text. JSON bodies are serialized compactly.
    pub fn as_text(&self) -> String {
        match self {
            Body::Empty => String::new(),
            Body::Text(s) => s.clone(),
            Body::Json(v) => v.to_string(),
        }
    }
}

/// The outbound response under construction for a connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub status: u16,
    #[serde(default)]
    pub headers: Headers,
    #[serde(default)]
    pub body: Body,
}

impl Default for Response {
    fn default() -> Self {
        Self {
            status: 200,
            headers: Headers::new(),
            body: Body::Empty,
        }
    }
}

impl Response {
    /// Creates a response and sets its content type from the body.
    pub fn new(status: u16, body: Body) -> Self {
        let mut response = Self {
            status,
            ..Self::default()
        };
        response.set_body(body);
        response
    }

    /// Replaces the body. A content type is added only when the application has
    /// not already chosen one.
    pub fn set_body(&mut self, body: Body) {
        if let Some(content_type) = body.content_type()
            && !self
                .headers
                .keys()
                .any(|k| k.eq_ignore_ascii_case(CONTENT_TYPE))
        {
            self.headers
                .insert(CONTENT_TYPE.to_string(), content_type.to_string());
        }
        self.body = body;
    }

    /// Status class label ("2xx", "4xx", ...) used for metrics.
    pub fn status_class(&self) -> &'static str {
        match self.status {
            100..=199 => "1xx",
            200..=299 => "2xx",
            300..=399 => "3xx",
            400..=499 => "4xx",
            _ => "5xx",
        }
    }
}
