// src/core/metrics.rs

//! Defines and registers Prometheus metrics for the runtime.
//!
//! This module uses `lazy_static` to ensure that metrics are registered only once
//! globally for the entire process.

use lazy_static::lazy_static;
use prometheus::{
    Counter, CounterVec, Gauge, Histogram, TextEncoder, register_counter, register_counter_vec,
    register_gauge, register_histogram,
};
use tracing::warn;

lazy_static! {
    // --- Gauges ---
    /// Connections currently pending in the pool.
    pub static ref IN_FLIGHT_CONNECTIONS: Gauge =
        register_gauge!("switchyard_in_flight_connections", "Number of connections waiting for a response.").unwrap();
    /// Interop calls issued but not yet resolved.
    pub static ref PENDING_INTEROP_CALLS: Gauge =
        register_gauge!("switchyard_pending_interop_calls", "Number of interop calls awaiting a result.").unwrap();

    // --- Counters ---
    /// Inbound envelopes processed, of any kind.
    pub static ref ENVELOPES_PROCESSED_TOTAL: Counter =
        register_counter!("switchyard_envelopes_processed_total", "Total number of inbound envelopes processed.").unwrap();
    /// New requests accepted into the pool.
    pub static ref REQUESTS_ACCEPTED_TOTAL: Counter =
        register_counter!("switchyard_requests_accepted_total", "Total number of requests accepted.").unwrap();
    /// Responses emitted, labeled by status class.
    pub static ref RESPONSES_SENT_TOTAL: CounterVec =
        register_counter_vec!("switchyard_responses_sent_total", "Total number of responses sent, labeled by status class.", &["class"]).unwrap();
    /// Per-request processing errors, labeled by kind.
    pub static ref PROCESSING_ERRORS_TOTAL: CounterVec =
        register_counter_vec!("switchyard_processing_errors_total", "Total number of per-request processing errors, labeled by kind.", &["kind"]).unwrap();
    /// Side effects forwarded to the host.
    pub static ref EFFECTS_FORWARDED_TOTAL: Counter =
        register_counter!("switchyard_effects_forwarded_total", "Total number of side effects forwarded to the host.").unwrap();
    /// Interop calls issued to the host.
    pub static ref INTEROP_CALLS_TOTAL: Counter =
        register_counter!("switchyard_interop_calls_total", "Total number of interop calls issued.").unwrap();
    /// Commands dropped because their connection finalized in the same step.
    pub static ref COMMANDS_DISCARDED_TOTAL: Counter =
        register_counter!("switchyard_commands_discarded_total", "Total number of commands discarded on finalization.").unwrap();

    // --- Histograms ---
    /// Time spent in one dispatch step.
    pub static ref STEP_LATENCY_SECONDS: Histogram =
        register_histogram!("switchyard_step_latency_seconds", "Latency of a single dispatch step in seconds.").unwrap();
}

/// Gathers all registered metrics and encodes them in the Prometheus text format.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    encoder
        .encode_to_string(&metric_families)
        .unwrap_or_else(|e| {
            warn!("Failed to encode metrics: {}", e);
            String::new()
        })
}
