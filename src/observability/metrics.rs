//! Metrics collection and exposition.
//!
//! # Metrics
//! - `stomper_sessions_total` (counter): WebSocket sessions accepted
//! - `stomper_active_sessions` (gauge): sessions currently open
//! - `stomper_frames_relayed_total` (counter): frames published by the relay engine
//! - `stomper_resident_memory_bytes` (gauge): last sampled resident set size
//!
//! Recording is a no-op until an exporter is installed.

use std::net::SocketAddr;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

pub const SESSIONS_TOTAL: &str = "stomper_sessions_total";
pub const ACTIVE_SESSIONS: &str = "stomper_active_sessions";
pub const FRAMES_RELAYED_TOTAL: &str = "stomper_frames_relayed_total";
pub const RESIDENT_MEMORY_BYTES: &str = "stomper_resident_memory_bytes";

/// Install the Prometheus recorder with an HTTP scrape listener.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_session_opened(active: u64) {
    metrics::counter!(SESSIONS_TOTAL).increment(1);
    metrics::gauge!(ACTIVE_SESSIONS).set(active as f64);
}

pub fn record_session_closed(active: u64) {
    metrics::gauge!(ACTIVE_SESSIONS).set(active as f64);
}

pub fn record_frame_relayed() {
    metrics::counter!(FRAMES_RELAYED_TOTAL).increment(1);
}

pub fn record_resident_memory(bytes: u64) {
    metrics::gauge!(RESIDENT_MEMORY_BYTES).set(bytes as f64);
}
