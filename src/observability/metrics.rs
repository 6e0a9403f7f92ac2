//! Metrics collection and exposition.
//!
//! # Metrics
//! - `hostd_config_updates_total` (counter): snapshots published, by `key_rotated`
//! - `hostd_config_writes_total` (counter): config file writes, by `result`
//! - `hostd_accounts_created_total` (counter): system accounts created, by `template`
//! - `hostd_ownership_changes_total` (counter): workload directory chowns, by `result`
//!
//! # Design Decisions
//! - Recording is a no-op until [`init_metrics`] installs the exporter

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter on `addr`. Must run inside a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_config_update(key_rotated: bool) {
    metrics::counter!("hostd_config_updates_total", "key_rotated" => key_rotated.to_string())
        .increment(1);
}

pub fn record_config_write(ok: bool) {
    metrics::counter!("hostd_config_writes_total", "result" => result_label(ok)).increment(1);
}

pub fn record_account_created(template: &'static str) {
    metrics::counter!("hostd_accounts_created_total", "template" => template).increment(1);
}

pub fn record_ownership_change(ok: bool) {
    metrics::counter!("hostd_ownership_changes_total", "result" => result_label(ok)).increment(1);
}

fn result_label(ok: bool) -> &'static str {
    if ok {
        "ok"
    } else {
        "error"
    }
}
