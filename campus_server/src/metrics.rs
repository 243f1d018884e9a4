//! Prometheus metrics for the ledger server.
//!
//! Recording is always safe; values are only exported once [`init_metrics`]
//! has installed the exporter.
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use campus_server::metrics;
//! use std::net::SocketAddr;
//!
//! let addr: SocketAddr = "127.0.0.1:9090".parse().unwrap();
//! metrics::init_metrics(addr).unwrap();
//!
//! metrics::http_requests_total("POST", "/api/v1/payments", 200);
//! metrics::payments_total("Wallet", "completed");
//! ```

use campus_ledger::Money;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Initialize Prometheus metrics exporter.
///
/// Metrics will be available at `http://<addr>/metrics`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), String> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {}", e))
}

// ============================================================================
// HTTP Metrics
// ============================================================================

/// Record HTTP request.
pub fn http_requests_total(method: &str, path: &str, status: u16) {
    metrics::counter!("http_requests_total",
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record HTTP request duration in milliseconds.
pub fn http_request_duration_ms(method: &str, path: &str, duration_ms: f64) {
    metrics::histogram!("http_request_duration_ms",
        "method" => method.to_string(),
        "path" => path.to_string()
    )
    .record(duration_ms);
}

// ============================================================================
// Ledger Metrics
// ============================================================================

/// Count a payment attempt by method and outcome.
pub fn payments_total(method: &str, outcome: &str) {
    metrics::counter!("payments_total",
        "method" => method.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

/// Record the amount of a completed payment.
pub fn payment_amount(amount: Money) {
    metrics::histogram!("payment_amount").record(amount as f64);
}

/// Count a refund request or decision.
pub fn refunds_total(status: &str) {
    metrics::counter!("refunds_total", "status" => status.to_string()).increment(1);
}

/// Count a login attempt.
pub fn login_attempts_total(success: bool) {
    metrics::counter!("login_attempts_total", "success" => success.to_string()).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_without_exporter_is_noop() {
        http_requests_total("GET", "/health", 200);
        http_request_duration_ms("GET", "/health", 1.5);
        payments_total("Wallet", "completed");
        payment_amount(500);
        refunds_total("pending");
        login_attempts_total(false);
    }
}
