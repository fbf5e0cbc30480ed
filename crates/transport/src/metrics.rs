//! Upstream call metrics
//!
//! - `upstream_requests_total` (counter): labels `pool`, `status`
//! - `upstream_request_duration_seconds` (histogram): label `pool`
//! - `upstream_retries_total` (counter): label `pool`

use quota::PoolKind;

/// Record a completed upstream call.
pub fn record_request(pool: PoolKind, status: u16, duration_secs: f64) {
    metrics::counter!(
        "upstream_requests_total",
        "pool" => pool.label(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!("upstream_request_duration_seconds", "pool" => pool.label())
        .record(duration_secs);
}

/// Record a retry after a connection failure or timeout.
pub fn record_retry(pool: PoolKind) {
    metrics::counter!("upstream_retries_total", "pool" => pool.label()).increment(1);
}
