//! Quota metrics
//!
//! - `quota_remaining` (gauge): label `pool`, last server-observed remaining
//! - `quota_acquire_waits_total` (counter): label `pool`
//! - `quota_refusals_total` (counter): label `pool`
//!
//! Without an installed recorder these calls are no-ops.

use crate::ledger::PoolKind;

/// Record the remaining capacity reported by the server for a pool.
pub fn record_remaining(pool: PoolKind, remaining: i64) {
    metrics::gauge!("quota_remaining", "pool" => pool.label()).set(remaining as f64);
}

/// Record that a task had to sleep until a pool reset.
pub fn record_wait(pool: PoolKind) {
    metrics::counter!("quota_acquire_waits_total", "pool" => pool.label()).increment(1);
}

/// Record a fail-fast refusal (no network call was made).
pub fn record_refusal(pool: PoolKind) {
    metrics::counter!("quota_refusals_total", "pool" => pool.label()).increment(1);
}
