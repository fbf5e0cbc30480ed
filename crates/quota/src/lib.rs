//! Quota ledger for the three GitHub API rate-limit pools
//!
//! GitHub throttles the REST, search and GraphQL surfaces independently. The
//! ledger keeps one `QuotaPool` per surface and gates every outbound call:
//!
//! 1. Transport calls `acquire(pool, cost)` before sending → local reservation
//! 2. Pool has capacity → units are deducted, call proceeds
//! 3. Pool is empty → task sleeps until reset (`Wait`) or gets `Exhausted` (`FailFast`)
//! 4. Response arrives → `observe(pool, headers)` overwrites local state with the
//!    server's `x-ratelimit-*` values, even on error responses
//!
//! One ledger is built per session and shared by `Arc` with every transport.

pub mod error;
pub mod headers;
pub mod ledger;
pub mod metrics;

pub use error::{Error, Result, TimeRemaining};
pub use headers::QuotaHeaders;
pub use ledger::{
    ExhaustionPolicy, LOW_REMAINING_THRESHOLD, PoolKind, PoolSnapshot, QuotaLedger, QuotaPool,
};
