//! Per-pool quota state and the acquire/observe protocol
//!
//! Each pool sits behind its own `std::sync::Mutex`. The check-and-decrement in
//! `acquire` and the overwrite in `observe` both complete inside one critical
//! section with no await point, so two tasks can never both see the last unit
//! and both proceed. Waiting happens outside the lock.
//!
//! Local decrements are a conservative reservation between "decided to call"
//! and "response arrived". Server headers always win when they arrive.

use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use reqwest::header::HeaderMap;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::error::{Error, Result, TimeRemaining};
use crate::headers::QuotaHeaders;
use crate::metrics;

/// Observed `remaining` below this value logs a warning.
pub const LOW_REMAINING_THRESHOLD: i64 = 10;

/// One of the three independently throttled API surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PoolKind {
    /// REST API (5000/hour authenticated, 60/hour anonymous)
    Primary,
    /// Search API (30/minute)
    Search,
    /// GraphQL API (5000 points/hour)
    Query,
}

impl PoolKind {
    pub const ALL: [PoolKind; 3] = [PoolKind::Primary, PoolKind::Search, PoolKind::Query];

    /// Label for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            PoolKind::Primary => "primary",
            PoolKind::Search => "search",
            PoolKind::Query => "query",
        }
    }
}

impl fmt::Display for PoolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// What `acquire` does when a pool cannot cover the requested cost.
///
/// - `Wait`: the calling task sleeps until the reset time, then the pool is
///   replenished to its ceiling. Other tasks and pools keep running.
/// - `FailFast`: `acquire` returns `Error::Exhausted` without any network call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExhaustionPolicy {
    #[default]
    Wait,
    FailFast,
}

/// Quota state for a single pool.
#[derive(Debug, Clone)]
pub struct QuotaPool {
    ceiling: u32,
    remaining: i64,
    reset_at: Instant,
    /// Unix seconds matching `reset_at`, kept for error reporting
    reset_epoch: u64,
    window: Duration,
}

impl QuotaPool {
    /// Full pool whose first window ends `window` from now.
    pub fn new(ceiling: u32, window: Duration) -> Self {
        Self::with_remaining(ceiling, i64::from(ceiling), window, window)
    }

    /// Pool with explicit remaining capacity and time to reset.
    pub fn with_remaining(ceiling: u32, remaining: i64, reset_in: Duration, window: Duration) -> Self {
        Self {
            ceiling,
            remaining,
            reset_at: Instant::now() + reset_in,
            reset_epoch: epoch_now() + reset_in.as_secs(),
            window,
        }
    }

    /// GitHub's default REST budget.
    pub fn primary_default() -> Self {
        Self::new(5000, Duration::from_secs(3600))
    }

    /// REST budget for callers without a token.
    pub fn primary_anonymous() -> Self {
        Self::new(60, Duration::from_secs(3600))
    }

    /// GitHub's default search budget.
    pub fn search_default() -> Self {
        Self::new(30, Duration::from_secs(60))
    }

    /// GitHub's default GraphQL budget.
    pub fn query_default() -> Self {
        Self::new(5000, Duration::from_secs(3600))
    }

    fn try_take(&mut self, kind: PoolKind, cost: u32, policy: ExhaustionPolicy) -> Decision {
        let cost_units = i64::from(cost);
        if self.remaining >= cost_units {
            self.remaining -= cost_units;
            return Decision::Granted;
        }

        let now = Instant::now();
        if now >= self.reset_at {
            match policy {
                ExhaustionPolicy::Wait => {
                    debug!(pool = %kind, ceiling = self.ceiling, "window expired, replenishing");
                    self.remaining = i64::from(self.ceiling);
                    self.reset_at = now + self.window;
                    self.reset_epoch = epoch_now() + self.window.as_secs();
                    if self.remaining >= cost_units {
                        self.remaining -= cost_units;
                        return Decision::Granted;
                    }
                    return Decision::Refused(self.exhausted(kind));
                }
                ExhaustionPolicy::FailFast => {
                    // Reset time passed without a server update; let the call
                    // through and rely on the response headers to resync.
                    self.remaining -= cost_units;
                    return Decision::Granted;
                }
            }
        }

        match policy {
            ExhaustionPolicy::Wait => Decision::Wait(self.reset_at - now),
            ExhaustionPolicy::FailFast => Decision::Refused(self.exhausted(kind)),
        }
    }

    fn apply(&mut self, observed: &QuotaHeaders) {
        if let Some(limit) = observed.limit {
            self.ceiling = limit;
        }
        if let Some(remaining) = observed.remaining {
            self.remaining = remaining;
        }
        if let Some(reset) = observed.reset {
            let now = epoch_now();
            self.reset_epoch = reset;
            self.reset_at = Instant::now() + Duration::from_secs(reset.saturating_sub(now));
        }
    }

    fn exhausted(&self, kind: PoolKind) -> Error {
        Error::Exhausted {
            pool: kind,
            ceiling: self.ceiling,
            remaining: self.remaining,
            reset_in: TimeRemaining(self.reset_at.saturating_duration_since(Instant::now())),
            reset_at: self.reset_epoch,
        }
    }

    fn snapshot(&self) -> PoolSnapshot {
        PoolSnapshot {
            ceiling: self.ceiling,
            remaining: self.remaining,
            reset_in: self.reset_at.saturating_duration_since(Instant::now()),
            reset_at: self.reset_epoch,
        }
    }
}

/// Point-in-time view of a pool for status reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolSnapshot {
    pub ceiling: u32,
    pub remaining: i64,
    pub reset_in: Duration,
    /// Unix seconds
    pub reset_at: u64,
}

enum Decision {
    Granted,
    Wait(Duration),
    Refused(Error),
}

/// Quota ledger holding one independently locked pool per API surface.
pub struct QuotaLedger {
    primary: Mutex<QuotaPool>,
    search: Mutex<QuotaPool>,
    query: Mutex<QuotaPool>,
    policy: ExhaustionPolicy,
}

impl QuotaLedger {
    /// Ledger with GitHub's default budgets for all three pools.
    pub fn new(policy: ExhaustionPolicy) -> Self {
        Self::with_pools(
            policy,
            QuotaPool::primary_default(),
            QuotaPool::search_default(),
            QuotaPool::query_default(),
        )
    }

    pub fn with_pools(
        policy: ExhaustionPolicy,
        primary: QuotaPool,
        search: QuotaPool,
        query: QuotaPool,
    ) -> Self {
        info!(?policy, "quota ledger initialized");
        Self {
            primary: Mutex::new(primary),
            search: Mutex::new(search),
            query: Mutex::new(query),
            policy,
        }
    }

    pub fn policy(&self) -> ExhaustionPolicy {
        self.policy
    }

    /// Reserve `cost` units from `kind` before issuing a call.
    ///
    /// Under `Wait` this suspends only the calling task until the pool resets.
    /// Under `FailFast` an empty pool returns `Error::Exhausted` immediately.
    pub async fn acquire(&self, kind: PoolKind, cost: u32) -> Result<()> {
        loop {
            let decision = {
                let mut pool = self.lock(kind);
                if cost > pool.ceiling {
                    return Err(Error::CostExceedsCeiling {
                        pool: kind,
                        cost,
                        ceiling: pool.ceiling,
                    });
                }
                pool.try_take(kind, cost, self.policy)
            };

            match decision {
                Decision::Granted => return Ok(()),
                Decision::Wait(delay) => {
                    warn!(
                        pool = %kind,
                        wait_secs = delay.as_secs(),
                        resets_in = %TimeRemaining(delay),
                        "quota exhausted, waiting for reset"
                    );
                    metrics::record_wait(kind);
                    tokio::time::sleep(delay).await;
                }
                Decision::Refused(err) => {
                    warn!(pool = %kind, error = %err, "quota exhausted, refusing call");
                    metrics::record_refusal(kind);
                    return Err(err);
                }
            }
        }
    }

    /// Overwrite pool state with server-declared values from a response.
    pub fn observe(&self, kind: PoolKind, headers: &HeaderMap) {
        self.update(kind, &QuotaHeaders::from_headers(headers));
    }

    /// Overwrite pool state with server-declared values from any source
    /// (response headers, the rate limit endpoint).
    pub fn update(&self, kind: PoolKind, observed: &QuotaHeaders) {
        if observed.is_empty() {
            return;
        }

        let remaining = {
            let mut pool = self.lock(kind);
            let before = pool.remaining;
            pool.apply(observed);
            if pool.remaining < LOW_REMAINING_THRESHOLD && before >= LOW_REMAINING_THRESHOLD {
                warn!(
                    pool = %kind,
                    remaining = pool.remaining,
                    ceiling = pool.ceiling,
                    "quota running low"
                );
            }
            pool.remaining
        };

        debug!(pool = %kind, remaining, "quota observed");
        metrics::record_remaining(kind, remaining);
    }

    pub fn snapshot(&self, kind: PoolKind) -> PoolSnapshot {
        self.lock(kind).snapshot()
    }

    fn lock(&self, kind: PoolKind) -> MutexGuard<'_, QuotaPool> {
        let slot = match kind {
            PoolKind::Primary => &self.primary,
            PoolKind::Search => &self.search,
            PoolKind::Query => &self.query,
        };
        // Critical sections never panic midway, so poisoned state is still consistent.
        slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for QuotaLedger {
    fn default() -> Self {
        Self::new(ExhaustionPolicy::default())
    }
}

fn epoch_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
