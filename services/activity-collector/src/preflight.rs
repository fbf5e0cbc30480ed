//! Quota check before a run
//!
//! Reads `GET /rate_limit` and seeds the ledger with the live budgets. An
//! exhausted primary budget stops the run before anything is spent. When the
//! endpoint cannot be read the default budgets stay in place.

use anyhow::{Result, bail};
use quota::{PoolKind, TimeRemaining};
use tracing::{info, warn};
use transport::{RestTransport, Transport};

pub async fn check_rate_limit(rest: &RestTransport) -> Result<()> {
    let status = match rest.rate_limit().await {
        Ok(status) => status,
        Err(e) => {
            warn!(error = %e, "could not check rate limit, using default budgets");
            return Ok(());
        }
    };
    status.apply_to(rest.ledger());

    let Some(core) = status.core else {
        return Ok(());
    };
    if core.remaining <= 0 {
        let reset_in = rest.ledger().snapshot(PoolKind::Primary).reset_in;
        let hint = if rest.is_authenticated() {
            ""
        } else {
            " (a token raises the limit to 5000 requests/hour)"
        };
        bail!(
            "rate limit exhausted (0/{} requests remaining), resets in {}{hint}",
            core.limit,
            TimeRemaining(reset_in)
        );
    }

    info!(
        remaining = core.remaining,
        limit = core.limit,
        search_remaining = status.search.map(|s| s.remaining),
        "rate limit checked"
    );
    Ok(())
}
