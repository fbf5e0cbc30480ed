//! `GET /rate_limit` response
//!
//! Reports the live budget of every pool without spending any of it, so a
//! session can start from the server's numbers instead of defaults.

use quota::{PoolKind, QuotaHeaders, QuotaLedger};
use serde::Deserialize;
use serde_json::Value;

use crate::error::{Error, Result};

/// One pool's entry under `resources`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct RateLimitResource {
    pub limit: u32,
    pub remaining: i64,
    /// Unix seconds
    pub reset: u64,
}

impl RateLimitResource {
    pub fn as_quota(&self) -> QuotaHeaders {
        QuotaHeaders {
            limit: Some(self.limit),
            remaining: Some(self.remaining),
            reset: Some(self.reset),
        }
    }
}

/// The resources the collector spends from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RateLimitStatus {
    pub core: Option<RateLimitResource>,
    pub search: Option<RateLimitResource>,
    pub graphql: Option<RateLimitResource>,
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(default)]
    resources: RateLimitStatus,
}

impl RateLimitStatus {
    pub fn from_body(body: Value) -> Result<Self> {
        serde_json::from_value::<Envelope>(body)
            .map(|envelope| envelope.resources)
            .map_err(|e| Error::Decode(format!("rate limit status: {e}")))
    }

    pub fn resource(&self, pool: PoolKind) -> Option<&RateLimitResource> {
        match pool {
            PoolKind::Primary => self.core.as_ref(),
            PoolKind::Search => self.search.as_ref(),
            PoolKind::Query => self.graphql.as_ref(),
        }
    }

    /// Overwrite every reported pool in `ledger`.
    pub fn apply_to(&self, ledger: &QuotaLedger) {
        for pool in PoolKind::ALL {
            if let Some(resource) = self.resource(pool) {
                ledger.update(pool, &resource.as_quota());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn body() -> Value {
        json!({
            "resources": {
                "core": {"limit": 5000, "used": 4990, "remaining": 10, "reset": 4_000_000_000u64},
                "search": {"limit": 30, "used": 0, "remaining": 30, "reset": 4_000_000_060u64},
                "code_search": {"limit": 10, "used": 0, "remaining": 10, "reset": 4_000_000_060u64}
            },
            "rate": {"limit": 5000, "used": 4990, "remaining": 10, "reset": 4_000_000_000u64}
        })
    }

    #[test]
    fn parses_reported_resources() {
        let status = RateLimitStatus::from_body(body()).unwrap();
        assert_eq!(
            status.core,
            Some(RateLimitResource {
                limit: 5000,
                remaining: 10,
                reset: 4_000_000_000,
            })
        );
        assert_eq!(status.resource(PoolKind::Search).map(|r| r.limit), Some(30));
        assert!(status.graphql.is_none());
    }

    #[test]
    fn apply_overwrites_only_reported_pools() {
        let ledger = QuotaLedger::default();
        RateLimitStatus::from_body(body()).unwrap().apply_to(&ledger);

        let primary = ledger.snapshot(PoolKind::Primary);
        assert_eq!((primary.ceiling, primary.remaining), (5000, 10));
        assert_eq!(primary.reset_at, 4_000_000_000);
        assert_eq!(ledger.snapshot(PoolKind::Search).remaining, 30);
        assert_eq!(ledger.snapshot(PoolKind::Query).remaining, 5000);
    }

    #[test]
    fn non_object_body_is_a_decode_error() {
        assert!(matches!(
            RateLimitStatus::from_body(json!("nope")),
            Err(Error::Decode(_))
        ));
    }

    #[test]
    fn missing_resources_is_empty() {
        assert_eq!(
            RateLimitStatus::from_body(json!({})).unwrap(),
            RateLimitStatus::default()
        );
    }
}
