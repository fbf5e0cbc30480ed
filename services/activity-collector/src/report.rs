//! JSON document written to stdout at the end of a run

use std::collections::BTreeMap;

use activity::{ActivityData, ActivitySummary, ContributionStats, ContributionSummary, Window};
use quota::{PoolKind, QuotaLedger};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct Report {
    pub run_id: String,
    pub login: String,
    pub window: Window,
    pub summary: ActivitySummary,
    pub activity: ActivityData,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contributions: Option<Contributions>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub yearly_contributions: BTreeMap<i32, ContributionSummary>,
    pub quota: Vec<QuotaStatus>,
}

#[derive(Debug, Serialize)]
pub struct Contributions {
    pub summary: ContributionSummary,
    pub stats: ContributionStats,
}

impl From<ContributionStats> for Contributions {
    fn from(stats: ContributionStats) -> Self {
        Self {
            summary: stats.summary(),
            stats,
        }
    }
}

/// Pool state at the end of the run.
#[derive(Debug, Serialize)]
pub struct QuotaStatus {
    pub pool: PoolKind,
    pub ceiling: u32,
    pub remaining: i64,
    pub reset_in_secs: u64,
    /// Unix seconds
    pub reset_at: u64,
}

impl QuotaStatus {
    pub fn all(ledger: &QuotaLedger) -> Vec<Self> {
        PoolKind::ALL
            .iter()
            .map(|&pool| {
                let snapshot = ledger.snapshot(pool);
                Self {
                    pool,
                    ceiling: snapshot.ceiling,
                    remaining: snapshot.remaining,
                    reset_in_secs: snapshot.reset_in.as_secs(),
                    reset_at: snapshot.reset_at,
                }
            })
            .collect()
    }
}
