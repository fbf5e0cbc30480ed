//! Contribution calendar fetch over GraphQL

use std::collections::BTreeMap;

use chrono::{Datelike, Months, NaiveDate, Utc};
use serde_json::{Value, json};
use tracing::{info, instrument, warn};
use transport::{Request, Transport};

use crate::calendar::ContributionStats;
use crate::error::{Error, Result};

/// Calendar plus per-kind totals for one account and date range.
pub const CONTRIBUTIONS_QUERY: &str = r#"
query($username: String!, $from: DateTime!, $to: DateTime!) {
  user(login: $username) {
    contributionsCollection(from: $from, to: $to) {
      contributionCalendar {
        totalContributions
        weeks {
          contributionDays {
            date
            contributionCount
            contributionLevel
          }
        }
      }
      totalCommitContributions
      totalIssueContributions
      totalPullRequestContributions
      totalPullRequestReviewContributions
      restrictedContributionsCount
    }
  }
}
"#;

/// Fetch contribution statistics for `login` between two dates (inclusive).
///
/// `to` defaults to today and `from` to one year before `to`.
#[instrument(skip(transport), fields(transport = transport.id()))]
pub async fn fetch_contributions(
    transport: &dyn Transport,
    login: &str,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> Result<ContributionStats> {
    let to = to.unwrap_or_else(|| Utc::now().date_naive());
    let from = from.unwrap_or_else(|| one_year_before(to));

    let variables = json!({
        "username": login,
        "from": format!("{from}T00:00:00Z"),
        "to": format!("{to}T23:59:59Z"),
    });
    let response = transport
        .send(&Request::query(CONTRIBUTIONS_QUERY, variables))
        .await?;

    let collection = match response.body.pointer("/data/user") {
        Some(Value::Null) | None => return Err(Error::UserNotFound(login.to_owned())),
        Some(user) => user
            .get("contributionsCollection")
            .cloned()
            .unwrap_or(Value::Null),
    };
    let stats: ContributionStats = if collection.is_null() {
        ContributionStats::default()
    } else {
        serde_json::from_value(collection)?
    };

    info!(
        total = stats.calendar.total_contributions,
        %from,
        %to,
        "contributions fetched"
    );
    Ok(stats)
}

/// Fetch each calendar year in `years`, oldest first.
///
/// The current year stops at today and future years are skipped. A year that
/// fails is logged and left out of the result.
pub async fn fetch_yearly(
    transport: &dyn Transport,
    login: &str,
    years: &[i32],
) -> BTreeMap<i32, ContributionStats> {
    fetch_yearly_until(transport, login, years, Utc::now().date_naive()).await
}

pub(crate) async fn fetch_yearly_until(
    transport: &dyn Transport,
    login: &str,
    years: &[i32],
    today: NaiveDate,
) -> BTreeMap<i32, ContributionStats> {
    let mut results = BTreeMap::new();
    for &year in years {
        let (Some(from), Some(end)) = (
            NaiveDate::from_ymd_opt(year, 1, 1),
            NaiveDate::from_ymd_opt(year, 12, 31),
        ) else {
            warn!(year, "year out of range, skipping");
            continue;
        };
        if from > today {
            continue;
        }
        match fetch_contributions(transport, login, Some(from), Some(end.min(today))).await {
            Ok(stats) => {
                results.insert(year, stats);
            }
            Err(e) => warn!(year, error = %e, "failed to fetch contributions for year"),
        }
    }
    results
}

fn one_year_before(date: NaiveDate) -> NaiveDate {
    date.checked_sub_months(Months::new(12))
        .unwrap_or_else(|| date.with_day(1).unwrap_or(date))
}
