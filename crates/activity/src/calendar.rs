//! Contribution calendar and streak analytics
//!
//! A calendar is an ordered list of weeks, each an ordered list of days.
//! Analytics walk the flattened day sequence; days missing from the calendar
//! are simply absent, never treated as zero.
//!
//! Field aliases accept the GraphQL `contributionsCollection` shape directly.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// GitHub's quartile bucket for a day's contribution count.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContributionLevel {
    #[default]
    None,
    FirstQuartile,
    SecondQuartile,
    ThirdQuartile,
    FourthQuartile,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributionDay {
    pub date: NaiveDate,
    #[serde(default, alias = "contributionCount")]
    pub count: u32,
    #[serde(default, alias = "contributionLevel")]
    pub level: ContributionLevel,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Week {
    #[serde(default, alias = "contributionDays")]
    pub days: Vec<ContributionDay>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Calendar {
    /// Total as reported by the server
    #[serde(default, alias = "totalContributions")]
    pub total_contributions: u64,
    #[serde(default)]
    pub weeks: Vec<Week>,
}

impl Calendar {
    /// Calendar of consecutive single-day weeks, oldest first.
    pub fn from_days(days: Vec<ContributionDay>) -> Self {
        let total_contributions = days.iter().map(|d| u64::from(d.count)).sum();
        Self {
            total_contributions,
            weeks: days.into_iter().map(|day| Week { days: vec![day] }).collect(),
        }
    }

    /// Every day in chronological order.
    pub fn days(&self) -> impl DoubleEndedIterator<Item = &ContributionDay> {
        self.weeks.iter().flat_map(|week| week.days.iter())
    }

    /// Sum of the per-day counts.
    pub fn total(&self) -> u64 {
        self.days().map(|d| u64::from(d.count)).sum()
    }

    /// Consecutive active days ending at the last day; zero when the last day
    /// itself is inactive.
    pub fn current_streak(&self) -> u32 {
        self.days().rev().take_while(|d| d.count > 0).count() as u32
    }

    pub fn longest_streak(&self) -> u32 {
        let mut longest = 0;
        let mut current = 0;
        for day in self.days() {
            if day.count > 0 {
                current += 1;
                longest = longest.max(current);
            } else {
                current = 0;
            }
        }
        longest
    }

    /// Day with the highest count; the earliest wins a tie.
    pub fn busiest_day(&self) -> Option<&ContributionDay> {
        let mut busiest: Option<&ContributionDay> = None;
        for day in self.days() {
            if busiest.is_none_or(|best| day.count > best.count) {
                busiest = Some(day);
            }
        }
        busiest
    }
}

/// Contribution totals plus the calendar for one date range.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributionStats {
    #[serde(default, alias = "totalCommitContributions")]
    pub total_commits: u64,
    #[serde(default, alias = "totalIssueContributions")]
    pub total_issues: u64,
    #[serde(default, alias = "totalPullRequestContributions")]
    pub total_pull_requests: u64,
    #[serde(default, alias = "totalPullRequestReviewContributions")]
    pub total_reviews: u64,
    /// Private contributions, count only
    #[serde(default, alias = "restrictedContributionsCount")]
    pub restricted_contributions: u64,
    #[serde(default, alias = "contributionCalendar")]
    pub calendar: Calendar,
}

/// Flat digest of `ContributionStats` for reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContributionSummary {
    pub total_contributions: u64,
    pub commits: u64,
    pub pull_requests: u64,
    pub issues: u64,
    pub reviews: u64,
    pub restricted_contributions: u64,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub busiest_day: Option<NaiveDate>,
    pub busiest_day_count: u32,
}

impl ContributionStats {
    pub fn summary(&self) -> ContributionSummary {
        let busiest = self.calendar.busiest_day();
        ContributionSummary {
            total_contributions: self.calendar.total_contributions,
            commits: self.total_commits,
            pull_requests: self.total_pull_requests,
            issues: self.total_issues,
            reviews: self.total_reviews,
            restricted_contributions: self.restricted_contributions,
            current_streak: self.calendar.current_streak(),
            longest_streak: self.calendar.longest_streak(),
            busiest_day: busiest.map(|d| d.date),
            busiest_day_count: busiest.map_or(0, |d| d.count),
        }
    }
}
