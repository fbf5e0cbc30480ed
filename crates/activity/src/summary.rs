//! Aggregate counts over a collection

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::collector::{ActivityData, Window};

/// Most active repositories kept in a summary
pub const MOST_ACTIVE_LIMIT: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepoActivity {
    pub repo: String,
    pub activity_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivitySummary {
    pub login: String,
    pub period_start: Option<DateTime<Utc>>,
    pub period_end: Option<DateTime<Utc>>,
    pub total_events: usize,
    pub total_commits: usize,
    pub prs_opened: usize,
    pub prs_merged: usize,
    pub issues_opened: usize,
    pub issues_closed: usize,
    pub total_reviews: usize,
    /// Sorted by name
    pub repos_contributed_to: Vec<String>,
    pub most_active_repos: Vec<RepoActivity>,
}

impl ActivitySummary {
    pub fn from_activity(login: &str, data: &ActivityData, window: &Window) -> Self {
        let mut per_repo: BTreeMap<&str, usize> = BTreeMap::new();
        let repos = data
            .commits
            .iter()
            .map(|c| c.repo.as_str())
            .chain(data.pull_requests.iter().map(|pr| pr.repo.as_str()))
            .chain(data.issues.iter().map(|i| i.repo.as_str()))
            .filter(|repo| !repo.is_empty());
        for repo in repos {
            *per_repo.entry(repo).or_default() += 1;
        }

        let repos_contributed_to: Vec<String> =
            per_repo.keys().map(|repo| (*repo).to_owned()).collect();

        let mut most_active: Vec<RepoActivity> = per_repo
            .into_iter()
            .map(|(repo, activity_count)| RepoActivity {
                repo: repo.to_owned(),
                activity_count,
            })
            .collect();
        // Stable sort over name-ordered input: ties stay alphabetical
        most_active.sort_by(|a, b| b.activity_count.cmp(&a.activity_count));
        most_active.truncate(MOST_ACTIVE_LIMIT);

        Self {
            login: login.to_owned(),
            period_start: window.since,
            period_end: window.until,
            total_events: data.events.len(),
            total_commits: data.commits.len(),
            prs_opened: data
                .pull_requests
                .iter()
                .filter(|pr| pr.author == login)
                .count(),
            prs_merged: data.pull_requests.iter().filter(|pr| pr.is_merged).count(),
            issues_opened: data.issues.iter().filter(|i| i.author == login).count(),
            issues_closed: data.issues.iter().filter(|i| i.state == "closed").count(),
            total_reviews: data.reviews.len(),
            repos_contributed_to,
            most_active_repos: most_active,
        }
    }
}
