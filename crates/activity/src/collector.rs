//! Collection orchestration
//!
//! A collection always reads the public events feed. A deep collection then
//! runs the three search gathers concurrently (authenticated callers only)
//! and fetches per-repository commit histories through a bounded task set.
//! Without named repositories, the account's most recently updated ones are
//! listed first. Search gathers, the listing and repository fetches fail in
//! isolation: the failure is recorded as a warning and contributes nothing.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, instrument, warn};
use transport::pages::{DEFAULT_PAGE_DELAY, MAX_PER_PAGE};
use transport::{Endpoint, PageWalker, PoolKind, Transport};

use crate::error::{Error, Result};
use crate::models::{Commit, Event, Issue, PullRequest, commits_from_events, decode_all};

/// How much of the API surface a collection touches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Depth {
    /// Events feed only
    Shallow,
    /// Events, searches and repository commit histories
    #[default]
    Deep,
}

/// Creation-date bounds applied to searches and commit histories.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Window {
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

impl Window {
    pub fn new(since: Option<DateTime<Utc>>, until: Option<DateTime<Utc>>) -> Self {
        Self { since, until }
    }

    /// The `days` days ending now.
    pub fn last_days(days: u32) -> Self {
        let until = Utc::now();
        Self {
            since: until.checked_sub_signed(TimeDelta::days(i64::from(days))),
            until: Some(until),
        }
    }

    fn search_qualifiers(&self) -> String {
        let mut qualifiers = String::new();
        if let Some(since) = self.since {
            qualifiers.push_str(&format!(" created:>={}", since.format("%Y-%m-%d")));
        }
        if let Some(until) = self.until {
            qualifiers.push_str(&format!(" created:<={}", until.format("%Y-%m-%d")));
        }
        qualifiers
    }
}

/// Tunables for a `Collector`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectorSettings {
    pub events_max_pages: u32,
    /// Most recently updated repositories whose histories are read when the
    /// caller names none (0 disables the lookup)
    pub discovered_repositories: usize,
    pub max_commits_per_repo: usize,
    /// Repository fetches in flight at once
    pub concurrency: usize,
    pub page_delay: Duration,
}

impl Default for CollectorSettings {
    fn default() -> Self {
        Self {
            events_max_pages: 10,
            discovered_repositories: 20,
            max_commits_per_repo: 100,
            concurrency: 5,
            page_delay: DEFAULT_PAGE_DELAY,
        }
    }
}

/// Everything one collection produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ActivityData {
    pub events: Vec<Event>,
    pub commits: Vec<Commit>,
    pub pull_requests: Vec<PullRequest>,
    pub issues: Vec<Issue>,
    /// Pull requests the account reviewed
    pub reviews: Vec<PullRequest>,
    /// One entry per gather that failed or was skipped
    pub warnings: Vec<String>,
}

impl ActivityData {
    fn warn(&mut self, message: String) {
        warn!(warning = %message, "collection degraded");
        self.warnings.push(message);
    }

    /// Keep a gather's records, or record its failure and keep nothing.
    fn absorb<T>(&mut self, what: &str, result: Result<Vec<T>>) -> Vec<T> {
        match result {
            Ok(records) => records,
            Err(e) => {
                self.warn(format!("{what}: {e}"));
                Vec::new()
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum SearchGather {
    PullRequests,
    Issues,
    Reviews,
}

impl SearchGather {
    fn qualifier(self, login: &str) -> String {
        match self {
            SearchGather::PullRequests => format!("author:{login} type:pr"),
            SearchGather::Issues => format!("author:{login} type:issue"),
            SearchGather::Reviews => format!("reviewed-by:{login} type:pr"),
        }
    }

    fn cap(self) -> usize {
        match self {
            SearchGather::PullRequests | SearchGather::Issues => 1000,
            SearchGather::Reviews => 500,
        }
    }

    fn label(self) -> &'static str {
        match self {
            SearchGather::PullRequests => "authored pull requests",
            SearchGather::Issues => "authored issues",
            SearchGather::Reviews => "reviewed pull requests",
        }
    }
}

pub struct Collector {
    transport: Arc<dyn Transport>,
    settings: CollectorSettings,
}

impl Collector {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            settings: CollectorSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: CollectorSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Collect activity for `login`.
    ///
    /// Only an events-feed failure aborts the collection. Dropping the
    /// returned future cancels every outstanding request.
    #[instrument(skip(self, window, repositories), fields(transport = self.transport.id()))]
    pub async fn collect(
        &self,
        login: &str,
        window: &Window,
        depth: Depth,
        repositories: &[String],
    ) -> Result<ActivityData> {
        let events = self.collect_events(login).await?;
        let event_commits = commits_from_events(&events);
        info!(
            events = events.len(),
            commits = event_commits.len(),
            "events feed collected"
        );

        let mut data = ActivityData {
            events,
            ..Default::default()
        };

        if depth == Depth::Shallow {
            data.commits = event_commits;
            return Ok(data);
        }

        if self.transport.is_authenticated() {
            let (prs, issues, reviews) = tokio::join!(
                self.search(login, window, SearchGather::PullRequests),
                self.search(login, window, SearchGather::Issues),
                self.search(login, window, SearchGather::Reviews),
            );
            data.pull_requests = data.absorb(
                SearchGather::PullRequests.label(),
                prs.map(|items| decode_all(items, "pull request", PullRequest::from_api)),
            );
            data.issues = data.absorb(
                SearchGather::Issues.label(),
                issues.map(|items| decode_all(items, "issue", Issue::from_api)),
            );
            data.reviews = data.absorb(
                SearchGather::Reviews.label(),
                reviews.map(|items| decode_all(items, "pull request", PullRequest::from_api)),
            );
        } else {
            data.warn("searches skipped: the search API requires a token".to_owned());
        }

        let discovered;
        let repositories = if repositories.is_empty() {
            let listing = self.discover_repositories(login).await;
            discovered = data.absorb("repository listing", listing);
            discovered.as_slice()
        } else {
            repositories
        };
        let history = if repositories.is_empty() {
            Vec::new()
        } else {
            self.collect_repository_commits(login, window, repositories, &mut data)
                .await
        };
        data.commits = merge_commits(event_commits, history);

        info!(
            commits = data.commits.len(),
            pull_requests = data.pull_requests.len(),
            issues = data.issues.len(),
            reviews = data.reviews.len(),
            warnings = data.warnings.len(),
            "collection complete"
        );
        Ok(data)
    }

    fn walker(&self) -> PageWalker<'_> {
        PageWalker::new(self.transport.as_ref()).with_page_delay(self.settings.page_delay)
    }

    async fn collect_events(&self, login: &str) -> Result<Vec<Event>> {
        let endpoint = Endpoint::from_segments(["users", login, "events", "public"])?;
        let items = match self
            .walker()
            .drain(
                PoolKind::Primary,
                endpoint.as_str(),
                Some(self.settings.events_max_pages),
                MAX_PER_PAGE,
            )
            .await
        {
            Ok(items) => items,
            Err(transport::Error::NotFound { .. }) => {
                return Err(Error::UserNotFound(login.to_owned()));
            }
            Err(e) => return Err(e.into()),
        };
        Ok(decode_all(items, "event", Event::from_api))
    }

    /// Full names of the account's most recently updated repositories.
    async fn discover_repositories(&self, login: &str) -> Result<Vec<String>> {
        let limit = self.settings.discovered_repositories;
        if limit == 0 {
            return Ok(Vec::new());
        }
        let endpoint =
            Endpoint::from_segments(["users", login, "repos"])?.with_query("sort", "updated");
        let per_page = limit.clamp(1, MAX_PER_PAGE as usize) as u32;
        let items = self
            .walker()
            .drain(
                PoolKind::Primary,
                endpoint.as_str(),
                Some(pages_for(limit)),
                per_page,
            )
            .await?;

        let names: Vec<String> = items
            .iter()
            .filter_map(|repo| repo.get("full_name").and_then(Value::as_str))
            .take(limit)
            .map(str::to_owned)
            .collect();
        info!(repositories = names.len(), "repositories discovered");
        Ok(names)
    }

    async fn search(&self, login: &str, window: &Window, gather: SearchGather) -> Result<Vec<Value>> {
        let query = format!("{}{}", gather.qualifier(login), window.search_qualifiers());
        let endpoint = Endpoint::from_segments(["search", "issues"])?
            .with_query("q", &query)
            .with_query("sort", "updated")
            .with_query("order", "desc");
        let cap = gather.cap();

        let mut items = self
            .walker()
            .drain(
                PoolKind::Search,
                endpoint.as_str(),
                Some(pages_for(cap)),
                MAX_PER_PAGE,
            )
            .await?;
        items.truncate(cap);
        debug!(gather = gather.label(), items = items.len(), "search gathered");
        Ok(items)
    }

    async fn collect_repository_commits(
        &self,
        login: &str,
        window: &Window,
        repositories: &[String],
        data: &mut ActivityData,
    ) -> Vec<Commit> {
        let semaphore = Arc::new(Semaphore::new(self.settings.concurrency.max(1)));
        let mut tasks = JoinSet::new();

        for (index, name) in repositories.iter().enumerate() {
            let Some((owner, repo)) = split_repository(name) else {
                data.warn(format!("skipping repository {name:?}: expected owner/repo"));
                continue;
            };
            let endpoint = match commits_endpoint(owner, repo, login, window) {
                Ok(endpoint) => endpoint,
                Err(e) => {
                    data.warn(format!("skipping repository {name:?}: {e}"));
                    continue;
                }
            };
            let transport = Arc::clone(&self.transport);
            let semaphore = Arc::clone(&semaphore);
            let name = name.clone();
            let limit = self.settings.max_commits_per_repo;
            let page_delay = self.settings.page_delay;

            tasks.spawn(async move {
                // Local semaphore, never closed
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return (index, name, Ok(Vec::new()));
                };
                let result =
                    fetch_repository_commits(transport, &endpoint, &name, limit, page_delay).await;
                (index, name, result)
            });
        }

        let mut finished = Vec::with_capacity(tasks.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(outcome) => finished.push(outcome),
                Err(e) => data.warn(format!("repository commit task failed: {e}")),
            }
        }
        finished.sort_by_key(|(index, _, _)| *index);

        let mut commits = Vec::new();
        for (_, name, result) in finished {
            match result {
                Ok(batch) => {
                    debug!(repo = %name, commits = batch.len(), "repository history fetched");
                    commits.extend(batch);
                }
                Err(e) => data.warn(format!("commits for {name}: {e}")),
            }
        }
        commits
    }
}

async fn fetch_repository_commits(
    transport: Arc<dyn Transport>,
    endpoint: &str,
    repo: &str,
    limit: usize,
    page_delay: Duration,
) -> Result<Vec<Commit>> {
    let per_page = limit.clamp(1, MAX_PER_PAGE as usize) as u32;
    let items = PageWalker::new(transport.as_ref())
        .with_page_delay(page_delay)
        .drain(PoolKind::Primary, endpoint, Some(pages_for(limit)), per_page)
        .await?;
    let items: Vec<Value> = items.into_iter().take(limit).collect();
    Ok(decode_all(items, "commit", |value| Commit::from_api(value, repo)))
}

/// Event-derived commits followed by history commits, one per SHA; the first
/// occurrence wins.
pub fn merge_commits(event_commits: Vec<Commit>, history: Vec<Commit>) -> Vec<Commit> {
    let mut seen = HashSet::new();
    event_commits
        .into_iter()
        .chain(history)
        .filter(|commit| seen.insert(commit.sha.clone()))
        .collect()
}

fn split_repository(name: &str) -> Option<(&str, &str)> {
    let (owner, repo) = name.split_once('/')?;
    if owner.is_empty() || repo.is_empty() || repo.contains('/') {
        return None;
    }
    Some((owner, repo))
}

fn commits_endpoint(owner: &str, repo: &str, login: &str, window: &Window) -> transport::Result<String> {
    let mut endpoint =
        Endpoint::from_segments(["repos", owner, repo, "commits"])?.with_query("author", login);
    if let Some(since) = window.since {
        endpoint = endpoint.with_query("since", &since.to_rfc3339_opts(SecondsFormat::Secs, true));
    }
    if let Some(until) = window.until {
        endpoint = endpoint.with_query("until", &until.to_rfc3339_opts(SecondsFormat::Secs, true));
    }
    Ok(endpoint.into())
}

fn pages_for(results: usize) -> u32 {
    results.div_ceil(MAX_PER_PAGE as usize).max(1) as u32
}
