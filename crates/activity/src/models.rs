//! Typed activity records built from raw API JSON
//!
//! Upstream objects are loose: nested objects can be `null` (a commit whose
//! author has no GitHub account) and many fields are optional. The raw shapes
//! below mirror that looseness; the public records fill in defaults.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

/// An entry from the public events feed. Identity: `id`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub actor: String,
    pub repo: String,
    pub created_at: DateTime<Utc>,
    pub payload: Value,
    pub public: bool,
}

/// A commit, either from a push event payload or a repository history.
/// Identity: `sha`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Commit {
    pub sha: String,
    /// First line of the commit message
    pub message: String,
    pub author: String,
    pub author_email: Option<String>,
    pub date: DateTime<Utc>,
    pub repo: String,
    pub url: String,
}

/// A pull request from the search API. Identity: `repo` + `number`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PullRequest {
    pub number: u64,
    pub title: String,
    pub state: String,
    pub author: String,
    pub repo: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
    pub merged_at: Option<DateTime<Utc>>,
    pub url: String,
    pub is_merged: bool,
}

/// An issue from the search API. Identity: `repo` + `number`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Issue {
    pub number: u64,
    pub title: String,
    pub state: String,
    pub author: String,
    pub repo: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
    pub url: String,
    pub labels: Vec<String>,
    pub comments: u64,
}

#[derive(Deserialize)]
struct Login {
    login: Option<String>,
}

#[derive(Deserialize)]
struct Named {
    name: Option<String>,
}

#[derive(Deserialize)]
struct RawEvent {
    id: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
    actor: Option<Login>,
    repo: Option<Named>,
    created_at: Option<DateTime<Utc>>,
    payload: Option<Value>,
    public: Option<bool>,
}

#[derive(Deserialize)]
struct RawPushCommit {
    sha: Option<String>,
    message: Option<String>,
    author: Option<RawSignature>,
}

#[derive(Deserialize)]
struct RawSignature {
    name: Option<String>,
    email: Option<String>,
    date: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
struct RawCommit {
    sha: Option<String>,
    commit: Option<RawCommitDetail>,
    author: Option<Login>,
    html_url: Option<String>,
}

#[derive(Deserialize)]
struct RawCommitDetail {
    message: Option<String>,
    author: Option<RawSignature>,
}

#[derive(Deserialize)]
struct RawLabel {
    name: Option<String>,
}

#[derive(Deserialize)]
struct RawPullRequestRef {
    merged_at: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
struct RawSearchItem {
    number: Option<u64>,
    title: Option<String>,
    state: Option<String>,
    user: Option<Login>,
    repository_url: Option<String>,
    html_url: Option<String>,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
    closed_at: Option<DateTime<Utc>>,
    merged_at: Option<DateTime<Utc>>,
    merged: Option<bool>,
    pull_request: Option<RawPullRequestRef>,
    #[serde(default)]
    labels: Vec<RawLabel>,
    comments: Option<u64>,
}

impl Event {
    pub fn from_api(value: Value) -> serde_json::Result<Self> {
        let raw: RawEvent = serde_json::from_value(value)?;
        Ok(Self {
            id: raw.id.unwrap_or_default(),
            kind: raw.kind.unwrap_or_default(),
            actor: raw.actor.and_then(|a| a.login).unwrap_or_default(),
            repo: raw.repo.and_then(|r| r.name).unwrap_or_default(),
            created_at: raw.created_at.unwrap_or_else(Utc::now),
            payload: raw.payload.unwrap_or_else(|| Value::Object(Default::default())),
            public: raw.public.unwrap_or(true),
        })
    }

    pub fn is_push(&self) -> bool {
        self.kind == "PushEvent"
    }
}

impl Commit {
    /// Commit from one entry of a push event's `payload.commits`. The push
    /// time stands in for the commit date.
    pub fn from_push_event(event: &Event, commit: &Value) -> serde_json::Result<Self> {
        let raw = RawPushCommit::deserialize(commit)?;
        let sha = raw.sha.unwrap_or_default();
        let (author, author_email) = match raw.author {
            Some(signature) => (
                signature.name.unwrap_or_else(|| event.actor.clone()),
                signature.email,
            ),
            None => (event.actor.clone(), None),
        };
        Ok(Self {
            url: format!("https://github.com/{}/commit/{sha}", event.repo),
            sha,
            message: first_line(raw.message.as_deref()),
            author,
            author_email,
            date: event.created_at,
            repo: event.repo.clone(),
        })
    }

    /// Commit from a repository history entry.
    pub fn from_api(value: Value, repo: &str) -> serde_json::Result<Self> {
        let raw: RawCommit = serde_json::from_value(value)?;
        let (message, signature) = match raw.commit {
            Some(detail) => (detail.message, detail.author),
            None => (None, None),
        };
        let (name, email, date) = match signature {
            Some(s) => (s.name, s.email, s.date),
            None => (None, None, None),
        };
        Ok(Self {
            sha: raw.sha.unwrap_or_default(),
            message: first_line(message.as_deref()),
            author: raw
                .author
                .and_then(|a| a.login)
                .or(name)
                .unwrap_or_default(),
            author_email: email,
            date: date.unwrap_or_else(Utc::now),
            repo: repo.to_owned(),
            url: raw.html_url.unwrap_or_default(),
        })
    }
}

impl PullRequest {
    pub fn from_api(value: Value) -> serde_json::Result<Self> {
        let raw: RawSearchItem = serde_json::from_value(value)?;
        let merged_at = raw
            .merged_at
            .or_else(|| raw.pull_request.and_then(|pr| pr.merged_at));
        Ok(Self {
            number: raw.number.unwrap_or_default(),
            title: raw.title.unwrap_or_default(),
            state: raw.state.unwrap_or_default(),
            author: raw.user.and_then(|u| u.login).unwrap_or_default(),
            repo: repository_name(raw.repository_url.as_deref(), raw.html_url.as_deref()),
            created_at: raw.created_at.unwrap_or_else(Utc::now),
            updated_at: raw.updated_at,
            closed_at: raw.closed_at,
            is_merged: raw.merged.unwrap_or(false) || merged_at.is_some(),
            merged_at,
            url: raw.html_url.unwrap_or_default(),
        })
    }
}

impl Issue {
    pub fn from_api(value: Value) -> serde_json::Result<Self> {
        let raw: RawSearchItem = serde_json::from_value(value)?;
        Ok(Self {
            number: raw.number.unwrap_or_default(),
            title: raw.title.unwrap_or_default(),
            state: raw.state.unwrap_or_default(),
            author: raw.user.and_then(|u| u.login).unwrap_or_default(),
            repo: repository_name(raw.repository_url.as_deref(), raw.html_url.as_deref()),
            created_at: raw.created_at.unwrap_or_else(Utc::now),
            updated_at: raw.updated_at,
            closed_at: raw.closed_at,
            url: raw.html_url.unwrap_or_default(),
            labels: raw.labels.into_iter().filter_map(|l| l.name).collect(),
            comments: raw.comments.unwrap_or_default(),
        })
    }
}

/// Commits carried in the payloads of push events, in feed order.
pub fn commits_from_events(events: &[Event]) -> Vec<Commit> {
    let mut commits = Vec::new();
    for event in events.iter().filter(|e| e.is_push()) {
        let Some(entries) = event.payload.get("commits").and_then(Value::as_array) else {
            continue;
        };
        for entry in entries {
            match Commit::from_push_event(event, entry) {
                Ok(commit) => commits.push(commit),
                Err(e) => warn!(event = %event.id, error = %e, "skipping malformed push commit"),
            }
        }
    }
    commits
}

/// Map raw items with `convert`, dropping (and logging) the ones that fail.
pub(crate) fn decode_all<T>(
    items: Vec<Value>,
    what: &str,
    convert: impl Fn(Value) -> serde_json::Result<T>,
) -> Vec<T> {
    let mut out = Vec::with_capacity(items.len());
    for item in items {
        match convert(item) {
            Ok(record) => out.push(record),
            Err(e) => warn!(kind = what, error = %e, "skipping malformed item"),
        }
    }
    out
}

fn first_line(message: Option<&str>) -> String {
    message
        .and_then(|m| m.lines().next())
        .unwrap_or_default()
        .to_owned()
}

/// `owner/repo` from an API `repository_url`, falling back to the
/// `https://github.com/owner/repo/...` web URL.
fn repository_name(repository_url: Option<&str>, html_url: Option<&str>) -> String {
    if let Some(url) = repository_url.filter(|u| !u.is_empty()) {
        let mut segments = url.trim_end_matches('/').rsplit('/');
        if let (Some(repo), Some(owner)) = (segments.next(), segments.next()) {
            return format!("{owner}/{repo}");
        }
    }
    if let Some(url) = html_url {
        let parts: Vec<&str> = url.split('/').collect();
        if parts.len() >= 5 {
            return format!("{}/{}", parts[3], parts[4]);
        }
    }
    String::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn push_event() -> Event {
        Event::from_api(json!({
            "id": "1001",
            "type": "PushEvent",
            "actor": {"login": "octocat"},
            "repo": {"name": "octocat/hello-world"},
            "created_at": "2024-03-01T12:00:00Z",
            "payload": {
                "commits": [
                    {"sha": "abc123", "message": "Fix parser\n\nLonger body", "author": {"name": "Mona", "email": "mona@example.com"}},
                    {"sha": "def456", "message": "Bump version"}
                ]
            },
            "public": true
        }))
        .unwrap()
    }

    #[test]
    fn event_from_api_flattens_nested_names() {
        let event = push_event();
        assert_eq!(event.id, "1001");
        assert_eq!(event.actor, "octocat");
        assert_eq!(event.repo, "octocat/hello-world");
        assert!(event.is_push());
        assert_eq!(event.created_at.to_rfc3339(), "2024-03-01T12:00:00+00:00");
    }

    #[test]
    fn event_defaults_for_missing_fields() {
        let event = Event::from_api(json!({"id": "7", "type": "WatchEvent"})).unwrap();
        assert_eq!(event.actor, "");
        assert!(event.public);
        assert!(event.payload.is_object());
    }

    #[test]
    fn push_commits_take_first_line_and_fall_back_to_actor() {
        let commits = commits_from_events(&[push_event()]);
        assert_eq!(commits.len(), 2);

        assert_eq!(commits[0].sha, "abc123");
        assert_eq!(commits[0].message, "Fix parser");
        assert_eq!(commits[0].author, "Mona");
        assert_eq!(commits[0].author_email.as_deref(), Some("mona@example.com"));
        assert_eq!(
            commits[0].url,
            "https://github.com/octocat/hello-world/commit/abc123"
        );

        assert_eq!(commits[1].author, "octocat");
        assert_eq!(commits[1].date, commits[0].date);
    }

    #[test]
    fn non_push_events_yield_no_commits() {
        let event = Event::from_api(json!({
            "id": "2",
            "type": "IssuesEvent",
            "payload": {"commits": [{"sha": "zzz"}]}
        }))
        .unwrap();
        assert!(commits_from_events(&[event]).is_empty());
    }

    #[test]
    fn commit_from_api_prefers_login() {
        let commit = Commit::from_api(
            json!({
                "sha": "abc123",
                "html_url": "https://github.com/o/r/commit/abc123",
                "commit": {
                    "message": "Subject\nbody",
                    "author": {"name": "Mona Lisa", "email": "m@example.com", "date": "2024-02-02T08:30:00Z"}
                },
                "author": {"login": "octocat"}
            }),
            "o/r",
        )
        .unwrap();
        assert_eq!(commit.author, "octocat");
        assert_eq!(commit.message, "Subject");
        assert_eq!(commit.repo, "o/r");
        assert_eq!(commit.date.to_rfc3339(), "2024-02-02T08:30:00+00:00");
    }

    #[test]
    fn commit_from_api_null_author_uses_signature_name() {
        let commit = Commit::from_api(
            json!({
                "sha": "f00",
                "commit": {"message": "x", "author": {"name": "Unlinked", "date": "2024-02-02T08:30:00Z"}},
                "author": null
            }),
            "o/r",
        )
        .unwrap();
        assert_eq!(commit.author, "Unlinked");
    }

    #[test]
    fn pull_request_from_search_item() {
        let pr = PullRequest::from_api(json!({
            "number": 42,
            "title": "Add feature",
            "state": "closed",
            "user": {"login": "octocat"},
            "repository_url": "https://api.github.com/repos/rust-lang/rust",
            "html_url": "https://github.com/rust-lang/rust/pull/42",
            "created_at": "2024-01-01T00:00:00Z",
            "closed_at": "2024-01-03T00:00:00Z",
            "pull_request": {"merged_at": "2024-01-03T00:00:00Z"}
        }))
        .unwrap();
        assert_eq!(pr.repo, "rust-lang/rust");
        assert_eq!(pr.number, 42);
        assert!(pr.is_merged);
        assert!(pr.merged_at.is_some());
    }

    #[test]
    fn unmerged_pull_request() {
        let pr = PullRequest::from_api(json!({
            "number": 1,
            "state": "open",
            "repository_url": "https://api.github.com/repos/o/r",
            "created_at": "2024-01-01T00:00:00Z",
            "pull_request": {"merged_at": null}
        }))
        .unwrap();
        assert!(!pr.is_merged);
    }

    #[test]
    fn issue_repo_from_html_url_and_labels() {
        let issue = Issue::from_api(json!({
            "number": 9,
            "title": "Crash",
            "state": "open",
            "user": {"login": "octocat"},
            "html_url": "https://github.com/owner/project/issues/9",
            "created_at": "2024-01-01T00:00:00Z",
            "labels": [{"name": "bug"}, {"name": "p1"}],
            "comments": 3
        }))
        .unwrap();
        assert_eq!(issue.repo, "owner/project");
        assert_eq!(issue.labels, vec!["bug", "p1"]);
        assert_eq!(issue.comments, 3);
    }

    #[test]
    fn decode_all_drops_malformed_items() {
        let items = vec![
            json!({"id": "1", "type": "WatchEvent"}),
            json!({"id": 5}),
            json!({"id": "2", "type": "ForkEvent"}),
        ];
        let events = decode_all(items, "event", Event::from_api);
        let ids: Vec<&str> = events.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2"]);
    }
}
