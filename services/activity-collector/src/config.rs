//! Configuration types and loading
//!
//! Precedence: CLI args > env vars > config file > defaults. The API token
//! comes from GITHUB_RESEARCHER_TOKEN, GITHUB_TOKEN or `token_file` and is
//! never read from the TOML itself.

use std::path::{Path, PathBuf};
use std::time::Duration;

use activity::{CollectorSettings, Depth};
use common::Secret;
use quota::ExhaustionPolicy;
use serde::Deserialize;

/// Default config file name, looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "activity-collector.toml";

/// Root configuration
#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub quota: QuotaConfig,
    #[serde(default)]
    pub collection: CollectionConfig,
}

/// Upstream endpoints and credentials
#[derive(Debug, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_graphql_url")]
    pub graphql_url: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// File holding the token (alternative to the token env vars)
    #[serde(default)]
    pub token_file: Option<PathBuf>,
    #[serde(skip)]
    pub token: Option<Secret<String>>,
}

#[derive(Debug, Deserialize)]
pub struct QuotaConfig {
    #[serde(default)]
    pub policy: ExhaustionPolicy,
    /// Seed the ledger from `GET /rate_limit` before collecting
    #[serde(default = "default_true")]
    pub check_rate_limit: bool,
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            policy: ExhaustionPolicy::default(),
            check_rate_limit: true,
        }
    }
}

/// What to collect and how hard to push
#[derive(Debug, Deserialize)]
pub struct CollectionConfig {
    /// Account to collect; `--user` overrides
    #[serde(default)]
    pub login: Option<String>,
    #[serde(default)]
    pub depth: Depth,
    /// Look-back window for searches and commit histories
    #[serde(default = "default_days")]
    pub days: u32,
    /// `owner/repo` names whose commit histories are read
    #[serde(default)]
    pub repositories: Vec<String>,
    /// With no `repositories`, read this many recently updated repositories
    #[serde(default = "default_discover_repositories")]
    pub discover_repositories: usize,
    #[serde(default = "default_events_max_pages")]
    pub events_max_pages: u32,
    #[serde(default = "default_max_commits_per_repo")]
    pub max_commits_per_repo: usize,
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    #[serde(default = "default_page_delay_ms")]
    pub page_delay_ms: u64,
    /// Fetch the contribution calendar (requires a token)
    #[serde(default = "default_true")]
    pub contributions: bool,
    /// Calendar years to fetch individually
    #[serde(default)]
    pub years: Vec<i32>,
}

fn default_base_url() -> String {
    common::DEFAULT_API_URL.to_owned()
}

fn default_graphql_url() -> String {
    common::DEFAULT_GRAPHQL_URL.to_owned()
}

fn default_timeout() -> u64 {
    30
}

fn default_days() -> u32 {
    365
}

fn default_discover_repositories() -> usize {
    20
}

fn default_events_max_pages() -> u32 {
    10
}

fn default_max_commits_per_repo() -> usize {
    100
}

fn default_concurrency() -> usize {
    5
}

fn default_page_delay_ms() -> u64 {
    100
}

fn default_true() -> bool {
    true
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            graphql_url: default_graphql_url(),
            timeout_secs: default_timeout(),
            token_file: None,
            token: None,
        }
    }
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            login: None,
            depth: Depth::default(),
            days: default_days(),
            repositories: Vec::new(),
            discover_repositories: default_discover_repositories(),
            events_max_pages: default_events_max_pages(),
            max_commits_per_repo: default_max_commits_per_repo(),
            concurrency: default_concurrency(),
            page_delay_ms: default_page_delay_ms(),
            contributions: true,
            years: Vec::new(),
        }
    }
}

impl CollectionConfig {
    pub fn settings(&self) -> CollectorSettings {
        CollectorSettings {
            events_max_pages: self.events_max_pages,
            discovered_repositories: self.discover_repositories,
            max_commits_per_repo: self.max_commits_per_repo,
            concurrency: self.concurrency,
            page_delay: Duration::from_millis(self.page_delay_ms),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file, then overlay environment variables.
    pub fn load(path: &Path) -> common::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Defaults plus environment overrides, for runs without a config file.
    pub fn from_env() -> common::Result<Self> {
        Self::parse("")
    }

    fn parse(contents: &str) -> common::Result<Self> {
        let mut config: Config = toml::from_str(contents)?;

        if let Ok(url) = std::env::var("GITHUB_API_URL") {
            config.api.base_url = url;
        }
        if let Ok(url) = std::env::var("GITHUB_GRAPHQL_URL") {
            config.api.graphql_url = url;
        }

        config.validate()?;
        config.api.token = resolve_token(config.api.token_file.as_deref())?;
        Ok(config)
    }

    fn validate(&self) -> common::Result<()> {
        for (name, url) in [
            ("base_url", &self.api.base_url),
            ("graphql_url", &self.api.graphql_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(common::Error::UrlScheme {
                    field: name,
                    value: url.clone(),
                });
            }
        }

        for (name, value) in [
            ("timeout_secs", self.api.timeout_secs),
            ("concurrency", self.collection.concurrency as u64),
            ("events_max_pages", u64::from(self.collection.events_max_pages)),
            ("max_commits_per_repo", self.collection.max_commits_per_repo as u64),
        ] {
            if value == 0 {
                return Err(common::Error::Zero(name));
            }
        }

        Ok(())
    }

    /// Resolve config file path from CLI arg or CONFIG_PATH env var.
    ///
    /// The flag reports whether the path was asked for explicitly; only the
    /// implicit default may be missing.
    pub fn resolve_path(cli_path: Option<&str>) -> (PathBuf, bool) {
        if let Some(p) = cli_path {
            return (PathBuf::from(p), true);
        }
        if let Ok(p) = std::env::var("CONFIG_PATH") {
            return (PathBuf::from(p), true);
        }
        (PathBuf::from(DEFAULT_CONFIG_FILE), false)
    }
}

/// First non-empty token env var, otherwise the trimmed token file.
fn resolve_token(token_file: Option<&Path>) -> common::Result<Option<Secret<String>>> {
    for var in common::TOKEN_ENV_VARS {
        if let Some(token) = std::env::var(var).ok().and_then(|v| Secret::from_token_text(&v)) {
            return Ok(Some(token));
        }
    }

    let Some(path) = token_file else {
        return Ok(None);
    };
    let contents = std::fs::read_to_string(path).map_err(|source| common::Error::TokenFile {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Secret::from_token_text(&contents))
}
