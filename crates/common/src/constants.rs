//! Upstream API constants
//!
//! Public endpoint and header values for the GitHub API surfaces. None of these
//! are secrets; the bearer token lives in `Secret` and is resolved from the
//! environment or a token file at startup.

/// REST and search API base URL
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// GraphQL endpoint
pub const DEFAULT_GRAPHQL_URL: &str = "https://api.github.com/graphql";

/// Media type requested on every REST call
pub const ACCEPT: &str = "application/vnd.github+json";

/// REST API version pinned via `X-GitHub-Api-Version`
pub const API_VERSION: &str = "2022-11-28";

/// User agent sent on every request (GitHub rejects requests without one)
pub const USER_AGENT: &str = concat!("activity-collector/", env!("CARGO_PKG_VERSION"));

/// Environment variables checked for a token, in order of precedence
pub const TOKEN_ENV_VARS: &[&str] = &["GITHUB_RESEARCHER_TOKEN", "GITHUB_TOKEN"];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_urls_use_https() {
        assert!(DEFAULT_API_URL.starts_with("https://"));
        assert!(DEFAULT_GRAPHQL_URL.starts_with(DEFAULT_API_URL));
    }

    #[test]
    fn researcher_token_takes_precedence() {
        assert_eq!(TOKEN_ENV_VARS[0], "GITHUB_RESEARCHER_TOKEN");
        assert_eq!(TOKEN_ENV_VARS[1], "GITHUB_TOKEN");
    }

    #[test]
    fn user_agent_carries_version() {
        assert!(USER_AGENT.starts_with("activity-collector/"));
        assert!(USER_AGENT.len() > "activity-collector/".len());
    }
}
