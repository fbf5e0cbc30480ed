//! Error taxonomy for upstream calls
//!
//! Callers pattern-match on the variant to decide what to do: `NotFound`,
//! `Forbidden` and `Api` are permanent; `RateLimited` carries the reset time;
//! `QuotaExhausted` means no request was sent at all; `Query` carries the raw
//! GraphQL error list. Nothing here is retried by the caller automatically.

use quota::PoolKind;

/// Errors from transport operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("not found: {url}")]
    NotFound { url: String },

    #[error("rate limited on {pool} pool (resets at {reset_at}): {message}")]
    RateLimited {
        pool: PoolKind,
        /// Unix seconds
        reset_at: u64,
        message: String,
    },

    #[error(transparent)]
    QuotaExhausted(#[from] quota::Error),

    #[error("forbidden: {message}")]
    Forbidden { message: String },

    #[error("upstream server error {status}: {body}")]
    TransientServer { status: u16, body: String },

    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("query errors: {message}")]
    Query {
        message: String,
        errors: Vec<serde_json::Value>,
    },

    #[error("a token is required for the GraphQL API (set GITHUB_RESEARCHER_TOKEN)")]
    AuthenticationRequired,

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid response body: {0}")]
    Decode(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("URL cannot carry a path: {0}")]
    InvalidEndpoint(String),
}

impl Error {
    /// Whether the failure is tied to quota (server-side or local).
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, Error::RateLimited { .. } | Error::QuotaExhausted(_))
    }
}

/// Result alias for transport operations.
pub type Result<T> = std::result::Result<T, Error>;
