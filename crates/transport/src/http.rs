//! Shared request execution for the REST and GraphQL transports
//!
//! One attempt is: acquire quota → send → observe quota headers → classify.
//! Connection failures and timeouts loop back to a fresh acquire after the
//! backoff delay; everything else returns on the first attempt.

use std::sync::Arc;
use std::time::{Duration, Instant};

use common::Secret;
use quota::{PoolKind, QuotaLedger};
use reqwest::RequestBuilder;
use tracing::{debug, warn};
use url::Url;

use crate::classify::{Classification, classify_status, error_message};
use crate::error::{Error, Result};
use crate::retry::{self, RetryPolicy};
use crate::{Response, metrics};

/// Default per-request timeout
pub(crate) const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

pub(crate) struct HttpCore {
    pub client: reqwest::Client,
    pub ledger: Arc<QuotaLedger>,
    pub token: Option<Secret<String>>,
    pub retry: RetryPolicy,
    pub timeout: Duration,
}

impl HttpCore {
    pub fn new(
        client: reqwest::Client,
        ledger: Arc<QuotaLedger>,
        token: Option<Secret<String>>,
    ) -> Self {
        Self {
            client,
            ledger,
            token,
            retry: RetryPolicy::default(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Attach the user agent and, when configured, the bearer token.
    pub fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        let builder = builder.header(reqwest::header::USER_AGENT, common::USER_AGENT);
        match &self.token {
            Some(token) => builder.bearer_auth(token.expose()),
            None => builder,
        }
    }

    /// Run one logical call, re-building the request for each attempt.
    pub async fn execute<F>(&self, pool: PoolKind, url: &Url, build: F) -> Result<Response>
    where
        F: Fn() -> RequestBuilder,
    {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            self.ledger.acquire(pool, 1).await?;

            let started = Instant::now();
            match build().timeout(self.timeout).send().await {
                Ok(response) => return self.finish(pool, url, response, started).await,
                Err(e) if retry::is_retryable(&e) && attempt < self.retry.max_attempts => {
                    let delay = self.retry.backoff(attempt);
                    warn!(
                        attempt,
                        error = %e,
                        retry_in_ms = delay.as_millis() as u64,
                        "transient network failure, retrying"
                    );
                    metrics::record_retry(pool);
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    warn!(attempts = attempt, error = %e, "upstream request failed");
                    return Err(Error::Http(e));
                }
            }
        }
    }

    /// One attempt that reserves no quota, for calls the server does not bill
    /// (`GET /rate_limit`). Headers are still observed.
    pub async fn execute_unmetered<F>(&self, pool: PoolKind, url: &Url, build: F) -> Result<Response>
    where
        F: FnOnce() -> RequestBuilder,
    {
        let started = Instant::now();
        let response = build().timeout(self.timeout).send().await?;
        self.finish(pool, url, response, started).await
    }

    async fn finish(
        &self,
        pool: PoolKind,
        url: &Url,
        response: reqwest::Response,
        started: Instant,
    ) -> Result<Response> {
        let status = response.status().as_u16();
        let headers = response.headers().clone();
        // Quota headers arrive on error responses too
        self.ledger.observe(pool, &headers);

        let text = response.text().await?;
        metrics::record_request(pool, status, started.elapsed().as_secs_f64());
        debug!(status, bytes = text.len(), "upstream responded");

        match classify_status(status, &text) {
            Classification::Success => {}
            Classification::NotFound => {
                return Err(Error::NotFound {
                    url: url.to_string(),
                });
            }
            Classification::RateLimited => {
                return Err(Error::RateLimited {
                    pool,
                    reset_at: self.ledger.snapshot(pool).reset_at,
                    message: error_message(&text),
                });
            }
            Classification::Forbidden => {
                return Err(Error::Forbidden {
                    message: error_message(&text),
                });
            }
            Classification::ServerError => {
                return Err(Error::TransientServer { status, body: text });
            }
            Classification::ClientError => return Err(Error::Api { status, body: text }),
        }

        let body = if text.trim().is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_str(&text).map_err(|e| Error::Decode(format!("{url}: {e}")))?
        };

        Ok(Response {
            status,
            headers,
            body,
        })
    }
}

/// Resolve an endpoint against a base URL; absolute URLs pass through.
///
/// The base path is kept as a prefix (`https://ghe.example/api/v3` +
/// `/users/x` → `https://ghe.example/api/v3/users/x`).
pub(crate) fn resolve_url(base: &str, endpoint: &str) -> Result<Url> {
    match Url::parse(endpoint) {
        Ok(absolute) => Ok(absolute),
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            let mut base = Url::parse(base)?;
            if endpoint.is_empty() {
                return Ok(base);
            }
            if !base.path().ends_with('/') {
                let path = format!("{}/", base.path());
                base.set_path(&path);
            }
            Ok(base.join(endpoint.trim_start_matches('/'))?)
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_relative_endpoint() {
        assert_eq!(
            resolve_url("https://api.github.com", "/users/octocat")
                .unwrap()
                .as_str(),
            "https://api.github.com/users/octocat"
        );
        assert_eq!(
            resolve_url("https://api.github.com/", "users/octocat?page=2")
                .unwrap()
                .as_str(),
            "https://api.github.com/users/octocat?page=2"
        );
    }

    #[test]
    fn resolve_keeps_base_path_prefix() {
        assert_eq!(
            resolve_url("https://ghe.example.com/api/v3", "/repos/o/r/commits?author=x")
                .unwrap()
                .as_str(),
            "https://ghe.example.com/api/v3/repos/o/r/commits?author=x"
        );
    }

    #[test]
    fn resolve_absolute_endpoint_verbatim() {
        let next = "https://api.github.com/user/1/events?page=2";
        assert_eq!(
            resolve_url("https://api.github.com", next).unwrap().as_str(),
            next
        );
    }

    #[test]
    fn resolve_empty_endpoint_is_base() {
        assert_eq!(
            resolve_url("https://api.github.com/graphql", "")
                .unwrap()
                .as_str(),
            "https://api.github.com/graphql"
        );
    }

    #[test]
    fn resolve_rejects_invalid_base() {
        assert!(matches!(
            resolve_url("not a url", "/users/octocat"),
            Err(Error::InvalidUrl(_))
        ));
    }
}
