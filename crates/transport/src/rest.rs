//! REST and search transport (HTTP GET)

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use common::Secret;
use quota::{PoolKind, QuotaLedger};
use reqwest::RequestBuilder;
use reqwest::header::ACCEPT;
use tracing::instrument;
use url::Url;

use crate::http::{HttpCore, resolve_url};
use crate::rate_limit::RateLimitStatus;
use crate::retry::RetryPolicy;
use crate::{Request, Response, Result, Transport};

/// Transport for the primary REST surface and the search surface.
///
/// The pool charged for each call comes from the request, so one instance
/// serves both.
pub struct RestTransport {
    core: HttpCore,
    base_url: String,
}

impl RestTransport {
    pub fn new(
        client: reqwest::Client,
        base_url: impl Into<String>,
        token: Option<Secret<String>>,
        ledger: Arc<QuotaLedger>,
    ) -> Self {
        Self {
            core: HttpCore::new(client, ledger, token),
            base_url: base_url.into(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.core.retry = retry;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.core.timeout = timeout;
        self
    }

    pub fn ledger(&self) -> &Arc<QuotaLedger> {
        &self.core.ledger
    }

    #[instrument(skip(self), fields(pool = %pool))]
    pub async fn get(&self, pool: PoolKind, endpoint: &str) -> Result<Response> {
        let url = resolve_url(&self.base_url, endpoint)?;
        self.core
            .execute(pool, &url, || self.build_get(&url))
            .await
    }

    /// Current quota for every pool from `GET /rate_limit`.
    ///
    /// Reserves no quota. Response headers still refresh the primary pool.
    #[instrument(skip(self))]
    pub async fn rate_limit(&self) -> Result<RateLimitStatus> {
        let url = resolve_url(&self.base_url, "/rate_limit")?;
        let response = self
            .core
            .execute_unmetered(PoolKind::Primary, &url, || self.build_get(&url))
            .await?;
        RateLimitStatus::from_body(response.body)
    }

    fn build_get(&self, url: &Url) -> RequestBuilder {
        self.core.authorize(
            self.core
                .client
                .get(url.clone())
                .header(ACCEPT, common::ACCEPT)
                .header("x-github-api-version", common::API_VERSION),
        )
    }
}

impl Transport for RestTransport {
    fn id(&self) -> &str {
        "rest"
    }

    fn is_authenticated(&self) -> bool {
        self.core.token.is_some()
    }

    fn send<'a>(
        &'a self,
        request: &'a Request,
    ) -> Pin<Box<dyn Future<Output = Result<Response>> + Send + 'a>> {
        Box::pin(self.get(request.pool, &request.endpoint))
    }
}
