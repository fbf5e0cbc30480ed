//! GraphQL transport (HTTP POST against the query pool)
//!
//! A 200 response may still carry a top-level `errors` list; that is surfaced
//! as `Error::Query` with the raw list attached. The GraphQL API rejects
//! anonymous callers, so construction without a token fails up front.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use common::Secret;
use quota::{PoolKind, QuotaLedger};
use serde_json::Value;
use tracing::instrument;
use url::Url;

use crate::error::Error;
use crate::http::HttpCore;
use crate::retry::RetryPolicy;
use crate::{Request, Response, Result, Transport};

pub struct QueryTransport {
    core: HttpCore,
    endpoint: Url,
}

impl QueryTransport {
    pub fn new(
        client: reqwest::Client,
        endpoint: &str,
        token: Option<Secret<String>>,
        ledger: Arc<QuotaLedger>,
    ) -> Result<Self> {
        let Some(token) = token else {
            return Err(Error::AuthenticationRequired);
        };
        Ok(Self {
            core: HttpCore::new(client, ledger, Some(token)),
            endpoint: Url::parse(endpoint)?,
        })
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.core.retry = retry;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.core.timeout = timeout;
        self
    }

    /// Run a document and return its `data` object.
    pub async fn execute(&self, document: &str, variables: Value) -> Result<Value> {
        let response = self.send(&Request::query(document, variables)).await?;
        Ok(response
            .body
            .get("data")
            .cloned()
            .unwrap_or_else(|| Value::Object(Default::default())))
    }

    #[instrument(skip_all, fields(pool = %PoolKind::Query))]
    async fn post(&self, body: &Value) -> Result<Response> {
        let response = self
            .core
            .execute(PoolKind::Query, &self.endpoint, || {
                self.core.authorize(
                    self.core
                        .client
                        .post(self.endpoint.clone())
                        .header(reqwest::header::ACCEPT, "application/json")
                        .json(body),
                )
            })
            .await?;
        check_errors(&response.body)?;
        Ok(response)
    }
}

impl Transport for QueryTransport {
    fn id(&self) -> &str {
        "graphql"
    }

    fn is_authenticated(&self) -> bool {
        true
    }

    fn send<'a>(
        &'a self,
        request: &'a Request,
    ) -> Pin<Box<dyn Future<Output = Result<Response>> + Send + 'a>> {
        Box::pin(async move {
            let body = request
                .body
                .as_ref()
                .ok_or_else(|| Error::Decode("GraphQL request has no document".into()))?;
            self.post(body).await
        })
    }
}

/// Reject a response body whose `errors` list is non-empty.
pub fn check_errors(body: &Value) -> Result<()> {
    match body.get("errors").and_then(Value::as_array) {
        Some(errors) if !errors.is_empty() => {
            let message = errors
                .iter()
                .map(|e| {
                    e.get("message")
                        .and_then(Value::as_str)
                        .unwrap_or("Unknown error")
                })
                .collect::<Vec<_>>()
                .join("; ");
            Err(Error::Query {
                message,
                errors: errors.clone(),
            })
        }
        _ => Ok(()),
    }
}
