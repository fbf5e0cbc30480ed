//! HTTP transports for the GitHub REST, search and GraphQL surfaces
//!
//! Defines the `Transport` trait that decouples collection logic from the wire.
//! `RestTransport` issues GET calls against the primary and search pools;
//! `QueryTransport` POSTs GraphQL documents against the query pool. Both gate
//! every attempt on the shared `QuotaLedger`, feed response headers back into
//! it, classify error statuses, and retry connection failures and timeouts.
//!
//! `PageWalker` drains `Link`-paginated endpoints on top of any transport.

pub mod classify;
pub mod endpoint;
pub mod error;
mod http;
pub mod link;
pub mod metrics;
pub mod pages;
pub mod query;
pub mod rate_limit;
pub mod rest;
pub mod retry;

#[cfg(test)]
mod testutil;

pub use endpoint::Endpoint;
pub use error::{Error, Result};
pub use link::LinkRelations;
pub use pages::PageWalker;
pub use query::QueryTransport;
pub use quota::PoolKind;
pub use rate_limit::{RateLimitResource, RateLimitStatus};
pub use rest::RestTransport;
pub use retry::RetryPolicy;

use reqwest::header::HeaderMap;
use std::future::Future;
use std::pin::Pin;

/// One outbound call: which pool pays for it, where it goes, and an optional
/// JSON body (GraphQL documents). Endpoints may be relative to the transport's
/// base URL or absolute (continuation links).
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub pool: PoolKind,
    pub endpoint: String,
    pub body: Option<serde_json::Value>,
}

impl Request {
    pub fn get(pool: PoolKind, endpoint: impl Into<String>) -> Self {
        Self {
            pool,
            endpoint: endpoint.into(),
            body: None,
        }
    }

    /// GraphQL request against the query pool.
    pub fn query(document: &str, variables: serde_json::Value) -> Self {
        Self {
            pool: PoolKind::Query,
            endpoint: String::new(),
            body: Some(serde_json::json!({
                "query": document,
                "variables": variables,
            })),
        }
    }
}

/// A successful (2xx) response with its JSON body decoded.
#[derive(Debug, Clone)]
pub struct Response {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: serde_json::Value,
}

impl Response {
    /// Pagination relations from the `Link` header.
    pub fn links(&self) -> LinkRelations {
        LinkRelations::from_headers(&self.headers)
    }
}

/// Abstraction over the upstream API surfaces.
///
/// Uses `Pin<Box<dyn Future>>` return types for dyn-compatibility
/// (`Arc<dyn Transport>` is shared across spawned collection tasks).
pub trait Transport: Send + Sync {
    /// Identifier for logging (e.g. "rest", "graphql")
    fn id(&self) -> &str;

    /// Whether calls carry a bearer token.
    fn is_authenticated(&self) -> bool;

    /// Issue one call, returning the decoded 2xx response or a classified error.
    fn send<'a>(
        &'a self,
        request: &'a Request,
    ) -> Pin<Box<dyn Future<Output = Result<Response>> + Send + 'a>>;
}
