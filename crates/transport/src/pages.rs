//! Link-header pagination
//!
//! A drain requests page 1 with `per_page`/`page` appended, then follows
//! `rel="next"` verbatim until it disappears or the page cap is hit. Pages are
//! fetched strictly one after another with a short pause between them.

use std::time::Duration;

use quota::PoolKind;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::{Endpoint, Request, Result, Transport};

/// Pause between consecutive pages of one drain
pub const DEFAULT_PAGE_DELAY: Duration = Duration::from_millis(100);

/// Search endpoints never return more than this many results.
pub const SEARCH_RESULT_CAP: u64 = 1000;

/// Largest page size the API accepts
pub const MAX_PER_PAGE: u32 = 100;

pub struct PageWalker<'a> {
    transport: &'a dyn Transport,
    page_delay: Duration,
}

impl<'a> PageWalker<'a> {
    pub fn new(transport: &'a dyn Transport) -> Self {
        Self {
            transport,
            page_delay: DEFAULT_PAGE_DELAY,
        }
    }

    pub fn with_page_delay(mut self, page_delay: Duration) -> Self {
        self.page_delay = page_delay;
        self
    }

    /// Collect every item reachable from `endpoint`, in page order.
    ///
    /// Bare JSON arrays contribute their elements; search envelopes contribute
    /// their `items`; any other body is returned as a single item and ends the
    /// walk. The first failing page aborts the whole drain.
    #[instrument(skip(self), fields(transport = self.transport.id()))]
    pub async fn drain(
        &self,
        pool: PoolKind,
        endpoint: &str,
        max_pages: Option<u32>,
        per_page: u32,
    ) -> Result<Vec<Value>> {
        let mut items = Vec::new();
        let mut next = Some(first_page(endpoint, per_page)?);
        let mut pages = 0u32;

        while let Some(url) = next.take() {
            if pages > 0 && !self.page_delay.is_zero() {
                tokio::time::sleep(self.page_delay).await;
            }

            let response = self.transport.send(&Request::get(pool, url)).await?;
            pages += 1;
            let links = response.links();
            if pages == 1 {
                if let Some(total) = links.total_pages() {
                    debug!(total_pages = total, "paginated result");
                }
            }

            match response.body {
                Value::Array(page) => items.extend(page),
                Value::Object(mut envelope) if envelope.get("items").is_some_and(Value::is_array) => {
                    if pages == 1 {
                        if let Some(total) = envelope.get("total_count").and_then(Value::as_u64) {
                            if total > SEARCH_RESULT_CAP {
                                warn!(
                                    total_count = total,
                                    cap = SEARCH_RESULT_CAP,
                                    "search matches more results than the API returns"
                                );
                            }
                        }
                    }
                    if let Some(Value::Array(page)) = envelope.remove("items") {
                        items.extend(page);
                    }
                }
                other => {
                    items.push(other);
                    break;
                }
            }

            if max_pages.is_some_and(|max| pages >= max) {
                debug!(pages, "page cap reached");
                break;
            }
            next = links.next;
        }

        debug!(pages, items = items.len(), "drain complete");
        Ok(items)
    }
}

fn first_page(endpoint: &str, per_page: u32) -> Result<String> {
    Ok(Endpoint::parse(endpoint)?
        .with_query("per_page", &per_page.to_string())
        .with_query("page", "1")
        .into())
}
