//! Parsing of the `x-ratelimit-*` response headers
//!
//! GitHub reports quota on every response (including 4xx/5xx) with three
//! headers. Each is optional and parsed independently: a missing or garbled
//! header leaves the corresponding pool field untouched.

use reqwest::header::HeaderMap;
use tracing::debug;

pub const LIMIT_HEADER: &str = "x-ratelimit-limit";
pub const REMAINING_HEADER: &str = "x-ratelimit-remaining";
pub const RESET_HEADER: &str = "x-ratelimit-reset";

/// Server-declared quota values from a single response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QuotaHeaders {
    pub limit: Option<u32>,
    pub remaining: Option<i64>,
    /// Unix timestamp (seconds) at which the window resets
    pub reset: Option<u64>,
}

impl QuotaHeaders {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self {
            limit: parse(headers, LIMIT_HEADER),
            remaining: parse(headers, REMAINING_HEADER),
            reset: parse(headers, RESET_HEADER),
        }
    }

    /// True when the response carried none of the quota headers.
    pub fn is_empty(&self) -> bool {
        self.limit.is_none() && self.remaining.is_none() && self.reset.is_none()
    }
}

fn parse<T: std::str::FromStr>(headers: &HeaderMap, name: &str) -> Option<T> {
    let raw = headers.get(name)?.to_str().ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            debug!(header = name, value = raw, "ignoring unparsable quota header");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn parses_all_three_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(LIMIT_HEADER, HeaderValue::from_static("5000"));
        headers.insert(REMAINING_HEADER, HeaderValue::from_static("4987"));
        headers.insert(RESET_HEADER, HeaderValue::from_static("1700000000"));

        let parsed = QuotaHeaders::from_headers(&headers);
        assert_eq!(parsed.limit, Some(5000));
        assert_eq!(parsed.remaining, Some(4987));
        assert_eq!(parsed.reset, Some(1_700_000_000));
        assert!(!parsed.is_empty());
    }

    #[test]
    fn missing_headers_are_none() {
        let parsed = QuotaHeaders::from_headers(&HeaderMap::new());
        assert_eq!(parsed, QuotaHeaders::default());
        assert!(parsed.is_empty());
    }

    #[test]
    fn headers_parse_independently() {
        let mut headers = HeaderMap::new();
        headers.insert(LIMIT_HEADER, HeaderValue::from_static("not-a-number"));
        headers.insert(REMAINING_HEADER, HeaderValue::from_static(" 12 "));

        let parsed = QuotaHeaders::from_headers(&headers);
        assert_eq!(parsed.limit, None);
        assert_eq!(parsed.remaining, Some(12));
        assert_eq!(parsed.reset, None);
    }
}
