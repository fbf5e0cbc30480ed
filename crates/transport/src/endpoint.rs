//! Endpoint construction
//!
//! A `Request` carries its endpoint as a string: either a path plus query
//! relative to the transport's base URL, or an absolute continuation link.
//! Relative endpoints are assembled on a placeholder origin so `url` handles
//! every escape, then rendered without that origin.

use std::fmt;

use url::{Position, Url};

use crate::error::{Error, Result};

const PLACEHOLDER_ORIGIN: &str = "http://endpoint.invalid/";

/// Endpoint under construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    url: Url,
    relative: bool,
}

impl Endpoint {
    /// Relative endpoint from unescaped path segments
    /// (`["repos", owner, repo, "commits"]`).
    pub fn from_segments<I>(segments: I) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut url = Url::parse(PLACEHOLDER_ORIGIN)?;
        url.path_segments_mut()
            .map_err(|()| Error::InvalidEndpoint(PLACEHOLDER_ORIGIN.to_owned()))?
            .clear()
            .extend(segments);
        Ok(Self {
            url,
            relative: true,
        })
    }

    /// Parse an existing endpoint, relative or absolute.
    pub fn parse(endpoint: &str) -> Result<Self> {
        match Url::parse(endpoint) {
            Ok(url) => Ok(Self {
                url,
                relative: false,
            }),
            Err(url::ParseError::RelativeUrlWithoutBase) => Ok(Self {
                url: Url::parse(PLACEHOLDER_ORIGIN)?.join(endpoint)?,
                relative: true,
            }),
            Err(e) => Err(e.into()),
        }
    }

    /// Append one query parameter, form-encoded.
    pub fn with_query(mut self, key: &str, value: &str) -> Self {
        self.url.query_pairs_mut().append_pair(key, value);
        self
    }

    /// First decoded value of a query parameter.
    pub fn query_value(&self, key: &str) -> Option<String> {
        self.url
            .query_pairs()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.into_owned())
    }

    pub fn as_str(&self) -> &str {
        if self.relative {
            &self.url[Position::BeforePath..]
        } else {
            self.url.as_str()
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Endpoint> for String {
    fn from(endpoint: Endpoint) -> Self {
        endpoint.as_str().to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segments_are_escaped() {
        let endpoint = Endpoint::from_segments(["repos", "own er", "re#po", "commits"])
            .unwrap()
            .with_query("author", "octocat");
        assert_eq!(endpoint.as_str(), "/repos/own%20er/re%23po/commits?author=octocat");
        assert_eq!(endpoint.query_value("author").as_deref(), Some("octocat"));
    }

    #[test]
    fn query_values_are_form_encoded() {
        let endpoint = Endpoint::from_segments(["search", "issues"])
            .unwrap()
            .with_query("q", "author:octocat type:pr created:>=2024-01-01");
        assert_eq!(
            endpoint.as_str(),
            "/search/issues?q=author%3Aoctocat+type%3Apr+created%3A%3E%3D2024-01-01"
        );
        assert_eq!(
            endpoint.query_value("q").as_deref(),
            Some("author:octocat type:pr created:>=2024-01-01")
        );
    }

    #[test]
    fn parse_keeps_existing_query() {
        let endpoint = Endpoint::parse("/search/issues?q=author:octocat")
            .unwrap()
            .with_query("page", "1");
        assert_eq!(endpoint.as_str(), "/search/issues?q=author:octocat&page=1");
    }

    #[test]
    fn absolute_links_stay_absolute() {
        let endpoint = Endpoint::parse("https://api.github.com/user/1/events?page=2").unwrap();
        assert_eq!(endpoint.as_str(), "https://api.github.com/user/1/events?page=2");
        assert_eq!(endpoint.query_value("page").as_deref(), Some("2"));
    }

    #[test]
    fn invalid_absolute_url_is_rejected() {
        assert!(matches!(
            Endpoint::parse("http://[::1"),
            Err(Error::InvalidUrl(_))
        ));
    }
}
