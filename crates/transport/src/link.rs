//! `Link` header parsing
//!
//! GitHub paginates with a comma-separated header of the form
//! `<https://api.github.com/x?page=2>; rel="next", <...?page=5>; rel="last"`.
//! Each relation is parsed independently; unknown relations are ignored.

use reqwest::header::{HeaderMap, LINK};

use crate::endpoint::Endpoint;

/// Continuation URLs from a single response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkRelations {
    pub next: Option<String>,
    pub prev: Option<String>,
    pub first: Option<String>,
    pub last: Option<String>,
}

impl LinkRelations {
    pub fn parse(header: &str) -> Self {
        let mut links = Self::default();
        let mut rest = header;

        while let Some(open) = rest.find('<') {
            let after = &rest[open + 1..];
            let Some(close) = after.find('>') else {
                break;
            };
            let url = &after[..close];
            let tail = &after[close + 1..];
            let params_end = tail.find('<').unwrap_or(tail.len());

            for rel in rel_values(&tail[..params_end]) {
                let slot = match rel {
                    "next" => &mut links.next,
                    "prev" => &mut links.prev,
                    "first" => &mut links.first,
                    "last" => &mut links.last,
                    _ => continue,
                };
                *slot = Some(url.to_owned());
            }
            rest = &tail[params_end..];
        }

        links
    }

    pub fn from_headers(headers: &HeaderMap) -> Self {
        headers
            .get(LINK)
            .and_then(|v| v.to_str().ok())
            .map(Self::parse)
            .unwrap_or_default()
    }

    /// Page count implied by the `page` parameter of the `last` relation.
    pub fn total_pages(&self) -> Option<u32> {
        let last = Endpoint::parse(self.last.as_deref()?).ok()?;
        last.query_value("page")?.parse().ok()
    }
}

/// URL of the `next` relation, if any.
pub fn next_link(header: Option<&str>) -> Option<String> {
    header.and_then(|h| LinkRelations::parse(h).next)
}

/// Values of every `rel=` parameter in a `; rel="a b"; foo=bar,` segment.
fn rel_values(params: &str) -> impl Iterator<Item = &str> {
    params
        .split(';')
        .map(|p| p.trim().trim_end_matches(',').trim())
        .filter_map(|p| p.strip_prefix("rel="))
        .flat_map(|v| v.trim_matches('"').split_whitespace())
}

#[cfg(test)]
mod tests {
    use super::*;

    const GITHUB_STYLE: &str = "<https://api.github.com/users/torvalds/repos?page=2>; rel=\"next\", \
         <https://api.github.com/users/torvalds/repos?page=5>; rel=\"last\"";

    #[test]
    fn parses_next_and_last() {
        let links = LinkRelations::parse(GITHUB_STYLE);
        assert_eq!(
            links.next.as_deref(),
            Some("https://api.github.com/users/torvalds/repos?page=2")
        );
        assert_eq!(
            links.last.as_deref(),
            Some("https://api.github.com/users/torvalds/repos?page=5")
        );
        assert!(links.prev.is_none());
        assert!(links.first.is_none());
    }

    #[test]
    fn multiple_relations_parse_independently() {
        let links = LinkRelations::parse("<u1>; rel=\"next\", <u2>; rel=\"last\"");
        assert_eq!(links.next.as_deref(), Some("u1"));
        assert_eq!(links.last.as_deref(), Some("u2"));
    }

    #[test]
    fn all_four_relations() {
        let header = "<https://x/?page=1>; rel=\"first\", <https://x/?page=2>; rel=\"prev\", \
                      <https://x/?page=4>; rel=\"next\", <https://x/?page=9>; rel=\"last\"";
        let links = LinkRelations::parse(header);
        assert_eq!(links.first.as_deref(), Some("https://x/?page=1"));
        assert_eq!(links.prev.as_deref(), Some("https://x/?page=2"));
        assert_eq!(links.next.as_deref(), Some("https://x/?page=4"));
        assert_eq!(links.last.as_deref(), Some("https://x/?page=9"));
    }

    #[test]
    fn next_absent_on_last_page() {
        let header = "<https://x/?page=1>; rel=\"first\", <https://x/?page=4>; rel=\"prev\"";
        assert_eq!(next_link(Some(header)), None);
    }

    #[test]
    fn next_link_helper() {
        assert_eq!(next_link(Some(GITHUB_STYLE)).as_deref(), Some(
            "https://api.github.com/users/torvalds/repos?page=2"
        ));
        assert_eq!(next_link(None), None);
        assert_eq!(next_link(Some("")), None);
    }

    #[test]
    fn urls_with_commas_survive() {
        let header = "<https://x/search?q=a,b&page=2>; rel=\"next\"";
        assert_eq!(next_link(Some(header)).as_deref(), Some("https://x/search?q=a,b&page=2"));
    }

    #[test]
    fn unquoted_and_multi_value_rel() {
        let links = LinkRelations::parse("<u1>; rel=next, <u2>; rel=\"prev first\"");
        assert_eq!(links.next.as_deref(), Some("u1"));
        assert_eq!(links.prev.as_deref(), Some("u2"));
        assert_eq!(links.first.as_deref(), Some("u2"));
    }

    #[test]
    fn garbage_yields_nothing() {
        assert_eq!(LinkRelations::parse("not a link header"), LinkRelations::default());
        assert_eq!(LinkRelations::parse("<unterminated; rel=\"next\""), LinkRelations::default());
    }

    #[test]
    fn total_pages_from_last() {
        let links = LinkRelations::parse(GITHUB_STYLE);
        assert_eq!(links.total_pages(), Some(5));
    }

    #[test]
    fn total_pages_ignores_per_page() {
        let links = LinkRelations::parse("<https://x/r?per_page=100&page=7>; rel=\"last\"");
        assert_eq!(links.total_pages(), Some(7));
    }

    #[test]
    fn total_pages_from_relative_or_garbled_last() {
        let links = LinkRelations::parse("</r?page=3>; rel=\"last\"");
        assert_eq!(links.total_pages(), Some(3));
        let links = LinkRelations::parse("<https://x/r?page=many>; rel=\"last\"");
        assert_eq!(links.total_pages(), None);
    }

    #[test]
    fn total_pages_none_without_last() {
        let links = LinkRelations::parse("<https://x/r?page=2>; rel=\"next\"");
        assert_eq!(links.total_pages(), None);
    }

    #[test]
    fn from_headers_reads_link() {
        let mut headers = HeaderMap::new();
        headers.insert(LINK, GITHUB_STYLE.parse().unwrap());
        assert_eq!(LinkRelations::from_headers(&headers).total_pages(), Some(5));
        assert_eq!(
            LinkRelations::from_headers(&HeaderMap::new()),
            LinkRelations::default()
        );
    }
}
