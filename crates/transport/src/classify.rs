//! Classification of GitHub error responses
//!
//! GitHub signals both primary and secondary rate limits with a 403 whose
//! message mentions the rate limit; any other 403 is a permission problem.
//! 5xx are upstream faults. Only the body text distinguishes the two 403s.

/// Rate-limit message patterns in GitHub 403 response bodies.
const RATE_LIMIT_PATTERNS: &[&str] = &["rate limit", "abuse detection"];

/// Outcome of inspecting a response status and body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Success,
    NotFound,
    RateLimited,
    Forbidden,
    ServerError,
    ClientError,
}

/// Whether a 403 body names a rate limit (case-insensitive).
pub fn is_rate_limit_body(body: &str) -> bool {
    let lower = body.to_lowercase();
    RATE_LIMIT_PATTERNS
        .iter()
        .any(|pattern| lower.contains(pattern))
}

/// Classify a response by HTTP status and body.
pub fn classify_status(status: u16, body: &str) -> Classification {
    match status {
        200..=399 => Classification::Success,
        404 => Classification::NotFound,
        403 if is_rate_limit_body(body) => Classification::RateLimited,
        403 => Classification::Forbidden,
        500.. => Classification::ServerError,
        _ => Classification::ClientError,
    }
}

/// Human-readable message from an error body: the JSON `message` field when
/// present, otherwise the trimmed raw text.
pub fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_owned))
        .unwrap_or_else(|| body.trim().to_owned())
}
