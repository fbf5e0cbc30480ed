//! Error types for activity collection

/// Errors that abort a collection or contribution fetch.
///
/// Per-gather failures inside a deep collection never surface here; they are
/// recorded as warnings on the aggregate instead.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Transport(#[from] transport::Error),

    #[error("user not found: {0}")]
    UserNotFound(String),

    #[error("unexpected response shape: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Result alias for activity operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_not_found_names_login() {
        assert_eq!(
            Error::UserNotFound("ghost".into()).to_string(),
            "user not found: ghost"
        );
    }

    #[test]
    fn transport_errors_are_transparent() {
        let err: Error = transport::Error::AuthenticationRequired.into();
        assert_eq!(
            err.to_string(),
            transport::Error::AuthenticationRequired.to_string()
        );
    }
}
