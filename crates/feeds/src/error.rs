//! Error types for feed operations.

use thiserror::Error;

/// Errors that can occur while fetching a price or rate.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("Request failed: {0}")]
    ConnectionFailed(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("HTTP {0}")]
    HttpStatus(u16),

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("No usable data: {0}")]
    NoData(String),

    #[error("No providers configured")]
    NoProviders,
}

impl From<reqwest::Error> for FeedError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FeedError::Timeout(err.to_string())
        } else if err.is_decode() {
            FeedError::ParseError(err.to_string())
        } else if let Some(status) = err.status() {
            FeedError::HttpStatus(status.as_u16())
        } else {
            FeedError::ConnectionFailed(err.to_string())
        }
    }
}

impl From<serde_json::Error> for FeedError {
    fn from(err: serde_json::Error) -> Self {
        FeedError::ParseError(err.to_string())
    }
}

impl FeedError {
    /// Returns true if the same request may succeed on a later tick.
    pub fn is_transient(&self) -> bool {
        match self {
            FeedError::ConnectionFailed(_)
            | FeedError::Timeout(_)
            | FeedError::RateLimitExceeded
            | FeedError::NoData(_) => true,
            FeedError::HttpStatus(code) => *code >= 500,
            FeedError::ParseError(_) | FeedError::NoProviders => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(FeedError::RateLimitExceeded.is_transient());
        assert!(FeedError::Timeout("10s".into()).is_transient());
        assert!(FeedError::HttpStatus(503).is_transient());
        assert!(!FeedError::HttpStatus(404).is_transient());
        assert!(!FeedError::ParseError("bad".into()).is_transient());
        assert!(!FeedError::NoProviders.is_transient());
    }

    #[test]
    fn test_from_serde_error() {
        let err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert!(matches!(FeedError::from(err), FeedError::ParseError(_)));
    }
}
