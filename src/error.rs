use std::time::Duration;

use strum_macros::Display;
use thiserror::Error;

use crate::core::MediaFormat;

/// Coarse classification of a backend failure, used by the resolver to log
/// why it moved on to the next backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ExtractionErrorKind {
    /// Source unreachable or slow; worth retrying elsewhere or later.
    Transient,
    /// Source understood the URL but has nothing for it.
    NotFound,
    /// Source answered with something we cannot interpret.
    MalformedResponse,
}

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("Network request failed: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Request timeout after {0:?}")]
    RequestTimeout(Duration),

    #[error("HTTP error {status} for URL: {url}")]
    HttpError { status: u16, url: String },

    #[error("Failed to parse JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),

    #[error("Media not found: {0}")]
    NotFound(String),

    #[error("Source temporarily unavailable: {0}")]
    Unavailable(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Failed to launch extractor: {0}")]
    IoError(#[from] std::io::Error),
}

/// Classify an upstream HTTP status. 403 is usually throttling or a bot
/// check rather than a missing resource.
pub fn status_kind(status: u16) -> ExtractionErrorKind {
    match status {
        404 | 410 => ExtractionErrorKind::NotFound,
        403 | 408 | 429 | 500..=599 => ExtractionErrorKind::Transient,
        _ => ExtractionErrorKind::MalformedResponse,
    }
}

impl ExtractionError {
    pub fn kind(&self) -> ExtractionErrorKind {
        match self {
            ExtractionError::NetworkError(e) if e.is_decode() => {
                ExtractionErrorKind::MalformedResponse
            }
            ExtractionError::NetworkError(_)
            | ExtractionError::RequestTimeout(_)
            | ExtractionError::Unavailable(_)
            | ExtractionError::RateLimited(_)
            | ExtractionError::IoError(_) => ExtractionErrorKind::Transient,
            ExtractionError::HttpError { status, .. } => status_kind(*status),
            ExtractionError::JsonError(_) | ExtractionError::InvalidResponse(_) => {
                ExtractionErrorKind::MalformedResponse
            }
            ExtractionError::NotFound(_) => ExtractionErrorKind::NotFound,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.kind() == ExtractionErrorKind::Transient
    }
}

/// The backend produced media, but none of its variants fit the request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("No variant matches the requested format: {format}")]
pub struct NoMatchingVariant {
    pub format: MediaFormat,
}

/// Failure classes that are allowed to reach the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    InvalidInput,
    Unresolvable,
}

pub const MISSING_URL_MESSAGE: &str = "URL is required";
pub const INVALID_URL_MESSAGE: &str = "Please enter a valid video URL.";
pub const INVALID_REQUEST_MESSAGE: &str = "Invalid request body.";
pub const UNRESOLVABLE_MESSAGE: &str = "Could not process the video. Please check the URL.";

/// User-visible resolution failure. Messages are fixed strings and never
/// carry backend output.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind}: {message}")]
pub struct ResolveError {
    pub kind: ErrorKind,
    pub message: &'static str,
}

impl ResolveError {
    pub fn missing_url() -> Self {
        Self {
            kind: ErrorKind::InvalidInput,
            message: MISSING_URL_MESSAGE,
        }
    }

    pub fn invalid_url() -> Self {
        Self {
            kind: ErrorKind::InvalidInput,
            message: INVALID_URL_MESSAGE,
        }
    }

    /// Body could not be decoded into a request
    pub fn invalid_request() -> Self {
        Self {
            kind: ErrorKind::InvalidInput,
            message: INVALID_REQUEST_MESSAGE,
        }
    }

    pub fn unresolvable() -> Self {
        Self {
            kind: ErrorKind::Unresolvable,
            message: UNRESOLVABLE_MESSAGE,
        }
    }
}

pub type Result<T> = std::result::Result<T, ExtractionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_status_classification() {
        let err = |status| ExtractionError::HttpError {
            status,
            url: "https://example.com".to_string(),
        };
        assert_eq!(err(404).kind(), ExtractionErrorKind::NotFound);
        assert_eq!(err(429).kind(), ExtractionErrorKind::Transient);
        assert_eq!(err(503).kind(), ExtractionErrorKind::Transient);
        assert_eq!(err(408).kind(), ExtractionErrorKind::Transient);
        assert_eq!(err(403).kind(), ExtractionErrorKind::Transient);
        assert_eq!(err(410).kind(), ExtractionErrorKind::NotFound);
        assert_eq!(err(400).kind(), ExtractionErrorKind::MalformedResponse);
    }

    #[test]
    fn test_timeout_is_retryable() {
        assert!(ExtractionError::RequestTimeout(Duration::from_secs(8)).is_retryable());
        assert!(!ExtractionError::NotFound("gone".to_string()).is_retryable());
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(ExtractionErrorKind::MalformedResponse.to_string(), "MALFORMED_RESPONSE");
        assert_eq!(ErrorKind::InvalidInput.to_string(), "INVALID_INPUT");
    }
}
