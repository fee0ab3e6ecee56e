//! Uniform failure type for backend calls

use thiserror::Error;

/// Longest body excerpt kept in a status error.
const BODY_EXCERPT_LEN: usize = 200;

/// Network failure from any backend call.
///
/// Every variant means the call did not produce a usable result; callers never
/// see a partially parsed body.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request could not be sent or the connection failed.
    #[error("{method} {url} failed: {source}")]
    Transport {
        method: &'static str,
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The backend answered with a non-2xx status.
    #[error("HTTP {status} for {url}: {body}")]
    Status { status: u16, url: String, body: String },

    /// The response body was not the expected JSON shape.
    #[error("Failed to parse response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

impl ApiError {
    pub(crate) fn status(status: u16, url: &str, body: &str) -> Self {
        let body: String = body.trim().chars().take(BODY_EXCERPT_LEN).collect();
        ApiError::Status {
            status,
            url: url.to_string(),
            body,
        }
    }

    /// HTTP status code, when the backend answered at all.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
