//! SDK error types.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for SDK operations.
pub type SdkResult<T> = Result<T, SdkError>;

/// Errors that can occur while talking to the runtime or the gateway.
#[derive(Debug, Error)]
pub enum SdkError {
    /// Reading or writing a runtime file failed.
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A runtime file or payload was not valid JSON for the expected shape.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A request was built without a path.
    #[error("can not generate request without path")]
    MissingPath,

    /// The runtime environment carries no gateway host.
    #[error("gateway is not configured")]
    MissingGateway,

    /// Transport failure or non-2xx status. Only the caller's message is kept.
    #[error("{0}")]
    Request(String),

    /// The backend answered with a `data` shape the endpoint does not document.
    #[error("unexpected response shape for {endpoint}: expected {expected}")]
    Contract { endpoint: &'static str, expected: &'static str },

    /// A lookup was attempted with an empty key.
    #[error("key is empty")]
    EmptyKey,

    /// A message id is missing from the active catalog.
    #[error("localize error: {0}")]
    Localize(String),
}

impl SdkError {
    /// Wrap an IO error with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }

    /// Create a generic request error.
    pub fn request(msg: impl Into<String>) -> Self {
        Self::Request(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SdkError::request("fail to get commit history");
        assert_eq!(err.to_string(), "fail to get commit history");

        assert_eq!(SdkError::MissingPath.to_string(), "can not generate request without path");
        assert_eq!(SdkError::EmptyKey.to_string(), "key is empty");

        let err = SdkError::Contract { endpoint: "build context", expected: "string" };
        assert_eq!(err.to_string(), "unexpected response shape for build context: expected string");
    }

    #[test]
    fn test_io_error_keeps_path() {
        let err = SdkError::io("/tmp/x.json", std::io::Error::from(std::io::ErrorKind::NotFound));
        assert!(err.to_string().contains("/tmp/x.json"));
    }
}
