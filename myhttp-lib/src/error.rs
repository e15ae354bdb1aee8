//! Error handling for fetch-and-hash operations.
//!
//! Every way a single URL can fail maps onto one variant here. None of these
//! ever escape [`Processor::run`](crate::Processor::run); they only surface
//! through logging and the optional failure channel.

use std::fmt;
use std::time::Duration;

/// Main error type for the library.
#[derive(Debug, Clone)]
pub enum FetchHashError {
    /// Empty input, unparsable input, or a scheme other than http/https
    InvalidUrl { url: String, reason: String },

    /// Connection-level failures reported by the transport
    NetworkError {
        message: String,
        source: Option<String>,
    },

    /// The body stream failed part-way through hashing
    StreamError { url: String, message: String },

    /// The shared cancellation token fired before the job finished
    Cancelled { url: String },

    /// Timeout errors when operations take too long
    Timeout {
        operation: String,
        duration: Duration,
    },

    /// Configuration errors (invalid settings, unparsable files)
    ConfigError { message: String },

    /// File I/O errors when reading URL lists or config files
    FileError { path: String, message: String },
}

/// Where in the per-URL pipeline a job was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureStage {
    Validation,
    Transport,
    Stream,
}

impl FetchHashError {
    /// Create a new invalid URL error.
    pub fn invalid_url<U: Into<String>, R: Into<String>>(url: U, reason: R) -> Self {
        Self::InvalidUrl {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Create a new network error.
    pub fn network<M: Into<String>>(message: M) -> Self {
        Self::NetworkError {
            message: message.into(),
            source: None,
        }
    }

    /// Create a new network error with source information.
    pub fn network_with_source<M: Into<String>, S: Into<String>>(message: M, source: S) -> Self {
        Self::NetworkError {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Create a new body stream error.
    pub fn stream<U: Into<String>, M: Into<String>>(url: U, message: M) -> Self {
        Self::StreamError {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Create a new cancellation error for the job at `url`.
    pub fn cancelled<U: Into<String>>(url: U) -> Self {
        Self::Cancelled { url: url.into() }
    }

    /// Create a new timeout error.
    pub fn timeout<O: Into<String>>(operation: O, duration: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration,
        }
    }

    /// Create a new configuration error.
    pub fn config<M: Into<String>>(message: M) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Create a new file error.
    pub fn file_error<P: Into<String>, M: Into<String>>(path: P, message: M) -> Self {
        Self::FileError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Classify the error by the pipeline stage that produces it.
    ///
    /// Cancellation is reported as a transport failure since the worker
    /// treats it exactly like one.
    pub fn stage(&self) -> FailureStage {
        match self {
            Self::InvalidUrl { .. } => FailureStage::Validation,
            Self::StreamError { .. } => FailureStage::Stream,
            _ => FailureStage::Transport,
        }
    }

    /// True if the job was dropped because the run was cancelled.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

impl fmt::Display for FetchHashError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidUrl { url, reason } => {
                write!(f, "Invalid URL '{}': {}", url, reason)
            }
            Self::NetworkError { message, source } => {
                if let Some(source) = source {
                    write!(f, "Network error: {} (source: {})", message, source)
                } else {
                    write!(f, "Network error: {}", message)
                }
            }
            Self::StreamError { url, message } => {
                write!(f, "Body stream error for '{}': {}", url, message)
            }
            Self::Cancelled { url } => {
                write!(f, "Cancelled while fetching '{}'", url)
            }
            Self::Timeout {
                operation,
                duration,
            } => {
                write!(f, "Timeout after {:?} during: {}", duration, operation)
            }
            Self::ConfigError { message } => {
                write!(f, "Configuration error: {}", message)
            }
            Self::FileError { path, message } => {
                write!(f, "File error at '{}': {}", path, message)
            }
        }
    }
}

impl fmt::Display for FailureStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureStage::Validation => write!(f, "validation"),
            FailureStage::Transport => write!(f, "transport"),
            FailureStage::Stream => write!(f, "stream"),
        }
    }
}

impl std::error::Error for FetchHashError {}

impl From<reqwest::Error> for FetchHashError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::network_with_source("Request timed out", err.to_string())
        } else if err.is_connect() {
            Self::network_with_source("Connection failed", err.to_string())
        } else {
            Self::network_with_source("HTTP request failed", err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_classification() {
        assert_eq!(
            FetchHashError::invalid_url("", "empty URL").stage(),
            FailureStage::Validation
        );
        assert_eq!(
            FetchHashError::network("refused").stage(),
            FailureStage::Transport
        );
        assert_eq!(
            FetchHashError::cancelled("http://a.test").stage(),
            FailureStage::Transport
        );
        assert_eq!(
            FetchHashError::stream("http://a.test", "reset").stage(),
            FailureStage::Stream
        );
    }

    #[test]
    fn test_display_messages() {
        let err = FetchHashError::invalid_url("ftp://host", "invalid URL");
        assert_eq!(err.to_string(), "Invalid URL 'ftp://host': invalid URL");

        let err = FetchHashError::network_with_source("Connection failed", "refused");
        assert_eq!(
            err.to_string(),
            "Network error: Connection failed (source: refused)"
        );

        let err = FetchHashError::file_error("urls.txt", "not found");
        assert_eq!(err.to_string(), "File error at 'urls.txt': not found");
    }

    #[test]
    fn test_is_cancelled() {
        assert!(FetchHashError::cancelled("http://a.test").is_cancelled());
        assert!(!FetchHashError::network("boom").is_cancelled());
    }
}
