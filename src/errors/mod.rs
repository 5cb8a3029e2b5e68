//! Error types for the fraud-screening client.
//!
//! Every failure surfaced by the request layer is classified into a
//! [`FailureKind`]. The kind decides whether the retry orchestrator may
//! repeat the call and lets callers pick a presentation (toast, banner,
//! silent drop) without inspecting message text.

use std::fmt;
use std::time::Duration;
use thiserror::Error;

use crate::transport::TransportError;

/// Result type alias for client operations.
pub type ScanOutcome<T> = Result<T, ScanError>;

/// Classification of a failed call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// The deadline elapsed before the call settled.
    Timeout,
    /// A non-success status below 500. Never retried.
    ClientError,
    /// A 5xx status. Retried.
    ServerError,
    /// Connection refused, DNS failure, dropped socket. Retried.
    NetworkError,
    /// The response body could not be decoded. Never retried.
    ParseError,
    /// The caller aborted the call. Never retried.
    Cancelled,
}

impl FailureKind {
    /// Returns the kind name as used in logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Timeout => "timeout",
            FailureKind::ClientError => "client_error",
            FailureKind::ServerError => "server_error",
            FailureKind::NetworkError => "network_error",
            FailureKind::ParseError => "parse_error",
            FailureKind::Cancelled => "cancelled",
        }
    }

    /// Returns true if a failure of this kind is worth repeating unmodified.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            FailureKind::ServerError | FailureKind::NetworkError | FailureKind::Timeout
        )
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error type for client operations.
#[derive(Debug, Clone, Error)]
pub enum ScanError {
    /// Invalid client or call configuration (bad base URL, zero deadline).
    #[error("Configuration error: {message}")]
    Configuration {
        /// Error message describing the configuration issue.
        message: String,
    },

    /// A file was rejected before any bytes were sent.
    #[error("Validation error: {message}")]
    Validation {
        /// Why the file was rejected.
        message: String,
    },

    /// The deadline elapsed before the call settled.
    #[error("Request timed out after {}ms - server took too long to respond", timeout.as_millis())]
    Timeout {
        /// The deadline that elapsed.
        timeout: Duration,
    },

    /// Non-success status below 500.
    #[error("API request failed (HTTP {status_code}): {message}")]
    Client {
        /// HTTP status code.
        status_code: u16,
        /// Response body text, or a placeholder when it could not be read.
        message: String,
    },

    /// 5xx status.
    #[error("Server error (HTTP {status_code}): {message}")]
    Server {
        /// HTTP status code.
        status_code: u16,
        /// Response body text, or a placeholder when it could not be read.
        message: String,
    },

    /// Transport-level failure.
    #[error("Network error - please check your connection and try again: {message}")]
    Network {
        /// Error message.
        message: String,
    },

    /// Malformed response body.
    #[error("Invalid JSON response: {message}")]
    Parse {
        /// Error message.
        message: String,
        /// HTTP status of the response whose body failed to decode.
        status_code: Option<u16>,
    },

    /// Caller-initiated abort.
    #[error("Request cancelled: {message}")]
    Cancelled {
        /// Error message.
        message: String,
    },
}

impl ScanError {
    /// Returns the failure kind.
    ///
    /// Configuration and validation problems are reported as client errors:
    /// they originate with the caller and repeating the call cannot fix them.
    pub fn kind(&self) -> FailureKind {
        match self {
            ScanError::Configuration { .. }
            | ScanError::Validation { .. }
            | ScanError::Client { .. } => FailureKind::ClientError,
            ScanError::Timeout { .. } => FailureKind::Timeout,
            ScanError::Server { .. } => FailureKind::ServerError,
            ScanError::Network { .. } => FailureKind::NetworkError,
            ScanError::Parse { .. } => FailureKind::ParseError,
            ScanError::Cancelled { .. } => FailureKind::Cancelled,
        }
    }

    /// Returns the HTTP status code, when one was received.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ScanError::Client { status_code, .. } | ScanError::Server { status_code, .. } => {
                Some(*status_code)
            }
            ScanError::Parse { status_code, .. } => *status_code,
            _ => None,
        }
    }

    /// Returns true if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        self.kind().is_transient()
    }

    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        ScanError::Configuration {
            message: message.into(),
        }
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ScanError::Validation {
            message: message.into(),
        }
    }

    /// Creates a network error.
    pub fn network(message: impl Into<String>) -> Self {
        ScanError::Network {
            message: message.into(),
        }
    }

    /// Creates a cancellation error.
    pub fn cancelled(message: impl Into<String>) -> Self {
        ScanError::Cancelled {
            message: message.into(),
        }
    }

    /// Creates a parse error.
    pub fn parse(message: impl Into<String>, status_code: Option<u16>) -> Self {
        ScanError::Parse {
            message: message.into(),
            status_code,
        }
    }

    /// Classifies a non-success HTTP status.
    ///
    /// 5xx is a server error; every other non-2xx status is treated as a
    /// client error without finer distinction.
    pub fn from_status(status_code: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        if status_code >= 500 {
            ScanError::Server {
                status_code,
                message,
            }
        } else {
            ScanError::Client {
                status_code,
                message,
            }
        }
    }
}

impl From<TransportError> for ScanError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::InvalidRequest { message } => ScanError::Configuration { message },
            other => ScanError::Network {
                message: other.to_string(),
            },
        }
    }
}

impl From<serde_json::Error> for ScanError {
    fn from(err: serde_json::Error) -> Self {
        ScanError::Parse {
            message: err.to_string(),
            status_code: None,
        }
    }
}

impl From<url::ParseError> for ScanError {
    fn from(err: url::ParseError) -> Self {
        ScanError::Configuration {
            message: format!("Invalid URL: {}", err),
        }
    }
}
