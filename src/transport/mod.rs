//! HTTP transport layer for the fraud-screening client.
//!
//! One [`HttpTransport`] capability serves both request paths: JSON calls go
//! through [`HttpTransport::send`], binary uploads through
//! [`HttpTransport::send_multipart`], which additionally reports how many
//! file bytes have been handed to the connection.

mod http;

pub use http::{HttpMethod, HttpRequest, HttpResponse, HttpTransport, ReqwestTransport};

use bytes::Bytes;
use std::collections::HashMap;
use std::sync::Arc;

/// Receives `(bytes_sent, total_bytes)` as the transport pushes file data.
///
/// `total_bytes` is `None` when the transport cannot tell how large the
/// payload is.
pub type TransferObserver = Arc<dyn Fn(u64, Option<u64>) + Send + Sync>;

/// Multipart request carrying a single file field.
#[derive(Debug, Clone)]
pub struct MultipartRequest {
    /// Absolute request URL.
    pub url: String,
    /// Request headers.
    pub headers: HashMap<String, String>,
    /// Form field name of the file.
    pub field_name: String,
    /// File name sent in the part's content disposition.
    pub filename: String,
    /// Content type of the part.
    pub content_type: String,
    /// File contents.
    pub data: Bytes,
}

/// Transport error types.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TransportError {
    /// Connection error, including timeouts enforced by a caller-supplied
    /// reqwest client.
    #[error("Connection error: {message}")]
    Connection {
        /// Error message.
        message: String,
    },

    /// The request could not be built (bad header, bad content type).
    #[error("Invalid request: {message}")]
    InvalidRequest {
        /// Error message.
        message: String,
    },

    /// The response could not be read.
    #[error("Invalid response: {message}")]
    InvalidResponse {
        /// Error message.
        message: String,
    },
}
