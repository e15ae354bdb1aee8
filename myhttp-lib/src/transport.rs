//! HTTP transport capability.
//!
//! The worker pool only depends on the [`Transport`] trait, which issues a
//! request and hands back the response body as a stream of chunks. The
//! default implementation wraps a shared `reqwest::Client`; tests substitute
//! in-memory transports.

use crate::error::FetchHashError;
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{BoxStream, StreamExt};
use reqwest::Method;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Response body as a stream of chunks.
pub type BodyStream = BoxStream<'static, Result<Bytes, FetchHashError>>;

/// A single request handed to a transport.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub method: Method,
    /// Normalized URL
    pub url: String,
    /// Shared cancellation token for the whole run
    pub cancel: CancellationToken,
}

impl FetchRequest {
    /// Create a GET request for `url`.
    pub fn get(url: impl Into<String>, cancel: CancellationToken) -> Self {
        Self {
            method: Method::GET,
            url: url.into(),
            cancel,
        }
    }
}

/// Capability to issue an HTTP request and obtain its body stream.
///
/// Status codes are the transport's business: whatever body it returns is
/// what gets hashed.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn issue(&self, request: FetchRequest) -> Result<BodyStream, FetchHashError>;
}

/// Default transport backed by `reqwest`.
#[derive(Clone)]
pub struct ReqwestTransport {
    /// HTTP client shared by every worker
    http_client: reqwest::Client,
    timeout: Duration,
}

impl ReqwestTransport {
    /// Create a transport with the given per-request timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self, FetchHashError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                FetchHashError::network_with_source("Failed to create HTTP client", e.to_string())
            })?;

        Ok(Self {
            http_client,
            timeout,
        })
    }

    /// Wrap an already configured client.
    pub fn from_client(http_client: reqwest::Client, timeout: Duration) -> Self {
        Self {
            http_client,
            timeout,
        }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn issue(&self, request: FetchRequest) -> Result<BodyStream, FetchHashError> {
        let FetchRequest { method, url, .. } = request;

        let response = self
            .http_client
            .request(method, url.as_str())
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    FetchHashError::timeout(format!("GET {}", url), self.timeout)
                } else {
                    FetchHashError::from(e)
                }
            })?;

        tracing::trace!(url = %url, status = %response.status(), "response headers received");

        let body = response.bytes_stream().map(move |chunk| {
            chunk.map_err(|e| FetchHashError::stream(url.as_str(), e.to_string()))
        });

        Ok(body.boxed())
    }
}
