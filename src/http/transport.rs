//! Transport boundary.
//!
//! # Responsibilities
//! - Perform one HTTP round trip for a [`TransportRequest`]
//! - Classify failures: non-2xx response, timeout, network error
//!
//! # Design Decisions
//! - The pipeline only depends on the [`Transport`] trait; [`ReqwestTransport`]
//!   is the production implementation
//! - Non-2xx responses are errors carrying the full response, so the failure
//!   path can still read the backend payload
//! - Cancellation is not the transport's concern: the pipeline wraps the
//!   returned future in `Abortable`

use std::time::Duration;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use reqwest::header::HeaderValue;
use reqwest::Client;
use thiserror::Error;

use crate::http::request::{TransportRequest, X_REQUEST_ID};
use crate::http::response::TransportResponse;

/// Errors produced by a transport.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The server answered with a status outside 2xx.
    #[error("server responded with status {}", .0.status)]
    Status(TransportResponse),

    /// No response arrived before the deadline.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// Connection-level failure; no response was received.
    #[error("network error: {0}")]
    Network(String),
}

impl TransportError {
    /// The received response, if the server answered at all.
    pub fn response(&self) -> Option<&TransportResponse> {
        match self {
            TransportError::Status(resp) => Some(resp),
            _ => None,
        }
    }
}

/// Generic HTTP call primitive.
pub trait Transport: Send + Sync {
    fn send(&self, request: TransportRequest)
        -> BoxFuture<'_, Result<TransportResponse, TransportError>>;
}

/// [`Transport`] backed by a shared `reqwest::Client`.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Build a transport whose client enforces `timeout` on every call.
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Network(e.to_string()))?;
        Ok(Self { client })
    }

    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

impl Transport for ReqwestTransport {
    fn send(
        &self,
        request: TransportRequest,
    ) -> BoxFuture<'_, Result<TransportResponse, TransportError>> {
        let TransportRequest {
            id,
            method,
            url,
            query,
            mut headers,
            body,
            timeout,
        } = request;

        if let Ok(value) = HeaderValue::from_str(&id.to_string()) {
            headers.insert(X_REQUEST_ID, value);
        }

        let mut builder = self
            .client
            .request(method.into(), url)
            .headers(headers)
            .timeout(timeout);
        if !query.is_empty() {
            builder = builder.query(&query);
        }
        if let Some(body) = &body {
            builder = builder.json(body);
        }

        async move {
            let response = builder.send().await.map_err(|e| classify(e, timeout))?;

            let status = response.status().as_u16();
            let headers = response.headers().clone();
            let body = response
                .bytes()
                .await
                .map_err(|e| classify(e, timeout))?
                .to_vec();

            let response = TransportResponse {
                status,
                headers,
                body,
            };

            if response.is_success() {
                Ok(response)
            } else {
                Err(TransportError::Status(response))
            }
        }
        .boxed()
    }
}

fn classify(err: reqwest::Error, timeout: Duration) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout(timeout)
    } else {
        TransportError::Network(err.to_string())
    }
}
