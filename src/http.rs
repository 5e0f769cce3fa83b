//! HTTP client utilities for talking to the agent service.
//!
//! This module provides client construction from [`TransportOptions`],
//! including the extra headers sent with every request, and the logged
//! request/response helpers shared by every endpoint.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, RequestBuilder, Response};
use serde::Serialize;
use tracing::{debug, warn};

use crate::client::ClientError;
use crate::options::TransportOptions;

/// Build a configured HTTP client from transport options.
///
/// # Example
/// ```ignore
/// let client = build_http_client(&transport_options)?;
/// ```
pub fn build_http_client(transport_options: &TransportOptions) -> Result<Client, ClientError> {
    if transport_options.base_url.trim().is_empty() {
        return Err(ClientError::Config("Base URL must not be empty".to_string()));
    }

    let mut builder = Client::builder().default_headers(extra_header_map(transport_options)?);

    if let Some(timeout) = transport_options.timeout {
        builder = builder.timeout(timeout);
    }

    if let Some(proxy_url) = &transport_options.proxy {
        let proxy = reqwest::Proxy::all(proxy_url)
            .map_err(|e| ClientError::Config(format!("Invalid proxy {}: {}", proxy_url, e)))?;
        builder = builder.proxy(proxy);
    }

    builder
        .build()
        .map_err(|e| ClientError::Config(format!("Failed to build HTTP client: {}", e)))
}

/// Validate the extra headers from transport options into a header map.
///
/// Invalid names or values are configuration errors, reported before any
/// request is sent.
pub fn extra_header_map(transport_options: &TransportOptions) -> Result<HeaderMap, ClientError> {
    let mut map = HeaderMap::new();
    if let Some(headers) = &transport_options.extra_headers {
        for (key, value) in headers {
            let name = HeaderName::from_bytes(key.as_bytes())
                .map_err(|e| ClientError::Config(format!("Invalid header name {:?}: {}", key, e)))?;
            let value = HeaderValue::from_str(value).map_err(|e| {
                ClientError::Config(format!("Invalid value for header {}: {}", key, e))
            })?;
            map.insert(name, value);
        }
    }
    Ok(map)
}

pub trait RequestBuilderExt {
    /// Attach a JSON body, logging it at debug level.
    fn json_logged<T: Serialize + ?Sized>(self, body: &T) -> Self;
}

impl RequestBuilderExt for RequestBuilder {
    fn json_logged<T: Serialize + ?Sized>(self, body: &T) -> Self {
        if tracing::enabled!(tracing::Level::DEBUG) {
            match serde_json::to_string(body) {
                Ok(json) => debug!(body = %json, "Sending request"),
                Err(e) => debug!(error = %e, "Sending request with unserializable body"),
            }
        }
        self.json(body)
    }
}

#[async_trait]
pub trait ResponseExt: Sized {
    /// Pass a success response through; turn anything else into
    /// [`ClientError::Api`] carrying the status and body text.
    async fn error_for_api_status(self) -> Result<Self, ClientError>;
}

#[async_trait]
impl ResponseExt for Response {
    async fn error_for_api_status(self) -> Result<Self, ClientError> {
        let status = self.status();
        if status.is_success() {
            return Ok(self);
        }

        let url = self.url().to_string();
        let body = self.text().await.unwrap_or_default();
        warn!(status = status.as_u16(), %url, body = %body, "API error response");
        Err(ClientError::Api {
            status: status.as_u16(),
            body,
        })
    }
}
