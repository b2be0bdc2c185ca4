//! HTTP utilities for Konnect REST API calls

use crate::error::{RequestError, TransportError};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, ACCEPT};
use reqwest::{Client, Method, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use url::Url;
use uuid::Uuid;

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

pub const APPLICATION_JSON: &str = "application/json";

/// Correlation header sent with every request
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Sanitize response body for logging
/// Truncates long responses and strips control characters
fn sanitize_for_log(body: &str) -> String {
    let truncated = if body.len() > MAX_LOG_BODY_LENGTH {
        let mut end = MAX_LOG_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... [truncated, {} bytes total]", &body[..end], body.len())
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| c.is_control() && c != ' ', "")
}

/// Executes one request against the API.
///
/// `path` is relative to the configured base URL. When `authenticated` is set
/// the implementation attaches its credentials. On a non-success status the
/// error is a [`TransportError::Request`] carrying the status code.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn request(
        &self,
        authenticated: bool,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        headers: HeaderMap,
        body: Option<Vec<u8>>,
    ) -> Result<Vec<u8>, TransportError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn request(
        &self,
        authenticated: bool,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        headers: HeaderMap,
        body: Option<Vec<u8>>,
    ) -> Result<Vec<u8>, TransportError> {
        (**self)
            .request(authenticated, method, path, query, headers, body)
            .await
    }
}

/// HTTP client wrapper for Konnect API calls
#[derive(Clone, Debug)]
pub struct KonnectHttpClient {
    client: Client,
}

impl KonnectHttpClient {
    /// Create a new HTTP client
    pub fn new(timeout: Option<Duration>) -> Result<Self, TransportError> {
        let mut builder =
            Client::builder().user_agent(concat!("konnect-sync/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
        })
    }

    /// Send a request and return the raw response body
    pub async fn send(
        &self,
        method: Method,
        url: Url,
        token: Option<&str>,
        headers: HeaderMap,
        body: Option<Vec<u8>>,
    ) -> Result<Vec<u8>, TransportError> {
        let request_id = Uuid::new_v4().to_string();
        tracing::debug!("{} {} [{}]", method, url.path(), request_id);

        let mut request = self
            .client
            .request(method.clone(), url)
            .headers(headers)
            .header(ACCEPT, APPLICATION_JSON)
            .header(REQUEST_ID_HEADER, request_id.as_str());

        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.body(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        if !status.is_success() {
            let sanitized = sanitize_for_log(&String::from_utf8_lossy(&bytes));
            if status == StatusCode::NOT_FOUND {
                tracing::debug!("{} returned 404 [{}]", method, request_id);
            } else {
                // Security: Only log sanitized/truncated error body to avoid leaking sensitive data
                tracing::error!("API error: {} - {} [{}]", status, sanitized, request_id);
            }
            return Err(RequestError::new(status.as_u16(), sanitized).into());
        }

        Ok(bytes.to_vec())
    }
}
