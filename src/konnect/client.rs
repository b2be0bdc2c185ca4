//! Konnect Client
//!
//! Main client for talking to the Konnect API, combining credentials, the
//! HTTP client and the regional base URL. It is the production [`Transport`].

use super::auth::KonnectCredentials;
use super::http::{KonnectHttpClient, Transport};
use crate::error::{CrudError, TransportError};
use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::Method;
use std::time::Duration;
use url::Url;

/// Region used when none is configured
pub const DEFAULT_REGION: &str = "us";

/// Regional API host, e.g. `https://eu.api.konghq.com`
pub fn region_base_url(region: &str) -> String {
    format!("https://{}.api.konghq.com", region)
}

/// Main Konnect client
#[derive(Clone, Debug)]
pub struct KonnectClient {
    pub credentials: Option<KonnectCredentials>,
    pub http: KonnectHttpClient,
    base_url: Url,
}

impl KonnectClient {
    /// Create a new client for `base_url`
    pub fn new(
        base_url: &str,
        credentials: Option<KonnectCredentials>,
        timeout: Option<Duration>,
    ) -> Result<Self, TransportError> {
        let base_url = Url::parse(base_url.trim_end_matches('/'))?;
        let http = KonnectHttpClient::new(timeout)?;

        Ok(Self {
            credentials,
            http,
            base_url,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build the absolute URL for an API path. Path segments are used as is.
    pub fn url_for(&self, path: &str, query: &[(&str, &str)]) -> Result<Url, TransportError> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let mut url = Url::parse(&format!("{}{}", base, path))?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query.iter());
        }
        Ok(url)
    }
}

#[async_trait]
impl Transport for KonnectClient {
    async fn request(
        &self,
        authenticated: bool,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        headers: HeaderMap,
        body: Option<Vec<u8>>,
    ) -> Result<Vec<u8>, TransportError> {
        let token = if authenticated {
            let creds = self
                .credentials
                .as_ref()
                .ok_or(TransportError::MissingToken)?;
            Some(creds.token())
        } else {
            None
        };

        let url = self.url_for(path, query)?;
        self.http.send(method, url, token, headers, body).await
    }
}

/// Format a Konnect error for display
/// Security: Sanitizes error messages to avoid leaking sensitive API details
pub fn format_konnect_error(error: &anyhow::Error) -> String {
    let status = error.chain().find_map(|cause| {
        if let Some(crud) = cause.downcast_ref::<CrudError>() {
            return match crud {
                CrudError::NotFound { .. } => Some(404),
                CrudError::Transport(t) => t.status(),
                _ => None,
            };
        }
        cause.downcast_ref::<TransportError>().and_then(|t| t.status())
    });

    if let Some(status) = status {
        return status_message(status).to_string();
    }

    let error_str = error.to_string();

    // Truncate long error messages and remove potential sensitive data
    let sanitized = error_str
        .chars()
        .filter(|c| c.is_ascii_graphic() || *c == ' ')
        .take(80)
        .collect::<String>();

    if sanitized.len() < error_str.len() {
        format!("{}...", sanitized)
    } else {
        sanitized
    }
}

/// Generic messages avoid leaking API structure details
fn status_message(status: u16) -> &'static str {
    match status {
        401 => "Authentication failed. Check KONNECT_TOKEN.",
        403 => "Permission denied. Check the token's Konnect roles.",
        404 => "Resource not found.",
        409 => "Resource conflict. The resource may already exist.",
        429 => "Rate limit exceeded. Please try again later.",
        400 => "Invalid request. Check the declared fields.",
        500..=599 => "Konnect service temporarily unavailable. Please try again.",
        _ => "Request failed. Check your network connection and try again.",
    }
}
