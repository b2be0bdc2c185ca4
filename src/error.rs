//! Typed errors for the transport and the resource lifecycle engine.

use thiserror::Error;

/// Structured error returned when the API answers with a non-success status.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("API request failed: {status}")]
pub struct RequestError {
    pub status: u16,
    /// Sanitized, truncated response body
    pub body: String,
}

impl RequestError {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status == 404
    }
}

/// Failure of a single request/response exchange
#[derive(Error, Debug)]
pub enum TransportError {
    #[error(transparent)]
    Request(#[from] RequestError),
    #[error("http transport: {0}")]
    Http(#[from] reqwest::Error),
    #[error("invalid request url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("no access token configured for an authenticated request")]
    MissingToken,
}

impl TransportError {
    /// HTTP status carried by the error, if the server answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Request(e) => Some(e.status),
            TransportError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

/// Errors surfaced by the CRUD engine
#[derive(Error, Debug)]
pub enum CrudError {
    #[error("encoding: {0}")]
    Encoding(#[from] serde_json::Error),
    #[error(transparent)]
    Transport(TransportError),
    #[error("not found: {path}")]
    NotFound { path: String },
    #[error("malformed identifier '{input}': {reason}")]
    MalformedIdentifier { input: String, reason: &'static str },
    #[error("validation: {0}")]
    Validation(String),
}

impl CrudError {
    /// Classify a transport failure for the request made against `path`.
    /// A 404 becomes [`CrudError::NotFound`], everything else stays a transport error.
    pub fn from_transport(err: TransportError, path: &str) -> Self {
        if err.is_not_found() {
            CrudError::NotFound {
                path: path.to_string(),
            }
        } else {
            CrudError::Transport(err)
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, CrudError::NotFound { .. })
    }

    pub(crate) fn malformed(input: &str, reason: &'static str) -> Self {
        CrudError::MalformedIdentifier {
            input: input.to_string(),
            reason,
        }
    }
}
