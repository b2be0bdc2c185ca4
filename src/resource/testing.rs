//! In-memory transport for engine tests

use super::data::ResourceData;
use crate::error::{RequestError, TransportError};
use crate::konnect::http::Transport;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, CONTENT_TYPE};
use reqwest::Method;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub authenticated: bool,
    pub method: Method,
    pub path: String,
    pub content_type: Option<String>,
    pub body: Option<Vec<u8>>,
}

impl RecordedRequest {
    pub fn json_body(&self) -> Value {
        let body = self.body.as_deref().expect("request has no body");
        serde_json::from_slice(body).expect("body is not JSON")
    }
}

#[derive(Default)]
struct Inner {
    responses: VecDeque<Result<Vec<u8>, TransportError>>,
    requests: Vec<RecordedRequest>,
}

/// Answers requests from a queue and records what was sent
#[derive(Clone, Default)]
pub struct MockTransport {
    inner: Arc<Mutex<Inner>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond_json(&self, body: Value) {
        self.respond_raw(serde_json::to_vec(&body).unwrap());
    }

    pub fn respond_raw(&self, body: Vec<u8>) {
        self.inner.lock().unwrap().responses.push_back(Ok(body));
    }

    pub fn respond_status(&self, status: u16) {
        self.respond_error(TransportError::Request(RequestError::new(status, "")));
    }

    pub fn respond_error(&self, err: TransportError) {
        self.inner.lock().unwrap().responses.push_back(Err(err));
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.inner.lock().unwrap().requests.clone()
    }

    pub fn request_count(&self) -> usize {
        self.inner.lock().unwrap().requests.len()
    }

    pub fn last_request(&self) -> RecordedRequest {
        self.requests().pop().expect("no request was sent")
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn request(
        &self,
        authenticated: bool,
        method: Method,
        path: &str,
        _query: &[(&str, &str)],
        headers: HeaderMap,
        body: Option<Vec<u8>>,
    ) -> Result<Vec<u8>, TransportError> {
        let mut inner = self.inner.lock().unwrap();
        inner.requests.push(RecordedRequest {
            authenticated,
            method,
            path: path.to_string(),
            content_type: headers
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(String::from),
            body,
        });
        inner
            .responses
            .pop_front()
            .unwrap_or_else(|| Err(RequestError::new(500, "no response queued").into()))
    }
}

/// Record from a JSON object literal
pub fn data(value: Value) -> ResourceData {
    match value {
        Value::Object(map) => ResourceData::from_fields(map),
        other => panic!("expected an object, got {other}"),
    }
}
