//! Wire-level access to the Notion API. The adapter in `notion` only sees
//! `RemoteRequest`/`RemoteResponse`, so tests can swap in a fake transport.
use async_trait::async_trait;
use reqwest::{Client, Method, Url};
use serde_json::Value;
use std::fmt;
use std::time::Duration;
use tracing::debug;

use crate::error::RelayError;

pub const NOTION_API_BASE: &str = "https://api.notion.com/";

#[derive(Clone, PartialEq, Eq)]
pub enum Auth {
    Bearer(String),
    Basic { username: String, password: String },
}

impl fmt::Debug for Auth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Auth::Bearer(_) => f.write_str("Bearer([REDACTED])"),
            Auth::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .finish_non_exhaustive(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RemoteRequest {
    pub method: Method,
    /// Path relative to the API base, e.g. `v1/search`.
    pub path: String,
    pub auth: Auth,
    pub body: Option<Value>,
}

impl RemoteRequest {
    pub fn get(path: impl Into<String>, auth: Auth) -> Self {
        Self {
            method: Method::GET,
            path: path.into(),
            auth,
            body: None,
        }
    }

    pub fn post(path: impl Into<String>, auth: Auth, body: Value) -> Self {
        Self {
            method: Method::POST,
            path: path.into(),
            auth,
            body: Some(body),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RemoteResponse {
    pub status: u16,
    pub body: Value,
}

impl RemoteResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Issues one request against Notion. Only network-level failures are errors;
/// a non-2xx status is still a response.
#[async_trait]
pub trait NotionTransport: Send + Sync {
    async fn send(&self, request: RemoteRequest) -> Result<RemoteResponse, RelayError>;
}

#[derive(Clone)]
pub struct HttpTransport {
    http: Client,
    base_url: Url,
    version: String,
}

impl fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpTransport")
            .field("base_url", &self.base_url)
            .field("version", &self.version)
            .finish_non_exhaustive()
    }
}

impl HttpTransport {
    pub fn new(base_url: Url, version: String, timeout: Duration) -> Result<Self, RelayError> {
        let http = Client::builder()
            .user_agent(concat!("notion-relay/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|err| RelayError::Transport(err.to_string()))?;
        Ok(Self {
            http,
            base_url,
            version,
        })
    }

    pub fn build_request(&self, request: &RemoteRequest) -> Result<reqwest::Request, RelayError> {
        let endpoint = self
            .base_url
            .join(&request.path)
            .map_err(|err| RelayError::Transport(format!("invalid Notion URL: {err}")))?;
        let mut builder = self
            .http
            .request(request.method.clone(), endpoint)
            .header("Notion-Version", &self.version)
            .header("Accept", "application/json");
        builder = match &request.auth {
            Auth::Bearer(token) => builder.bearer_auth(token),
            Auth::Basic { username, password } => builder.basic_auth(username, Some(password)),
        };
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        builder
            .build()
            .map_err(|err| RelayError::Transport(format!("failed to build Notion request: {err}")))
    }
}

#[async_trait]
impl NotionTransport for HttpTransport {
    async fn send(&self, request: RemoteRequest) -> Result<RemoteResponse, RelayError> {
        let built = self.build_request(&request)?;
        debug!(method = %built.method(), url = %built.url(), auth = ?request.auth, "sending notion request");
        let res = self
            .http
            .execute(built)
            .await
            .map_err(|err| RelayError::Transport(err.to_string()))?;

        let status = res.status().as_u16();
        let text = res
            .text()
            .await
            .map_err(|err| RelayError::Transport(format!("failed to read Notion response: {err}")))?;
        debug!(status, bytes = text.len(), "notion response");

        let body = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or(Value::String(text))
        };
        Ok(RemoteResponse { status, body })
    }
}
