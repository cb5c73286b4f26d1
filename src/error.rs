//! Error taxonomy for remote calls and the uniform failure carrier returned at
//! every boundary operation.
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// Message used whenever the remote body carries no usable detail.
pub const GENERIC_REMOTE_MESSAGE: &str = "Notion API error";

/// Status used for network-level failures reaching the remote service.
pub const TRANSPORT_FAILURE_STATUS: u16 = 502;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RelayError {
    /// The remote service answered with a non-success status.
    #[error(
        "notion error {status} ({code}): {}",
        message.as_deref().unwrap_or(GENERIC_REMOTE_MESSAGE)
    )]
    RemoteApi {
        status: u16,
        code: String,
        message: Option<String>,
    },
    #[error("failed to reach Notion: {0}")]
    Transport(String),
    #[error("unexpected Notion response: {0}")]
    Parse(String),
    #[error("invalid request: {0}")]
    Validation(String),
}

/// Either an HTTP-like status or the remote service's own error code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ErrorCode {
    Status(u16),
    Remote(String),
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCode::Status(status) => write!(f, "{status}"),
            ErrorCode::Remote(code) => f.write_str(code),
        }
    }
}

/// Failure value handed back in place of a success value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResult {
    pub message: String,
    pub code: ErrorCode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ErrorResult {
    pub fn new(message: impl Into<String>, code: ErrorCode) -> Self {
        Self {
            message: message.into(),
            code,
            data: None,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Mapping used by search: the remote body's detail is not surfaced and
    /// the code is the HTTP status.
    pub fn generic(err: RelayError) -> Self {
        match err {
            RelayError::RemoteApi { status, .. } => {
                Self::new(GENERIC_REMOTE_MESSAGE, ErrorCode::Status(status))
            }
            RelayError::Transport(_) => Self::new(
                GENERIC_REMOTE_MESSAGE,
                ErrorCode::Status(TRANSPORT_FAILURE_STATUS),
            ),
            other => Self::local(other),
        }
    }

    /// Mapping used by create/retrieve: the remote `message` is surfaced and
    /// the code is the remote service's own error code.
    pub fn detailed(err: RelayError) -> Self {
        match err {
            RelayError::RemoteApi { code, message, .. } => Self::new(
                message.unwrap_or_else(|| GENERIC_REMOTE_MESSAGE.to_string()),
                ErrorCode::Remote(code),
            ),
            RelayError::Transport(_) => Self::new(
                err.to_string(),
                ErrorCode::Status(TRANSPORT_FAILURE_STATUS),
            ),
            other => Self::local(other),
        }
    }

    fn local(err: RelayError) -> Self {
        match err {
            RelayError::Parse(msg) => Self::new(msg, ErrorCode::Status(500)),
            RelayError::Validation(msg) => Self::new(msg, ErrorCode::Status(400)),
            other => Self::new(other.to_string(), ErrorCode::Status(500)),
        }
    }
}
