//! The `{success, message, data, code}` envelope every endpoint answers with.
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::Value;

use crate::error::{ErrorCode, ErrorResult};

#[derive(Debug, Serialize)]
pub struct ApiResponse {
    pub success: bool,
    pub message: String,
    pub data: Value,
    pub code: ErrorCode,
    #[serde(skip)]
    pub status: StatusCode,
}

impl ApiResponse {
    pub fn ok<T: Serialize>(data: T) -> Self {
        match serde_json::to_value(data) {
            Ok(data) => Self {
                success: true,
                message: String::new(),
                data,
                code: ErrorCode::Status(0),
                status: StatusCode::OK,
            },
            Err(err) => {
                tracing::error!(%err, "failed to serialize response data");
                Self::from_error(ErrorResult::new(
                    "failed to serialize response",
                    ErrorCode::Status(500),
                ))
            }
        }
    }

    /// Failure envelope. The HTTP status follows the error code.
    pub fn from_error(err: ErrorResult) -> Self {
        let status = status_for(&err.code);
        Self {
            success: false,
            message: err.message,
            data: err.data.unwrap_or(Value::Null),
            code: err.code,
            status,
        }
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }
}

impl IntoResponse for ApiResponse {
    fn into_response(self) -> Response {
        let status = self.status;
        (status, Json(self)).into_response()
    }
}

/// Numeric codes in the 4xx/5xx range are used as-is; Notion's string codes
/// are mapped onto their documented statuses.
pub fn status_for(code: &ErrorCode) -> StatusCode {
    match code {
        ErrorCode::Status(s) if (400..=599).contains(s) => {
            StatusCode::from_u16(*s).unwrap_or(StatusCode::BAD_GATEWAY)
        }
        ErrorCode::Status(_) => StatusCode::BAD_GATEWAY,
        ErrorCode::Remote(code) => match code.as_str() {
            "unauthorized" => StatusCode::UNAUTHORIZED,
            "restricted_resource" => StatusCode::FORBIDDEN,
            "object_not_found" => StatusCode::NOT_FOUND,
            "conflict_error" => StatusCode::CONFLICT,
            "rate_limited" => StatusCode::TOO_MANY_REQUESTS,
            "internal_server_error" => StatusCode::BAD_GATEWAY,
            "service_unavailable" | "database_connection_unavailable" => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            "gateway_timeout" => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::BAD_REQUEST,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(status_for(&ErrorCode::Status(404)), StatusCode::NOT_FOUND);
        assert_eq!(status_for(&ErrorCode::Status(502)), StatusCode::BAD_GATEWAY);
        assert_eq!(status_for(&ErrorCode::Status(200)), StatusCode::BAD_GATEWAY);
        assert_eq!(
            status_for(&ErrorCode::Remote("object_not_found".into())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_for(&ErrorCode::Remote("validation_error".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&ErrorCode::Remote("rate_limited".into())),
            StatusCode::TOO_MANY_REQUESTS
        );
    }

    #[test]
    fn ok_envelope_shape() {
        let resp = ApiResponse::ok(vec![1, 2]);
        let value = serde_json::to_value(&resp).unwrap();
        assert_eq!(value["success"], true);
        assert_eq!(value["code"], 0);
        assert_eq!(value["message"], "");
        assert_eq!(value["data"], serde_json::json!([1, 2]));
        assert!(value.get("status").is_none());
    }
}
