//! HTTP error rendering and gateway startup errors.
//!
//! Every non-2xx response body is `{"code": <stable id>, "message": <generic text>}`.
//! Internal error text is logged, never rendered.

use crate::domain::config::ConfigError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use thiserror::Error;

/// Stable error codes.
pub mod codes {
    pub const MALFORMED_REQUEST: &str = "malformed_request";
    pub const UNSUPPORTED_MEDIA_TYPE: &str = "unsupported_media_type";
    pub const ACCESS_DENIED: &str = "access_denied";
    pub const MISSING_OBJECT_NAME: &str = "missing_object_name";
    pub const NOT_READY: &str = "not_ready";
    pub const OBJECT_BROKEN: &str = "object_broken";
    pub const INVALID_CAPABILITY: &str = "invalid_capability";
    pub const PAYLOAD_TOO_LARGE: &str = "payload_too_large";
    pub const NO_SUCH_OBJECT: &str = "no_such_object";
    pub const TIMEOUT: &str = "timeout";
    pub const INTERNAL_ERROR: &str = "internal_error";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: &'static str,
}

impl ApiError {
    pub const fn new(status: StatusCode, code: &'static str, message: &'static str) -> Self {
        Self {
            status,
            code,
            message,
        }
    }

    pub const fn malformed_request() -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            codes::MALFORMED_REQUEST,
            "request body is malformed",
        )
    }

    pub const fn unsupported_media_type() -> Self {
        Self::new(
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            codes::UNSUPPORTED_MEDIA_TYPE,
            "unsupported media type",
        )
    }

    pub const fn access_denied() -> Self {
        Self::new(StatusCode::FORBIDDEN, codes::ACCESS_DENIED, "access denied")
    }

    pub const fn missing_object_name() -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            codes::MISSING_OBJECT_NAME,
            "object-name parameter is required",
        )
    }

    pub const fn not_ready() -> Self {
        Self::new(
            StatusCode::TOO_EARLY,
            codes::NOT_READY,
            "object is still processing",
        )
    }

    pub const fn object_broken() -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            codes::OBJECT_BROKEN,
            "object could not be processed",
        )
    }

    pub const fn invalid_capability() -> Self {
        Self::new(
            StatusCode::FORBIDDEN,
            codes::INVALID_CAPABILITY,
            "capability is missing, invalid or expired",
        )
    }

    pub const fn payload_too_large() -> Self {
        Self::new(
            StatusCode::PAYLOAD_TOO_LARGE,
            codes::PAYLOAD_TOO_LARGE,
            "object exceeds the maximum size",
        )
    }

    pub const fn no_such_object() -> Self {
        Self::new(StatusCode::NOT_FOUND, codes::NO_SUCH_OBJECT, "no such object")
    }

    pub const fn timeout() -> Self {
        Self::new(
            StatusCode::GATEWAY_TIMEOUT,
            codes::TIMEOUT,
            "request timed out",
        )
    }

    pub const fn internal() -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            codes::INTERNAL_ERROR,
            "internal error",
        )
    }

    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            code: self.code.to_string(),
            message: self.message.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body())).into_response()
    }
}

/// Gateway lifecycle errors.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("http server failed: {0}")]
    Serve(#[source] std::io::Error),
}
