//! Errors surfaced to bridge clients

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Invalid JSON")]
    InvalidJson,

    #[error("No messages provided")]
    NoMessages,

    #[error("LM Studio not found. Ensure the server is running.")]
    EndpointNotFound,

    #[error("Connection failed: {0}")]
    Upstream(#[from] reqwest::Error),

    #[error("Connection failed: upstream returned {0}")]
    UpstreamStatus(reqwest::StatusCode),
}

#[derive(Serialize, Debug)]
pub struct ErrorBody {
    pub error: String,
}

impl BridgeError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            BridgeError::InvalidJson | BridgeError::NoMessages => StatusCode::BAD_REQUEST,
            BridgeError::EndpointNotFound => StatusCode::SERVICE_UNAVAILABLE,
            BridgeError::Upstream(_) | BridgeError::UpstreamStatus(_) => StatusCode::BAD_GATEWAY,
        }
    }

    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            error: self.to_string(),
        }
    }

    /// Terminal server-sent-event frame carrying this error.
    pub fn as_event_frame(&self) -> String {
        let payload = serde_json::to_string(&self.body())
            .unwrap_or_else(|_| r#"{"error":"Connection failed"}"#.to_owned());
        format!("data: {payload}\n\n")
    }
}

impl IntoResponse for BridgeError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self.body())).into_response()
    }
}
