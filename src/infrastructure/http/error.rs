//! HTTP Error Handling
//!
//! 所有错误响应统一为 `{error, type}`，被跟踪的失败任务额外带上 `jobId` 与 `status`

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::application::ports::{ErrorKind, UpstreamError};
use crate::application::ApplicationError;
use crate::domain::job::JobStatus;

/// 统一错误响应格式
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    #[serde(rename = "jobId", skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<&'static str>,
}

/// 错误类型（`type` 字段）
pub mod kind {
    pub const VALIDATION: &str = "validation";
    pub const NOT_FOUND: &str = "not_found";
    pub const SERVER_ERROR: &str = "server_error";
}

/// API 错误
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    MethodNotAllowed,
    Upstream {
        job_id: Option<String>,
        error: UpstreamError,
    },
    Internal(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::Upstream { error, .. } => upstream_status(error.kind()),
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(&self) -> ErrorResponse {
        let (error, kind, job_id) = match self {
            ApiError::BadRequest(msg) => (msg.clone(), kind::VALIDATION, None),
            ApiError::NotFound(msg) => (msg.clone(), kind::NOT_FOUND, None),
            ApiError::MethodNotAllowed => {
                ("Method not allowed".to_string(), kind::VALIDATION, None)
            }
            ApiError::Upstream { job_id, error } => {
                (error.to_string(), error.kind().as_str(), job_id.clone())
            }
            ApiError::Internal(msg) => (msg.clone(), kind::SERVER_ERROR, None),
        };
        let status = job_id.as_ref().map(|_| JobStatus::Failed.as_str());
        ErrorResponse {
            error,
            kind,
            job_id,
            status,
        }
    }
}

fn upstream_status(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::RateLimit => StatusCode::TOO_MANY_REQUESTS,
        ErrorKind::Upstream5xx | ErrorKind::UpstreamEmpty => StatusCode::BAD_GATEWAY,
        ErrorKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::ServerError | ErrorKind::Unknown => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = self.body();

        if status.is_server_error() {
            tracing::error!(
                status = status.as_u16(),
                kind = body.kind,
                job_id = body.job_id.as_deref().unwrap_or(""),
                error = %body.error,
                "Request failed"
            );
        } else {
            tracing::warn!(
                status = status.as_u16(),
                kind = body.kind,
                error = %body.error,
                "Request rejected"
            );
        }

        (status, Json(body)).into_response()
    }
}

impl From<ApplicationError> for ApiError {
    fn from(e: ApplicationError) -> Self {
        match e {
            ApplicationError::ValidationError(msg) => ApiError::BadRequest(msg),
            ApplicationError::NotFound { resource_type, .. } => {
                ApiError::NotFound(format!("{} not found", resource_type))
            }
            ApplicationError::UpstreamError { job_id, error } => ApiError::Upstream {
                job_id: job_id.map(|id| id.to_string()),
                error,
            },
            ApplicationError::StoreError(msg) => ApiError::Internal(msg),
            ApplicationError::InternalError(msg) => ApiError::Internal(msg),
        }
    }
}
