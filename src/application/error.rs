//! 应用层错误定义
//!
//! 统一的命令/查询错误类型

use thiserror::Error;

use crate::application::ports::{StoreError, UpstreamError};
use crate::domain::job::JobId;

/// 应用层错误
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// 验证错误
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// 资源未找到
    #[error("{resource_type} not found: {id}")]
    NotFound {
        resource_type: &'static str,
        id: String,
    },

    /// 上游供应商错误；被跟踪的任务会带上 job_id
    #[error("Upstream error: {error}")]
    UpstreamError {
        job_id: Option<JobId>,
        error: UpstreamError,
    },

    /// 任务存储错误
    #[error("Store error: {0}")]
    StoreError(String),

    /// 内部错误
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl ApplicationError {
    /// 创建 NotFound 错误
    pub fn not_found(resource_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            resource_type,
            id: id.into(),
        }
    }

    /// 创建验证错误
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError(message.into())
    }

    /// 未跟踪的上游错误
    pub fn upstream(error: UpstreamError) -> Self {
        Self::UpstreamError {
            job_id: None,
            error,
        }
    }

    /// 已跟踪任务的上游错误
    pub fn upstream_for_job(job_id: Option<JobId>, error: UpstreamError) -> Self {
        Self::UpstreamError { job_id, error }
    }

    /// 创建内部错误
    pub fn internal(message: impl Into<String>) -> Self {
        Self::InternalError(message.into())
    }
}

impl From<StoreError> for ApplicationError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => Self::not_found("Job", id),
            other => Self::StoreError(other.to_string()),
        }
    }
}

impl From<UpstreamError> for ApplicationError {
    fn from(err: UpstreamError) -> Self {
        Self::upstream(err)
    }
}
