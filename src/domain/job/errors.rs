//! Job Context - Errors

use thiserror::Error;

use super::{JobId, JobStatus};

#[derive(Debug, Error)]
pub enum JobError {
    #[error("任务 {id} 已处于终态 {status:?}，不能再变更")]
    AlreadyTerminal { id: JobId, status: JobStatus },

    #[error("任务 {0} 的结果为空")]
    EmptyResult(JobId),

    #[error("未知的任务状态: {0}")]
    UnknownStatus(String),
}
