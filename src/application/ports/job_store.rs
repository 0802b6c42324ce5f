//! Job Store Port - 任务记录存储
//!
//! 定义任务存储的抽象接口，具体实现在 infrastructure/memory 与 infrastructure/persistence 层

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;
use thiserror::Error;

use crate::domain::job::{Job, JobError, JobPatch, JobStatus};

/// Job Store 错误
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Job not found: {0}")]
    NotFound(String),

    #[error("Job already exists: {0}")]
    DuplicateId(String),

    #[error("Invalid state transition: {0}")]
    InvalidTransition(String),

    #[error("Store backend error: {0}")]
    Backend(String),
}

impl From<JobError> for StoreError {
    fn from(err: JobError) -> Self {
        StoreError::InvalidTransition(err.to_string())
    }
}

/// 清理截止时间：`now - older_than`
pub fn sweep_cutoff(older_than: Duration) -> Result<DateTime<Utc>, StoreError> {
    let window = chrono::Duration::from_std(older_than)
        .map_err(|e| StoreError::Backend(format!("invalid retention window: {}", e)))?;
    Utc::now()
        .checked_sub_signed(window)
        .ok_or_else(|| StoreError::Backend("retention window out of range".to_string()))
}

/// Job Store Port
///
/// `merge` 必须对单条记录原子生效：并发的 `get` / `sweep_older_than` 不会读到写了一半的记录
#[async_trait]
pub trait JobStorePort: Send + Sync {
    /// 插入新记录，ID 已存在时返回 `DuplicateId`
    async fn create(&self, job: Job) -> Result<(), StoreError>;

    /// 读取记录
    async fn get(&self, id: &str) -> Result<Job, StoreError>;

    /// 部分更新已有记录，返回更新后的记录；不存在时返回 `NotFound`（不会复活已删除记录）
    async fn merge(&self, id: &str, patch: JobPatch) -> Result<Job, StoreError>;

    /// 删除记录
    async fn delete(&self, id: &str) -> Result<(), StoreError>;

    /// 删除 completed_at 早于 `now - older_than` 且状态属于 `statuses` 的记录，返回删除数量
    async fn sweep_older_than(
        &self,
        older_than: Duration,
        statuses: &[JobStatus],
    ) -> Result<usize, StoreError>;

    /// 存储后端名称（日志用）
    fn backend_name(&self) -> &'static str;
}
