//! Job Status Query Handler

use std::sync::Arc;
use std::time::Duration;

use crate::application::error::ApplicationError;
use crate::application::ports::{JobStorePort, StoreError};
use crate::application::queries::{GetJobStatus, JobView};
use crate::domain::job::JobStatus;

/// 读取前的顺带清理最多等待这么久
const SWEEP_BUDGET: Duration = Duration::from_millis(250);

/// GetJobStatus Handler
pub struct GetJobStatusHandler {
    store: Arc<dyn JobStorePort>,
    retention: Duration,
}

impl GetJobStatusHandler {
    pub fn new(store: Arc<dyn JobStorePort>, retention: Duration) -> Self {
        Self { store, retention }
    }

    pub async fn handle(&self, query: GetJobStatus) -> Result<JobView, ApplicationError> {
        if query.job_id.trim().is_empty() {
            return Err(ApplicationError::validation("Missing \"jobId\" query parameter"));
        }

        self.sweep().await;

        let job = self.store.get(&query.job_id).await.map_err(|e| match e {
            StoreError::NotFound(_) => ApplicationError::not_found("Job", query.job_id.clone()),
            other => ApplicationError::from(other),
        })?;

        tracing::debug!(job_id = %job.id(), status = %job.status().as_str(), "Job status read");
        Ok(JobView::from(&job))
    }

    /// 清理失败不影响查询
    async fn sweep(&self) {
        let sweep = self
            .store
            .sweep_older_than(self.retention, &JobStatus::TERMINAL);
        match tokio::time::timeout(SWEEP_BUDGET, sweep).await {
            Ok(Ok(0)) => {}
            Ok(Ok(removed)) => tracing::debug!(removed, "Swept expired jobs"),
            Ok(Err(e)) => tracing::warn!(error = %e, "Job sweep failed"),
            Err(_) => tracing::warn!("Job sweep timed out"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::job::{Job, JobInput, JobPatch, SpeechInput};
    use crate::infrastructure::memory::InMemoryJobStore;

    fn speech_job() -> Job {
        Job::new(
            JobInput::Speech(SpeechInput {
                text: "Hello".to_string(),
                voice_id: "v1".to_string(),
            }),
            "elevenlabs",
        )
    }

    #[tokio::test]
    async fn test_missing_job_is_not_found() {
        let handler =
            GetJobStatusHandler::new(Arc::new(InMemoryJobStore::new()), Duration::from_secs(3600));
        let err = handler
            .handle(GetJobStatus {
                job_id: "doesnotexist".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ApplicationError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_terminal_status_is_stable() {
        let store = Arc::new(InMemoryJobStore::new());
        let job = speech_job();
        let id = job.id().to_string();
        store.create(job).await.unwrap();
        store.merge(&id, JobPatch::completed("url")).await.unwrap();

        let handler = GetJobStatusHandler::new(store, Duration::from_secs(3600));
        let first = handler.handle(GetJobStatus { job_id: id.clone() }).await.unwrap();
        let second = handler.handle(GetJobStatus { job_id: id }).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.status, JobStatus::Completed);
        assert_eq!(first.audio_url.as_deref(), Some("url"));
    }

    #[tokio::test]
    async fn test_expired_job_is_swept_before_read() {
        let store = Arc::new(InMemoryJobStore::new());
        let job = speech_job();
        let id = job.id().to_string();
        store.create(job).await.unwrap();
        store.merge(&id, JobPatch::failed("boom")).await.unwrap();

        let handler = GetJobStatusHandler::new(store.clone(), Duration::ZERO);
        tokio::time::sleep(Duration::from_millis(5)).await;
        let err = handler.handle(GetJobStatus { job_id: id }).await.unwrap_err();
        assert!(matches!(err, ApplicationError::NotFound { .. }));
    }
}
