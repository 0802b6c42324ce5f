//! In-Memory Job Store Implementation

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::application::ports::{sweep_cutoff, JobStorePort, StoreError};
use crate::domain::job::{Job, JobPatch, JobStatus};

/// 内存任务存储
///
/// 进程重启后记录丢失；merge 在分片写锁内完成，对单条记录原子生效
#[derive(Default)]
pub struct InMemoryJobStore {
    /// job_id -> Job
    jobs: DashMap<String, Job>,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

#[async_trait]
impl JobStorePort for InMemoryJobStore {
    async fn create(&self, job: Job) -> Result<(), StoreError> {
        match self.jobs.entry(job.id().to_string()) {
            Entry::Occupied(entry) => Err(StoreError::DuplicateId(entry.key().clone())),
            Entry::Vacant(entry) => {
                tracing::debug!(job_id = %job.id(), provider = %job.provider(), "Job stored");
                entry.insert(job);
                Ok(())
            }
        }
    }

    async fn get(&self, id: &str) -> Result<Job, StoreError> {
        self.jobs
            .get(id)
            .map(|job| job.clone())
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn merge(&self, id: &str, patch: JobPatch) -> Result<Job, StoreError> {
        let mut job = self
            .jobs
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        let old_status = job.status();
        job.apply(patch)?;

        tracing::debug!(
            job_id = %id,
            old_status = ?old_status,
            new_status = ?job.status(),
            "Job merged"
        );
        Ok(job.clone())
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.jobs
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn sweep_older_than(
        &self,
        older_than: Duration,
        statuses: &[JobStatus],
    ) -> Result<usize, StoreError> {
        let cutoff = sweep_cutoff(older_than)?;
        let mut removed = 0usize;
        self.jobs.retain(|_, job| {
            let expired = statuses.contains(&job.status()) && job.expired_before(cutoff);
            if expired {
                removed += 1;
            }
            !expired
        });

        if removed > 0 {
            tracing::debug!(removed, remaining = self.jobs.len(), "Expired jobs removed");
        }
        Ok(removed)
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::job::{ImageInput, JobInput, SpeechInput};

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
    async fn test_create_then_get_is_processing() {
        let store = InMemoryJobStore::new();
        let job = speech_job();
        let id = job.id().to_string();
        store.create(job).await.unwrap();

        let fetched = store.get(&id).await.unwrap();
        assert_eq!(fetched.status(), JobStatus::Processing);
        assert!(fetched.result().is_none());
        assert!(fetched.error().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_id_rejected() {
        let store = InMemoryJobStore::new();
        let job = speech_job();
        store.create(job.clone()).await.unwrap();
        assert!(matches!(
            store.create(job).await,
            Err(StoreError::DuplicateId(_))
        ));
    }

    #[tokio::test]
    async fn test_merge_terminal_is_final() {
        let store = InMemoryJobStore::new();
        let job = speech_job();
        let id = job.id().to_string();
        store.create(job).await.unwrap();

        let done = store.merge(&id, JobPatch::completed("url")).await.unwrap();
        assert_eq!(done.status(), JobStatus::Completed);
        assert!(done.completed_at().unwrap() >= done.created_at());

        let err = store.merge(&id, JobPatch::failed("late")).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidTransition(_)));
        assert_eq!(store.get(&id).await.unwrap().result(), Some("url"));
    }

    #[tokio::test]
    async fn test_merge_does_not_resurrect() {
        let store = InMemoryJobStore::new();
        let job = speech_job();
        let id = job.id().to_string();
        store.create(job).await.unwrap();
        store.delete(&id).await.unwrap();

        assert!(matches!(
            store.merge(&id, JobPatch::completed("url")).await,
            Err(StoreError::NotFound(_))
        ));
        assert!(matches!(store.delete(&id).await, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_sweep_keeps_processing_and_recent() {
        let store = InMemoryJobStore::new();

        let processing = speech_job();
        let processing_id = processing.id().to_string();
        store.create(processing).await.unwrap();

        let old = Job::new(JobInput::Image(ImageInput::from_prompt("castle")), "replicate-image");
        let old_id = old.id().to_string();
        store.create(old).await.unwrap();
        store.merge(&old_id, JobPatch::failed("boom")).await.unwrap();

        tokio::time::sleep(Duration::from_millis(20)).await;

        let recent = speech_job();
        let recent_id = recent.id().to_string();
        store.create(recent).await.unwrap();
        store.merge(&recent_id, JobPatch::completed("url")).await.unwrap();

        let removed = store
            .sweep_older_than(Duration::from_millis(10), &JobStatus::TERMINAL)
            .await
            .unwrap();
        assert_eq!(removed, 1);
        assert!(store.get(&processing_id).await.is_ok());
        assert!(store.get(&recent_id).await.is_ok());
        assert!(matches!(store.get(&old_id).await, Err(StoreError::NotFound(_))));

        let removed = store
            .sweep_older_than(Duration::ZERO, &[JobStatus::Failed])
            .await
            .unwrap();
        assert_eq!(removed, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_sweep_count_ignores_concurrent_creates() {
        let store = InMemoryJobStore::new().arc();
        for _ in 0..20 {
            let job = speech_job();
            let id = job.id().to_string();
            store.create(job).await.unwrap();
            store.merge(&id, JobPatch::completed("url")).await.unwrap();
        }
        tokio::time::sleep(Duration::from_millis(20)).await;

        let writer = {
            let store = store.clone();
            tokio::spawn(async move {
                for _ in 0..500 {
                    store.create(speech_job()).await.unwrap();
                }
            })
        };
        let removed = store
            .sweep_older_than(Duration::from_millis(10), &JobStatus::TERMINAL)
            .await
            .unwrap();
        writer.await.unwrap();

        assert_eq!(removed, 20);
        assert_eq!(store.len(), 500);
    }
}
