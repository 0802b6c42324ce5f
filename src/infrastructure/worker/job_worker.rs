//! Job Worker - Background Upstream Job Processor

use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};

use crate::application::commands::handlers::JobRunner;
use crate::domain::job::JobId;

/// Worker 配置
#[derive(Debug, Clone)]
pub struct JobWorkerConfig {
    /// 最大并发任务数
    pub max_concurrent: usize,
}

impl Default for JobWorkerConfig {
    fn default() -> Self {
        Self { max_concurrent: 4 }
    }
}

/// 任务 Worker
///
/// 从队列消费 job_id，在持有信号量许可的独立 task 中执行
pub struct JobWorker {
    config: JobWorkerConfig,
    queue_receiver: mpsc::Receiver<String>,
    runner: Arc<JobRunner>,
}

impl JobWorker {
    pub fn new(
        config: JobWorkerConfig,
        queue_receiver: mpsc::Receiver<String>,
        runner: Arc<JobRunner>,
    ) -> Self {
        Self {
            config,
            queue_receiver,
            runner,
        }
    }

    /// 启动 Worker，队列发送端全部关闭后退出
    pub async fn run(mut self) {
        tracing::info!(max_concurrent = self.config.max_concurrent, "JobWorker started");

        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent.max(1)));

        while let Some(job_id) = self.queue_receiver.recv().await {
            let permit = match semaphore.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(e) => {
                    tracing::error!(job_id = %job_id, error = %e, "Failed to acquire semaphore permit");
                    self.runner
                        .fail(&JobId::from_string(job_id), "Worker unavailable")
                        .await;
                    continue;
                }
            };

            let runner = self.runner.clone();
            tokio::spawn(async move {
                let _permit = permit;
                Self::process_job(runner, job_id).await;
            });
        }

        tracing::info!("JobWorker stopped");
    }

    /// 执行单个任务；执行体 panic 时把任务标记为失败，避免永远停留在 processing
    async fn process_job(runner: Arc<JobRunner>, job_id: String) {
        tracing::debug!(job_id = %job_id, "Processing job");

        let exec_runner = runner.clone();
        let exec_id = job_id.clone();
        let outcome = tokio::spawn(async move { exec_runner.execute(&exec_id).await }).await;

        match outcome {
            Ok(Some(job)) => {
                tracing::debug!(job_id = %job_id, status = %job.status().as_str(), "Job processed");
            }
            Ok(None) => {}
            Err(e) => {
                tracing::error!(job_id = %job_id, error = %e, "Job execution panicked");
                runner
                    .fail(&JobId::from_string(job_id), "Internal error while running job")
                    .await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::poller::{PollPolicy, Poller};
    use crate::application::ports::JobStorePort;
    use crate::application::registry::ProviderRegistry;
    use crate::domain::job::{Job, JobInput, JobStatus, SpeechInput};
    use crate::infrastructure::adapters::{FakeBehavior, FakeUpstreamAdapter};
    use crate::infrastructure::memory::InMemoryJobStore;
    use std::time::Duration;

    async fn wait_terminal(store: &Arc<dyn JobStorePort>, id: &str) -> Job {
        for _ in 0..200 {
            let job = store.get(id).await.unwrap();
            if job.is_terminal() {
                return job;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("job {} never reached a terminal state", id);
    }

    #[tokio::test]
    async fn test_worker_runs_queued_jobs() {
        let store: Arc<dyn JobStorePort> = Arc::new(InMemoryJobStore::new());
        let registry = ProviderRegistry::new().with(Arc::new(FakeUpstreamAdapter::new(
            "elevenlabs",
            FakeBehavior::SucceedAfter {
                pending_polls: 1,
                output: "data:audio/mpeg;base64,AA".to_string(),
            },
        )));
        let runner = Arc::new(JobRunner::new(
            Some(store.clone()),
            Arc::new(registry),
            Poller::new(PollPolicy {
                interval: Duration::from_millis(1),
                max_attempts: 5,
            }),
        ));

        let (tx, rx) = mpsc::channel(8);
        let worker = JobWorker::new(JobWorkerConfig { max_concurrent: 2 }, rx, runner);
        let handle = tokio::spawn(worker.run());

        let mut ids = Vec::new();
        for text in ["one", "two", "three"] {
            let job = Job::new(
                JobInput::Speech(SpeechInput {
                    text: text.to_string(),
                    voice_id: "v1".to_string(),
                }),
                "elevenlabs",
            );
            ids.push(job.id().to_string());
            store.create(job).await.unwrap();
            tx.send(ids.last().cloned().unwrap()).await.unwrap();
        }

        for id in &ids {
            let job = wait_terminal(&store, id).await;
            assert_eq!(job.status(), JobStatus::Completed);
        }

        drop(tx);
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_unknown_provider_fails_job() {
        let store: Arc<dyn JobStorePort> = Arc::new(InMemoryJobStore::new());
        let runner = Arc::new(JobRunner::new(
            Some(store.clone()),
            Arc::new(ProviderRegistry::new()),
            Poller::default(),
        ));

        let job = Job::new(
            JobInput::Speech(SpeechInput {
                text: "hi".to_string(),
                voice_id: "v1".to_string(),
            }),
            "missing",
        );
        let id = job.id().to_string();
        store.create(job).await.unwrap();

        JobWorker::process_job(runner, id.clone()).await;
        let job = store.get(&id).await.unwrap();
        assert_eq!(job.status(), JobStatus::Failed);
        assert!(job.error().unwrap().contains("missing"));
    }
}
