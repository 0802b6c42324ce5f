//! Job Command Handlers
//!
//! - JobRunner: 执行单个任务并写入终态（worker 与同步路径共用）
//! - JobOrchestrator: 创建任务、后台入队或同步执行、供应商回退链
//! - SubmitSpeechJobHandler: /generate-audio-async 的用例

use std::sync::Arc;
use tokio::sync::mpsc;

use crate::application::commands::job_commands::*;
use crate::application::error::ApplicationError;
use crate::application::poller::Poller;
use crate::application::ports::{JobStorePort, UpstreamAdapterPort, UpstreamError};
use crate::application::registry::ProviderRegistry;
use crate::domain::job::{Job, JobId, JobInput, JobPatch, JobStatus, SpeechInput};

/// 单个任务的执行器
pub struct JobRunner {
    store: Option<Arc<dyn JobStorePort>>,
    registry: Arc<ProviderRegistry>,
    poller: Poller,
}

impl JobRunner {
    pub fn new(
        store: Option<Arc<dyn JobStorePort>>,
        registry: Arc<ProviderRegistry>,
        poller: Poller,
    ) -> Self {
        Self {
            store,
            registry,
            poller,
        }
    }

    pub fn store(&self) -> Option<&Arc<dyn JobStorePort>> {
        self.store.as_ref()
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    pub fn adapter(&self, provider: &str) -> Result<Arc<dyn UpstreamAdapterPort>, ApplicationError> {
        self.registry
            .get(provider)
            .ok_or_else(|| ApplicationError::validation(format!("Unsupported provider: {}", provider)))
    }

    /// 直接调用上游（submit + 轮询），不写任务记录
    pub async fn call(
        &self,
        adapter: &dyn UpstreamAdapterPort,
        input: &JobInput,
    ) -> Result<String, UpstreamError> {
        self.poller.run(adapter, input).await
    }

    /// 执行一个已创建的 processing 任务，并写入终态
    ///
    /// 所有错误都被转换为 failed 记录，不会向上传播
    pub async fn execute(&self, job_id: &str) -> Option<Job> {
        let Some(store) = self.store.as_ref() else {
            tracing::error!(job_id = %job_id, "Cannot execute job without a job store");
            return None;
        };

        let job = match store.get(job_id).await {
            Ok(job) => job,
            Err(e) => {
                tracing::warn!(job_id = %job_id, error = %e, "Job not found, skipping");
                return None;
            }
        };

        if job.is_terminal() {
            tracing::debug!(job_id = %job_id, status = ?job.status(), "Job already terminal, skipping");
            return Some(job);
        }

        let outcome = match self.registry.get(job.provider()) {
            Some(adapter) => self.call(adapter.as_ref(), job.input()).await,
            None => Err(UpstreamError::NotConfigured(format!(
                "provider {} is not registered",
                job.provider()
            ))),
        };

        let patch = match &outcome {
            Ok(output) => JobPatch::completed(output.clone()),
            Err(e) => JobPatch::failed(e.to_string()),
        };
        self.record(job.id(), patch).await
    }

    /// 把任务标记为失败（worker 崩溃、入队失败等场景）
    pub async fn fail(&self, job_id: &JobId, reason: impl Into<String>) -> Option<Job> {
        self.record(job_id, JobPatch::failed(reason)).await
    }

    /// 写入任务更新；存储失败只记录日志，不覆盖上游结果
    pub async fn record(&self, job_id: &JobId, patch: JobPatch) -> Option<Job> {
        let store = self.store.as_ref()?;
        match store.merge(job_id.as_str(), patch).await {
            Ok(job) => {
                tracing::info!(
                    job_id = %job_id,
                    provider = %job.provider(),
                    status = %job.status().as_str(),
                    "Job updated"
                );
                Some(job)
            }
            Err(e) => {
                tracing::error!(job_id = %job_id, error = %e, "Failed to update job record");
                None
            }
        }
    }
}

/// 任务编排器
pub struct JobOrchestrator {
    runner: Arc<JobRunner>,
    queue: Option<mpsc::Sender<String>>,
}

impl JobOrchestrator {
    /// `queue` 为 None 时 start_job 退化为同步执行
    pub fn new(runner: Arc<JobRunner>, queue: Option<mpsc::Sender<String>>) -> Self {
        Self { runner, queue }
    }

    pub fn runner(&self) -> &Arc<JobRunner> {
        &self.runner
    }

    /// 创建任务并交给后台 worker，立即返回 jobId
    pub async fn start_job(&self, cmd: StartJobCommand) -> Result<JobDispatch, ApplicationError> {
        self.runner.adapter(&cmd.provider)?;

        let (Some(store), Some(queue)) = (self.runner.store(), self.queue.as_ref()) else {
            if self.runner.store().is_some() {
                tracing::debug!(provider = %cmd.provider, "No background worker, running job inline");
            }
            return self
                .run_job_synchronously(cmd)
                .await
                .map(JobDispatch::Finished);
        };

        let job = Job::new(cmd.input, cmd.provider.clone());
        let job_id = job.id().clone();
        store.create(job).await?;

        if let Err(e) = queue.try_send(job_id.to_string()) {
            tracing::error!(job_id = %job_id, error = %e, "Failed to enqueue job");
            self.runner.fail(&job_id, format!("Failed to enqueue job: {}", e)).await;
            return Err(ApplicationError::internal("Failed to enqueue job"));
        }

        tracing::info!(job_id = %job_id, provider = %cmd.provider, "Job queued");
        Ok(JobDispatch::Queued(QueuedJob {
            job_id,
            status: JobStatus::Processing,
        }))
    }

    /// 阻塞执行到终态并返回结果
    pub async fn run_job_synchronously(
        &self,
        cmd: StartJobCommand,
    ) -> Result<JobResult, ApplicationError> {
        self.run_with_fallback(cmd.into()).await
    }

    /// 按顺序尝试供应商链；只有 AccessRestricted 会切换到下一个供应商
    pub async fn run_with_fallback(
        &self,
        cmd: FallbackJobCommand,
    ) -> Result<JobResult, ApplicationError> {
        let Some(primary) = cmd.providers.first() else {
            return Err(ApplicationError::validation("No provider given"));
        };
        let adapters = cmd
            .providers
            .iter()
            .map(|p| self.runner.adapter(p))
            .collect::<Result<Vec<_>, _>>()?;

        let job_id = match self.runner.store() {
            Some(store) => {
                let job = Job::new(cmd.input.clone(), primary.clone());
                let id = job.id().clone();
                store.create(job).await?;
                tracing::info!(job_id = %id, provider = %primary, "Job created");
                Some(id)
            }
            None => {
                tracing::warn!(
                    provider = %primary,
                    "Job store not configured, running in degraded passthrough mode"
                );
                None
            }
        };

        let last = adapters.len() - 1;
        for (i, adapter) in adapters.iter().enumerate() {
            let provider = adapter.name();
            if i > 0 {
                if let Some(id) = &job_id {
                    self.runner.record(id, JobPatch::reassigned(provider)).await;
                }
            }

            match self.runner.call(adapter.as_ref(), &cmd.input).await {
                Ok(output) => {
                    if let Some(id) = &job_id {
                        self.runner.record(id, JobPatch::completed(output.clone())).await;
                    }
                    return Ok(JobResult {
                        job_id,
                        provider: provider.to_string(),
                        output,
                    });
                }
                Err(e) if e.is_access_restricted() && i < last => {
                    tracing::warn!(
                        provider = %provider,
                        next = %adapters[i + 1].name(),
                        error = %e,
                        "Provider access restricted, falling back"
                    );
                }
                Err(e) => {
                    tracing::error!(provider = %provider, error = %e, "Upstream call failed");
                    if let Some(id) = &job_id {
                        self.runner.record(id, JobPatch::failed(e.to_string())).await;
                    }
                    return Err(ApplicationError::upstream_for_job(job_id, e));
                }
            }
        }

        Err(ApplicationError::internal("provider chain exhausted"))
    }
}

pub const DEFAULT_TTS_PROVIDER: &str = "elevenlabs";
pub const GOOGLE_TTS_PROVIDER: &str = "google";

/// 语音供应商默认音色
#[derive(Debug, Clone)]
pub struct VoiceDefaults {
    pub elevenlabs: String,
    pub google: String,
}

impl Default for VoiceDefaults {
    fn default() -> Self {
        Self {
            elevenlabs: "21m00Tcm4TlvDq8ikWAM".to_string(),
            google: "en-US-Wavenet-D".to_string(),
        }
    }
}

/// SubmitSpeechJob Handler - 异步 TTS
pub struct SubmitSpeechJobHandler {
    orchestrator: Arc<JobOrchestrator>,
    mode: JobMode,
    voices: VoiceDefaults,
}

impl SubmitSpeechJobHandler {
    pub fn new(orchestrator: Arc<JobOrchestrator>, mode: JobMode, voices: VoiceDefaults) -> Self {
        Self {
            orchestrator,
            mode,
            voices,
        }
    }

    pub async fn handle(&self, cmd: SubmitSpeechJobCommand) -> Result<JobDispatch, ApplicationError> {
        if cmd.text.trim().is_empty() {
            return Err(ApplicationError::validation("Missing \"text\" in request body"));
        }

        let provider = cmd
            .tts_provider
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| DEFAULT_TTS_PROVIDER.to_string());
        if !matches!(provider.as_str(), DEFAULT_TTS_PROVIDER | GOOGLE_TTS_PROVIDER)
            || !self.orchestrator.runner().registry().contains(&provider)
        {
            return Err(ApplicationError::validation(format!(
                "Unsupported TTS provider: {}",
                provider
            )));
        }

        let voice_id = cmd.voice_id.filter(|v| !v.is_empty()).unwrap_or_else(|| {
            if provider == GOOGLE_TTS_PROVIDER {
                self.voices.google.clone()
            } else {
                self.voices.elevenlabs.clone()
            }
        });

        tracing::info!(provider = %provider, voice_id = %voice_id, mode = ?self.mode, "Submitting speech job");

        let start = StartJobCommand {
            input: JobInput::Speech(SpeechInput {
                text: cmd.text,
                voice_id,
            }),
            provider,
        };

        match self.mode {
            JobMode::Background => self.orchestrator.start_job(start).await,
            JobMode::Synchronous => self
                .orchestrator
                .run_job_synchronously(start)
                .await
                .map(JobDispatch::Finished),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::poller::PollPolicy;
    use crate::infrastructure::adapters::{FakeBehavior, FakeUpstreamAdapter};
    use crate::infrastructure::memory::InMemoryJobStore;
    use crate::domain::job::ImageInput;
    use std::time::Duration;

    fn fast_poller() -> Poller {
        Poller::new(PollPolicy {
            interval: Duration::from_millis(1),
            max_attempts: 3,
        })
    }

    fn registry(adapters: Vec<FakeUpstreamAdapter>) -> Arc<ProviderRegistry> {
        let mut registry = ProviderRegistry::new();
        for adapter in adapters {
            registry.register(Arc::new(adapter));
        }
        Arc::new(registry)
    }

    fn speech(text: &str) -> JobInput {
        JobInput::Speech(SpeechInput {
            text: text.to_string(),
            voice_id: "v1".to_string(),
        })
    }

    fn orchestrator(
        store: Option<Arc<dyn JobStorePort>>,
        adapters: Vec<FakeUpstreamAdapter>,
    ) -> JobOrchestrator {
        let runner = Arc::new(JobRunner::new(store, registry(adapters), fast_poller()));
        JobOrchestrator::new(runner, None)
    }

    #[tokio::test]
    async fn test_synchronous_run_records_completed_job() {
        let store: Arc<dyn JobStorePort> = Arc::new(InMemoryJobStore::new());
        let orch = orchestrator(
            Some(store.clone()),
            vec![FakeUpstreamAdapter::new(
                "elevenlabs",
                FakeBehavior::Immediate("data:audio/mpeg;base64,AA".to_string()),
            )],
        );

        let result = orch
            .run_job_synchronously(StartJobCommand {
                input: speech("Hello"),
                provider: "elevenlabs".to_string(),
            })
            .await
            .unwrap();

        let job_id = result.job_id.unwrap();
        let job = store.get(job_id.as_str()).await.unwrap();
        assert_eq!(job.status(), JobStatus::Completed);
        assert_eq!(job.result(), Some("data:audio/mpeg;base64,AA"));
        assert!(job.completed_at().unwrap() >= job.created_at());
    }

    #[tokio::test]
    async fn test_failure_becomes_failed_job() {
        let store: Arc<dyn JobStorePort> = Arc::new(InMemoryJobStore::new());
        let orch = orchestrator(
            Some(store.clone()),
            vec![FakeUpstreamAdapter::new(
                "elevenlabs",
                FakeBehavior::Reject(UpstreamError::from_status("elevenlabs", 500, "boom")),
            )],
        );

        let err = orch
            .run_job_synchronously(StartJobCommand {
                input: speech("Hello"),
                provider: "elevenlabs".to_string(),
            })
            .await
            .unwrap_err();

        let ApplicationError::UpstreamError { job_id, .. } = err else {
            panic!("expected upstream error");
        };
        let job = store.get(job_id.unwrap().as_str()).await.unwrap();
        assert_eq!(job.status(), JobStatus::Failed);
        assert!(job.result().is_none());
        assert!(job.error().unwrap().contains("boom"));
    }

    #[tokio::test]
    async fn test_degraded_mode_still_returns_result() {
        let orch = orchestrator(
            None,
            vec![FakeUpstreamAdapter::new(
                "elevenlabs",
                FakeBehavior::Immediate("data:audio/mpeg;base64,AA".to_string()),
            )],
        );

        let dispatch = orch
            .start_job(StartJobCommand {
                input: speech("Hello"),
                provider: "elevenlabs".to_string(),
            })
            .await
            .unwrap();

        match dispatch {
            JobDispatch::Finished(result) => {
                assert!(result.job_id.is_none());
                assert_eq!(result.output, "data:audio/mpeg;base64,AA");
            }
            other => panic!("unexpected dispatch: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unknown_provider_is_validation_error() {
        let orch = orchestrator(None, vec![]);
        let err = orch
            .start_job(StartJobCommand {
                input: speech("Hello"),
                provider: "nope".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ApplicationError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_background_job_is_queued_as_processing() {
        let store: Arc<dyn JobStorePort> = Arc::new(InMemoryJobStore::new());
        let runner = Arc::new(JobRunner::new(
            Some(store.clone()),
            registry(vec![FakeUpstreamAdapter::new(
                "elevenlabs",
                FakeBehavior::Immediate("url".to_string()),
            )]),
            fast_poller(),
        ));
        let (tx, mut rx) = mpsc::channel(4);
        let orch = JobOrchestrator::new(runner.clone(), Some(tx));

        let dispatch = orch
            .start_job(StartJobCommand {
                input: speech("Hello"),
                provider: "elevenlabs".to_string(),
            })
            .await
            .unwrap();
        let JobDispatch::Queued(queued) = dispatch else {
            panic!("expected queued job");
        };
        assert_eq!(queued.status, JobStatus::Processing);

        let job = store.get(queued.job_id.as_str()).await.unwrap();
        assert_eq!(job.status(), JobStatus::Processing);
        assert!(job.result().is_none() && job.error().is_none());

        let queued_id = rx.recv().await.unwrap();
        assert_eq!(queued_id, queued.job_id.as_str());

        let done = runner.execute(&queued_id).await.unwrap();
        assert_eq!(done.status(), JobStatus::Completed);
        assert_eq!(done.result(), Some("url"));
    }

    #[tokio::test]
    async fn test_full_queue_fails_job_instead_of_leaving_it_processing() {
        let store: Arc<dyn JobStorePort> = Arc::new(InMemoryJobStore::new());
        let runner = Arc::new(JobRunner::new(
            Some(store.clone()),
            registry(vec![FakeUpstreamAdapter::new(
                "elevenlabs",
                FakeBehavior::Immediate("url".to_string()),
            )]),
            fast_poller(),
        ));
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let orch = JobOrchestrator::new(runner, Some(tx));

        let err = orch
            .start_job(StartJobCommand {
                input: speech("Hello"),
                provider: "elevenlabs".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ApplicationError::InternalError(_)));
    }

    #[tokio::test]
    async fn test_fallback_on_access_restriction() {
        let store: Arc<dyn JobStorePort> = Arc::new(InMemoryJobStore::new());
        let orch = orchestrator(
            Some(store.clone()),
            vec![
                FakeUpstreamAdapter::new(
                    "elevenlabs-music",
                    FakeBehavior::Reject(UpstreamError::from_status(
                        "elevenlabs-music",
                        403,
                        "music is not available on your plan",
                    )),
                ),
                FakeUpstreamAdapter::new(
                    "replicate-music",
                    FakeBehavior::SucceedAfter {
                        pending_polls: 1,
                        output: "https://replicate.delivery/song.mp3".to_string(),
                    },
                ),
            ],
        );

        let result = orch
            .run_with_fallback(FallbackJobCommand {
                input: JobInput::Image(ImageInput::from_prompt("unused")),
                providers: vec!["elevenlabs-music".to_string(), "replicate-music".to_string()],
            })
            .await
            .unwrap();

        assert_eq!(result.provider, "replicate-music");
        let job = store.get(result.job_id.unwrap().as_str()).await.unwrap();
        assert_eq!(job.provider(), "replicate-music");
        assert_eq!(job.status(), JobStatus::Completed);
    }

    #[tokio::test]
    async fn test_fallback_not_used_for_other_errors() {
        let orch = orchestrator(
            None,
            vec![
                FakeUpstreamAdapter::new(
                    "elevenlabs-music",
                    FakeBehavior::Reject(UpstreamError::from_status("elevenlabs-music", 500, "down")),
                ),
                FakeUpstreamAdapter::new("replicate-music", FakeBehavior::Immediate("url".to_string())),
            ],
        );

        let err = orch
            .run_with_fallback(FallbackJobCommand {
                input: JobInput::Image(ImageInput::from_prompt("unused")),
                providers: vec!["elevenlabs-music".to_string(), "replicate-music".to_string()],
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ApplicationError::UpstreamError {
                error: UpstreamError::ServerError { .. },
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_speech_handler_defaults_and_validation() {
        let store: Arc<dyn JobStorePort> = Arc::new(InMemoryJobStore::new());
        let orch = Arc::new(orchestrator(
            Some(store.clone()),
            vec![
                FakeUpstreamAdapter::new("elevenlabs", FakeBehavior::Immediate("a".to_string())),
                FakeUpstreamAdapter::new("google", FakeBehavior::Immediate("g".to_string())),
            ],
        ));
        let handler = SubmitSpeechJobHandler::new(orch, JobMode::Synchronous, VoiceDefaults::default());

        let err = handler
            .handle(SubmitSpeechJobCommand {
                text: String::new(),
                voice_id: None,
                tts_provider: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ApplicationError::ValidationError(_)));

        let err = handler
            .handle(SubmitSpeechJobCommand {
                text: "Hi".to_string(),
                voice_id: None,
                tts_provider: Some("polly".to_string()),
            })
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Unsupported TTS provider: polly"));

        let dispatch = handler
            .handle(SubmitSpeechJobCommand {
                text: "Hi".to_string(),
                voice_id: None,
                tts_provider: Some("google".to_string()),
            })
            .await
            .unwrap();
        let JobDispatch::Finished(result) = dispatch else {
            panic!("expected finished job");
        };
        assert_eq!(result.provider, "google");
        let job = store.get(result.job_id.unwrap().as_str()).await.unwrap();
        match job.input() {
            JobInput::Speech(input) => assert_eq!(input.voice_id, "en-US-Wavenet-D"),
            other => panic!("unexpected input: {:?}", other),
        }
    }
}
