//! Job Context - Aggregate Root

use chrono::{DateTime, Utc};

use super::{JobError, JobId, JobInput, JobStatus};

/// 终态结果
#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
    Completed(String),
    Failed(String),
}

/// 部分更新（merge 语义）
///
/// 只携带需要变更的字段；`outcome` 一次性写入 status/result/error/completed_at
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobPatch {
    pub provider: Option<String>,
    pub outcome: Option<JobOutcome>,
}

impl JobPatch {
    pub fn completed(result: impl Into<String>) -> Self {
        Self {
            provider: None,
            outcome: Some(JobOutcome::Completed(result.into())),
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            provider: None,
            outcome: Some(JobOutcome::Failed(error.into())),
        }
    }

    pub fn reassigned(provider: impl Into<String>) -> Self {
        Self {
            provider: Some(provider.into()),
            outcome: None,
        }
    }

    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }
}

/// Job 聚合根
///
/// 不变量:
/// - `processing` 时 result 与 error 均为空
/// - 终态时 result / error 恰好有一个非空，completed_at 已设置且不早于 created_at
/// - 终态之后不允许任何变更
#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    id: JobId,
    status: JobStatus,
    input: JobInput,
    provider: String,
    result: Option<String>,
    error: Option<String>,
    created_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl Job {
    /// 创建新任务（processing）
    pub fn new(input: JobInput, provider: impl Into<String>) -> Self {
        let id = JobId::generate(input.kind().id_prefix());
        Self::with_id(id, input, provider)
    }

    pub fn with_id(id: JobId, input: JobInput, provider: impl Into<String>) -> Self {
        Self {
            id,
            status: JobStatus::Processing,
            input,
            provider: provider.into(),
            result: None,
            error: None,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    /// 从持久化记录恢复（不做状态机校验）
    #[allow(clippy::too_many_arguments)]
    pub fn restore(
        id: JobId,
        status: JobStatus,
        input: JobInput,
        provider: String,
        result: Option<String>,
        error: Option<String>,
        created_at: DateTime<Utc>,
        completed_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id,
            status,
            input,
            provider,
            result,
            error,
            created_at,
            completed_at,
        }
    }

    pub fn complete(&mut self, result: String) -> Result<(), JobError> {
        self.ensure_processing()?;
        if result.is_empty() {
            return Err(JobError::EmptyResult(self.id.clone()));
        }
        self.status = JobStatus::Completed;
        self.result = Some(result);
        self.error = None;
        self.completed_at = Some(self.terminal_timestamp());
        Ok(())
    }

    pub fn fail(&mut self, error: String) -> Result<(), JobError> {
        self.ensure_processing()?;
        self.status = JobStatus::Failed;
        self.result = None;
        self.error = Some(if error.is_empty() {
            "Unknown failure".to_string()
        } else {
            error
        });
        self.completed_at = Some(self.terminal_timestamp());
        Ok(())
    }

    /// 回退链切换供应商，只允许在 processing 时进行
    pub fn reassign(&mut self, provider: String) -> Result<(), JobError> {
        self.ensure_processing()?;
        self.provider = provider;
        Ok(())
    }

    /// 应用部分更新；整体失败时不修改任何字段
    pub fn apply(&mut self, patch: JobPatch) -> Result<(), JobError> {
        let mut next = self.clone();
        if let Some(provider) = patch.provider {
            next.reassign(provider)?;
        }
        match patch.outcome {
            Some(JobOutcome::Completed(result)) => next.complete(result)?,
            Some(JobOutcome::Failed(error)) => next.fail(error)?,
            None => {}
        }
        *self = next;
        Ok(())
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// 终态且 completed_at 早于 cutoff
    pub fn expired_before(&self, cutoff: DateTime<Utc>) -> bool {
        self.is_terminal() && self.completed_at.map(|t| t < cutoff).unwrap_or(false)
    }

    fn ensure_processing(&self) -> Result<(), JobError> {
        if self.is_terminal() {
            return Err(JobError::AlreadyTerminal {
                id: self.id.clone(),
                status: self.status,
            });
        }
        Ok(())
    }

    fn terminal_timestamp(&self) -> DateTime<Utc> {
        Utc::now().max(self.created_at)
    }

    // Getters
    pub fn id(&self) -> &JobId {
        &self.id
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    pub fn input(&self) -> &JobInput {
        &self.input
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    pub fn result(&self) -> Option<&str> {
        self.result.as_deref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::job::SpeechInput;
    use chrono::Duration;

    fn speech_job() -> Job {
        Job::new(
            JobInput::Speech(SpeechInput {
                text: "Hello".to_string(),
                voice_id: "v1".to_string(),
            }),
            "elevenlabs",
        )
    }

    #[test]
    fn test_new_job_is_processing() {
        let job = speech_job();
        assert_eq!(job.status(), JobStatus::Processing);
        assert!(job.result().is_none());
        assert!(job.error().is_none());
        assert!(job.completed_at().is_none());
        assert!(job.id().as_str().starts_with("tts_"));
    }

    #[test]
    fn test_complete_sets_exactly_result() {
        let mut job = speech_job();
        job.complete("data:audio/mpeg;base64,AAA".to_string()).unwrap();
        assert_eq!(job.status(), JobStatus::Completed);
        assert_eq!(job.result(), Some("data:audio/mpeg;base64,AAA"));
        assert!(job.error().is_none());
        assert!(job.completed_at().unwrap() >= job.created_at());
    }

    #[test]
    fn test_fail_sets_exactly_error() {
        let mut job = speech_job();
        job.fail("boom".to_string()).unwrap();
        assert_eq!(job.status(), JobStatus::Failed);
        assert!(job.result().is_none());
        assert_eq!(job.error(), Some("boom"));
    }

    #[test]
    fn test_terminal_is_final() {
        let mut job = speech_job();
        job.complete("url".to_string()).unwrap();
        let completed_at = job.completed_at();

        assert!(job.fail("late".to_string()).is_err());
        assert!(job.complete("other".to_string()).is_err());
        assert!(job.reassign("google".to_string()).is_err());
        assert_eq!(job.result(), Some("url"));
        assert_eq!(job.completed_at(), completed_at);
    }

    #[test]
    fn test_empty_result_rejected() {
        let mut job = speech_job();
        assert!(matches!(
            job.complete(String::new()),
            Err(JobError::EmptyResult(_))
        ));
        assert_eq!(job.status(), JobStatus::Processing);
    }

    #[test]
    fn test_apply_is_all_or_nothing() {
        let mut job = speech_job();
        job.fail("first".to_string()).unwrap();
        let before = job.clone();
        let patch = JobPatch::completed("url").with_provider("google");
        assert!(job.apply(patch).is_err());
        assert_eq!(job, before);
    }

    #[test]
    fn test_apply_reassign_then_complete() {
        let mut job = speech_job();
        job.apply(JobPatch::completed("url").with_provider("google"))
            .unwrap();
        assert_eq!(job.provider(), "google");
        assert_eq!(job.status(), JobStatus::Completed);
    }

    #[test]
    fn test_expired_before() {
        let mut job = speech_job();
        let future = Utc::now() + Duration::hours(1);
        assert!(!job.expired_before(future));
        job.complete("url".to_string()).unwrap();
        assert!(job.expired_before(future));
        assert!(!job.expired_before(Utc::now() - Duration::hours(1)));
    }
}
