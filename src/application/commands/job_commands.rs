//! Job Commands - 上游任务相关命令

use serde::Deserialize;

use crate::domain::job::{JobId, JobInput, JobStatus};

/// 异步 TTS 的执行方式
///
/// - background: 立即返回 jobId，由后台 worker 执行
/// - synchronous: 阻塞到终态后一次性返回（适用于响应后无法继续执行的部署环境）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobMode {
    Background,
    #[default]
    Synchronous,
}

/// 启动任务命令
#[derive(Debug, Clone)]
pub struct StartJobCommand {
    pub input: JobInput,
    pub provider: String,
}

/// 按供应商链执行（仅在权限受限时切换到下一个）
#[derive(Debug, Clone)]
pub struct FallbackJobCommand {
    pub input: JobInput,
    pub providers: Vec<String>,
}

impl From<StartJobCommand> for FallbackJobCommand {
    fn from(cmd: StartJobCommand) -> Self {
        Self {
            input: cmd.input,
            providers: vec![cmd.provider],
        }
    }
}

/// 已入队任务
#[derive(Debug, Clone, PartialEq)]
pub struct QueuedJob {
    pub job_id: JobId,
    pub status: JobStatus,
}

/// 同步执行结果
#[derive(Debug, Clone, PartialEq)]
pub struct JobResult {
    /// 降级（无存储）模式下为 None
    pub job_id: Option<JobId>,
    /// 实际提供结果的供应商
    pub provider: String,
    pub output: String,
}

/// start_job 的两种结果
#[derive(Debug, Clone, PartialEq)]
pub enum JobDispatch {
    Queued(QueuedJob),
    Finished(JobResult),
}

/// 提交语音合成任务（/generate-audio-async）
#[derive(Debug, Clone)]
pub struct SubmitSpeechJobCommand {
    pub text: String,
    pub voice_id: Option<String>,
    pub tts_provider: Option<String>,
}
