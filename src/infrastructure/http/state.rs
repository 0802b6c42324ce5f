//! Application State
//!
//! 包含所有 Command/Query Handlers 以及诊断端点使用的服务信息

use std::sync::Arc;
use std::time::Duration;

use crate::application::{
    // Command handlers
    CharacterOptions, ImageGenerationHandler, JobMode, JobOrchestrator, RetryPolicy,
    SpeechAudioHandler, SubmitSpeechJobHandler, TextGenerationHandler, TextModels,
    ThemeSongHandler, VoiceDefaults,
    // Query handlers
    GetJobStatusHandler,
    // Ports
    SpeechSynthesisPort, TextGenerationPort,
};

/// 已配置的凭据与模型版本（仅记录是否配置）
#[derive(Debug, Clone, Default)]
pub struct ProviderFlags {
    pub openai: bool,
    pub elevenlabs: bool,
    pub google: bool,
    pub replicate: bool,
    pub image_version: bool,
    pub world_version: bool,
    pub cover_version: bool,
    pub music_version: bool,
}

/// `/_version` 与 `/check-image-config` 返回的信息
#[derive(Debug, Clone, Default)]
pub struct ServiceInfo {
    pub commit_hash: Option<String>,
    pub model_in_use: Option<String>,
    pub providers: ProviderFlags,
}

/// 构建 AppState 所需的端口
pub struct AppPorts {
    pub text_generator: Arc<dyn TextGenerationPort>,
    pub speech_synthesizer: Arc<dyn SpeechSynthesisPort>,
    pub orchestrator: Arc<JobOrchestrator>,
}

/// 构建 AppState 所需的配置
#[derive(Debug, Clone, Default)]
pub struct AppSettings {
    pub models: TextModels,
    pub character: CharacterOptions,
    pub retry: RetryPolicy,
    pub job_mode: JobMode,
    pub voices: VoiceDefaults,
    /// 主题曲供应商回退链
    pub music_providers: Vec<String>,
    pub retention: Duration,
    pub info: ServiceInfo,
}

/// 应用状态
///
/// 未配置任务存储时没有状态查询处理器，所有 jobId 都查不到
pub struct AppState {
    // ========== Command Handlers ==========
    pub text_handler: TextGenerationHandler,
    pub speech_audio_handler: SpeechAudioHandler,
    pub submit_speech_handler: SubmitSpeechJobHandler,
    pub image_handler: ImageGenerationHandler,
    pub theme_song_handler: ThemeSongHandler,

    // ========== Query Handlers ==========
    pub job_status_handler: Option<GetJobStatusHandler>,

    pub info: ServiceInfo,
}

impl AppState {
    /// 创建应用状态
    pub fn new(ports: AppPorts, settings: AppSettings) -> Self {
        let job_status_handler = ports
            .orchestrator
            .runner()
            .store()
            .map(|store| GetJobStatusHandler::new(store.clone(), settings.retention));

        Self {
            // Command handlers
            text_handler: TextGenerationHandler::new(
                ports.text_generator,
                settings.models,
                settings.character,
                settings.retry,
            ),
            speech_audio_handler: SpeechAudioHandler::new(
                ports.speech_synthesizer,
                settings.voices.elevenlabs.clone(),
            ),
            submit_speech_handler: SubmitSpeechJobHandler::new(
                ports.orchestrator.clone(),
                settings.job_mode,
                settings.voices,
            ),
            image_handler: ImageGenerationHandler::new(ports.orchestrator.clone()),
            theme_song_handler: ThemeSongHandler::new(
                ports.orchestrator,
                settings.music_providers,
            ),

            // Query handlers
            job_status_handler,

            info: settings.info,
        }
    }
}
