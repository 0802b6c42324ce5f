//! 应用层 - 用例编排
//!
//! 包含：
//! - ports: 六边形架构端口定义（JobStore、UpstreamAdapter、TextGeneration、SpeechSynthesis）
//! - registry / poller / retry: 供应商注册表、轮询与有限重试
//! - commands: CQRS 命令及处理器
//! - queries: CQRS 查询及处理器
//! - error: 应用层错误定义

pub mod commands;
pub mod error;
pub mod poller;
pub mod ports;
pub mod queries;
pub mod registry;
pub mod retry;

// Re-exports
pub use commands::{
    CharacterOptions, FallbackJobCommand, GenerateCharacter, GenerateImageCommand,
    GenerateSpeechAudio, GenerateStory, GenerateThemeLyrics, GenerateThemeSongCommand,
    ExtractSceneMoments, ExtractStoryState, ImageTarget, JobDispatch, JobMode, JobResult,
    QueuedJob, ScoreCompatibility, StartJobCommand, SubmitSpeechJobCommand, TextModels,
    TextTask, VisualRewrite,
    // Handlers
    handlers::{
        ImageGenerationHandler, JobOrchestrator, JobRunner, SpeechAudioHandler,
        SubmitSpeechJobHandler, TextGenerationHandler, ThemeSongHandler, VoiceDefaults,
    },
};

pub use error::ApplicationError;

pub use poller::{PollPolicy, Poller};
pub use ports::{
    JobStorePort, SpeechSynthesisPort, StoreError, TextGenerationPort, UpstreamAdapterPort,
    UpstreamError,
};
pub use registry::ProviderRegistry;
pub use retry::{retry_bounded, RetryPolicy};

pub use queries::{handlers::GetJobStatusHandler, GetJobStatus, JobView};
