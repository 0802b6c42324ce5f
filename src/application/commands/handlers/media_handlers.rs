//! Media Command Handlers
//!
//! - SpeechAudioHandler: 同步 TTS（二进制）以及 ElevenLabs 诊断
//! - ImageGenerationHandler: 三种 Replicate 图像，按目标选择供应商
//! - ThemeSongHandler: 主题曲，带供应商回退链

use std::sync::Arc;

use crate::application::commands::handlers::JobOrchestrator;
use crate::application::commands::job_commands::{FallbackJobCommand, StartJobCommand};
use crate::application::commands::media_commands::*;
use crate::application::error::ApplicationError;
use crate::application::ports::SpeechSynthesisPort;
use crate::domain::job::{ImageInput, JobInput, MusicInput, DEFAULT_MUSIC_STYLE};

/// 诊断合成使用的固定文本
pub const DIAGNOSTIC_TEXT: &str = "Test";

pub struct SpeechAudioHandler {
    synthesizer: Arc<dyn SpeechSynthesisPort>,
    default_voice: String,
}

impl SpeechAudioHandler {
    pub fn new(synthesizer: Arc<dyn SpeechSynthesisPort>, default_voice: impl Into<String>) -> Self {
        Self {
            synthesizer,
            default_voice: default_voice.into(),
        }
    }

    pub async fn handle(&self, cmd: GenerateSpeechAudio) -> Result<Vec<u8>, ApplicationError> {
        if cmd.text.trim().is_empty() {
            return Err(ApplicationError::validation("Missing \"text\" in request body"));
        }
        let voice_id = cmd
            .voice_id
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| self.default_voice.clone());

        let audio = self.synthesizer.synthesize(&cmd.text, &voice_id).await?;
        tracing::info!(voice_id = %voice_id, bytes = audio.len(), "Speech synthesized");
        Ok(audio)
    }

    /// 列出音色，验证 API key 可用
    pub async fn check_voices(&self) -> Result<usize, ApplicationError> {
        Ok(self.synthesizer.voice_count().await?)
    }

    /// 合成一小段文本，返回音频字节数
    pub async fn check_synthesis(&self) -> Result<usize, ApplicationError> {
        let audio = self
            .synthesizer
            .synthesize(DIAGNOSTIC_TEXT, &self.default_voice)
            .await?;
        Ok(audio.len())
    }
}

pub const DEFAULT_COVER_ASPECT_RATIO: &str = "3:4";

pub struct ImageGenerationHandler {
    orchestrator: Arc<JobOrchestrator>,
}

impl ImageGenerationHandler {
    pub fn new(orchestrator: Arc<JobOrchestrator>) -> Self {
        Self { orchestrator }
    }

    pub async fn handle(&self, cmd: GenerateImageCommand) -> Result<ImageResult, ApplicationError> {
        let input = match cmd.target {
            ImageTarget::Cover => {
                let (Some(character), Some(world)) = (
                    cmd.character_image_url.filter(|u| !u.trim().is_empty()),
                    cmd.world_image_url.filter(|u| !u.trim().is_empty()),
                ) else {
                    return Err(ApplicationError::validation(
                        "Missing characterImageUrl or worldImageUrl",
                    ));
                };
                ImageInput {
                    prompt: cmd.prompt,
                    reference_images: vec![character, world],
                    aspect_ratio: Some(
                        cmd.aspect_ratio
                            .filter(|r| !r.is_empty())
                            .unwrap_or_else(|| DEFAULT_COVER_ASPECT_RATIO.to_string()),
                    ),
                }
            }
            ImageTarget::Generic | ImageTarget::World => {
                if cmd.prompt.trim().is_empty() {
                    return Err(ApplicationError::validation("Missing prompt"));
                }
                ImageInput {
                    prompt: cmd.prompt,
                    reference_images: Vec::new(),
                    aspect_ratio: cmd.aspect_ratio,
                }
            }
        };

        let result = self
            .orchestrator
            .run_job_synchronously(StartJobCommand {
                input: JobInput::Image(input),
                provider: cmd.target.provider().to_string(),
            })
            .await?;

        Ok(ImageResult {
            image_url: result.output,
            job_id: result.job_id,
        })
    }
}

pub struct ThemeSongHandler {
    orchestrator: Arc<JobOrchestrator>,
    providers: Vec<String>,
}

impl ThemeSongHandler {
    /// `providers` 为回退链，第一个为首选
    pub fn new(orchestrator: Arc<JobOrchestrator>, providers: Vec<String>) -> Self {
        Self {
            orchestrator,
            providers,
        }
    }

    pub async fn handle(
        &self,
        cmd: GenerateThemeSongCommand,
    ) -> Result<ThemeSongResult, ApplicationError> {
        if cmd.prompt.trim().is_empty() {
            return Err(ApplicationError::validation("Missing or invalid \"prompt\""));
        }

        let input = MusicInput {
            prompt: cmd.prompt,
            duration_seconds: MusicInput::clamp_duration(cmd.duration_seconds),
            style: cmd
                .style
                .unwrap_or_else(|| DEFAULT_MUSIC_STYLE.to_string()),
            looped: cmd.looped.unwrap_or(true),
            vocals_style: cmd.vocals_style.unwrap_or_default(),
            lyrics: cmd.lyrics.unwrap_or_default(),
        };

        let result = self
            .orchestrator
            .run_with_fallback(FallbackJobCommand {
                input: JobInput::Music(input),
                providers: self.providers.clone(),
            })
            .await?;

        tracing::info!(provider = %result.provider, "Theme song generated");
        Ok(ThemeSongResult {
            audio_url: result.output,
            provider: result.provider,
            job_id: result.job_id,
        })
    }
}
