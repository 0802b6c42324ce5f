//! Media Commands - 语音、图像、音乐生成命令

use crate::domain::job::JobId;

/// 同步语音合成（/generate-audio，返回二进制 MP3）
#[derive(Debug, Clone)]
pub struct GenerateSpeechAudio {
    pub text: String,
    pub voice_id: Option<String>,
}

/// 图像生成目标，对应注册表中的 Replicate 供应商
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageTarget {
    Generic,
    World,
    Cover,
}

impl ImageTarget {
    pub fn provider(&self) -> &'static str {
        match self {
            ImageTarget::Generic => "replicate-image",
            ImageTarget::World => "replicate-world",
            ImageTarget::Cover => "replicate-cover",
        }
    }
}

/// 图像生成命令
#[derive(Debug, Clone)]
pub struct GenerateImageCommand {
    pub target: ImageTarget,
    pub prompt: String,
    /// 仅封面使用
    pub character_image_url: Option<String>,
    /// 仅封面使用
    pub world_image_url: Option<String>,
    pub aspect_ratio: Option<String>,
}

impl GenerateImageCommand {
    pub fn from_prompt(target: ImageTarget, prompt: impl Into<String>) -> Self {
        Self {
            target,
            prompt: prompt.into(),
            character_image_url: None,
            world_image_url: None,
            aspect_ratio: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageResult {
    pub image_url: String,
    pub job_id: Option<JobId>,
}

/// 主题曲生成命令
#[derive(Debug, Clone, Default)]
pub struct GenerateThemeSongCommand {
    pub prompt: String,
    pub duration_seconds: Option<f64>,
    pub style: Option<String>,
    pub looped: Option<bool>,
    pub lyrics: Option<String>,
    pub vocals_style: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ThemeSongResult {
    pub audio_url: String,
    /// 实际生成音乐的供应商
    pub provider: String,
    pub job_id: Option<JobId>,
}
