//! Data Transfer Objects
//!
//! 请求体字段名沿用前端约定（camelCase 与 snake_case 混用）

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::application::{JobResult, QueuedJob};

// ============================================================================
// Text DTOs
// ============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PromptRequest {
    pub prompt: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CompatibilityRequest {
    pub character: Value,
    pub world: Value,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct StoryTextRequest {
    pub story: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DescriptionRequest {
    pub description: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ThemeLyricsRequest {
    pub character: Value,
    pub tone: String,
    pub world: String,
    pub duration_seconds: Value,
}

// ============================================================================
// Speech DTOs
// ============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SpeechRequest {
    pub text: String,
    pub voice_id: Option<String>,
    pub tts_provider: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct JobStatusParams {
    #[serde(rename = "jobId")]
    pub job_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueuedJobResponse {
    pub job_id: String,
    pub status: &'static str,
}

impl From<QueuedJob> for QueuedJobResponse {
    fn from(job: QueuedJob) -> Self {
        Self {
            job_id: job.job_id.to_string(),
            status: job.status.as_str(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeechJobResponse {
    pub success: bool,
    pub audio_url: String,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,
}

impl From<JobResult> for SpeechJobResponse {
    fn from(result: JobResult) -> Self {
        Self {
            success: true,
            audio_url: result.output,
            status: "completed",
            job_id: result.job_id.map(|id| id.to_string()),
        }
    }
}

// ============================================================================
// Image DTOs
// ============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CoverOptions {
    pub aspect_ratio: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CoverRequest {
    pub character_image_url: Option<String>,
    pub world_image_url: Option<String>,
    pub prompt: String,
    pub options: CoverOptions,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageResponse {
    pub image_url: String,
}

// ============================================================================
// Music DTOs
// ============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ThemeSongRequest {
    pub prompt: Value,
    pub duration_seconds: Value,
    pub style: Option<String>,
    #[serde(rename = "loop")]
    pub looped: Option<bool>,
    pub lyrics: Option<String>,
    pub vocals_style: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeSongResponse {
    pub success: bool,
    pub audio_url: String,
    pub provider: String,
}

// ============================================================================
// Diagnostic DTOs
// ============================================================================

#[derive(Debug, Serialize)]
pub struct PingResponse {
    pub status: &'static str,
    pub version: &'static str,
}

#[derive(Debug, Serialize)]
pub struct VersionFlags {
    #[serde(rename = "CHAR_GEN_USE_JSON")]
    pub char_gen_use_json: String,
    #[serde(rename = "CHAR_GEN_MAX_TOKENS")]
    pub char_gen_max_tokens: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionResponse {
    pub commit_hash: Option<String>,
    pub model_in_use: Option<String>,
    pub flags: VersionFlags,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageConfigResponse {
    pub openai_api_key_configured: bool,
    pub replicate_api_key_configured: bool,
    pub replicate_model_version_configured: bool,
    pub replicate_world_version_configured: bool,
    pub replicate_cover_version_configured: bool,
    pub replicate_music_version_configured: bool,
    pub image_provider: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ElevenLabsCheckResponse {
    pub success: bool,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_size: Option<usize>,
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ElevenLabsCheckFailure {
    pub error: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub status: &'static str,
}
