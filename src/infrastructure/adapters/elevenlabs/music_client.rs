//! ElevenLabs Music Client
//!
//! POST {music_endpoint}，Accept: audio/mpeg
//! - 音频响应: 编码为 data URI
//! - JSON 响应: 取 audioUrl / url

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use crate::application::ports::{
    encode_data_uri, normalize_output, Submission, UpstreamAdapterPort, UpstreamError,
};
use crate::domain::job::{JobInput, MusicInput};
use crate::infrastructure::adapters::http_support::{build_client, ensure_success, require_setting};

pub const ELEVENLABS_MUSIC_PROVIDER: &str = "elevenlabs-music";

#[derive(Debug, Serialize)]
struct MusicRequest {
    prompt: String,
    duration_seconds: f64,
    // 不同版本接口使用的时长字段不一致，全部带上
    duration: f64,
    length_seconds: f64,
    options: MusicOptions,
}

#[derive(Debug, Serialize)]
struct MusicOptions {
    #[serde(rename = "loop")]
    looped: bool,
    safe: bool,
    vocals: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    lyrics: Option<String>,
}

impl From<&MusicInput> for MusicRequest {
    fn from(input: &MusicInput) -> Self {
        let vocals = if input.vocals_style.is_empty() {
            "instrumental".to_string()
        } else {
            input.vocals_style.clone()
        };
        let lyrics = (input.wants_vocals() && !input.lyrics.trim().is_empty())
            .then(|| input.lyrics.trim().to_string());
        Self {
            prompt: input.descriptive_prompt(),
            duration_seconds: input.duration_seconds,
            duration: input.duration_seconds,
            length_seconds: input.duration_seconds,
            options: MusicOptions {
                looped: input.looped,
                safe: true,
                vocals,
                lyrics,
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct ElevenLabsMusicConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl Default for ElevenLabsMusicConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.elevenlabs.io/v1/music/generate".to_string(),
            api_key: None,
            timeout_secs: 30,
        }
    }
}

pub struct ElevenLabsMusicClient {
    client: Client,
    config: ElevenLabsMusicConfig,
}

impl ElevenLabsMusicClient {
    pub fn new(config: ElevenLabsMusicConfig) -> Result<Self, UpstreamError> {
        let client = build_client(config.timeout_secs)?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl UpstreamAdapterPort for ElevenLabsMusicClient {
    fn name(&self) -> &'static str {
        ELEVENLABS_MUSIC_PROVIDER
    }

    async fn submit(&self, input: &JobInput) -> Result<Submission, UpstreamError> {
        let JobInput::Music(music) = input else {
            return Err(UpstreamError::UnsupportedInput {
                provider: ELEVENLABS_MUSIC_PROVIDER,
                message: format!("expected music input, got {:?}", input.kind()),
            });
        };
        let api_key = require_setting(&self.config.api_key, "ELEVENLABS_API_KEY")?;
        let body = MusicRequest::from(music);

        tracing::debug!(
            endpoint = %self.config.endpoint,
            duration_seconds = body.duration_seconds,
            "Sending ElevenLabs music request"
        );

        let response = self
            .client
            .post(&self.config.endpoint)
            .header("xi-api-key", api_key)
            .header(reqwest::header::ACCEPT, "audio/mpeg")
            .json(&body)
            .send()
            .await
            .map_err(UpstreamError::from_reqwest)?;
        let response = ensure_success(ELEVENLABS_MUSIC_PROVIDER, response).await?;

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();

        if content_type.contains("audio/") {
            let audio = response
                .bytes()
                .await
                .map_err(|e| UpstreamError::InvalidOutput(format!("failed to read audio: {}", e)))?;
            if audio.is_empty() {
                return Err(UpstreamError::InvalidOutput(
                    "ElevenLabs music returned empty audio".to_string(),
                ));
            }
            tracing::info!(audio_size = audio.len(), "ElevenLabs music completed");
            return Ok(Submission::Completed(encode_data_uri("audio/mpeg", &audio)));
        }

        let value: serde_json::Value = response.json().await.map_err(|e| {
            UpstreamError::InvalidOutput(format!("unexpected music response: {}", e))
        })?;
        normalize_output(&value).map(Submission::Completed)
    }
}
