//! ElevenLabs TTS Client
//!
//! POST {base_url}/v1/text-to-speech/{voice_id}  -> audio/mpeg 二进制
//! GET  {base_url}/v1/voices                     -> {"voices": [...]}
//!
//! 同时作为注册表中的 `elevenlabs` 供应商：音频编码为 data URI 直接返回

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::application::ports::{
    encode_data_uri, SpeechSynthesisPort, Submission, UpstreamAdapterPort, UpstreamError,
};
use crate::domain::job::JobInput;
use crate::infrastructure::adapters::http_support::{
    build_client, ensure_success, require_setting, trim_base_url,
};

pub const ELEVENLABS_PROVIDER: &str = "elevenlabs";

#[derive(Debug, Serialize)]
struct SynthesisRequest<'a> {
    text: &'a str,
    model_id: &'a str,
    voice_settings: VoiceSettings,
}

#[derive(Debug, Serialize)]
struct VoiceSettings {
    stability: f32,
    similarity_boost: f32,
}

#[derive(Debug, Deserialize)]
struct VoicesResponse {
    #[serde(default)]
    voices: Vec<serde_json::Value>,
}

/// ElevenLabs 客户端配置
#[derive(Debug, Clone)]
pub struct ElevenLabsConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub model_id: String,
    pub timeout_secs: u64,
}

impl Default for ElevenLabsConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.elevenlabs.io".to_string(),
            api_key: None,
            model_id: "eleven_monolingual_v1".to_string(),
            timeout_secs: 30,
        }
    }
}

pub struct ElevenLabsTtsClient {
    client: Client,
    config: ElevenLabsConfig,
}

impl ElevenLabsTtsClient {
    pub fn new(config: ElevenLabsConfig) -> Result<Self, UpstreamError> {
        let client = build_client(config.timeout_secs)?;
        Ok(Self { client, config })
    }

    fn api_key(&self) -> Result<&str, UpstreamError> {
        require_setting(&self.config.api_key, "ELEVENLABS_API_KEY")
    }

    fn synthesis_url(&self, voice_id: &str) -> String {
        format!(
            "{}/v1/text-to-speech/{}",
            trim_base_url(&self.config.base_url),
            voice_id
        )
    }

    fn voices_url(&self) -> String {
        format!("{}/v1/voices", trim_base_url(&self.config.base_url))
    }
}

#[async_trait]
impl SpeechSynthesisPort for ElevenLabsTtsClient {
    async fn synthesize(&self, text: &str, voice_id: &str) -> Result<Vec<u8>, UpstreamError> {
        let api_key = self.api_key()?;
        let body = SynthesisRequest {
            text,
            model_id: &self.config.model_id,
            voice_settings: VoiceSettings {
                stability: 0.5,
                similarity_boost: 0.75,
            },
        };

        tracing::debug!(voice_id = %voice_id, text_len = text.len(), "Sending ElevenLabs TTS request");

        let response = self
            .client
            .post(self.synthesis_url(voice_id))
            .header("xi-api-key", api_key)
            .header(reqwest::header::ACCEPT, "audio/mpeg")
            .json(&body)
            .send()
            .await
            .map_err(UpstreamError::from_reqwest)?;
        let response = ensure_success(ELEVENLABS_PROVIDER, response).await?;

        let audio = response
            .bytes()
            .await
            .map_err(|e| UpstreamError::InvalidOutput(format!("failed to read audio: {}", e)))?
            .to_vec();

        if audio.is_empty() {
            return Err(UpstreamError::InvalidOutput(
                "ElevenLabs returned empty audio".to_string(),
            ));
        }

        tracing::info!(voice_id = %voice_id, audio_size = audio.len(), "ElevenLabs TTS completed");
        Ok(audio)
    }

    async fn voice_count(&self) -> Result<usize, UpstreamError> {
        let api_key = self.api_key()?;
        let response = self
            .client
            .get(self.voices_url())
            .header("xi-api-key", api_key)
            .send()
            .await
            .map_err(UpstreamError::from_reqwest)?;
        let response = ensure_success(ELEVENLABS_PROVIDER, response).await?;

        let voices: VoicesResponse = response
            .json()
            .await
            .map_err(|e| UpstreamError::InvalidOutput(format!("malformed voices list: {}", e)))?;
        Ok(voices.voices.len())
    }
}

#[async_trait]
impl UpstreamAdapterPort for ElevenLabsTtsClient {
    fn name(&self) -> &'static str {
        ELEVENLABS_PROVIDER
    }

    async fn submit(&self, input: &JobInput) -> Result<Submission, UpstreamError> {
        let JobInput::Speech(speech) = input else {
            return Err(UpstreamError::UnsupportedInput {
                provider: ELEVENLABS_PROVIDER,
                message: format!("expected speech input, got {:?}", input.kind()),
            });
        };
        let audio = self.synthesize(&speech.text, &speech.voice_id).await?;
        Ok(Submission::Completed(encode_data_uri("audio/mpeg", &audio)))
    }
}
