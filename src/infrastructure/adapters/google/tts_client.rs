//! Google Cloud TTS Client (REST)
//!
//! POST {base_url}/v1/text:synthesize?key={api_key}
//! Response: {"audioContent": "<base64 MP3>"}

use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::application::ports::{
    encode_data_uri, Submission, UpstreamAdapterPort, UpstreamError,
};
use crate::domain::job::JobInput;
use crate::infrastructure::adapters::http_support::{
    build_client, ensure_success, require_setting, trim_base_url,
};

pub const GOOGLE_PROVIDER: &str = "google";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeRequest<'a> {
    input: TextInput<'a>,
    voice: VoiceSelection<'a>,
    audio_config: AudioConfig,
}

#[derive(Debug, Serialize)]
struct TextInput<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VoiceSelection<'a> {
    language_code: String,
    name: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AudioConfig {
    audio_encoding: &'static str,
    speaking_rate: f32,
    pitch: f32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeResponse {
    #[serde(default)]
    audio_content: Option<String>,
}

/// 校验音色并推导语言代码：`en-US-Wavenet-D` -> `en-US`
pub fn language_code(voice_id: &str) -> Result<String, UpstreamError> {
    if !voice_id.starts_with("en-") {
        return Err(UpstreamError::UnsupportedInput {
            provider: GOOGLE_PROVIDER,
            message: format!("Invalid or unsupported Google TTS voice: {}", voice_id),
        });
    }
    let mut parts = voice_id.split('-');
    match (parts.next(), parts.next()) {
        (Some(lang), Some(region)) if !region.is_empty() => Ok(format!("{}-{}", lang, region)),
        _ => Err(UpstreamError::UnsupportedInput {
            provider: GOOGLE_PROVIDER,
            message: format!("Invalid or unsupported Google TTS voice: {}", voice_id),
        }),
    }
}

#[derive(Debug, Clone)]
pub struct GoogleTtsConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl Default for GoogleTtsConfig {
    fn default() -> Self {
        Self {
            base_url: "https://texttospeech.googleapis.com".to_string(),
            api_key: None,
            timeout_secs: 30,
        }
    }
}

pub struct GoogleTtsClient {
    client: Client,
    config: GoogleTtsConfig,
}

impl GoogleTtsClient {
    pub fn new(config: GoogleTtsConfig) -> Result<Self, UpstreamError> {
        let client = build_client(config.timeout_secs)?;
        Ok(Self { client, config })
    }

    fn synthesize_url(&self) -> String {
        format!("{}/v1/text:synthesize", trim_base_url(&self.config.base_url))
    }
}

#[async_trait]
impl UpstreamAdapterPort for GoogleTtsClient {
    fn name(&self) -> &'static str {
        GOOGLE_PROVIDER
    }

    async fn submit(&self, input: &JobInput) -> Result<Submission, UpstreamError> {
        let JobInput::Speech(speech) = input else {
            return Err(UpstreamError::UnsupportedInput {
                provider: GOOGLE_PROVIDER,
                message: format!("expected speech input, got {:?}", input.kind()),
            });
        };
        let language_code = language_code(&speech.voice_id)?;
        let api_key = require_setting(&self.config.api_key, "GOOGLE_TTS_API_KEY")?;

        let body = SynthesizeRequest {
            input: TextInput { text: &speech.text },
            voice: VoiceSelection {
                language_code,
                name: &speech.voice_id,
            },
            audio_config: AudioConfig {
                audio_encoding: "MP3",
                speaking_rate: 1.0,
                pitch: 0.0,
            },
        };

        tracing::debug!(
            voice_id = %speech.voice_id,
            text_len = speech.text.len(),
            "Sending Google TTS request"
        );

        let response = self
            .client
            .post(self.synthesize_url())
            .query(&[("key", api_key)])
            .json(&body)
            .send()
            .await
            .map_err(UpstreamError::from_reqwest)?;
        let response = ensure_success(GOOGLE_PROVIDER, response).await?;

        let parsed: SynthesizeResponse = response.json().await.map_err(|e| {
            UpstreamError::InvalidOutput(format!("malformed Google TTS response: {}", e))
        })?;
        let encoded = parsed
            .audio_content
            .filter(|c| !c.is_empty())
            .ok_or_else(|| {
                UpstreamError::InvalidOutput("No audio content returned from Google TTS".to_string())
            })?;
        let audio = base64::engine::general_purpose::STANDARD
            .decode(encoded.as_bytes())
            .map_err(|e| UpstreamError::InvalidOutput(format!("invalid audioContent: {}", e)))?;

        tracing::info!(voice_id = %speech.voice_id, audio_size = audio.len(), "Google TTS completed");
        Ok(Submission::Completed(encode_data_uri("audio/mpeg", &audio)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::job::SpeechInput;

    #[test]
    fn test_language_code() {
        assert_eq!(language_code("en-US-Wavenet-D").unwrap(), "en-US");
        assert_eq!(language_code("en-GB-Neural2-A").unwrap(), "en-GB");
        assert!(language_code("fr-FR-Wavenet-A").is_err());
        assert!(language_code("en-").is_err());
    }

    #[test]
    fn test_request_body_shape() {
        let body = SynthesizeRequest {
            input: TextInput { text: "Hello" },
            voice: VoiceSelection {
                language_code: "en-US".to_string(),
                name: "en-US-Wavenet-D",
            },
            audio_config: AudioConfig {
                audio_encoding: "MP3",
                speaking_rate: 1.0,
                pitch: 0.0,
            },
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["voice"]["languageCode"], "en-US");
        assert_eq!(value["audioConfig"]["audioEncoding"], "MP3");
    }

    #[tokio::test]
    async fn test_invalid_voice_rejected_before_network() {
        let client = GoogleTtsClient::new(GoogleTtsConfig::default()).unwrap();
        let err = client
            .submit(&JobInput::Speech(SpeechInput {
                text: "Hello".to_string(),
                voice_id: "21m00Tcm4TlvDq8ikWAM".to_string(),
            }))
            .await
            .unwrap_err();
        assert!(matches!(err, UpstreamError::UnsupportedInput { .. }));
    }
}
