//! Fake Speech Synthesizer

use async_trait::async_trait;

use crate::application::ports::{SpeechSynthesisPort, UpstreamError};

/// 始终返回固定的音频字节
pub struct FakeSpeechSynthesizer {
    audio: Vec<u8>,
    voices: usize,
}

impl FakeSpeechSynthesizer {
    pub fn new(audio: Vec<u8>, voices: usize) -> Self {
        Self { audio, voices }
    }
}

impl Default for FakeSpeechSynthesizer {
    fn default() -> Self {
        // ID3 头，足够让客户端识别为 MP3
        Self::new(b"ID3\x03\x00\x00\x00\x00\x00\x00fake".to_vec(), 3)
    }
}

#[async_trait]
impl SpeechSynthesisPort for FakeSpeechSynthesizer {
    async fn synthesize(&self, text: &str, voice_id: &str) -> Result<Vec<u8>, UpstreamError> {
        tracing::debug!(text_len = text.len(), voice_id = %voice_id, "FakeSpeechSynthesizer: returning fixed audio");
        Ok(self.audio.clone())
    }

    async fn voice_count(&self) -> Result<usize, UpstreamError> {
        Ok(self.voices)
    }
}
