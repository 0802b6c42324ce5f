//! Speech Synthesis Port - 直接返回音频字节的语音合成
//!
//! `/generate-audio` 需要原始 MP3 字节，诊断接口需要列出可用音色

use async_trait::async_trait;

use super::UpstreamError;

#[async_trait]
pub trait SpeechSynthesisPort: Send + Sync {
    /// 合成 MP3 音频
    async fn synthesize(&self, text: &str, voice_id: &str) -> Result<Vec<u8>, UpstreamError>;

    /// 账户下可用音色数量（用于校验 API key）
    async fn voice_count(&self) -> Result<usize, UpstreamError>;
}
