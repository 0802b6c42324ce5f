//! Text Generation Port - 对话补全抽象

use async_trait::async_trait;
use serde::Serialize;

use super::UpstreamError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }
}

/// 补全请求
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    pub temperature: Option<f32>,
    /// 要求模型只输出 JSON 对象
    pub json_mode: bool,
}

/// 补全结果
#[derive(Debug, Clone, PartialEq)]
pub struct ChatCompletion {
    /// 第一个 choice 的内容，可能为空
    pub content: String,
    /// 实际服务的模型
    pub model: String,
}

/// Text Generation Port
#[async_trait]
pub trait TextGenerationPort: Send + Sync {
    async fn complete(&self, request: ChatRequest) -> Result<ChatCompletion, UpstreamError>;
}
