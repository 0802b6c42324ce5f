//! OpenAI Chat Client - 调用 Chat Completions 接口
//!
//! POST {base_url}/v1/chat/completions
//! Request: {"model", "messages", "max_tokens", "temperature"?, "response_format"?}
//! Response: {"model", "choices": [{"message": {"content"}}]}

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::application::ports::{
    ChatCompletion, ChatMessage, ChatRequest, TextGenerationPort, UpstreamError,
};
use crate::infrastructure::adapters::http_support::{
    build_client, ensure_success, require_setting, trim_base_url,
};

const PROVIDER: &str = "openai";

#[derive(Debug, Serialize)]
struct ChatHttpRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatHttpResponse {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// OpenAI 客户端配置
#[derive(Debug, Clone)]
pub struct OpenAiClientConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl Default for OpenAiClientConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com".to_string(),
            api_key: None,
            timeout_secs: 30,
        }
    }
}

pub struct OpenAiChatClient {
    client: Client,
    config: OpenAiClientConfig,
}

impl OpenAiChatClient {
    pub fn new(config: OpenAiClientConfig) -> Result<Self, UpstreamError> {
        let client = build_client(config.timeout_secs)?;
        Ok(Self { client, config })
    }

    fn completions_url(&self) -> String {
        format!("{}/v1/chat/completions", trim_base_url(&self.config.base_url))
    }
}

#[async_trait]
impl TextGenerationPort for OpenAiChatClient {
    async fn complete(&self, request: ChatRequest) -> Result<ChatCompletion, UpstreamError> {
        let api_key = require_setting(&self.config.api_key, "OPENAI_API_KEY")?;

        let body = ChatHttpRequest {
            model: &request.model,
            messages: &request.messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            response_format: request
                .json_mode
                .then_some(ResponseFormat { kind: "json_object" }),
        };

        tracing::debug!(
            model = %request.model,
            messages = request.messages.len(),
            max_tokens = request.max_tokens,
            "Sending chat completion request"
        );

        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(UpstreamError::from_reqwest)?;
        let response = ensure_success(PROVIDER, response).await?;

        let parsed: ChatHttpResponse = response.json().await.map_err(|e| {
            UpstreamError::InvalidOutput(format!("malformed chat completion: {}", e))
        })?;

        Ok(into_completion(parsed, request.model))
    }
}

fn into_completion(response: ChatHttpResponse, requested_model: String) -> ChatCompletion {
    let content = response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .unwrap_or_default();
    ChatCompletion {
        content,
        model: response.model.unwrap_or(requested_model),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_shape() {
        let messages = vec![ChatMessage::system("sys"), ChatMessage::user("hi")];
        let body = ChatHttpRequest {
            model: "gpt-4o",
            messages: &messages,
            max_tokens: 300,
            temperature: Some(0.8),
            response_format: Some(ResponseFormat { kind: "json_object" }),
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["messages"][0]["role"], "system");
        assert_eq!(value["messages"][1]["content"], "hi");
        assert_eq!(value["response_format"]["type"], "json_object");

        let plain = ChatHttpRequest {
            model: "gpt-4o",
            messages: &messages,
            max_tokens: 1200,
            temperature: None,
            response_format: None,
        };
        let value = serde_json::to_value(&plain).unwrap();
        assert!(value.get("temperature").is_none());
        assert!(value.get("response_format").is_none());
    }

    #[test]
    fn test_parse_response() {
        let parsed: ChatHttpResponse = serde_json::from_str(
            r#"{"model":"gpt-4o-2024","choices":[{"message":{"role":"assistant","content":"Once"}}]}"#,
        )
        .unwrap();
        let completion = into_completion(parsed, "gpt-4o".to_string());
        assert_eq!(completion.content, "Once");
        assert_eq!(completion.model, "gpt-4o-2024");

        let empty: ChatHttpResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        let completion = into_completion(empty, "gpt-4o".to_string());
        assert_eq!(completion.content, "");
        assert_eq!(completion.model, "gpt-4o");
    }

    #[tokio::test]
    async fn test_missing_key_is_not_configured() {
        let client = OpenAiChatClient::new(OpenAiClientConfig::default()).unwrap();
        let err = client
            .complete(ChatRequest {
                model: "gpt-4o".to_string(),
                messages: vec![ChatMessage::user("hi")],
                max_tokens: 10,
                temperature: None,
                json_mode: false,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, UpstreamError::NotConfigured(_)));
    }
}
