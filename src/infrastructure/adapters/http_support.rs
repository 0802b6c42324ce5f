//! 上游 HTTP 客户端公用部分

use reqwest::{Client, Response};
use std::time::Duration;

use crate::application::ports::UpstreamError;

/// 构建带整体超时的 reqwest 客户端
pub fn build_client(timeout_secs: u64) -> Result<Client, UpstreamError> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| UpstreamError::Network(e.to_string()))
}

/// 非 2xx 响应转换为分类后的上游错误
pub async fn error_from_response(provider: &'static str, response: Response) -> UpstreamError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    tracing::warn!(provider = provider, status, body = %truncate(&body, 300), "Upstream returned an error status");
    UpstreamError::from_status(provider, status, truncate(&body, 500))
}

/// 成功时原样返回响应，否则转换为错误
pub async fn ensure_success(
    provider: &'static str,
    response: Response,
) -> Result<Response, UpstreamError> {
    if response.status().is_success() {
        Ok(response)
    } else {
        Err(error_from_response(provider, response).await)
    }
}

/// 缺失的密钥或模型版本
pub fn require_setting<'a>(
    value: &'a Option<String>,
    name: &'static str,
) -> Result<&'a str, UpstreamError> {
    value
        .as_deref()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| UpstreamError::NotConfigured(format!("Missing {}", name)))
}

pub fn trim_base_url(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}

fn truncate(text: &str, max: usize) -> String {
    if text.len() <= max {
        return text.to_string();
    }
    let mut cut = max;
    while !text.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}...", &text[..cut])
}
