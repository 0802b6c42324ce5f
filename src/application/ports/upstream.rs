//! Upstream Adapter Port - 上游供应商调用抽象
//!
//! 统一 `submit` + 可选 `poll` 契约，具体实现在 infrastructure/adapters 层

use async_trait::async_trait;
use base64::Engine;
use serde_json::Value;
use thiserror::Error;

use crate::domain::job::JobInput;

/// 上游错误分类（对外 `type` 字段）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    RateLimit,
    Upstream5xx,
    UpstreamEmpty,
    Timeout,
    Validation,
    ServerError,
    Unknown,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::RateLimit => "rate_limit",
            ErrorKind::Upstream5xx => "upstream_5xx",
            ErrorKind::UpstreamEmpty => "upstream_empty",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Validation => "validation",
            ErrorKind::ServerError => "server_error",
            ErrorKind::Unknown => "unknown",
        }
    }
}

/// 上游错误
#[derive(Debug, Clone, Error)]
pub enum UpstreamError {
    #[error("{provider} rate limited: {message}")]
    RateLimited {
        provider: &'static str,
        message: String,
    },

    #[error("{provider} server error (HTTP {status}): {message}")]
    ServerError {
        provider: &'static str,
        status: u16,
        message: String,
    },

    #[error("{provider} rejected request (HTTP {status}): {message}")]
    Rejected {
        provider: &'static str,
        status: u16,
        message: String,
    },

    #[error("{provider} access restricted: {message}")]
    AccessRestricted {
        provider: &'static str,
        message: String,
    },

    #[error("Prediction failed: {0}")]
    PredictionFailed(String),

    #[error("Invalid upstream output: {0}")]
    InvalidOutput(String),

    #[error("Timed out after {attempts} poll attempts")]
    Timeout { attempts: u32 },

    #[error("Upstream request timed out")]
    RequestTimeout,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Not configured: {0}")]
    NotConfigured(String),

    #[error("{provider} cannot handle this input: {message}")]
    UnsupportedInput {
        provider: &'static str,
        message: String,
    },
}

/// 套餐/权限受限的响应体特征
const RESTRICTION_MARKERS: &[&str] = &[
    "limited_access",
    "limited access",
    "subscription",
    "upgrade your plan",
    "not available on your",
    "payment_required",
];

impl UpstreamError {
    /// 根据 HTTP 状态码和响应体分类
    pub fn from_status(provider: &'static str, status: u16, body: impl Into<String>) -> Self {
        let message = body.into();
        let lowered = message.to_lowercase();
        let restricted = RESTRICTION_MARKERS.iter().any(|m| lowered.contains(m));
        match status {
            429 => UpstreamError::RateLimited { provider, message },
            s if s >= 500 => UpstreamError::ServerError {
                provider,
                status: s,
                message,
            },
            401..=403 => UpstreamError::AccessRestricted { provider, message },
            _ if restricted => UpstreamError::AccessRestricted { provider, message },
            s => UpstreamError::Rejected {
                provider,
                status: s,
                message,
            },
        }
    }

    pub fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            UpstreamError::RequestTimeout
        } else {
            UpstreamError::Network(err.to_string())
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            UpstreamError::RateLimited { .. } => ErrorKind::RateLimit,
            UpstreamError::ServerError { .. } | UpstreamError::Network(_) => ErrorKind::Upstream5xx,
            UpstreamError::PredictionFailed(_) | UpstreamError::InvalidOutput(_) => {
                ErrorKind::UpstreamEmpty
            }
            UpstreamError::Timeout { .. } | UpstreamError::RequestTimeout => ErrorKind::Timeout,
            UpstreamError::UnsupportedInput { .. } => ErrorKind::Validation,
            UpstreamError::NotConfigured(_) => ErrorKind::ServerError,
            UpstreamError::Rejected { .. } | UpstreamError::AccessRestricted { .. } => {
                ErrorKind::Unknown
            }
        }
    }

    /// 仅限流、5xx、网络错误可重试
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            UpstreamError::RateLimited { .. }
                | UpstreamError::ServerError { .. }
                | UpstreamError::Network(_)
        )
    }

    pub fn is_access_restricted(&self) -> bool {
        matches!(self, UpstreamError::AccessRestricted { .. })
    }
}

/// 异步任务句柄（Replicate prediction）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionHandle {
    pub id: String,
    pub poll_url: String,
}

/// 提交结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// 同步供应商直接返回结果
    Completed(String),
    /// 异步供应商返回句柄，需轮询
    Pending(SubmissionHandle),
}

/// 轮询结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    Pending,
    Succeeded(String),
    Failed(String),
}

/// Upstream Adapter Port
#[async_trait]
pub trait UpstreamAdapterPort: Send + Sync {
    /// 注册表中的供应商名称
    fn name(&self) -> &'static str;

    /// 提交请求
    async fn submit(&self, input: &JobInput) -> Result<Submission, UpstreamError>;

    /// 查询异步任务状态，同步供应商无需实现
    async fn poll(&self, handle: &SubmissionHandle) -> Result<PollOutcome, UpstreamError> {
        Err(UpstreamError::InvalidOutput(format!(
            "{} returned a pending handle {} but does not support polling",
            self.name(),
            handle.id
        )))
    }
}

/// 优先查找的包装字段
const WRAPPER_KEYS: &[&str] = &["output", "audioUrl", "url", "imageUrl"];

/// 从异构的供应商输出中提取唯一的 URL / data URI
///
/// - 字符串: 直接使用
/// - 数组: 第一个非空字符串
/// - 对象: 依次尝试 `output`、`audioUrl`、`url`、`imageUrl`
pub fn normalize_output(output: &Value) -> Result<String, UpstreamError> {
    extract_first_string(output).ok_or_else(|| {
        let mut shown = output.to_string();
        if shown.len() > 200 {
            let mut cut = 200;
            while !shown.is_char_boundary(cut) {
                cut -= 1;
            }
            shown.truncate(cut);
        }
        UpstreamError::InvalidOutput(format!("no usable URL in upstream output: {}", shown))
    })
}

fn extract_first_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Array(items) => items.iter().find_map(|item| match item {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            _ => None,
        }),
        Value::Object(map) => WRAPPER_KEYS
            .iter()
            .filter_map(|key| map.get(*key))
            .find_map(extract_first_string),
        _ => None,
    }
}

/// 把音频字节编码为 `data:{mime};base64,...`
pub fn encode_data_uri(mime: &str, bytes: &[u8]) -> String {
    format!(
        "data:{};base64,{}",
        mime,
        base64::engine::general_purpose::STANDARD.encode(bytes)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const URL: &str = "https://replicate.delivery/pbxt/abc/out.webp";

    #[test]
    fn test_normalize_equivalent_shapes() {
        let bare = normalize_output(&json!(URL)).unwrap();
        let array = normalize_output(&json!([URL])).unwrap();
        let wrapped = normalize_output(&json!({ "output": URL })).unwrap();
        assert_eq!(bare, URL);
        assert_eq!(array, URL);
        assert_eq!(wrapped, URL);
    }

    #[test]
    fn test_normalize_first_non_empty_wins() {
        let out = normalize_output(&json!(["", 3, URL, "https://other"])).unwrap();
        assert_eq!(out, URL);
        let nested = normalize_output(&json!({ "output": [URL] })).unwrap();
        assert_eq!(nested, URL);
        let audio = normalize_output(&json!({ "audioUrl": "data:audio/mpeg;base64,AA" })).unwrap();
        assert_eq!(audio, "data:audio/mpeg;base64,AA");
    }

    #[test]
    fn test_normalize_rejects_empty_shapes() {
        for value in [
            json!([]),
            json!({}),
            json!({ "status": 3 }),
            json!(null),
            json!(""),
            json!({ "output": [] }),
        ] {
            assert!(matches!(
                normalize_output(&value),
                Err(UpstreamError::InvalidOutput(_))
            ));
        }
    }

    #[test]
    fn test_status_classification() {
        assert_eq!(
            UpstreamError::from_status("openai", 429, "slow down").kind(),
            ErrorKind::RateLimit
        );
        assert_eq!(
            UpstreamError::from_status("openai", 503, "").kind(),
            ErrorKind::Upstream5xx
        );
        assert!(UpstreamError::from_status("elevenlabs-music", 403, "").is_access_restricted());
        assert!(UpstreamError::from_status(
            "elevenlabs-music",
            401,
            r#"{"detail":{"status":"limited_access"}}"#
        )
        .is_access_restricted());
        assert!(UpstreamError::from_status("elevenlabs", 401, "invalid api key").is_access_restricted());
        assert!(UpstreamError::from_status("elevenlabs-music", 400, "Subscription required")
            .is_access_restricted());
        assert!(!UpstreamError::from_status("elevenlabs-music", 404, "no such model")
            .is_access_restricted());
        assert_eq!(
            UpstreamError::from_status("openai", 400, "bad").kind(),
            ErrorKind::Unknown
        );
    }

    #[test]
    fn test_timeout_distinct_from_failure() {
        let timeout = UpstreamError::Timeout { attempts: 30 };
        let failed = UpstreamError::PredictionFailed("nsfw".to_string());
        assert_eq!(timeout.kind(), ErrorKind::Timeout);
        assert_eq!(failed.kind(), ErrorKind::UpstreamEmpty);
    }

    #[test]
    fn test_retryable() {
        assert!(UpstreamError::from_status("openai", 429, "").is_retryable());
        assert!(UpstreamError::Network("reset".to_string()).is_retryable());
        assert!(!UpstreamError::from_status("openai", 400, "").is_retryable());
        assert!(!UpstreamError::Timeout { attempts: 1 }.is_retryable());
    }

    #[test]
    fn test_encode_data_uri() {
        assert_eq!(encode_data_uri("audio/mpeg", b"abc"), "data:audio/mpeg;base64,YWJj");
    }
}
