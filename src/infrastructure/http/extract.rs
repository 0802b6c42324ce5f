//! 宽松的 JSON 请求体提取器
//!
//! 空请求体或无法解析的请求体按空对象处理，由字段校验报告缺失字段

use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, Request},
};
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::error::ApiError;

pub struct LenientJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for LenientJson<T>
where
    T: DeserializeOwned + Default,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()))?;
        Ok(Self(parse_lenient(&bytes)))
    }
}

/// 解析请求体；请求体本身是 JSON 字符串时再解析一层
pub fn parse_lenient<T: DeserializeOwned + Default>(bytes: &[u8]) -> T {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return T::default();
    }
    match serde_json::from_slice::<T>(bytes) {
        Ok(value) => value,
        Err(e) => match serde_json::from_slice::<Value>(bytes) {
            Ok(Value::String(inner)) => serde_json::from_str(&inner).unwrap_or_default(),
            _ => {
                tracing::debug!(error = %e, "Unparseable request body treated as empty object");
                T::default()
            }
        },
    }
}

/// 数字或数字字符串
pub fn lenient_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    number.filter(|n| n.is_finite())
}
