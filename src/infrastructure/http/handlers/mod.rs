//! HTTP Handlers
//!
//! 每个端点一个处理函数，另有 OPTIONS 预检与 405 兜底

mod audio;
mod diagnostics;
mod image;
mod music;
mod ping;
mod text;

pub use audio::*;
pub use diagnostics::*;
pub use image::*;
pub use music::*;
pub use ping::*;
pub use text::*;

use axum::http::StatusCode;

use super::error::ApiError;

/// CORS 预检；跨域响应头由 CorsLayer 添加
pub async fn preflight() -> StatusCode {
    StatusCode::OK
}

/// 路由存在但方法不匹配
pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}
