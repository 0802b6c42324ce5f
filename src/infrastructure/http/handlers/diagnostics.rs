//! Diagnostic Handlers - 配置检查与 ElevenLabs 连通性测试

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use crate::application::{ApplicationError, UpstreamError};
use crate::infrastructure::http::dto::{
    ElevenLabsCheckFailure, ElevenLabsCheckResponse, ImageConfigResponse,
};
use crate::infrastructure::http::state::AppState;

pub async fn check_image_config(State(state): State<Arc<AppState>>) -> Json<ImageConfigResponse> {
    let providers = &state.info.providers;
    let config = ImageConfigResponse {
        openai_api_key_configured: providers.openai,
        replicate_api_key_configured: providers.replicate,
        replicate_model_version_configured: providers.image_version,
        replicate_world_version_configured: providers.world_version,
        replicate_cover_version_configured: providers.cover_version,
        replicate_music_version_configured: providers.music_version,
        image_provider: "replicate",
    };
    tracing::info!(?config, "Image generation config");
    Json(config)
}

/// 列出音色验证 API key
pub async fn test_elevenlabs(State(state): State<Arc<AppState>>) -> Response {
    if !state.info.providers.elevenlabs {
        return missing_key();
    }
    match state.speech_audio_handler.check_voices().await {
        Ok(count) => {
            tracing::info!(voice_count = count, "ElevenLabs voices retrieved");
            Json(ElevenLabsCheckResponse {
                success: true,
                status: "working",
                voice_count: Some(count),
                audio_size: None,
                message: "ElevenLabs API key is valid and working",
            })
            .into_response()
        }
        Err(e) => check_failed(e),
    }
}

/// 用默认音色合成固定文本
pub async fn test_elevenlabs_simple(State(state): State<Arc<AppState>>) -> Response {
    if !state.info.providers.elevenlabs {
        return missing_key();
    }
    match state.speech_audio_handler.check_synthesis().await {
        Ok(size) => {
            tracing::info!(audio_size = size, "ElevenLabs test synthesis succeeded");
            Json(ElevenLabsCheckResponse {
                success: true,
                status: "working",
                voice_count: None,
                audio_size: Some(size),
                message: "ElevenLabs API key is working correctly",
            })
            .into_response()
        }
        Err(e) => check_failed(e),
    }
}

fn missing_key() -> Response {
    failure(
        "Missing ElevenLabs API key".to_string(),
        "server_error",
        "missing_key",
    )
}

fn check_failed(err: ApplicationError) -> Response {
    let (kind, status) = match &err {
        ApplicationError::UpstreamError { error, .. } => {
            let status = match error {
                UpstreamError::NotConfigured(_) => "missing_key",
                UpstreamError::Network(_) | UpstreamError::RequestTimeout => "network_error",
                _ => "api_error",
            };
            (error.kind().as_str(), status)
        }
        _ => ("server_error", "api_error"),
    };
    failure(format!("ElevenLabs API test failed: {}", err), kind, status)
}

fn failure(error: String, kind: &'static str, status: &'static str) -> Response {
    tracing::error!(error = %error, status, "ElevenLabs check failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ElevenLabsCheckFailure { error, kind, status }),
    )
        .into_response()
}
