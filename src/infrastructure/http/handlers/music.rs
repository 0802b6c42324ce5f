//! Music Handler - 主题曲生成（带供应商回退）

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::application::GenerateThemeSongCommand;
use crate::infrastructure::http::dto::{ThemeSongRequest, ThemeSongResponse};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::extract::{lenient_number, LenientJson};
use crate::infrastructure::http::state::AppState;

pub async fn generate_theme_song(
    State(state): State<Arc<AppState>>,
    LenientJson(req): LenientJson<ThemeSongRequest>,
) -> Result<Json<ThemeSongResponse>, ApiError> {
    let prompt = req.prompt.as_str().unwrap_or_default().to_string();

    let result = state
        .theme_song_handler
        .handle(GenerateThemeSongCommand {
            prompt,
            duration_seconds: lenient_number(&req.duration_seconds),
            style: req.style,
            looped: req.looped,
            lyrics: req.lyrics,
            vocals_style: req.vocals_style,
        })
        .await?;

    Ok(Json(ThemeSongResponse {
        success: true,
        audio_url: result.audio_url,
        provider: result.provider,
    }))
}
