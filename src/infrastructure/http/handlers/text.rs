//! Text Handlers - OpenAI 文本端点

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::application::commands::{
    CharacterResult, CompatibilityResult, ExtractSceneMoments, ExtractStoryState,
    GenerateCharacter, GenerateStory, GenerateThemeLyrics, SceneMomentsResult, ScoreCompatibility,
    StoryResult, StoryStateResult, ThemeLyricsResult, VisualRewrite, VisualRewriteResult,
};
use crate::infrastructure::http::dto::{
    CompatibilityRequest, DescriptionRequest, PromptRequest, StoryTextRequest, ThemeLyricsRequest,
};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::extract::{lenient_number, LenientJson};
use crate::infrastructure::http::state::AppState;

pub async fn generate_story(
    State(state): State<Arc<AppState>>,
    LenientJson(req): LenientJson<PromptRequest>,
) -> Result<Json<StoryResult>, ApiError> {
    let result = state
        .text_handler
        .generate_story(GenerateStory { prompt: req.prompt })
        .await?;
    Ok(Json(result))
}

pub async fn generate_character(
    State(state): State<Arc<AppState>>,
    LenientJson(req): LenientJson<PromptRequest>,
) -> Result<Json<CharacterResult>, ApiError> {
    let result = state
        .text_handler
        .generate_character(GenerateCharacter { prompt: req.prompt })
        .await?;
    Ok(Json(result))
}

pub async fn compatibility_score(
    State(state): State<Arc<AppState>>,
    LenientJson(req): LenientJson<CompatibilityRequest>,
) -> Result<Json<CompatibilityResult>, ApiError> {
    let result = state
        .text_handler
        .score_compatibility(ScoreCompatibility {
            character: req.character,
            world: req.world,
        })
        .await?;
    Ok(Json(result))
}

pub async fn extract_story_state(
    State(state): State<Arc<AppState>>,
    LenientJson(req): LenientJson<StoryTextRequest>,
) -> Result<Json<StoryStateResult>, ApiError> {
    let result = state
        .text_handler
        .extract_story_state(ExtractStoryState { story: req.story })
        .await?;
    Ok(Json(result))
}

pub async fn extract_scene_moments(
    State(state): State<Arc<AppState>>,
    LenientJson(req): LenientJson<StoryTextRequest>,
) -> Result<Json<SceneMomentsResult>, ApiError> {
    let result = state
        .text_handler
        .extract_scene_moments(ExtractSceneMoments { story: req.story })
        .await?;
    Ok(Json(result))
}

pub async fn visual_rewrite(
    State(state): State<Arc<AppState>>,
    LenientJson(req): LenientJson<DescriptionRequest>,
) -> Result<Json<VisualRewriteResult>, ApiError> {
    let result = state
        .text_handler
        .visual_rewrite(VisualRewrite {
            description: req.description,
        })
        .await?;
    Ok(Json(result))
}

pub async fn generate_theme_lyrics(
    State(state): State<Arc<AppState>>,
    LenientJson(req): LenientJson<ThemeLyricsRequest>,
) -> Result<Json<ThemeLyricsResult>, ApiError> {
    let result = state
        .text_handler
        .generate_theme_lyrics(GenerateThemeLyrics {
            character: req.character,
            tone: req.tone,
            world: req.world,
            duration_seconds: lenient_number(&req.duration_seconds),
        })
        .await?;
    Ok(Json(result))
}
