//! Image Handlers - Replicate 图像预测

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::application::{GenerateImageCommand, ImageTarget};
use crate::infrastructure::http::dto::{CoverRequest, ImageResponse, PromptRequest};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::extract::LenientJson;
use crate::infrastructure::http::state::AppState;

async fn generate(state: &AppState, cmd: GenerateImageCommand) -> Result<Json<ImageResponse>, ApiError> {
    let result = state.image_handler.handle(cmd).await?;
    Ok(Json(ImageResponse {
        image_url: result.image_url,
    }))
}

pub async fn generate_replicate_image(
    State(state): State<Arc<AppState>>,
    LenientJson(req): LenientJson<PromptRequest>,
) -> Result<Json<ImageResponse>, ApiError> {
    generate(
        &state,
        GenerateImageCommand::from_prompt(ImageTarget::Generic, req.prompt),
    )
    .await
}

pub async fn generate_world_image(
    State(state): State<Arc<AppState>>,
    LenientJson(req): LenientJson<PromptRequest>,
) -> Result<Json<ImageResponse>, ApiError> {
    generate(
        &state,
        GenerateImageCommand::from_prompt(ImageTarget::World, req.prompt),
    )
    .await
}

pub async fn generate_story_cover(
    State(state): State<Arc<AppState>>,
    LenientJson(req): LenientJson<CoverRequest>,
) -> Result<Json<ImageResponse>, ApiError> {
    generate(
        &state,
        GenerateImageCommand {
            target: ImageTarget::Cover,
            prompt: req.prompt,
            character_image_url: req.character_image_url,
            world_image_url: req.world_image_url,
            aspect_ratio: req.options.aspect_ratio,
        },
    )
    .await
}
