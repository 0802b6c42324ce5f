//! Audio Handlers - 语音合成与任务状态

use axum::{
    extract::{Query, State},
    http::header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use crate::application::{
    GenerateSpeechAudio, GetJobStatus, JobDispatch, JobView, SubmitSpeechJobCommand,
};
use crate::infrastructure::http::dto::{
    JobStatusParams, QueuedJobResponse, SpeechJobResponse, SpeechRequest,
};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::extract::LenientJson;
use crate::infrastructure::http::state::AppState;

/// 同步合成，直接返回 MP3 字节
pub async fn generate_audio(
    State(state): State<Arc<AppState>>,
    LenientJson(req): LenientJson<SpeechRequest>,
) -> Result<Response, ApiError> {
    let audio = state
        .speech_audio_handler
        .handle(GenerateSpeechAudio {
            text: req.text,
            voice_id: req.voice_id,
        })
        .await?;

    Ok((
        [
            (CONTENT_TYPE, "audio/mpeg"),
            (CONTENT_DISPOSITION, "inline; filename=\"story.mp3\""),
        ],
        audio,
    )
        .into_response())
}

/// 异步合成；后台模式返回 jobId，同步模式返回音频 data URI
pub async fn generate_audio_async(
    State(state): State<Arc<AppState>>,
    LenientJson(req): LenientJson<SpeechRequest>,
) -> Result<Response, ApiError> {
    let dispatch = state
        .submit_speech_handler
        .handle(SubmitSpeechJobCommand {
            text: req.text,
            voice_id: req.voice_id,
            tts_provider: req.tts_provider,
        })
        .await?;

    let response = match dispatch {
        JobDispatch::Queued(job) => Json(QueuedJobResponse::from(job)).into_response(),
        JobDispatch::Finished(result) => Json(SpeechJobResponse::from(result)).into_response(),
    };
    Ok(response)
}

pub async fn check_tts_status(
    State(state): State<Arc<AppState>>,
    Query(params): Query<JobStatusParams>,
) -> Result<Json<JobView>, ApiError> {
    let job_id = params.job_id.unwrap_or_default();

    let Some(handler) = &state.job_status_handler else {
        if job_id.trim().is_empty() {
            return Err(ApiError::BadRequest(
                "Missing \"jobId\" query parameter".to_string(),
            ));
        }
        return Err(ApiError::NotFound("Job not found".to_string()));
    };

    let view = handler.handle(GetJobStatus { job_id }).await?;
    Ok(Json(view))
}
