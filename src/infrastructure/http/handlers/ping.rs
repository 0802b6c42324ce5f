//! Ping Handler
//!
//! 健康检查与部署信息

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::infrastructure::http::dto::{PingResponse, VersionFlags, VersionResponse};
use crate::infrastructure::http::state::AppState;

/// Ping endpoint - 健康检查
pub async fn ping() -> Json<PingResponse> {
    Json(PingResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// 当前部署的提交号、故事模型与角色生成开关
pub async fn version(State(state): State<Arc<AppState>>) -> Json<VersionResponse> {
    let character = state.text_handler.character_options();
    Json(VersionResponse {
        commit_hash: state.info.commit_hash.clone(),
        model_in_use: state.info.model_in_use.clone(),
        flags: VersionFlags {
            char_gen_use_json: character.use_json.to_string(),
            char_gen_max_tokens: character.max_tokens.to_string(),
        },
    })
}
