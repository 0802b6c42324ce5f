//! HTTP Routes
//!
//! API Endpoints:
//! - /api/ping                     GET   健康检查
//! - /api/_version                 GET   部署信息
//! - /api/generate-story           POST  生成故事
//! - /api/generate-character       POST  生成角色
//! - /api/compatibility-score      POST  角色与世界匹配度
//! - /api/extract-story-state      POST  抽取故事状态
//! - /api/extract-scene-moments    POST  抽取关键场景
//! - /api/visual-rewrite           POST  改写为画面描述
//! - /api/generate-theme-lyrics    POST  生成主题曲歌词
//! - /api/generate-audio           POST  同步 TTS（MP3）
//! - /api/generate-audio-async     POST  异步 TTS（任务）
//! - /api/check-tts-status         GET   查询任务状态
//! - /api/generate-replicate-image POST  生成图像
//! - /api/generate-world-image     POST  生成世界图像
//! - /api/generate-story-cover     POST  生成故事封面
//! - /api/generate-theme-song      POST  生成主题曲
//! - /api/check-image-config       GET   图像配置检查
//! - /api/test-elevenlabs          GET   ElevenLabs key 测试
//! - /api/test-elevenlabs-simple   GET   ElevenLabs 合成测试
//!
//! 每个路由都接受 OPTIONS，其余方法返回 405

use axum::{
    handler::Handler,
    routing::{get, post, MethodRouter},
    Router,
};
use std::sync::Arc;

use super::handlers;
use super::state::AppState;

type AppRouter = Router<Arc<AppState>>;

/// 创建所有路由
pub fn create_routes() -> AppRouter {
    Router::new().nest("/api", api_routes())
}

/// API 路由
fn api_routes() -> AppRouter {
    Router::new()
        .route("/ping", with_common(get(handlers::ping)))
        .route("/_version", with_common(get(handlers::version)))
        .merge(text_routes())
        .merge(audio_routes())
        .merge(image_routes())
        .route(
            "/generate-theme-song",
            post_route(handlers::generate_theme_song),
        )
        .merge(diagnostic_routes())
}

/// Text 路由
fn text_routes() -> AppRouter {
    Router::new()
        .route("/generate-story", post_route(handlers::generate_story))
        .route("/generate-character", post_route(handlers::generate_character))
        .route("/compatibility-score", post_route(handlers::compatibility_score))
        .route("/extract-story-state", post_route(handlers::extract_story_state))
        .route(
            "/extract-scene-moments",
            post_route(handlers::extract_scene_moments),
        )
        .route("/visual-rewrite", post_route(handlers::visual_rewrite))
        .route(
            "/generate-theme-lyrics",
            post_route(handlers::generate_theme_lyrics),
        )
}

/// Audio 路由
fn audio_routes() -> AppRouter {
    Router::new()
        .route("/generate-audio", post_route(handlers::generate_audio))
        .route(
            "/generate-audio-async",
            post_route(handlers::generate_audio_async),
        )
        .route("/check-tts-status", with_common(get(handlers::check_tts_status)))
}

/// Image 路由
fn image_routes() -> AppRouter {
    Router::new()
        .route(
            "/generate-replicate-image",
            post_route(handlers::generate_replicate_image),
        )
        .route("/generate-world-image", post_route(handlers::generate_world_image))
        .route("/generate-story-cover", post_route(handlers::generate_story_cover))
}

/// Diagnostic 路由
fn diagnostic_routes() -> AppRouter {
    Router::new()
        .route("/check-image-config", with_common(get(handlers::check_image_config)))
        .route("/test-elevenlabs", with_common(get(handlers::test_elevenlabs)))
        .route(
            "/test-elevenlabs-simple",
            with_common(get(handlers::test_elevenlabs_simple)),
        )
}

fn post_route<H, T>(handler: H) -> MethodRouter<Arc<AppState>>
where
    H: Handler<T, Arc<AppState>>,
    T: 'static,
{
    with_common(post(handler))
}

/// OPTIONS 预检与 405 兜底
fn with_common(route: MethodRouter<Arc<AppState>>) -> MethodRouter<Arc<AppState>> {
    route
        .options(handlers::preflight)
        .fallback(handlers::method_not_allowed)
}
