//! Storyloom - 儿童故事应用的 AI 代理服务
//!
//! 启动顺序：配置 -> 日志 -> 任务存储 -> 供应商注册表 -> Worker/Sweeper -> HTTP

use std::sync::Arc;
use std::time::Duration;

use storyloom::application::{
    JobMode, JobOrchestrator, JobRunner, JobStorePort, PollPolicy, Poller, ProviderRegistry,
    RetryPolicy, UpstreamAdapterPort, VoiceDefaults,
};
use storyloom::config::{load_config, print_config, AppConfig, JobStoreKind, LogConfig};
use storyloom::infrastructure::adapters::{
    http_support::build_client, ElevenLabsConfig, ElevenLabsMusicClient, ElevenLabsMusicConfig,
    ElevenLabsTtsClient, GoogleTtsClient, GoogleTtsConfig, OpenAiChatClient, OpenAiClientConfig,
    ReplicateConfig, ReplicateModel, ReplicatePredictionClient,
};
use storyloom::infrastructure::http::{
    AppPorts, AppSettings, AppState, HttpServer, ProviderFlags, ServerConfig, ServiceInfo,
};
use storyloom::infrastructure::memory::InMemoryJobStore;
use storyloom::infrastructure::persistence::sqlite::{create_pool, run_migrations, DatabaseConfig};
use storyloom::infrastructure::persistence::SqliteJobStore;
use storyloom::infrastructure::worker::{JobSweeper, JobWorker, JobWorkerConfig};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

/// 主题曲供应商回退链
const MUSIC_PROVIDERS: [&str; 2] = ["elevenlabs-music", "replicate-music"];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置（优先级：原生环境变量 > STORYLOOM_ 环境变量 > 配置文件 > 默认值）
    let config = load_config().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    init_tracing(&config.log);

    tracing::info!("Storyloom - story app AI proxy");
    print_config(&config);

    // 任务存储
    let store = build_store(&config).await?;
    let retention = Duration::from_secs(config.jobs.retention_secs);

    // 供应商
    let elevenlabs = Arc::new(ElevenLabsTtsClient::new(ElevenLabsConfig {
        base_url: config.elevenlabs.base_url.clone(),
        api_key: config.elevenlabs.api_key.clone(),
        timeout_secs: config.http.timeout_secs,
        ..Default::default()
    })?);
    let registry = Arc::new(build_registry(&config, elevenlabs.clone())?);
    tracing::info!(providers = ?registry.names(), "Provider registry ready");

    let runner = Arc::new(JobRunner::new(
        store.clone(),
        registry,
        Poller::new(PollPolicy {
            interval: Duration::from_millis(config.jobs.poll_interval_ms),
            max_attempts: config.jobs.max_poll_attempts,
        }),
    ));

    // 后台模式且有存储时才启动 Worker
    let queue = match (&store, config.jobs.mode) {
        (Some(_), JobMode::Background) => {
            let (tx, rx) = mpsc::channel(config.jobs.queue_capacity.max(1));
            let worker = JobWorker::new(
                JobWorkerConfig {
                    max_concurrent: config.jobs.worker_concurrency,
                },
                rx,
                runner.clone(),
            );
            tokio::spawn(worker.run());
            Some(tx)
        }
        _ => None,
    };

    if let Some(store) = &store {
        if config.jobs.sweep_interval_secs > 0 {
            let sweeper = JobSweeper::new(
                store.clone(),
                Duration::from_secs(config.jobs.sweep_interval_secs),
                retention,
            );
            tokio::spawn(sweeper.run());
        }
    }

    let text_generator = Arc::new(OpenAiChatClient::new(OpenAiClientConfig {
        base_url: config.openai.base_url.clone(),
        api_key: config.openai.api_key.clone(),
        timeout_secs: config.http.timeout_secs,
    })?);

    let ports = AppPorts {
        text_generator,
        speech_synthesizer: elevenlabs,
        orchestrator: Arc::new(JobOrchestrator::new(runner, queue)),
    };
    let settings = AppSettings {
        models: config.openai.text_models(),
        character: config.character.options(),
        retry: RetryPolicy {
            max_retries: config.openai.max_retries,
            ..Default::default()
        },
        job_mode: config.jobs.mode,
        voices: VoiceDefaults {
            elevenlabs: config.elevenlabs.default_voice.clone(),
            google: config.google.default_voice.clone(),
        },
        music_providers: MUSIC_PROVIDERS.iter().map(|p| p.to_string()).collect(),
        retention,
        info: service_info(&config),
    };

    // 创建 HTTP 服务器
    let server_config = ServerConfig::new(&config.server.host, config.server.port)
        .with_cors_origins(config.cors.origins.clone());
    let server = HttpServer::new(server_config, AppState::new(ports, settings));

    // 启动服务器（带优雅关闭）
    server
        .run_with_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for ctrl-c");
                std::future::pending::<()>().await;
            }
            tracing::info!("Received shutdown signal");
        })
        .await?;

    tracing::info!("Server shutdown complete");

    Ok(())
}

/// 初始化日志；RUST_LOG 优先于 log.level
fn init_tracing(log: &LogConfig) {
    let default_filter = format!(
        "{},storyloom={},tower_http=debug",
        log.level, log.level
    );
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if log.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// 按配置选择任务存储；`none` 为降级透传模式
async fn build_store(config: &AppConfig) -> anyhow::Result<Option<Arc<dyn JobStorePort>>> {
    let store: Option<Arc<dyn JobStorePort>> = match config.jobs.store {
        JobStoreKind::Memory => Some(InMemoryJobStore::new().arc()),
        JobStoreKind::Sqlite => {
            if let Some(parent) = config.jobs.database_path.parent() {
                if !parent.as_os_str().is_empty() {
                    tokio::fs::create_dir_all(parent).await?;
                }
            }
            let pool = create_pool(&DatabaseConfig::new(&config.jobs.database_path)).await?;
            run_migrations(&pool).await?;
            Some(Arc::new(SqliteJobStore::new(pool)))
        }
        JobStoreKind::None => {
            tracing::warn!("Job store disabled, async jobs run in degraded passthrough mode");
            None
        }
    };

    if let Some(store) = &store {
        tracing::info!(backend = store.backend_name(), "Job store ready");
    }
    Ok(store)
}

/// 注册所有供应商；缺少凭据的供应商在调用时返回 NotConfigured
fn build_registry(
    config: &AppConfig,
    elevenlabs: Arc<ElevenLabsTtsClient>,
) -> anyhow::Result<ProviderRegistry> {
    let timeout_secs = config.http.timeout_secs;
    let replicate_client = build_client(timeout_secs)?;
    let replicate_config = ReplicateConfig {
        base_url: config.replicate.base_url.clone(),
        api_token: config.replicate.api_token.clone(),
        timeout_secs,
    };
    let replicate = |model: ReplicateModel| -> Arc<dyn UpstreamAdapterPort> {
        Arc::new(ReplicatePredictionClient::with_client(
            replicate_client.clone(),
            replicate_config.clone(),
            model,
        ))
    };

    let mut registry = ProviderRegistry::new();
    registry.register(elevenlabs);
    registry.register(Arc::new(GoogleTtsClient::new(GoogleTtsConfig {
        base_url: config.google.base_url.clone(),
        api_key: config.google.api_key.clone(),
        timeout_secs,
    })?));
    registry.register(Arc::new(ElevenLabsMusicClient::new(ElevenLabsMusicConfig {
        endpoint: config.elevenlabs.music_endpoint.clone(),
        api_key: config.elevenlabs.api_key.clone(),
        timeout_secs,
    })?));
    registry.register(replicate(ReplicateModel::image(
        config.replicate.image_version.clone(),
    )));
    registry.register(replicate(ReplicateModel::world(
        config.replicate.world_version.clone(),
    )));
    registry.register(replicate(ReplicateModel::cover(
        config.replicate.cover_version.clone(),
    )));
    registry.register(replicate(ReplicateModel::music(
        config.replicate.music_version.clone(),
    )));
    Ok(registry)
}

fn service_info(config: &AppConfig) -> ServiceInfo {
    let set = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.is_empty());
    ServiceInfo {
        commit_hash: config.build.commit_hash.clone(),
        model_in_use: config.openai.model_in_use(),
        providers: ProviderFlags {
            openai: set(&config.openai.api_key),
            elevenlabs: set(&config.elevenlabs.api_key),
            google: set(&config.google.api_key),
            replicate: set(&config.replicate.api_token),
            image_version: set(&config.replicate.image_version),
            world_version: set(&config.replicate.world_version),
            cover_version: set(&config.replicate.cover_version),
            music_version: set(&config.replicate.music_version),
        },
    }
}
