//! Configuration Loader
//!
//! 实现多源配置加载与合并逻辑
//!
//! 优先级（从高到低）：
//! 1. 供应商原生环境变量（`OPENAI_API_KEY` 等）
//! 2. `STORYLOOM_` 前缀环境变量
//! 3. 配置文件（config.toml / config.local.toml）
//! 4. 默认值

use config::{Config, ConfigError as ConfigCrateError, Environment, File, Map};
use std::path::Path;
use thiserror::Error;

use super::types::{AppConfig, JobStoreKind};

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// 配置文件搜索路径
const CONFIG_FILE_NAMES: &[&str] = &["config", "config.local"];

/// 供应商原生环境变量 -> 配置键
///
/// 同一配置键对应多个变量时取第一个非空值
const NATIVE_ENV_VARS: &[(&str, &[&str])] = &[
    ("openai.api_key", &["OPENAI_API_KEY"]),
    ("openai.model", &["OPENAI_MODEL"]),
    ("openai.model_story", &["OPENAI_MODEL_STORY"]),
    ("openai.model_misc", &["OPENAI_MODEL_MISC"]),
    ("elevenlabs.api_key", &["ELEVENLABS_API_KEY"]),
    ("elevenlabs.music_endpoint", &["ELEVEN_MUSIC_ENDPOINT"]),
    ("google.api_key", &["GOOGLE_TTS_API_KEY"]),
    ("replicate.api_token", &["REPLICATE_API_TOKEN", "REPLICATE_API_KEY"]),
    ("replicate.image_version", &["REPLICATE_MODEL_VERSION"]),
    ("replicate.world_version", &["REPLICATE_MODEL_VERSION_WORLD"]),
    ("replicate.cover_version", &["REPLICATE_MODEL_VERSION_COVER"]),
    ("replicate.music_version", &["REPLICATE_MODEL_VERSION_MUSIC"]),
    ("cors.origins", &["CORS_ORIGINS"]),
    ("character.use_json", &["CHAR_GEN_USE_JSON"]),
    ("character.max_tokens", &["CHAR_GEN_MAX_TOKENS"]),
    ("build.commit_hash", &["VERCEL_GIT_COMMIT_SHA", "COMMIT_HASH"]),
];

/// 加载应用配置
///
/// # 环境变量示例
/// - `STORYLOOM_SERVER__PORT=8080`
/// - `STORYLOOM_JOBS__MODE=background`
/// - `STORYLOOM_JOBS__STORE=sqlite`
/// - `OPENAI_API_KEY=sk-...`
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置
///
/// # 参数
/// - `config_path` - 可选的配置文件路径，如果为 None 则使用默认搜索路径
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let env: Map<String, String> = std::env::vars().collect();
    load_config_with_env(config_path, env)
}

/// 用给定的环境变量表加载配置
pub fn load_config_with_env(
    config_path: Option<&Path>,
    env: Map<String, String>,
) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. 添加配置文件（如果存在），缺省值由 serde default 提供
    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 2. 前缀环境变量: STORYLOOM_JOBS__MODE=background
    builder = builder.add_source(
        Environment::with_prefix("STORYLOOM")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
            .source(Some(env.clone())),
    );

    // 3. 供应商原生环境变量（最高优先级）
    for (key, value) in native_overrides(&env) {
        builder = builder.set_override(key, value)?;
    }

    let config = builder.build()?;

    let app_config: AppConfig = config.try_deserialize().map_err(|e| {
        ConfigError::ParseError(format!("Failed to deserialize config: {}", e))
    })?;

    validate_config(&app_config)?;

    Ok(app_config)
}

/// 收集已设置的原生环境变量
fn native_overrides(env: &Map<String, String>) -> Vec<(&'static str, String)> {
    NATIVE_ENV_VARS
        .iter()
        .filter_map(|(key, vars)| {
            vars.iter()
                .filter_map(|var| env.get(*var))
                .map(|v| v.trim())
                .find(|v| !v.is_empty())
                .filter(|v| *key != "character.max_tokens" || v.parse::<u32>().is_ok())
                .map(|v| (*key, v.to_string()))
        })
        .collect()
}

/// 验证配置有效性
fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "Server port cannot be 0".to_string(),
        ));
    }

    if config.jobs.poll_interval_ms == 0 {
        return Err(ConfigError::ValidationError(
            "Poll interval cannot be 0".to_string(),
        ));
    }

    if config.jobs.max_poll_attempts == 0 {
        return Err(ConfigError::ValidationError(
            "Max poll attempts cannot be 0".to_string(),
        ));
    }

    if config.jobs.retention_secs == 0 {
        return Err(ConfigError::ValidationError(
            "Job retention cannot be 0".to_string(),
        ));
    }

    if config.jobs.store == JobStoreKind::Sqlite && config.jobs.database_path.as_os_str().is_empty()
    {
        return Err(ConfigError::ValidationError(
            "Database path cannot be empty when jobs.store = sqlite".to_string(),
        ));
    }

    Ok(())
}

fn configured(value: &Option<String>) -> &'static str {
    match value {
        Some(v) if !v.is_empty() => "yes",
        _ => "no",
    }
}

/// 打印配置信息（用于启动时日志），密钥只报告是否配置
pub fn print_config(config: &AppConfig) {
    tracing::info!("=== Application Configuration ===");
    tracing::info!("Server: {}", config.server.addr());
    tracing::info!("Upstream Timeout: {}s", config.http.timeout_secs);
    if config.cors.origins.is_empty() {
        tracing::info!("CORS Origins: *");
    } else {
        tracing::info!("CORS Origins: {}", config.cors.origins.join(", "));
    }
    let models = config.openai.text_models();
    tracing::info!(
        "OpenAI: configured: {}, models: story={} misc={} lyrics={} extract={}, max retries: {}",
        configured(&config.openai.api_key),
        models.story,
        models.misc,
        models.lyrics,
        models.extract,
        config.openai.max_retries
    );
    tracing::info!(
        "Character Generation: json={}, max tokens={}",
        config.character.use_json,
        config.character.max_tokens
    );
    tracing::info!("ElevenLabs: configured: {}", configured(&config.elevenlabs.api_key));
    tracing::info!("Google TTS: configured: {}", configured(&config.google.api_key));
    tracing::info!(
        "Replicate: configured: {}, world version: {}, cover version: {}, music version: {}",
        configured(&config.replicate.api_token),
        configured(&config.replicate.world_version),
        configured(&config.replicate.cover_version),
        configured(&config.replicate.music_version)
    );
    tracing::info!(
        "Jobs: store={}, mode={:?}, retention={}s, poll={}ms x {}",
        config.jobs.store.as_str(),
        config.jobs.mode,
        config.jobs.retention_secs,
        config.jobs.poll_interval_ms,
        config.jobs.max_poll_attempts
    );
    if config.jobs.store == JobStoreKind::Sqlite {
        tracing::info!("Database: {:?}", config.jobs.database_path);
    }
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("=================================");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::JobMode;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> Map<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_validation_passes_for_valid_config() {
        let config = AppConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validation_errors() {
        let mut config = AppConfig::default();
        config.server.port = 0;
        assert!(validate_config(&config).is_err());

        let mut config = AppConfig::default();
        config.jobs.poll_interval_ms = 0;
        assert!(validate_config(&config).is_err());

        let mut config = AppConfig::default();
        config.jobs.retention_secs = 0;
        assert!(validate_config(&config).is_err());

        let mut config = AppConfig::default();
        config.jobs.store = JobStoreKind::Sqlite;
        config.jobs.database_path = Default::default();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let file = write_config(
            r#"
            [server]
            port = 8080

            [jobs]
            store = "sqlite"
            mode = "background"
            database_path = "/tmp/jobs.db"

            [cors]
            origins = ["https://storyloom.app"]
            "#,
        );
        let config = load_config_with_env(Some(file.path()), Map::new()).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.jobs.store, JobStoreKind::Sqlite);
        assert_eq!(config.jobs.mode, JobMode::Background);
        assert_eq!(config.cors.origins, vec!["https://storyloom.app"]);
        assert_eq!(config.jobs.max_poll_attempts, 30);
    }

    #[test]
    fn test_env_priority() {
        let file = write_config(
            r#"
            [server]
            port = 8080

            [replicate]
            api_token = "from-file"
            "#,
        );
        let config = load_config_with_env(
            Some(file.path()),
            env(&[
                ("STORYLOOM_SERVER__PORT", "9090"),
                ("STORYLOOM_REPLICATE__API_TOKEN", "from-prefixed"),
                ("REPLICATE_API_KEY", "from-native"),
                ("OPENAI_MODEL", "gpt-4.1"),
                ("CHAR_GEN_USE_JSON", "true"),
                ("CHAR_GEN_MAX_TOKENS", "lots"),
                ("CORS_ORIGINS", "https://a.app,https://b.app"),
                ("COMMIT_HASH", "deadbeef"),
            ]),
        )
        .unwrap();

        assert_eq!(config.server.port, 9090);
        assert_eq!(config.replicate.api_token.as_deref(), Some("from-native"));
        assert_eq!(config.openai.text_models().story, "gpt-4.1");
        assert!(config.character.use_json);
        assert_eq!(config.character.max_tokens, 300);
        assert_eq!(config.cors.origins, vec!["https://a.app", "https://b.app"]);
        assert_eq!(config.build.commit_hash.as_deref(), Some("deadbeef"));
    }

    #[test]
    fn test_native_overrides_prefer_first_variable() {
        let overrides = native_overrides(&env(&[
            ("REPLICATE_API_TOKEN", "token"),
            ("REPLICATE_API_KEY", "key"),
            ("VERCEL_GIT_COMMIT_SHA", " "),
            ("COMMIT_HASH", "abc"),
        ]));
        assert!(overrides.contains(&("replicate.api_token", "token".to_string())));
        assert!(overrides.contains(&("build.commit_hash", "abc".to_string())));
    }
}
