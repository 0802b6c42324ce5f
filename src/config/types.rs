//! Configuration Types
//!
//! 定义所有配置结构体

use serde::{Deserialize, Deserializer};
use std::path::PathBuf;

use crate::application::{CharacterOptions, JobMode, TextModels, VoiceDefaults};

/// 应用主配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// 服务器配置
    #[serde(default)]
    pub server: ServerConfig,

    /// 上游 HTTP 客户端配置
    #[serde(default)]
    pub http: HttpConfig,

    /// 跨域配置
    #[serde(default)]
    pub cors: CorsConfig,

    #[serde(default)]
    pub openai: OpenAiConfig,

    /// 角色生成开关
    #[serde(default)]
    pub character: CharacterConfig,

    #[serde(default)]
    pub elevenlabs: ElevenLabsConfig,

    #[serde(default)]
    pub google: GoogleConfig,

    #[serde(default)]
    pub replicate: ReplicateConfig,

    /// 任务跟踪配置
    #[serde(default)]
    pub jobs: JobsConfig,

    /// 部署信息
    #[serde(default)]
    pub build: BuildConfig,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

/// 服务器配置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,

    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    /// 获取服务器地址
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// 上游 HTTP 客户端配置
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    /// 单次请求超时时间（秒）
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// 跨域配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CorsConfig {
    /// 允许的来源；为空时允许任意来源
    ///
    /// 可写成 TOML 数组，也可写成逗号分隔的字符串
    #[serde(default, deserialize_with = "string_or_list")]
    pub origins: Vec<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrList {
    One(String),
    Many(Vec<String>),
}

fn string_or_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let items = match StringOrList::deserialize(deserializer)? {
        StringOrList::One(s) => s.split(',').map(str::to_string).collect(),
        StringOrList::Many(v) => v,
    };
    Ok(items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect())
}

/// OpenAI 配置
#[derive(Debug, Clone, Deserialize)]
pub struct OpenAiConfig {
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_openai_base_url")]
    pub base_url: String,

    /// 各档位未单独配置时使用的模型
    #[serde(default)]
    pub model: Option<String>,

    #[serde(default)]
    pub model_story: Option<String>,

    #[serde(default)]
    pub model_misc: Option<String>,

    #[serde(default)]
    pub model_extract: Option<String>,

    /// 首次调用之外的最大重试次数
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_openai_base_url() -> String {
    "https://api.openai.com".to_string()
}

fn default_max_retries() -> u32 {
    2
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_openai_base_url(),
            model: None,
            model_story: None,
            model_misc: None,
            model_extract: None,
            max_retries: default_max_retries(),
        }
    }
}

impl OpenAiConfig {
    /// 解析各档位模型：取候选中第一个非空配置，否则用默认值
    ///
    /// 歌词档位在通用模型之前先看故事模型；抽取档位不受通用模型影响
    pub fn text_models(&self) -> TextModels {
        let defaults = TextModels::default();
        let pick = |candidates: &[&Option<String>], default: String| {
            candidates
                .iter()
                .filter_map(|m| m.as_deref())
                .find(|m| !m.is_empty())
                .map(str::to_string)
                .unwrap_or(default)
        };
        TextModels {
            story: pick(&[&self.model_story, &self.model], defaults.story),
            misc: pick(&[&self.model_misc, &self.model], defaults.misc),
            lyrics: pick(
                &[&self.model_misc, &self.model_story, &self.model],
                defaults.lyrics,
            ),
            extract: pick(&[&self.model_extract], defaults.extract),
        }
    }

    /// `/_version` 报告的故事模型；未配置时为 None
    pub fn model_in_use(&self) -> Option<String> {
        self.model_story.clone().or_else(|| self.model.clone())
    }
}

/// 角色生成配置
#[derive(Debug, Clone, Deserialize)]
pub struct CharacterConfig {
    #[serde(default)]
    pub use_json: bool,

    #[serde(default = "default_character_max_tokens")]
    pub max_tokens: u32,
}

fn default_character_max_tokens() -> u32 {
    300
}

impl Default for CharacterConfig {
    fn default() -> Self {
        Self {
            use_json: false,
            max_tokens: default_character_max_tokens(),
        }
    }
}

impl CharacterConfig {
    pub fn options(&self) -> CharacterOptions {
        CharacterOptions {
            use_json: self.use_json,
            max_tokens: self.max_tokens,
        }
    }
}

/// ElevenLabs 配置（TTS 与音乐）
#[derive(Debug, Clone, Deserialize)]
pub struct ElevenLabsConfig {
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_elevenlabs_base_url")]
    pub base_url: String,

    #[serde(default = "default_music_endpoint")]
    pub music_endpoint: String,

    #[serde(default = "default_elevenlabs_voice")]
    pub default_voice: String,
}

fn default_elevenlabs_base_url() -> String {
    "https://api.elevenlabs.io".to_string()
}

fn default_music_endpoint() -> String {
    "https://api.elevenlabs.io/v1/music/generate".to_string()
}

fn default_elevenlabs_voice() -> String {
    VoiceDefaults::default().elevenlabs
}

impl Default for ElevenLabsConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_elevenlabs_base_url(),
            music_endpoint: default_music_endpoint(),
            default_voice: default_elevenlabs_voice(),
        }
    }
}

/// Google Cloud TTS 配置
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleConfig {
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_google_base_url")]
    pub base_url: String,

    #[serde(default = "default_google_voice")]
    pub default_voice: String,
}

fn default_google_base_url() -> String {
    "https://texttospeech.googleapis.com".to_string()
}

fn default_google_voice() -> String {
    VoiceDefaults::default().google
}

impl Default for GoogleConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_google_base_url(),
            default_voice: default_google_voice(),
        }
    }
}

/// Replicate 配置
#[derive(Debug, Clone, Deserialize)]
pub struct ReplicateConfig {
    #[serde(default)]
    pub api_token: Option<String>,

    #[serde(default = "default_replicate_base_url")]
    pub base_url: String,

    /// 通用图像模型版本；未配置时使用内置版本
    #[serde(default)]
    pub image_version: Option<String>,

    #[serde(default)]
    pub world_version: Option<String>,

    #[serde(default)]
    pub cover_version: Option<String>,

    #[serde(default)]
    pub music_version: Option<String>,
}

fn default_replicate_base_url() -> String {
    "https://api.replicate.com".to_string()
}

impl Default for ReplicateConfig {
    fn default() -> Self {
        Self {
            api_token: None,
            base_url: default_replicate_base_url(),
            image_version: None,
            world_version: None,
            cover_version: None,
            music_version: None,
        }
    }
}

/// 任务存储实现
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStoreKind {
    #[default]
    Memory,
    Sqlite,
    /// 不记录任务，直接透传
    None,
}

impl JobStoreKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStoreKind::Memory => "memory",
            JobStoreKind::Sqlite => "sqlite",
            JobStoreKind::None => "none",
        }
    }
}

/// 任务跟踪配置
#[derive(Debug, Clone, Deserialize)]
pub struct JobsConfig {
    #[serde(default)]
    pub store: JobStoreKind,

    #[serde(default)]
    pub mode: JobMode,

    /// SQLite 数据库文件路径
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,

    /// 终态任务保留时长（秒）
    #[serde(default = "default_retention_secs")]
    pub retention_secs: u64,

    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    #[serde(default = "default_max_poll_attempts")]
    pub max_poll_attempts: u32,

    #[serde(default = "default_worker_concurrency")]
    pub worker_concurrency: usize,

    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// 定期清理间隔（秒），0 表示关闭
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

fn default_database_path() -> PathBuf {
    PathBuf::from("data/storyloom.db")
}

fn default_retention_secs() -> u64 {
    3600
}

fn default_poll_interval_ms() -> u64 {
    2000
}

fn default_max_poll_attempts() -> u32 {
    30
}

fn default_worker_concurrency() -> usize {
    4
}

fn default_queue_capacity() -> usize {
    256
}

fn default_sweep_interval_secs() -> u64 {
    300
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            store: JobStoreKind::default(),
            mode: JobMode::default(),
            database_path: default_database_path(),
            retention_secs: default_retention_secs(),
            poll_interval_ms: default_poll_interval_ms(),
            max_poll_attempts: default_max_poll_attempts(),
            worker_concurrency: default_worker_concurrency(),
            queue_capacity: default_queue_capacity(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

/// 部署信息
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BuildConfig {
    #[serde(default)]
    pub commit_hash: Option<String>,
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: String,

    /// 是否启用 JSON 格式
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.addr(), "0.0.0.0:3000");
        assert_eq!(config.http.timeout_secs, 30);
        assert_eq!(config.jobs.store, JobStoreKind::Memory);
        assert_eq!(config.jobs.mode, JobMode::Synchronous);
        assert_eq!(config.jobs.poll_interval_ms, 2000);
        assert_eq!(config.jobs.max_poll_attempts, 30);
        assert_eq!(config.elevenlabs.default_voice, "21m00Tcm4TlvDq8ikWAM");
        assert_eq!(config.google.default_voice, "en-US-Wavenet-D");
    }

    #[test]
    fn test_text_models_resolution() {
        let mut openai = OpenAiConfig::default();
        assert_eq!(openai.text_models(), TextModels::default());
        assert_eq!(openai.model_in_use(), None);

        openai.model = Some("gpt-4.1".to_string());
        let models = openai.text_models();
        assert_eq!(models.story, "gpt-4.1");
        assert_eq!(models.misc, "gpt-4.1");
        assert_eq!(models.extract, "gpt-3.5-turbo");

        openai.model_story = Some("gpt-4o".to_string());
        assert_eq!(openai.text_models().story, "gpt-4o");
        assert_eq!(openai.model_in_use().as_deref(), Some("gpt-4o"));
    }

    #[test]
    fn test_lyrics_model_prefers_story_over_generic() {
        let mut openai = OpenAiConfig {
            model: Some("gpt-4.1".to_string()),
            model_story: Some("gpt-4o-story".to_string()),
            ..Default::default()
        };
        let models = openai.text_models();
        assert_eq!(models.lyrics, "gpt-4o-story");
        assert_eq!(models.misc, "gpt-4.1");

        openai.model_misc = Some("gpt-4o-mini".to_string());
        let models = openai.text_models();
        assert_eq!(models.lyrics, "gpt-4o-mini");
        assert_eq!(models.misc, "gpt-4o-mini");

        openai.model_misc = Some(String::new());
        assert_eq!(openai.text_models().lyrics, "gpt-4o-story");
    }

    #[test]
    fn test_cors_origins_from_comma_string() {
        let cors: CorsConfig =
            serde_json::from_value(serde_json::json!({"origins": "https://a.app, https://b.app,"}))
                .unwrap();
        assert_eq!(cors.origins, vec!["https://a.app", "https://b.app"]);
    }
}
