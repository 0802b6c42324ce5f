//! Replicate Prediction Client
//!
//! POST {base_url}/v1/predictions  {"version", "input"}   Authorization: Token ...
//! GET  {urls.get}                 轮询直到 succeeded / failed / canceled
//!
//! 每个注册表供应商（image / world / cover / music）是一个实例，区别在模型版本和 input 结构

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::application::ports::{
    normalize_output, PollOutcome, Submission, SubmissionHandle, UpstreamAdapterPort,
    UpstreamError,
};
use crate::domain::job::{ImageInput, JobInput, MusicInput};
use crate::infrastructure::adapters::http_support::{
    build_client, ensure_success, require_setting, trim_base_url,
};

pub const DEFAULT_IMAGE_VERSION: &str =
    "70e52dbcff0149b38a2d1006427c5d35471e90010b1355220e40574fbef306fb";

/// 模型的 input 结构
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputStyle {
    /// HiDream 通用图像
    HiDream,
    /// 只需要 prompt
    Plain,
    /// 角色图 + 世界图合成封面
    Cover,
    /// 音乐生成
    Music,
}

/// 一个 Replicate 模型对应的供应商
#[derive(Debug, Clone)]
pub struct ReplicateModel {
    pub provider: &'static str,
    pub version: Option<String>,
    /// 缺失版本时报告的配置名
    pub version_setting: &'static str,
    pub style: InputStyle,
}

impl ReplicateModel {
    pub fn image(version: Option<String>) -> Self {
        Self {
            provider: "replicate-image",
            version: version.or_else(|| Some(DEFAULT_IMAGE_VERSION.to_string())),
            version_setting: "REPLICATE_MODEL_VERSION",
            style: InputStyle::HiDream,
        }
    }

    pub fn world(version: Option<String>) -> Self {
        Self {
            provider: "replicate-world",
            version,
            version_setting: "REPLICATE_MODEL_VERSION_WORLD",
            style: InputStyle::Plain,
        }
    }

    pub fn cover(version: Option<String>) -> Self {
        Self {
            provider: "replicate-cover",
            version,
            version_setting: "REPLICATE_MODEL_VERSION_COVER",
            style: InputStyle::Cover,
        }
    }

    pub fn music(version: Option<String>) -> Self {
        Self {
            provider: "replicate-music",
            version,
            version_setting: "REPLICATE_MODEL_VERSION_MUSIC",
            style: InputStyle::Music,
        }
    }

    /// 按模型构造 input
    fn build_input(&self, input: &JobInput) -> Result<Value, UpstreamError> {
        match (self.style, input) {
            (InputStyle::HiDream, JobInput::Image(image)) => Ok(json!({
                "prompt": image.prompt,
                "seed": 1,
                "model_type": "full",
                "resolution": "1024x1024",
                "speed_mode": "juiced",
                "output_format": "webp",
                "output_quality": 80,
            })),
            (InputStyle::Plain, JobInput::Image(image)) => Ok(json!({ "prompt": image.prompt })),
            (InputStyle::Cover, JobInput::Image(image)) => self.cover_input(image),
            (InputStyle::Music, JobInput::Music(music)) => Ok(music_input(music)),
            (_, other) => Err(UpstreamError::UnsupportedInput {
                provider: self.provider,
                message: format!("cannot build model input from {:?}", other.kind()),
            }),
        }
    }

    fn cover_input(&self, image: &ImageInput) -> Result<Value, UpstreamError> {
        let [character, world] = image.reference_images.as_slice() else {
            return Err(UpstreamError::UnsupportedInput {
                provider: self.provider,
                message: "cover needs exactly two reference images".to_string(),
            });
        };
        Ok(json!({
            "prompt": image.prompt,
            "input_image_1": character,
            "input_image_2": world,
            "aspect_ratio": image.aspect_ratio.as_deref().unwrap_or("3:4"),
        }))
    }
}

fn music_input(music: &MusicInput) -> Value {
    json!({
        "prompt": music.descriptive_prompt(),
        "duration": music.duration_seconds,
        "output_format": "mp3",
    })
}

#[derive(Debug, Deserialize)]
struct PredictionResponse {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    output: Value,
    #[serde(default)]
    error: Value,
    #[serde(default)]
    urls: Option<PredictionUrls>,
}

#[derive(Debug, Deserialize)]
struct PredictionUrls {
    #[serde(default)]
    get: Option<String>,
}

impl PredictionResponse {
    /// 解析预测状态：终态返回结果，否则 Pending
    fn outcome(&self) -> Result<PollOutcome, UpstreamError> {
        match self.status.as_deref() {
            Some("succeeded") => normalize_output(&self.output).map(PollOutcome::Succeeded),
            Some("failed") | Some("canceled") => Ok(PollOutcome::Failed(self.failure_reason())),
            _ => Ok(PollOutcome::Pending),
        }
    }

    fn failure_reason(&self) -> String {
        match &self.error {
            Value::String(s) if !s.is_empty() => s.clone(),
            Value::Null => format!(
                "prediction {}",
                self.status.as_deref().unwrap_or("failed")
            ),
            other => other.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReplicateConfig {
    pub base_url: String,
    pub api_token: Option<String>,
    pub timeout_secs: u64,
}

impl Default for ReplicateConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.replicate.com".to_string(),
            api_token: None,
            timeout_secs: 30,
        }
    }
}

pub struct ReplicatePredictionClient {
    client: Client,
    config: ReplicateConfig,
    model: ReplicateModel,
}

impl ReplicatePredictionClient {
    pub fn new(config: ReplicateConfig, model: ReplicateModel) -> Result<Self, UpstreamError> {
        let client = build_client(config.timeout_secs)?;
        Ok(Self::with_client(client, config, model))
    }

    /// 多个模型共享同一个 reqwest 连接池
    pub fn with_client(client: Client, config: ReplicateConfig, model: ReplicateModel) -> Self {
        Self {
            client,
            config,
            model,
        }
    }

    fn predictions_url(&self) -> String {
        format!("{}/v1/predictions", trim_base_url(&self.config.base_url))
    }

    fn token(&self) -> Result<String, UpstreamError> {
        require_setting(&self.config.api_token, "REPLICATE_API_TOKEN").map(|t| format!("Token {}", t))
    }
}

#[async_trait]
impl UpstreamAdapterPort for ReplicatePredictionClient {
    fn name(&self) -> &'static str {
        self.model.provider
    }

    async fn submit(&self, input: &JobInput) -> Result<Submission, UpstreamError> {
        let model_input = self.model.build_input(input)?;
        let token = self.token()?;
        let version = require_setting(&self.model.version, self.model.version_setting)?;

        tracing::debug!(provider = %self.model.provider, version = %version, "Creating Replicate prediction");

        let response = self
            .client
            .post(self.predictions_url())
            .header(reqwest::header::AUTHORIZATION, token)
            .json(&json!({ "version": version, "input": model_input }))
            .send()
            .await
            .map_err(UpstreamError::from_reqwest)?;
        let response = ensure_success(self.model.provider, response).await?;

        let prediction: PredictionResponse = response.json().await.map_err(|e| {
            UpstreamError::InvalidOutput(format!("malformed prediction response: {}", e))
        })?;
        into_submission(prediction)
    }

    async fn poll(&self, handle: &SubmissionHandle) -> Result<PollOutcome, UpstreamError> {
        let response = self
            .client
            .get(&handle.poll_url)
            .header(reqwest::header::AUTHORIZATION, self.token()?)
            .send()
            .await
            .map_err(UpstreamError::from_reqwest)?;
        let response = ensure_success(self.model.provider, response).await?;

        let prediction: PredictionResponse = response.json().await.map_err(|e| {
            UpstreamError::InvalidOutput(format!("malformed prediction response: {}", e))
        })?;
        prediction.outcome()
    }
}

/// 创建响应可能已经是终态（同步模型），否则需要 urls.get 轮询
fn into_submission(prediction: PredictionResponse) -> Result<Submission, UpstreamError> {
    match prediction.outcome()? {
        PollOutcome::Succeeded(url) => Ok(Submission::Completed(url)),
        PollOutcome::Failed(reason) => Err(UpstreamError::PredictionFailed(reason)),
        PollOutcome::Pending => {
            let poll_url = prediction
                .urls
                .and_then(|u| u.get)
                .filter(|u| !u.is_empty())
                .ok_or_else(|| {
                    UpstreamError::InvalidOutput(
                        "Unexpected Replicate response (missing prediction URL)".to_string(),
                    )
                })?;
            Ok(Submission::Pending(SubmissionHandle {
                id: prediction.id.unwrap_or_else(|| poll_url.clone()),
                poll_url,
            }))
        }
    }
}
