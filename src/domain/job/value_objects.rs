//! Job Context - Value Objects

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::JobError;

/// 任务唯一标识
///
/// 格式: `{prefix}_{毫秒时间戳}_{9 位随机后缀}`，例如 `tts_1718000000000_3f9a1c2b7`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    pub fn generate(prefix: &str) -> Self {
        let suffix: String = Uuid::new_v4().simple().to_string().chars().take(9).collect();
        Self(format!(
            "{}_{}_{}",
            prefix,
            Utc::now().timestamp_millis(),
            suffix
        ))
    }

    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 任务状态
///
/// 状态机: `processing -> completed | failed`，终态不可再变更
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub const TERMINAL: [JobStatus; 2] = [JobStatus::Completed, JobStatus::Failed];

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobStatus::Processing)
    }
}

impl std::str::FromStr for JobStatus {
    type Err = JobError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "processing" => Ok(JobStatus::Processing),
            "completed" => Ok(JobStatus::Completed),
            "failed" => Ok(JobStatus::Failed),
            _ => Err(JobError::UnknownStatus(s.to_string())),
        }
    }
}

/// 任务类别（决定 ID 前缀和结果字段名）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobKind {
    Speech,
    Image,
    Music,
}

impl JobKind {
    pub fn id_prefix(&self) -> &'static str {
        match self {
            JobKind::Speech => "tts",
            JobKind::Image => "img",
            JobKind::Music => "music",
        }
    }
}

/// 语音合成输入
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeechInput {
    pub text: String,
    pub voice_id: String,
}

/// 图像生成输入
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageInput {
    pub prompt: String,
    /// 参考图（封面生成使用：角色图、世界图）
    #[serde(default)]
    pub reference_images: Vec<String>,
    #[serde(default)]
    pub aspect_ratio: Option<String>,
}

impl ImageInput {
    pub fn from_prompt(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            reference_images: Vec::new(),
            aspect_ratio: None,
        }
    }
}

pub const DEFAULT_MUSIC_STYLE: &str = "storybook, whimsical, kid-friendly, orchestral-lite, loopable";
pub const MIN_MUSIC_SECONDS: f64 = 5.0;
pub const MAX_MUSIC_SECONDS: f64 = 30.0;
pub const DEFAULT_MUSIC_SECONDS: f64 = 12.0;

/// 把请求时长限制在 `[min, max]`，小数保留；缺省、0 或非有限值取 `default`
pub fn clamp_seconds(requested: Option<f64>, min: f64, max: f64, default: f64) -> f64 {
    match requested {
        Some(secs) if secs.is_finite() && secs != 0.0 => secs.max(min).min(max),
        _ => default,
    }
}

/// 主题曲生成输入
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MusicInput {
    pub prompt: String,
    pub duration_seconds: f64,
    pub style: String,
    pub looped: bool,
    /// "lyrics" 表示带人声歌词，其余视为纯音乐
    pub vocals_style: String,
    #[serde(default)]
    pub lyrics: String,
}

impl MusicInput {
    /// 时长限制在 5..=30 秒
    pub fn clamp_duration(requested: Option<f64>) -> f64 {
        clamp_seconds(
            requested,
            MIN_MUSIC_SECONDS,
            MAX_MUSIC_SECONDS,
            DEFAULT_MUSIC_SECONDS,
        )
    }

    pub fn wants_vocals(&self) -> bool {
        self.vocals_style == "lyrics"
    }

    /// 面向供应商的自然语言描述
    pub fn descriptive_prompt(&self) -> String {
        let mut parts = vec![self.prompt.trim().to_string()];
        if !self.style.is_empty() {
            parts.push(format!("in a {} style", self.style));
        }
        if self.looped {
            parts.push("designed to loop cleanly".to_string());
        }
        parts.push(format!("lasting about {} seconds", self.duration_seconds));
        if self.wants_vocals() {
            parts.push("featuring gentle, kid-safe vocals and original lyrics".to_string());
        } else {
            parts.push("instrumental or very soft wordless vocals".to_string());
        }
        parts.join(". ")
    }
}

/// 任务输入（重试或执行时需要的原始请求）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum JobInput {
    Speech(SpeechInput),
    Image(ImageInput),
    Music(MusicInput),
}

impl JobInput {
    pub fn kind(&self) -> JobKind {
        match self {
            JobInput::Speech(_) => JobKind::Speech,
            JobInput::Image(_) => JobKind::Image,
            JobInput::Music(_) => JobKind::Music,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_id_format() {
        let id = JobId::generate("tts");
        let parts: Vec<&str> = id.as_str().split('_').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "tts");
        assert!(parts[1].parse::<i64>().is_ok());
        assert_eq!(parts[2].len(), 9);
    }

    #[test]
    fn test_job_ids_differ() {
        assert_ne!(JobId::generate("tts"), JobId::generate("tts"));
    }

    #[test]
    fn test_status_roundtrip_str() {
        for status in [JobStatus::Processing, JobStatus::Completed, JobStatus::Failed] {
            assert_eq!(status.as_str().parse::<JobStatus>().ok(), Some(status));
        }
        assert!(matches!(
            "ready".parse::<JobStatus>(),
            Err(JobError::UnknownStatus(ref s)) if s == "ready"
        ));
        assert!(!JobStatus::Processing.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
    }

    #[test]
    fn test_music_duration_clamp() {
        assert_eq!(MusicInput::clamp_duration(None), 12.0);
        assert_eq!(MusicInput::clamp_duration(Some(0.0)), 12.0);
        assert_eq!(MusicInput::clamp_duration(Some(f64::NAN)), 12.0);
        assert_eq!(MusicInput::clamp_duration(Some(2.0)), 5.0);
        assert_eq!(MusicInput::clamp_duration(Some(-4.0)), 5.0);
        assert_eq!(MusicInput::clamp_duration(Some(60.0)), 30.0);
        assert_eq!(MusicInput::clamp_duration(Some(15.4)), 15.4);
    }

    #[test]
    fn test_music_prompt_parts() {
        let input = MusicInput {
            prompt: "A brave fox".to_string(),
            duration_seconds: 10.0,
            style: "jazzy".to_string(),
            looped: true,
            vocals_style: "lyrics".to_string(),
            lyrics: String::new(),
        };
        assert_eq!(
            input.descriptive_prompt(),
            "A brave fox. in a jazzy style. designed to loop cleanly. lasting about 10 seconds. \
             featuring gentle, kid-safe vocals and original lyrics"
        );
    }

    #[test]
    fn test_input_serde_tagged() {
        let input = JobInput::Speech(SpeechInput {
            text: "Hello".to_string(),
            voice_id: "v1".to_string(),
        });
        let json = serde_json::to_value(&input).unwrap();
        assert_eq!(json["kind"], "speech");
        let back: JobInput = serde_json::from_value(json).unwrap();
        assert_eq!(back, input);
    }
}
