//! Job Queries

use serde::Serialize;

use crate::domain::job::{Job, JobInput, JobStatus};

/// 查询任务状态
#[derive(Debug, Clone)]
pub struct GetJobStatus {
    pub job_id: String,
}

/// 对外的任务视图
///
/// 不包含输入文本和原始上游载荷
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobView {
    #[serde(rename = "jobId")]
    pub job_id: String,
    pub status: JobStatus,
    /// 语音任务使用 `tts_provider`，其余使用 `provider`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tts_provider: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice_id: Option<String>,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
    #[serde(rename = "audioUrl", skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
    #[serde(rename = "imageUrl", skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<&Job> for JobView {
    fn from(job: &Job) -> Self {
        let (tts_provider, provider, voice_id) = match job.input() {
            JobInput::Speech(input) => (
                Some(job.provider().to_string()),
                None,
                Some(input.voice_id.clone()),
            ),
            JobInput::Image(_) | JobInput::Music(_) => {
                (None, Some(job.provider().to_string()), None)
            }
        };
        let result = job.result().map(str::to_string);
        let (audio_url, image_url) = match job.input() {
            JobInput::Image(_) => (None, result),
            JobInput::Speech(_) | JobInput::Music(_) => (result, None),
        };

        Self {
            job_id: job.id().to_string(),
            status: job.status(),
            tts_provider,
            provider,
            voice_id,
            created_at: job.created_at().to_rfc3339(),
            completed_at: job.completed_at().map(|t| t.to_rfc3339()),
            audio_url,
            image_url,
            error: job.error().map(str::to_string),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::job::{ImageInput, SpeechInput};

    #[test]
    fn test_speech_view_hides_text() {
        let mut job = Job::new(
            JobInput::Speech(SpeechInput {
                text: "a secret bedtime story".to_string(),
                voice_id: "v1".to_string(),
            }),
            "elevenlabs",
        );
        job.complete("data:audio/mpeg;base64,AA".to_string()).unwrap();

        let value = serde_json::to_value(JobView::from(&job)).unwrap();
        assert_eq!(value["status"], "completed");
        assert_eq!(value["tts_provider"], "elevenlabs");
        assert_eq!(value["voice_id"], "v1");
        assert_eq!(value["audioUrl"], "data:audio/mpeg;base64,AA");
        assert!(value.get("error").is_none());
        assert!(!value.to_string().contains("secret"));
    }

    #[test]
    fn test_image_view_uses_image_url() {
        let mut job = Job::new(JobInput::Image(ImageInput::from_prompt("castle")), "replicate-image");
        let processing = serde_json::to_value(JobView::from(&job)).unwrap();
        assert_eq!(processing["status"], "processing");
        assert!(processing.get("completed_at").is_none());

        job.fail("Prediction failed: nsfw".to_string()).unwrap();
        let value = serde_json::to_value(JobView::from(&job)).unwrap();
        assert_eq!(value["provider"], "replicate-image");
        assert_eq!(value["error"], "Prediction failed: nsfw");
        assert!(value.get("imageUrl").is_none());
    }
}
