//! Job Context - 上游任务限界上下文
//!
//! 职责:
//! - 长耗时上游调用（TTS、图像预测、音乐生成）的任务记录
//! - 状态机与终态不变量

mod aggregate;
mod errors;
mod value_objects;

pub use aggregate::{Job, JobOutcome, JobPatch};
pub use errors::JobError;
pub use value_objects::{
    clamp_seconds, ImageInput, JobId, JobInput, JobKind, JobStatus, MusicInput, SpeechInput,
    DEFAULT_MUSIC_SECONDS, DEFAULT_MUSIC_STYLE, MAX_MUSIC_SECONDS, MIN_MUSIC_SECONDS,
};
