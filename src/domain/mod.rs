//! Domain Layer - 领域层
//!
//! 包含:
//! - Job Context: 上游任务（语音、图像、音乐）的生命周期
//! - prompts: 文本生成提示词与歌词规划

pub mod job;
pub mod prompts;
