//! 应用层 - 命令（写操作）
//!
//! CQRS 命令侧：任务编排、文本生成、媒体生成

mod job_commands;
mod media_commands;
mod text_commands;

pub mod handlers;

pub use job_commands::*;
pub use media_commands::*;
pub use text_commands::*;
