//! Command Handlers 实现
//!
//! 所有 CommandHandler 的具体实现

mod job_handlers;
mod media_handlers;
mod text_handlers;

pub use job_handlers::*;
pub use media_handlers::*;
pub use text_handlers::*;
