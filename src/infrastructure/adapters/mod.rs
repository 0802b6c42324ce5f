//! Infrastructure Adapters
//!
//! 六边形架构的适配器实现：各上游供应商的 HTTP 客户端以及测试替身

pub mod elevenlabs;
pub mod fake;
pub mod google;
pub mod http_support;
pub mod openai;
pub mod replicate;

pub use elevenlabs::*;
pub use fake::*;
pub use google::*;
pub use openai::*;
pub use replicate::*;
