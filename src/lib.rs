//! Storyloom - 儿童故事应用的 AI 代理服务
//!
//! 架构设计: DDD + CQRS + Hexagonal Architecture
//!
//! 领域层 (domain/):
//! - Job: 上游任务聚合（processing -> completed | failed）
//! - Prompts: 提示词与模型输出整理
//!
//! 应用层 (application/):
//! - Ports: 端口定义（JobStore, UpstreamAdapter, TextGeneration, SpeechSynthesis）
//! - Commands: 任务编排、文本/媒体生成
//! - Queries: 任务状态查询
//!
//! 基础设施层 (infrastructure/):
//! - HTTP: `/api` JSON 端点
//! - Memory / Persistence: 内存与 SQLite 任务存储
//! - Worker: JobWorker 后台执行，JobSweeper 定期清理
//! - Adapters: OpenAI, ElevenLabs, Google TTS, Replicate 客户端

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::{load_config, AppConfig};
