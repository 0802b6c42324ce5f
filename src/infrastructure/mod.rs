//! Infrastructure Layer - 基础设施层
//!
//! 提供所有端口的具体实现

pub mod adapters;
pub mod http;
pub mod memory;
pub mod persistence;
pub mod worker;

pub use memory::InMemoryJobStore;
pub use persistence::SqliteJobStore;
pub use worker::{JobSweeper, JobWorker, JobWorkerConfig};
