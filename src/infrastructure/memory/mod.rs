//! Memory Layer - In-Memory State Management
//!
//! 进程内的任务记录存储

mod job_store;

pub use job_store::InMemoryJobStore;
