//! Worker Layer - Background Task Processing
//!
//! JobWorker 执行入队的上游任务，JobSweeper 定期清理过期记录

mod job_sweeper;
mod job_worker;

pub use job_sweeper::JobSweeper;
pub use job_worker::{JobWorker, JobWorkerConfig};
