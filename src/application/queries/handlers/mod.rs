//! Query Handlers 实现

mod job_status_handler;

pub use job_status_handler::*;
