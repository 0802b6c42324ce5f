//! Application Ports - 出站端口定义
//!
//! 定义应用层与基础设施层的抽象接口

mod job_store;
mod speech_synthesis;
mod text_generation;
mod upstream;

pub use job_store::{sweep_cutoff, JobStorePort, StoreError};
pub use speech_synthesis::SpeechSynthesisPort;
pub use text_generation::{ChatCompletion, ChatMessage, ChatRequest, ChatRole, TextGenerationPort};
pub use upstream::{
    encode_data_uri, normalize_output, ErrorKind, PollOutcome, Submission, SubmissionHandle,
    UpstreamAdapterPort, UpstreamError,
};
