//! Poller - submit + 固定间隔轮询
//!
//! 同步供应商在 submit 时直接完成；异步供应商按固定间隔轮询，超过次数上限返回 `Timeout`

use std::time::Duration;

use crate::application::ports::{
    PollOutcome, Submission, SubmissionHandle, UpstreamAdapterPort, UpstreamError,
};
use crate::domain::job::JobInput;

/// 轮询策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            max_attempts: 30,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Poller {
    policy: PollPolicy,
}

impl Poller {
    pub fn new(policy: PollPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> PollPolicy {
        self.policy
    }

    /// 执行一次完整的上游调用，返回规范化后的 URL / data URI
    pub async fn run(
        &self,
        adapter: &dyn UpstreamAdapterPort,
        input: &JobInput,
    ) -> Result<String, UpstreamError> {
        match adapter.submit(input).await? {
            Submission::Completed(output) => non_empty(adapter.name(), output),
            Submission::Pending(handle) => {
                tracing::debug!(
                    provider = %adapter.name(),
                    handle = %handle.id,
                    "Submission pending, start polling"
                );
                self.wait(adapter, &handle).await
            }
        }
    }

    async fn wait(
        &self,
        adapter: &dyn UpstreamAdapterPort,
        handle: &SubmissionHandle,
    ) -> Result<String, UpstreamError> {
        for attempt in 1..=self.policy.max_attempts {
            tokio::time::sleep(self.policy.interval).await;

            match adapter.poll(handle).await? {
                PollOutcome::Pending => {
                    tracing::trace!(handle = %handle.id, attempt, "Still pending");
                }
                PollOutcome::Succeeded(output) => {
                    tracing::debug!(handle = %handle.id, attempt, "Prediction succeeded");
                    return non_empty(adapter.name(), output);
                }
                PollOutcome::Failed(reason) => {
                    tracing::warn!(handle = %handle.id, attempt, reason = %reason, "Prediction failed");
                    return Err(UpstreamError::PredictionFailed(reason));
                }
            }
        }

        tracing::warn!(
            provider = %adapter.name(),
            handle = %handle.id,
            attempts = self.policy.max_attempts,
            "Polling budget exhausted"
        );
        Err(UpstreamError::Timeout {
            attempts: self.policy.max_attempts,
        })
    }
}

fn non_empty(provider: &str, output: String) -> Result<String, UpstreamError> {
    if output.trim().is_empty() {
        return Err(UpstreamError::InvalidOutput(format!(
            "{} returned an empty result",
            provider
        )));
    }
    Ok(output)
}
