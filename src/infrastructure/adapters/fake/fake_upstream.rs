//! Fake Upstream Adapter

use async_trait::async_trait;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use crate::application::ports::{
    PollOutcome, Submission, SubmissionHandle, UpstreamAdapterPort, UpstreamError,
};
use crate::domain::job::JobInput;

/// 替身行为
#[derive(Debug, Clone)]
pub enum FakeBehavior {
    /// submit 直接返回结果（同步供应商）
    Immediate(String),
    /// 前 `pending_polls` 次轮询返回 pending，之后成功
    SucceedAfter { pending_polls: u32, output: String },
    /// 前 `pending_polls` 次轮询返回 pending，之后失败
    FailAfter { pending_polls: u32, reason: String },
    /// 永远 pending
    NeverFinishes,
    /// submit 直接报错
    Reject(UpstreamError),
}

/// Fake Upstream Adapter
pub struct FakeUpstreamAdapter {
    name: &'static str,
    behavior: FakeBehavior,
    delay: Duration,
    submits: AtomicU32,
    polls: AtomicU32,
}

impl FakeUpstreamAdapter {
    pub fn new(name: &'static str, behavior: FakeBehavior) -> Self {
        Self {
            name,
            behavior,
            delay: Duration::ZERO,
            submits: AtomicU32::new(0),
            polls: AtomicU32::new(0),
        }
    }

    /// 模拟 submit 耗时
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn submit_count(&self) -> u32 {
        self.submits.load(Ordering::SeqCst)
    }

    pub fn poll_count(&self) -> u32 {
        self.polls.load(Ordering::SeqCst)
    }

    fn pending_handle(&self, n: u32) -> Submission {
        Submission::Pending(SubmissionHandle {
            id: format!("fake-{}-{}", self.name, n),
            poll_url: format!("fake://{}/predictions/{}", self.name, n),
        })
    }
}

#[async_trait]
impl UpstreamAdapterPort for FakeUpstreamAdapter {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn submit(&self, input: &JobInput) -> Result<Submission, UpstreamError> {
        let n = self.submits.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(provider = %self.name, kind = ?input.kind(), "Fake adapter submit");

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        match &self.behavior {
            FakeBehavior::Immediate(output) => Ok(Submission::Completed(output.clone())),
            FakeBehavior::Reject(err) => Err(err.clone()),
            FakeBehavior::SucceedAfter { .. }
            | FakeBehavior::FailAfter { .. }
            | FakeBehavior::NeverFinishes => Ok(self.pending_handle(n)),
        }
    }

    async fn poll(&self, _handle: &SubmissionHandle) -> Result<PollOutcome, UpstreamError> {
        let seen = self.polls.fetch_add(1, Ordering::SeqCst);
        match &self.behavior {
            FakeBehavior::SucceedAfter {
                pending_polls,
                output,
            } if seen >= *pending_polls => Ok(PollOutcome::Succeeded(output.clone())),
            FakeBehavior::FailAfter {
                pending_polls,
                reason,
            } if seen >= *pending_polls => Ok(PollOutcome::Failed(reason.clone())),
            _ => Ok(PollOutcome::Pending),
        }
    }
}
