//! Bounded Retry
//!
//! 有上限的重试，按错误分类谓词决定是否重试，线性退避

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// 首次调用之外的最大重试次数
    pub max_retries: u32,
    /// 第 n 次重试前等待 `base_delay * n`
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            base_delay: Duration::ZERO,
        }
    }
}

pub async fn retry_bounded<T, E, F, Fut, P>(
    policy: &RetryPolicy,
    should_retry: P,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
    E: Display,
{
    let mut retries = 0;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) if retries < policy.max_retries && should_retry(&err) => {
                retries += 1;
                tracing::warn!(
                    retry = retries,
                    max_retries = policy.max_retries,
                    error = %err,
                    "Retrying upstream call"
                );
                tokio::time::sleep(policy.base_delay * retries).await;
            }
            Err(err) => return Err(err),
        }
    }
}
