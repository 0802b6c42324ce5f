//! Job Sweeper - 定期清理过期任务记录

use std::sync::Arc;
use std::time::Duration;

use crate::application::ports::JobStorePort;
use crate::domain::job::JobStatus;

pub struct JobSweeper {
    store: Arc<dyn JobStorePort>,
    interval: Duration,
    retention: Duration,
}

impl JobSweeper {
    pub fn new(store: Arc<dyn JobStorePort>, interval: Duration, retention: Duration) -> Self {
        Self {
            store,
            interval,
            retention,
        }
    }

    /// 按固定间隔清理终态且超过保留时长的记录，永不返回
    pub async fn run(self) {
        tracing::info!(
            backend = self.store.backend_name(),
            interval_secs = self.interval.as_secs(),
            retention_secs = self.retention.as_secs(),
            "JobSweeper started"
        );

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // 第一次 tick 立即返回，跳过
        ticker.tick().await;

        loop {
            ticker.tick().await;
            self.sweep_once().await;
        }
    }

    pub async fn sweep_once(&self) -> usize {
        match self
            .store
            .sweep_older_than(self.retention, &JobStatus::TERMINAL)
            .await
        {
            Ok(removed) => {
                if removed > 0 {
                    tracing::info!(removed, "Expired jobs swept");
                }
                removed
            }
            Err(e) => {
                tracing::warn!(error = %e, "Periodic job sweep failed");
                0
            }
        }
    }
}
