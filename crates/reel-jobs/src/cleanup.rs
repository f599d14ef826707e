//! Retention sweeper for terminal jobs.
//!
//! Terminal jobs older than the retention window are evicted from the
//! store and their remaining files removed. An eviction racing a late
//! tail stage surfaces to that stage as `StoreError::NotFound`, which it
//! treats as the benign `JobVanished` outcome.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::interval;
use tracing::{debug, info};

use crate::store::JobStore;

/// Periodic sweep of expired terminal jobs.
pub struct CleanupSweeper {
    store: Arc<JobStore>,
    retention: Duration,
    period: Duration,
}

impl CleanupSweeper {
    /// Create a sweeper with a retention window and sweep period.
    pub fn new(store: Arc<JobStore>, retention: Duration, period: Duration) -> Self {
        Self {
            store,
            retention,
            period,
        }
    }

    /// Run the sweep loop forever. Spawn as a background task.
    pub async fn run(&self) {
        info!(
            retention_secs = self.retention.as_secs(),
            period_secs = self.period.as_secs(),
            "Starting job cleanup sweeper"
        );

        let mut ticker = interval(self.period);
        loop {
            ticker.tick().await;
            let evicted = self.sweep().await;
            if evicted > 0 {
                info!(evicted, "Swept expired jobs");
            }
        }
    }

    /// Run a single sweep cycle; returns the number of evicted jobs.
    pub async fn sweep(&self) -> usize {
        let cutoff = Utc::now()
            - chrono::Duration::from_std(self.retention).unwrap_or(chrono::Duration::zero());

        let mut evicted = 0;
        for id in self.store.list_ids().await {
            let Some(job) = self.store.get(&id).await else {
                continue;
            };

            let expired = job
                .terminal_at
                .map(|t| job.is_terminal() && t < cutoff)
                .unwrap_or(false);
            if !expired {
                continue;
            }

            if let Some(job) = self.store.remove(&id).await {
                debug!(job_id = %id, "Evicting expired job");
                let mut files = Vec::new();
                if let Some(inputs) = &job.inputs {
                    files.push(inputs.input_a.clone());
                    files.push(inputs.input_b.clone());
                }
                if let Some(output) = &job.output {
                    files.push(output.clone());
                }
                for path in files {
                    let _ = tokio::fs::remove_file(path).await;
                }
                evicted += 1;
            }
        }

        evicted
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use reel_models::{Job, JobInputs};

    use super::*;

    fn terminal_job(age_secs: i64) -> Job {
        let mut job = Job::new(
            JobInputs {
                input_a: PathBuf::from("/tmp/nope_a.mp4"),
                input_b: PathBuf::from("/tmp/nope_b.mp4"),
            },
            None,
            None,
        );
        job.complete(PathBuf::from("/tmp/nope_out.mp4"));
        job.terminal_at = Some(Utc::now() - chrono::Duration::seconds(age_secs));
        job
    }

    #[tokio::test]
    async fn test_sweep_evicts_only_expired_terminal_jobs() {
        let store = Arc::new(JobStore::new());
        let expired = store.insert(terminal_job(7200)).await;
        let fresh = store.insert(terminal_job(10)).await;
        let active = store
            .insert(Job::new(
                JobInputs {
                    input_a: PathBuf::from("/tmp/a.mp4"),
                    input_b: PathBuf::from("/tmp/b.mp4"),
                },
                None,
                None,
            ))
            .await;

        let sweeper = CleanupSweeper::new(
            Arc::clone(&store),
            Duration::from_secs(3600),
            Duration::from_secs(3600),
        );

        assert_eq!(sweeper.sweep().await, 1);
        assert!(store.get(&expired).await.is_none());
        assert!(store.get(&fresh).await.is_some());
        assert!(store.get(&active).await.is_some());
    }
}
