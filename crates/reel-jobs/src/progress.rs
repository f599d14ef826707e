//! Progress coalescing from the encoder into the store.
//!
//! The encoder's callback runs in its own task and must never wait on
//! store I/O. A watch channel keeps only the latest percentage; a
//! forwarder task drains it into the store at whatever pace the store
//! sustains, dropping intermediate values.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

use reel_models::JobId;

use crate::stages::ProgressHook;
use crate::store::JobStore;

/// Create a progress hook for one job plus the forwarder task draining it.
///
/// The forwarder ends when the hook is dropped, or silently when the job
/// has vanished from the store.
pub fn progress_tap(store: Arc<JobStore>, job_id: JobId) -> (ProgressHook, JoinHandle<()>) {
    let (tx, mut rx) = watch::channel(0u8);

    let handle = tokio::spawn(async move {
        while rx.changed().await.is_ok() {
            let pct = *rx.borrow_and_update();
            if store.update(&job_id, |job| job.set_progress(pct)).await.is_err() {
                debug!(job_id = %job_id, "Job vanished mid-encode, dropping progress");
                break;
            }
        }
    });

    let hook: ProgressHook = Arc::new(move |pct: u8| {
        // watch::send only fails when the forwarder is gone
        let _ = tx.send(pct);
    });

    (hook, handle)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use reel_models::{Job, JobInputs};

    use super::*;

    fn test_job() -> Job {
        Job::new(
            JobInputs {
                input_a: PathBuf::from("/tmp/a.mp4"),
                input_b: PathBuf::from("/tmp/b.mp4"),
            },
            None,
            None,
        )
    }

    #[tokio::test]
    async fn test_progress_reaches_store() {
        let store = Arc::new(JobStore::new());
        let id = store.insert(test_job()).await;

        let (hook, handle) = progress_tap(Arc::clone(&store), id.clone());
        hook(30);
        hook(60);
        drop(hook);
        handle.await.unwrap();

        // The latest value always lands; intermediates may coalesce away
        let job = store.get(&id).await.unwrap();
        assert_eq!(job.progress, 60);
    }

    #[tokio::test]
    async fn test_forwarder_stops_when_job_vanishes() {
        let store = Arc::new(JobStore::new());
        let id = store.insert(test_job()).await;
        store.remove(&id).await;

        let (hook, handle) = progress_tap(Arc::clone(&store), id);
        hook(50);
        drop(hook);
        // Must terminate rather than spin on a missing record
        handle.await.unwrap();
    }
}
