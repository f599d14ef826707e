//! Thread-safe in-memory job record store.
//!
//! Single source of truth for status reads. All cross-task mutation goes
//! through `update`, and every read is a deep copy, so callers never
//! observe a partially-updated record.

use std::collections::HashMap;

use tokio::sync::RwLock;

use reel_models::{Job, JobId};

use crate::error::StoreError;

/// In-memory job table.
#[derive(Default)]
pub struct JobStore {
    jobs: RwLock<HashMap<String, Job>>,
}

impl JobStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a freshly created job and return its id.
    pub async fn insert(&self, job: Job) -> JobId {
        let id = job.id.clone();
        self.jobs.write().await.insert(id.as_str().to_string(), job);
        id
    }

    /// Get a snapshot of a job. The clone is the atomicity boundary:
    /// callers never share a reference with a concurrent `update`.
    pub async fn get(&self, id: &JobId) -> Option<Job> {
        self.jobs.read().await.get(id.as_str()).cloned()
    }

    /// Apply an atomic read-modify-write to a job.
    ///
    /// Returns `NotFound` when the id has been evicted; callers must
    /// tolerate this between stages.
    pub async fn update<F>(&self, id: &JobId, mutate: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut Job),
    {
        let mut jobs = self.jobs.write().await;
        match jobs.get_mut(id.as_str()) {
            Some(job) => {
                mutate(job);
                Ok(())
            }
            None => Err(StoreError::NotFound(id.clone())),
        }
    }

    /// Remove a job, returning the evicted record.
    pub async fn remove(&self, id: &JobId) -> Option<Job> {
        self.jobs.write().await.remove(id.as_str())
    }

    /// Ids of all tracked jobs, for cleanup sweeps.
    pub async fn list_ids(&self) -> Vec<JobId> {
        self.jobs
            .read()
            .await
            .keys()
            .map(|k| JobId::from_string(k.clone()))
            .collect()
    }

    /// Number of tracked jobs.
    pub async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }

    /// Whether the store is empty.
    pub async fn is_empty(&self) -> bool {
        self.jobs.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::Arc;

    use reel_models::JobInputs;

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
    async fn test_insert_get_update() {
        let store = JobStore::new();
        let id = store.insert(test_job()).await;

        let snapshot = store.get(&id).await.unwrap();
        assert_eq!(snapshot.progress, 0);

        store
            .update(&id, |job| {
                job.set_progress(42);
                job.message = "working".to_string();
            })
            .await
            .unwrap();

        // Earlier snapshot is unaffected by the update
        assert_eq!(snapshot.progress, 0);
        let fresh = store.get(&id).await.unwrap();
        assert_eq!(fresh.progress, 42);
        assert_eq!(fresh.message, "working");
    }

    #[tokio::test]
    async fn test_update_unknown_id_reports_not_found() {
        let store = JobStore::new();
        let err = store
            .update(&JobId::from_string("missing"), |_| {})
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_snapshots_are_never_torn() {
        let store = Arc::new(JobStore::new());
        let id = store.insert(test_job()).await;

        // Writer updates progress and message together; readers must never
        // see one without the other.
        let writer = {
            let store = Arc::clone(&store);
            let id = id.clone();
            tokio::spawn(async move {
                for i in 1..=100u8 {
                    store
                        .update(&id, |job| {
                            job.progress = i;
                            job.message = i.to_string();
                        })
                        .await
                        .unwrap();
                }
            })
        };

        let reader = {
            let store = Arc::clone(&store);
            let id = id.clone();
            tokio::spawn(async move {
                for _ in 0..200 {
                    let job = store.get(&id).await.unwrap();
                    if job.progress > 0 {
                        assert_eq!(job.message, job.progress.to_string());
                    }
                }
            })
        };

        writer.await.unwrap();
        reader.await.unwrap();
    }

    #[tokio::test]
    async fn test_remove_and_list() {
        let store = JobStore::new();
        let id = store.insert(test_job()).await;
        assert_eq!(store.len().await, 1);
        assert_eq!(store.list_ids().await, vec![id.clone()]);

        assert!(store.remove(&id).await.is_some());
        assert!(store.is_empty().await);
        assert!(store.get(&id).await.is_none());
    }
}
