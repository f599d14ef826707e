//! Application state.

use std::sync::Arc;

use tracing::info;

use reel_jobs::{BackupStore, FfmpegComposer, JobStore, Orchestrator, Publisher, ReelsPublisher, RemoteMirror};
use reel_publish::{PublishConfig, ReelsClient};
use reel_storage::BackupClient;

use crate::config::ApiConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub store: Arc<JobStore>,
    pub orchestrator: Orchestrator,
    pub backup: Option<Arc<BackupClient>>,
}

impl AppState {
    /// Create new application state.
    ///
    /// Backup and publish are both optional integrations: when their
    /// credentials are absent the corresponding stage reports itself as
    /// skipped instead of blocking startup.
    pub async fn new(config: ApiConfig) -> Result<Self, Box<dyn std::error::Error>> {
        tokio::fs::create_dir_all(&config.upload_dir).await?;
        tokio::fs::create_dir_all(&config.output_dir).await?;

        reel_media::check_ffmpeg()?;
        reel_media::check_ffprobe()?;

        let store = Arc::new(JobStore::new());
        let composer = Arc::new(FfmpegComposer::new(
            &config.output_dir,
            config.encode_timeout_secs,
        ));

        let backup = match BackupClient::from_env() {
            Ok(client) => Some(Arc::new(client)),
            Err(e) => {
                info!("Backup mirror not configured: {}", e);
                None
            }
        };
        let backup_stage: Option<Arc<dyn BackupStore>> = backup
            .as_ref()
            .map(|c| Arc::new(RemoteMirror::new((**c).clone())) as Arc<dyn BackupStore>);

        let publisher: Option<Arc<dyn Publisher>> = match PublishConfig::from_env() {
            Ok(publish_config) => {
                let client = ReelsClient::new(publish_config)?;
                Some(Arc::new(ReelsPublisher::new(client)))
            }
            Err(e) => {
                info!("Publisher not configured: {}", e);
                None
            }
        };

        let orchestrator = Orchestrator::new(Arc::clone(&store), composer)
            .with_backup(backup_stage)
            .with_publisher(publisher)
            .with_public_video_base(config.public_video_base.clone());

        Ok(Self {
            config,
            store,
            orchestrator,
            backup,
        })
    }
}
