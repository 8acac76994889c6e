//! Application state.

use std::sync::Arc;

use firecast_azuracast::{AzuraCastClient, AzuraCastConfig};
use firecast_queue::{JobQueue, MemoryStore, QueueConfig};
use tracing::{info, warn};

use crate::config::{ApiConfig, QueueBackend};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub queue: Arc<JobQueue>,
    /// Absent when AzuraCast credentials are not configured
    pub azuracast: Option<Arc<AzuraCastClient>>,
}

impl AppState {
    /// Create new application state.
    pub async fn new(config: ApiConfig) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let queue_config = QueueConfig::from_env();
        let queue = match config.queue_backend {
            QueueBackend::Redis => JobQueue::connect(queue_config).await?,
            QueueBackend::Memory => {
                warn!("Using in-memory queue store; jobs are lost on restart");
                JobQueue::new(Arc::new(MemoryStore::new()), queue_config)
            }
        };

        let azuracast_config = AzuraCastConfig::from_env();
        let azuracast = if azuracast_config.is_configured() {
            info!("AzuraCast playlists enabled for {}", azuracast_config.domain);
            Some(Arc::new(AzuraCastClient::new(azuracast_config)?))
        } else {
            warn!("AZURACAST_DOMAIN or AZURACAST_API_KEY not set, /playlists is disabled");
            None
        };

        Ok(Self::with_parts(config, queue, azuracast))
    }

    /// Assemble state from already-built parts.
    pub fn with_parts(
        config: ApiConfig,
        queue: JobQueue,
        azuracast: Option<Arc<AzuraCastClient>>,
    ) -> Self {
        Self {
            config,
            queue: Arc::new(queue),
            azuracast,
        }
    }
}
