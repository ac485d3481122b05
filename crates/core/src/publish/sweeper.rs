//! Abandoned-draft sweeper.
//!
//! A handle that is registered but never finalized would otherwise leak
//! forever, along with every asset staged under it. The sweeper expires
//! handles past their TTL and reclaims their staged uploads.

use std::sync::Arc;

use chrono::Utc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::asset::{AssetRepository, AssetStore, ReclaimQueue};
use crate::draft::DraftRegistry;
use crate::storage::BlobStore;

/// Expires abandoned draft handles and reclaims their staged assets.
pub struct DraftSweeper<B, R, D>
where
    B: BlobStore,
    R: AssetRepository,
    D: DraftRegistry,
{
    registry: Arc<D>,
    assets: Arc<AssetStore<B, R>>,
    reclaim: Arc<ReclaimQueue>,
    ttl: chrono::Duration,
}

impl<B, R, D> DraftSweeper<B, R, D>
where
    B: BlobStore + 'static,
    R: AssetRepository + 'static,
    D: DraftRegistry + 'static,
{
    /// Create a new sweeper.
    #[must_use]
    pub fn new(
        registry: Arc<D>,
        assets: Arc<AssetStore<B, R>>,
        reclaim: Arc<ReclaimQueue>,
        ttl: chrono::Duration,
    ) -> Self {
        Self {
            registry,
            assets,
            reclaim,
            ttl,
        }
    }

    /// Run one sweep pass; returns the number of handles expired.
    pub async fn sweep_once(&self) -> u64 {
        let expired = self.registry.expired(self.ttl, Utc::now());
        let mut swept = 0u64;

        for (handle, owner) in expired {
            self.registry.release(handle);
            swept += 1;

            let staged = match self.assets.list_staged(handle).await {
                Ok(assets) => assets,
                Err(e) => {
                    warn!(%handle, error = %e, "failed to list staged assets for expired draft");
                    continue;
                }
            };

            let count = staged.len();
            for asset in staged {
                match self.assets.delete(&asset).await {
                    Ok(_) => {}
                    Err(e) => {
                        warn!(asset_id = %asset.id, error = %e, "staged asset delete failed, queued for retry");
                        self.reclaim.push(asset);
                    }
                }
            }

            info!(%handle, owner = %owner, staged_assets = count, "expired draft reclaimed");
        }

        swept
    }

    /// Spawn the periodic sweep task.
    pub fn spawn(self, every: std::time::Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                self.sweep_once().await;
            }
        })
    }
}
