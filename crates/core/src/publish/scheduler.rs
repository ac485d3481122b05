//! Post-commit reconciliation scheduling.
//!
//! Blob-store traffic must never join the database transaction that commits
//! a resource mutation. The orchestrator instead emits a "resource
//! committed" event; a worker task picks it up and runs reconciliation,
//! where every failure is caught and logged.

use driftwood_shared::types::ResourceId;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::types::Post;
use crate::asset::{AssetRepository, TargetKind};
use crate::content::Reconciler;
use crate::storage::BlobStore;

/// Event emitted after a resource mutation has committed.
#[derive(Debug, Clone)]
pub struct CommittedResource {
    /// Asset target kind of the committed resource.
    pub kind: TargetKind,
    /// Resource id.
    pub id: ResourceId,
    /// Content as committed.
    pub content: String,
}

impl From<&Post> for CommittedResource {
    fn from(post: &Post) -> Self {
        Self {
            kind: post.kind.target_kind(),
            id: post.id,
            content: post.content.clone(),
        }
    }
}

/// Sink for committed-resource events.
pub trait ReconcileScheduler: Send + Sync {
    /// Schedules reconciliation for a committed resource. Must not block and
    /// must not fail the caller.
    fn schedule(&self, committed: CommittedResource);
}

/// Production scheduler: hands events to the reconciliation worker over an
/// unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelScheduler {
    tx: mpsc::UnboundedSender<CommittedResource>,
}

impl ChannelScheduler {
    /// Creates the scheduler and the receiving end for the worker.
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<CommittedResource>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl ReconcileScheduler for ChannelScheduler {
    fn schedule(&self, committed: CommittedResource) {
        if self.tx.send(committed).is_err() {
            // Worker gone: the orphan stays until the next reconciliation of
            // the same resource, which is the documented best-effort contract.
            warn!("reconcile worker unavailable, dropping committed-resource event");
        }
    }
}

/// Spawns the reconciliation worker draining committed-resource events.
pub fn spawn_reconcile_worker<B, R>(
    mut rx: mpsc::UnboundedReceiver<CommittedResource>,
    reconciler: Reconciler<B, R>,
) -> JoinHandle<()>
where
    B: BlobStore + 'static,
    R: AssetRepository + 'static,
{
    tokio::spawn(async move {
        while let Some(committed) = rx.recv().await {
            debug!(kind = %committed.kind, resource_id = %committed.id, "reconciling committed resource");
            reconciler
                .reconcile(committed.kind, committed.id, &committed.content)
                .await;
        }
        debug!("reconcile worker stopped");
    })
}
