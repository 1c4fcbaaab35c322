use crate::domain::ports::{AuditSink, CacheInvalidator, Notifier, StatusChanged};
use crate::domain::purchase::{ActorId, Purchase, PurchaseId, PurchaseStatus};
use crate::domain::user::UserId;
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

/// No-op implementations for deployments where the surrounding system wires
/// its own audit, cache and notification infrastructure.
#[derive(Default, Clone)]
pub struct NoopCollaborators;

#[async_trait]
impl AuditSink for NoopCollaborators {
    async fn record(&self, _before: &Purchase, _after: &Purchase) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
impl CacheInvalidator for NoopCollaborators {
    async fn invalidate(&self, _buyer: UserId, _actor: ActorId) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
impl Notifier for NoopCollaborators {
    async fn status_changed(&self, _event: StatusChanged) -> Result<()> {
        Ok(())
    }
}

/// Audit entry captured by [`RecordingCollaborators`].
#[derive(Debug, Clone, PartialEq)]
pub struct AuditEntry {
    pub purchase: PurchaseId,
    pub before: PurchaseStatus,
    pub after: PurchaseStatus,
}

/// Recording implementations, used by integration tests to observe
/// post-commit fan-out.
#[derive(Default, Clone)]
pub struct RecordingCollaborators {
    pub audits: Arc<RwLock<Vec<AuditEntry>>>,
    pub invalidations: Arc<RwLock<Vec<(UserId, ActorId)>>>,
    pub events: Arc<RwLock<Vec<StatusChanged>>>,
}

#[async_trait]
impl AuditSink for RecordingCollaborators {
    async fn record(&self, before: &Purchase, after: &Purchase) -> Result<()> {
        self.audits.write().await.push(AuditEntry {
            purchase: after.id,
            before: before.status,
            after: after.status,
        });
        Ok(())
    }
}

#[async_trait]
impl CacheInvalidator for RecordingCollaborators {
    async fn invalidate(&self, buyer: UserId, actor: ActorId) -> Result<()> {
        self.invalidations.write().await.push((buyer, actor));
        Ok(())
    }
}

#[async_trait]
impl Notifier for RecordingCollaborators {
    async fn status_changed(&self, event: StatusChanged) -> Result<()> {
        self.events.write().await.push(event);
        Ok(())
    }
}
