use crate::domain::commission::Commission;
use crate::domain::money::Money;
use crate::domain::package::{Package, PackageId};
use crate::domain::purchase::{ActorId, Purchase, PurchaseId, PurchaseStatus, WalletId};
use crate::domain::schedule::BenefitSchedule;
use crate::domain::user::{User, UserId};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Package counter increments applied alongside an activation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PackageStatsDelta {
    pub package: PackageId,
    pub revenue: Money,
}

/// Everything one operator action writes, applied by [`Ledger::commit`] as a
/// single atomic unit with exactly one commit point.
#[derive(Debug, Clone)]
pub struct WriteBatch {
    /// Status the purchase must still hold at commit time. A concurrent
    /// writer that got there first makes the commit report
    /// [`CommitOutcome::StaleStatus`] instead of applying anything.
    pub expected_status: PurchaseStatus,
    pub purchase: Purchase,
    pub commissions: Vec<Commission>,
    pub schedule: Option<BenefitSchedule>,
    pub package_stats: Option<PackageStatsDelta>,
    pub release_wallet: Option<WalletId>,
}

impl WriteBatch {
    pub fn transition(expected_status: PurchaseStatus, purchase: Purchase) -> Self {
        Self {
            expected_status,
            purchase,
            commissions: Vec::new(),
            schedule: None,
            package_stats: None,
            release_wallet: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    Committed,
    /// The compare-and-set failed; carries the status the store observed.
    StaleStatus(PurchaseStatus),
}

/// Read side plus the single atomic write entry point.
///
/// Reads outside `commit` see only committed state; `commit` makes the whole
/// batch visible at once or not at all.
#[async_trait]
pub trait Ledger: Send + Sync {
    async fn purchase(&self, id: PurchaseId) -> Result<Option<Purchase>>;
    async fn user(&self, id: UserId) -> Result<Option<User>>;
    async fn package(&self, id: PackageId) -> Result<Option<Package>>;
    /// Count of this buyer's own purchases that reached `Active`.
    async fn completed_purchases(&self, buyer: UserId) -> Result<u64>;
    async fn commissions_for(&self, purchase: PurchaseId) -> Result<Vec<Commission>>;
    async fn schedule_for(&self, purchase: PurchaseId) -> Result<Option<BenefitSchedule>>;
    async fn commit(&self, batch: WriteBatch) -> Result<CommitOutcome>;
}

/// Post-commit event for the realtime fan-out collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusChanged {
    pub purchase_id: PurchaseId,
    pub old_status: PurchaseStatus,
    pub new_status: PurchaseStatus,
}

/// Receives before/after purchase snapshots after a successful commit.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(&self, before: &Purchase, after: &Purchase) -> Result<()>;
}

/// Drops stale aggregate views keyed by the involved identities.
#[async_trait]
pub trait CacheInvalidator: Send + Sync {
    async fn invalidate(&self, buyer: UserId, actor: ActorId) -> Result<()>;
}

/// Best-effort realtime notification; errors are logged, never propagated.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn status_changed(&self, event: StatusChanged) -> Result<()>;
}

pub type LedgerBox = Arc<dyn Ledger>;
pub type AuditSinkBox = Arc<dyn AuditSink>;
pub type CacheInvalidatorBox = Arc<dyn CacheInvalidator>;
pub type NotifierBox = Arc<dyn Notifier>;
