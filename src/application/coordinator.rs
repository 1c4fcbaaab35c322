use crate::application::idempotency::IdempotencyGuard;
use crate::domain::command::{Command, TransitionReceipt};
use crate::domain::commission::{ChainSnapshot, resolve_chain};
use crate::domain::package::MAX_REFERRAL_DEPTH;
use crate::domain::ports::{
    AuditSinkBox, CacheInvalidatorBox, CommitOutcome, LedgerBox, NotifierBox, PackageStatsDelta,
    StatusChanged, WriteBatch,
};
use crate::domain::purchase::{Purchase, PurchaseStatus};
use crate::domain::schedule::build_schedule;
use crate::domain::user::UserId;
use crate::error::{EngineError, Result};
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

/// Composes guard, state machine, commission resolver, schedule factory,
/// package statistics and wallet release into one atomic unit of work.
///
/// Except for the explicitly tolerated benefit-schedule sub-step, the unit
/// is all-or-nothing: any failure before or during [`crate::domain::ports::Ledger::commit`]
/// leaves the purchase in its pre-transition state, safe to retry.
pub struct TransactionCoordinator {
    ledger: LedgerBox,
    audit: AuditSinkBox,
    cache: CacheInvalidatorBox,
    notifier: NotifierBox,
}

impl TransactionCoordinator {
    pub fn new(
        ledger: LedgerBox,
        audit: AuditSinkBox,
        cache: CacheInvalidatorBox,
        notifier: NotifierBox,
    ) -> Self {
        Self {
            ledger,
            audit,
            cache,
            notifier,
        }
    }

    pub async fn execute(&self, cmd: &Command) -> Result<TransitionReceipt> {
        cmd.validate()?;

        let before = self
            .ledger
            .purchase(cmd.purchase)
            .await?
            .ok_or_else(|| EngineError::not_found("purchase", cmd.purchase.0))?;

        if let Some(receipt) = IdempotencyGuard::check(&before, cmd.action) {
            debug!(
                purchase = cmd.purchase.0,
                action = %cmd.action,
                "already at target status; replaying recorded result"
            );
            return Ok(receipt);
        }

        let now = Utc::now();
        let after = before.apply(cmd.action, cmd.actor, cmd.normalized_notes(), now)?;

        let mut batch = WriteBatch::transition(before.status, after.clone());
        if after.status == PurchaseStatus::Active {
            self.stage_activation(&after, &mut batch, now).await?;
        }
        if after.status.is_terminal() {
            batch.release_wallet = before.assigned_wallet;
        }

        match self.ledger.commit(batch).await? {
            CommitOutcome::Committed => {
                info!(
                    purchase = after.id.0,
                    from = %before.status,
                    to = %after.status,
                    actor = cmd.actor.0,
                    "purchase transition committed"
                );
                self.after_commit(&before, &after, cmd).await;
                Ok(TransitionReceipt {
                    purchase_id: after.id,
                    status: after.status,
                    actor: Some(cmd.actor),
                    timestamp: now,
                    idempotent: false,
                })
            }
            CommitOutcome::StaleStatus(observed) => self.resolve_race(cmd, observed).await,
        }
    }

    /// A concurrent operation transitioned the purchase between our read and
    /// our commit. When it landed on the same target this call degrades to
    /// the idempotent path; anything else is a real precondition failure.
    async fn resolve_race(
        &self,
        cmd: &Command,
        observed: PurchaseStatus,
    ) -> Result<TransitionReceipt> {
        if observed == cmd.action.target() {
            let current = self
                .ledger
                .purchase(cmd.purchase)
                .await?
                .ok_or_else(|| EngineError::not_found("purchase", cmd.purchase.0))?;
            if let Some(receipt) = IdempotencyGuard::check(&current, cmd.action) {
                debug!(
                    purchase = cmd.purchase.0,
                    action = %cmd.action,
                    "lost commit race to an identical transition"
                );
                return Ok(receipt);
            }
        }
        Err(EngineError::InvalidTransition {
            current: observed,
            required: cmd.action.required_sources(),
            action: cmd.action,
        })
    }

    /// Stages the activation pipeline into the batch: commission drafts,
    /// best-effort benefit schedule, package counters.
    async fn stage_activation(
        &self,
        after: &Purchase,
        batch: &mut WriteBatch,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let package = self
            .ledger
            .package(after.package)
            .await?
            .ok_or_else(|| EngineError::not_found("package", after.package.0))?;

        let chain = self.snapshot_chain(after.buyer).await?;
        debug!(
            purchase = after.id.0,
            buyer = after.buyer.0,
            depth = chain.referrers.len(),
            "referral chain resolved"
        );
        batch.commissions = resolve_chain(after, &package, &chain, now);

        // Benefit scheduling is repairable after the fact; a missing
        // commission is not. Activation proceeds without the schedule.
        match build_schedule(after, &package) {
            Ok(schedule) => batch.schedule = Some(schedule),
            Err(e) => warn!(
                purchase = after.id.0,
                package = package.id.0,
                error = %e,
                "benefit schedule derivation failed; activating without schedule"
            ),
        }

        batch.package_stats = Some(PackageStatsDelta {
            package: package.id,
            revenue: after.total_amount,
        });
        Ok(())
    }

    /// Walks `referred_by` upward from the buyer, stopping at the first
    /// missing or inactive referrer and after at most [`MAX_REFERRAL_DEPTH`]
    /// hops regardless of what the data claims.
    async fn snapshot_chain(&self, buyer: UserId) -> Result<ChainSnapshot> {
        let buyer_record = self
            .ledger
            .user(buyer)
            .await?
            .ok_or_else(|| EngineError::not_found("user", buyer.0))?;

        let mut chain = ChainSnapshot::default();
        let mut cursor = buyer_record.referred_by;
        while let Some(id) = cursor {
            if chain.referrers.len() >= MAX_REFERRAL_DEPTH {
                break;
            }
            let Some(referrer) = self.ledger.user(id).await? else {
                break;
            };
            if !referrer.is_active {
                break;
            }
            if chain.referrers.is_empty() {
                chain.parent_of_direct = referrer.referred_by;
            }
            chain.referrers.push(referrer.id);
            cursor = referrer.referred_by;
        }

        if let Some(direct) = chain.referrers.first().copied() {
            chain.direct_completed_purchases = self.ledger.completed_purchases(direct).await?;
        }
        Ok(chain)
    }

    /// Post-commit collaborators. All best-effort: the commit already
    /// happened, so failures here are logged and swallowed.
    async fn after_commit(&self, before: &Purchase, after: &Purchase, cmd: &Command) {
        if let Err(e) = self.audit.record(before, after).await {
            warn!(purchase = after.id.0, error = %e, "audit sink rejected snapshot");
        }
        if let Err(e) = self.cache.invalidate(after.buyer, cmd.actor).await {
            warn!(purchase = after.id.0, error = %e, "cache invalidation failed");
        }
        let event = StatusChanged {
            purchase_id: after.id,
            old_status: before.status,
            new_status: after.status,
        };
        if let Err(e) = self.notifier.status_changed(event).await {
            warn!(purchase = after.id.0, error = %e, "status notification not delivered");
        }
    }
}
