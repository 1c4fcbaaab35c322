use crate::domain::command::TransitionReceipt;
use crate::domain::purchase::{Action, Purchase};

/// Detects that a requested transition has already been applied and builds
/// the replayed response.
///
/// This runs before any write and is the primary defense against duplicate
/// commission or schedule creation from repeated operator clicks or retried
/// calls: a purchase already at the action's target status yields the
/// historically recorded actor and timestamp with `idempotent: true`, and
/// the coordinator performs no writes and no side effects at all.
pub struct IdempotencyGuard;

impl IdempotencyGuard {
    pub fn check(purchase: &Purchase, action: Action) -> Option<TransitionReceipt> {
        if purchase.status != action.target() {
            return None;
        }
        let record = purchase.record_for(purchase.status);
        Some(TransitionReceipt {
            purchase_id: purchase.id,
            status: purchase.status,
            actor: record.map(|r| r.actor),
            // Externally seeded records may predate transition bookkeeping.
            timestamp: record.map(|r| r.at).unwrap_or(purchase.created_at),
            idempotent: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::money::Money;
    use crate::domain::package::PackageId;
    use crate::domain::purchase::{
        ActorId, Currency, PurchaseId, PurchaseStatus, TransitionRecord,
    };
    use crate::domain::user::UserId;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn purchase(status: PurchaseStatus) -> Purchase {
        Purchase {
            id: PurchaseId(1),
            buyer: UserId(2),
            package: PackageId(3),
            total_amount: Money::new(dec!(50)),
            currency: Currency::Usd,
            status,
            assigned_wallet: None,
            notes: None,
            rejection_reason: None,
            approved: None,
            rejected: None,
            confirmed: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_replays_recorded_transition() {
        let mut p = purchase(PurchaseStatus::Rejected);
        let at = Utc::now();
        p.rejected = Some(TransitionRecord {
            actor: ActorId(9),
            at,
        });

        let receipt = IdempotencyGuard::check(&p, Action::Reject).unwrap();
        assert!(receipt.idempotent);
        assert_eq!(receipt.status, PurchaseStatus::Rejected);
        assert_eq!(receipt.actor, Some(ActorId(9)));
        assert_eq!(receipt.timestamp, at);
    }

    #[test]
    fn test_falls_back_to_created_at_without_record() {
        let p = purchase(PurchaseStatus::Active);
        let receipt = IdempotencyGuard::check(&p, Action::MarkPaid).unwrap();
        assert_eq!(receipt.actor, None);
        assert_eq!(receipt.timestamp, p.created_at);
    }

    #[test]
    fn test_passes_through_when_not_at_target() {
        let p = purchase(PurchaseStatus::Confirming);
        assert!(IdempotencyGuard::check(&p, Action::Approve).is_none());
        assert!(IdempotencyGuard::check(&p, Action::Reject).is_none());
        // Active is MarkPaid's target, Approved is not.
        let p = purchase(PurchaseStatus::Approved);
        assert!(IdempotencyGuard::check(&p, Action::MarkPaid).is_none());
    }
}
