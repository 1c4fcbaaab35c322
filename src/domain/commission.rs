use crate::domain::money::{Money, Rate};
use crate::domain::package::{MAX_REFERRAL_DEPTH, Package, PackageId};
use crate::domain::purchase::{Purchase, PurchaseId};
use crate::domain::user::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommissionKind {
    /// Regular per-level table commission.
    Level,
    /// One-time first-sale upline bonus, independent of the level table.
    ParentBonus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommissionStatus {
    Pending,
    Released,
}

/// A monetary credit to an upline referrer, created exactly once at purchase
/// activation. Unique per (purchase, recipient, level, kind).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Commission {
    pub recipient: UserId,
    pub source_user: UserId,
    pub purchase: PurchaseId,
    pub package: PackageId,
    pub level: u8,
    pub rate: Rate,
    pub amount: Money,
    pub kind: CommissionKind,
    pub status: CommissionStatus,
    pub created_at: DateTime<Utc>,
}

impl Commission {
    /// The uniqueness key the ledger enforces on insert.
    pub fn dedup_key(&self) -> (UserId, u8, CommissionKind) {
        (self.recipient, self.level, self.kind)
    }
}

/// Snapshot of the buyer's referral ancestry, taken by the coordinator with
/// bounded ledger reads so the resolver itself stays pure.
#[derive(Debug, Clone, Default)]
pub struct ChainSnapshot {
    /// Active ancestors, nearest first. The walk that builds this stops at
    /// the first missing or inactive referrer and never exceeds
    /// [`MAX_REFERRAL_DEPTH`] hops, even over corrupted cyclic data.
    pub referrers: Vec<UserId>,
    /// Completed (activated) purchases previously made by `referrers[0]`.
    pub direct_completed_purchases: u64,
    /// Raw `referred_by` of `referrers[0]`, regardless of activity.
    pub parent_of_direct: Option<UserId>,
}

/// Drafts the commissions owed for an activated purchase.
///
/// Level L (1-indexed) pays `rates[L] * total_amount` to the ancestor at
/// depth L when the rate is non-zero. An ancestor reached at two depths is
/// credited once per depth; deduplication is the tree invariant's job, not
/// ours. The parent bonus is granted on the direct referrer's first sale:
/// zero prior completed purchases and a grandparent to credit.
pub fn resolve_chain(
    purchase: &Purchase,
    package: &Package,
    chain: &ChainSnapshot,
    now: DateTime<Utc>,
) -> Vec<Commission> {
    let mut drafts = Vec::new();

    for (idx, recipient) in chain.referrers.iter().take(MAX_REFERRAL_DEPTH).enumerate() {
        let level = (idx + 1) as u8;
        let rate = package.commission_rates.level(level);
        if rate.is_zero() {
            continue;
        }
        drafts.push(Commission {
            recipient: *recipient,
            source_user: purchase.buyer,
            purchase: purchase.id,
            package: package.id,
            level,
            rate,
            amount: rate.of(purchase.total_amount),
            kind: CommissionKind::Level,
            status: CommissionStatus::Pending,
            created_at: now,
        });
    }

    if !chain.referrers.is_empty()
        && chain.direct_completed_purchases == 0
        && !package.parent_bonus_rate.is_zero()
        && let Some(grandparent) = chain.parent_of_direct
    {
        let rate = package.parent_bonus_rate;
        drafts.push(Commission {
            recipient: grandparent,
            source_user: purchase.buyer,
            purchase: purchase.id,
            package: package.id,
            level: 2,
            rate,
            amount: rate.of(purchase.total_amount),
            kind: CommissionKind::ParentBonus,
            status: CommissionStatus::Pending,
            created_at: now,
        });
    }

    drafts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::package::CommissionRates;
    use crate::domain::purchase::{Currency, PurchaseStatus};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn rate(v: Decimal) -> Rate {
        Rate::new(v).unwrap()
    }

    fn package_with_rates() -> Package {
        Package {
            id: PackageId(1),
            name: "pro".into(),
            commission_rates: CommissionRates([
                rate(dec!(0.10)),
                rate(dec!(0.05)),
                rate(dec!(0.03)),
                rate(dec!(0.02)),
                rate(dec!(0.01)),
            ]),
            parent_bonus_rate: Rate::ZERO,
            daily_rate: Rate::ZERO,
            benefit_days: 0,
            purchase_count: 0,
            total_revenue: Money::ZERO,
        }
    }

    fn purchase_of(amount: Decimal) -> Purchase {
        Purchase {
            id: PurchaseId(1),
            buyer: UserId(10),
            package: PackageId(1),
            total_amount: Money::new(amount),
            currency: Currency::Usdt,
            status: PurchaseStatus::Active,
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
    fn test_five_level_chain_amounts() {
        let chain = ChainSnapshot {
            referrers: vec![UserId(1), UserId(2), UserId(3), UserId(4), UserId(5)],
            direct_completed_purchases: 3,
            parent_of_direct: Some(UserId(2)),
        };
        let drafts = resolve_chain(&purchase_of(dec!(100)), &package_with_rates(), &chain, Utc::now());

        assert_eq!(drafts.len(), 5);
        let amounts: Vec<Decimal> = drafts.iter().map(|c| c.amount.value()).collect();
        assert_eq!(amounts, vec![dec!(10), dec!(5), dec!(3), dec!(2), dec!(1)]);
        assert!(drafts.iter().all(|c| c.kind == CommissionKind::Level));
        assert!(drafts.iter().all(|c| c.status == CommissionStatus::Pending));
        assert!(drafts.iter().all(|c| c.source_user == UserId(10)));
    }

    #[test]
    fn test_empty_chain_yields_nothing() {
        let drafts = resolve_chain(
            &purchase_of(dec!(100)),
            &package_with_rates(),
            &ChainSnapshot::default(),
            Utc::now(),
        );
        assert!(drafts.is_empty());
    }

    #[test]
    fn test_truncated_chain_credits_retained_levels_only() {
        // Level-3 referrer inactive: the walk handed us two ancestors.
        let chain = ChainSnapshot {
            referrers: vec![UserId(1), UserId(2)],
            direct_completed_purchases: 1,
            parent_of_direct: Some(UserId(2)),
        };
        let drafts = resolve_chain(&purchase_of(dec!(100)), &package_with_rates(), &chain, Utc::now());
        assert_eq!(drafts.len(), 2);
        assert_eq!(drafts[0].level, 1);
        assert_eq!(drafts[1].level, 2);
    }

    #[test]
    fn test_zero_rate_levels_are_skipped() {
        let mut package = package_with_rates();
        package.commission_rates.0[1] = Rate::ZERO;
        let chain = ChainSnapshot {
            referrers: vec![UserId(1), UserId(2), UserId(3)],
            direct_completed_purchases: 1,
            parent_of_direct: Some(UserId(2)),
        };
        let drafts = resolve_chain(&purchase_of(dec!(100)), &package, &chain, Utc::now());
        let levels: Vec<u8> = drafts.iter().map(|c| c.level).collect();
        assert_eq!(levels, vec![1, 3]);
    }

    #[test]
    fn test_repeated_referrer_credited_per_level() {
        // Corrupted cyclic data: the same user appears at two depths.
        let chain = ChainSnapshot {
            referrers: vec![UserId(1), UserId(2), UserId(1)],
            direct_completed_purchases: 1,
            parent_of_direct: Some(UserId(2)),
        };
        let drafts = resolve_chain(&purchase_of(dec!(100)), &package_with_rates(), &chain, Utc::now());
        let for_one: Vec<u8> = drafts
            .iter()
            .filter(|c| c.recipient == UserId(1))
            .map(|c| c.level)
            .collect();
        assert_eq!(for_one, vec![1, 3]);
    }

    #[test]
    fn test_parent_bonus_on_first_sale() {
        let mut package = package_with_rates();
        package.parent_bonus_rate = rate(dec!(0.02));
        let chain = ChainSnapshot {
            referrers: vec![UserId(1), UserId(2)],
            direct_completed_purchases: 0,
            parent_of_direct: Some(UserId(2)),
        };
        let drafts = resolve_chain(&purchase_of(dec!(100)), &package, &chain, Utc::now());

        let bonus: Vec<&Commission> = drafts
            .iter()
            .filter(|c| c.kind == CommissionKind::ParentBonus)
            .collect();
        assert_eq!(bonus.len(), 1);
        assert_eq!(bonus[0].recipient, UserId(2));
        assert_eq!(bonus[0].amount.value(), dec!(2));
        // The grandparent also keeps its regular level-2 credit.
        assert!(drafts
            .iter()
            .any(|c| c.recipient == UserId(2) && c.kind == CommissionKind::Level && c.level == 2));
    }

    #[test]
    fn test_parent_bonus_withheld_after_first_sale() {
        let mut package = package_with_rates();
        package.parent_bonus_rate = rate(dec!(0.02));
        let chain = ChainSnapshot {
            referrers: vec![UserId(1), UserId(2)],
            direct_completed_purchases: 4,
            parent_of_direct: Some(UserId(2)),
        };
        let drafts = resolve_chain(&purchase_of(dec!(100)), &package, &chain, Utc::now());
        assert!(drafts.iter().all(|c| c.kind == CommissionKind::Level));
    }

    #[test]
    fn test_parent_bonus_needs_a_grandparent() {
        let mut package = package_with_rates();
        package.parent_bonus_rate = rate(dec!(0.02));
        let chain = ChainSnapshot {
            referrers: vec![UserId(1)],
            direct_completed_purchases: 0,
            parent_of_direct: None,
        };
        let drafts = resolve_chain(&purchase_of(dec!(100)), &package, &chain, Utc::now());
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].kind, CommissionKind::Level);
    }
}
