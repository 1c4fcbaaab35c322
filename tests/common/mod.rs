#![allow(dead_code)]

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;
use upline::application::coordinator::TransactionCoordinator;
use upline::domain::money::{Money, Rate};
use upline::domain::package::{CommissionRates, Package, PackageId};
use upline::domain::purchase::{Currency, Purchase, PurchaseId, PurchaseStatus, WalletId};
use upline::domain::user::{User, UserId};
use upline::infrastructure::collaborators::RecordingCollaborators;
use upline::infrastructure::in_memory::InMemoryLedger;

/// Coordinator wired to an in-memory ledger and recording collaborators.
pub struct World {
    pub ledger: InMemoryLedger,
    pub recorder: RecordingCollaborators,
    pub coordinator: TransactionCoordinator,
}

pub fn world() -> World {
    let ledger = InMemoryLedger::new();
    let recorder = RecordingCollaborators::default();
    let coordinator = TransactionCoordinator::new(
        Arc::new(ledger.clone()),
        Arc::new(recorder.clone()),
        Arc::new(recorder.clone()),
        Arc::new(recorder.clone()),
    );
    World {
        ledger,
        recorder,
        coordinator,
    }
}

pub fn rate(v: Decimal) -> Rate {
    Rate::new(v).unwrap()
}

pub fn user(id: u64, referred_by: Option<u64>, is_active: bool) -> User {
    User {
        id: UserId(id),
        referred_by: referred_by.map(UserId),
        is_active,
    }
}

/// Standard test package: rates 10/5/3/2/1 percent, 2% parent bonus,
/// 1% daily benefit over 30 days.
pub fn standard_package(id: u64) -> Package {
    Package {
        id: PackageId(id),
        name: "pro".into(),
        commission_rates: CommissionRates([
            rate(dec!(0.10)),
            rate(dec!(0.05)),
            rate(dec!(0.03)),
            rate(dec!(0.02)),
            rate(dec!(0.01)),
        ]),
        parent_bonus_rate: rate(dec!(0.02)),
        daily_rate: rate(dec!(0.01)),
        benefit_days: 30,
        purchase_count: 0,
        total_revenue: Money::ZERO,
    }
}

pub fn purchase(
    id: u64,
    buyer: u64,
    package: u64,
    amount: Decimal,
    status: PurchaseStatus,
    wallet: Option<u64>,
) -> Purchase {
    Purchase {
        id: PurchaseId(id),
        buyer: UserId(buyer),
        package: PackageId(package),
        total_amount: Money::new(amount),
        currency: Currency::Usdt,
        status,
        assigned_wallet: wallet.map(WalletId),
        notes: None,
        rejection_reason: None,
        approved: None,
        rejected: None,
        confirmed: None,
        created_at: chrono::Utc::now(),
    }
}

/// Seeds a five-deep chain of active referrers above the buyer:
/// buyer(10) -> 1 -> 2 -> 3 -> 4 -> 5, plus the standard package and a
/// confirming 100-unit purchase with wallet 7. The direct referrer already
/// has a completed purchase, so the first-sale parent bonus stays off.
pub async fn seed_five_level_world(w: &World) {
    w.ledger
        .seed_purchase(purchase(99, 1, 1, dec!(50), PurchaseStatus::Active, None))
        .await;
    w.ledger.seed_user(user(5, None, true)).await;
    w.ledger.seed_user(user(4, Some(5), true)).await;
    w.ledger.seed_user(user(3, Some(4), true)).await;
    w.ledger.seed_user(user(2, Some(3), true)).await;
    w.ledger.seed_user(user(1, Some(2), true)).await;
    w.ledger.seed_user(user(10, Some(1), true)).await;
    w.ledger.seed_package(standard_package(1)).await;
    w.ledger
        .seed_purchase(purchase(
            1,
            10,
            1,
            dec!(100),
            PurchaseStatus::Confirming,
            Some(7),
        ))
        .await;
}
