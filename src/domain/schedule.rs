use crate::domain::money::Money;
use crate::domain::package::Package;
use crate::domain::purchase::{Purchase, PurchaseId};
use crate::domain::user::UserId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Benefit-schedule derivation failures.
///
/// Deliberately not part of [`crate::error::EngineError`]: the coordinator
/// logs these and activation proceeds without a schedule. A missing schedule
/// is repairable after the fact; a missing commission is not.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("package defines no benefit days")]
    NoBenefitDays,
    #[error("package daily rate is zero")]
    ZeroDailyRate,
    #[error("daily amount rounds to zero for purchase amount {0}")]
    VanishingDailyAmount(Money),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BenefitStatus {
    Scheduled,
    Released,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BenefitEntry {
    /// 1-indexed day offset from activation.
    pub day: u16,
    pub amount: Money,
    pub status: BenefitStatus,
}

/// Immutable per-day release template consumed by the external payout job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenefitSchedule {
    pub purchase: PurchaseId,
    pub buyer: UserId,
    pub entries: Vec<BenefitEntry>,
}

impl BenefitSchedule {
    pub fn total(&self) -> Money {
        self.entries
            .iter()
            .fold(Money::ZERO, |acc, e| acc + e.amount)
    }
}

/// Derives the fixed-length schedule from package terms.
pub fn build_schedule(purchase: &Purchase, package: &Package) -> Result<BenefitSchedule, ScheduleError> {
    if package.benefit_days == 0 {
        return Err(ScheduleError::NoBenefitDays);
    }
    if package.daily_rate.is_zero() {
        return Err(ScheduleError::ZeroDailyRate);
    }
    let daily = package.daily_rate.of(purchase.total_amount);
    if daily.is_zero() {
        return Err(ScheduleError::VanishingDailyAmount(purchase.total_amount));
    }

    let entries = (1..=package.benefit_days)
        .map(|day| BenefitEntry {
            day,
            amount: daily,
            status: BenefitStatus::Scheduled,
        })
        .collect();

    Ok(BenefitSchedule {
        purchase: purchase.id,
        buyer: purchase.buyer,
        entries,
    })
}
