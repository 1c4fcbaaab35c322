use crate::domain::money::{Money, Rate};
use serde::{Deserialize, Serialize};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub struct PackageId(pub u64);

/// Deepest referral level that can earn a table commission, and the hard cap
/// on the ancestry walk itself.
pub const MAX_REFERRAL_DEPTH: usize = 5;

/// Per-level commission rates, indexed by level 1..=5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CommissionRates(pub [Rate; MAX_REFERRAL_DEPTH]);

impl CommissionRates {
    /// Rate for a 1-indexed level; zero outside the table.
    pub fn level(&self, level: u8) -> Rate {
        match level {
            1..=5 => self.0[level as usize - 1],
            _ => Rate::ZERO,
        }
    }
}

/// A subscription package: commission configuration plus aggregate counters.
///
/// `commission_rates`, `parent_bonus_rate`, `daily_rate` and `benefit_days`
/// are read-only inputs here; the counters are incremented by the
/// coordinator on every activation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Package {
    pub id: PackageId,
    pub name: String,
    pub commission_rates: CommissionRates,
    /// One-time first-sale upline bonus; zero disables the rule.
    #[serde(default)]
    pub parent_bonus_rate: Rate,
    #[serde(default)]
    pub daily_rate: Rate,
    #[serde(default)]
    pub benefit_days: u16,
    #[serde(default)]
    pub purchase_count: u64,
    #[serde(default)]
    pub total_revenue: Money,
}

impl Package {
    pub fn record_activation(&mut self, amount: Money) {
        self.purchase_count += 1;
        self.total_revenue += amount;
    }
}
