use crate::domain::money::Money;
use crate::domain::package::PackageId;
use crate::domain::user::UserId;
use crate::error::EngineError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub struct PurchaseId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WalletId(pub u64);

/// Operator identity recorded on each transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActorId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Currency {
    Usd,
    Eur,
    Usdt,
}

/// Purchase lifecycle states.
///
/// `Active` and `Rejected` are terminal: a purchase there may still be
/// annotated, but its status never changes again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseStatus {
    PendingPayment,
    Confirming,
    Approved,
    Active,
    Rejected,
}

impl PurchaseStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Active | Self::Rejected)
    }
}

impl fmt::Display for PurchaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::PendingPayment => "pending_payment",
            Self::Confirming => "confirming",
            Self::Approved => "approved",
            Self::Active => "active",
            Self::Rejected => "rejected",
        };
        f.write_str(s)
    }
}

/// Operator actions that drive the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Approve,
    Reject,
    MarkPaid,
    ConfirmAndActivate,
}

impl Action {
    /// Statuses this action may be applied from.
    pub fn sources(self) -> &'static [PurchaseStatus] {
        match self {
            Self::Approve => &[PurchaseStatus::Confirming],
            Self::Reject => &[PurchaseStatus::Confirming, PurchaseStatus::Approved],
            Self::MarkPaid => &[PurchaseStatus::Approved],
            Self::ConfirmAndActivate => &[PurchaseStatus::Confirming],
        }
    }

    pub fn target(self) -> PurchaseStatus {
        match self {
            Self::Approve => PurchaseStatus::Approved,
            Self::Reject => PurchaseStatus::Rejected,
            Self::MarkPaid | Self::ConfirmAndActivate => PurchaseStatus::Active,
        }
    }

    /// Human-readable source set, used in transition errors.
    pub fn required_sources(self) -> &'static str {
        match self {
            Self::Approve | Self::ConfirmAndActivate => "confirming",
            Self::Reject => "confirming or approved",
            Self::MarkPaid => "approved",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Approve => "approve",
            Self::Reject => "reject",
            Self::MarkPaid => "mark_paid",
            Self::ConfirmAndActivate => "confirm_and_activate",
        };
        f.write_str(s)
    }
}

/// Actor and timestamp recorded when a transition lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionRecord {
    pub actor: ActorId,
    pub at: DateTime<Utc>,
}

/// A buyer's order for a package, tracked through its confirmation lifecycle.
///
/// Created by an external checkout flow in `PendingPayment`; mutated
/// exclusively through [`Purchase::apply`]; never hard-deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Purchase {
    pub id: PurchaseId,
    pub buyer: UserId,
    pub package: PackageId,
    pub total_amount: Money,
    pub currency: Currency,
    pub status: PurchaseStatus,
    /// Non-`None` only while status is `Confirming` or `Approved`.
    #[serde(default)]
    pub assigned_wallet: Option<WalletId>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub rejection_reason: Option<String>,
    #[serde(default)]
    pub approved: Option<TransitionRecord>,
    #[serde(default)]
    pub rejected: Option<TransitionRecord>,
    /// Set when the purchase reaches `Active`.
    #[serde(default)]
    pub confirmed: Option<TransitionRecord>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl Purchase {
    /// The transition record for a given terminal-of-action status, if one
    /// was ever applied. Used by the idempotency guard to replay history.
    pub fn record_for(&self, status: PurchaseStatus) -> Option<&TransitionRecord> {
        match status {
            PurchaseStatus::Approved => self.approved.as_ref(),
            PurchaseStatus::Rejected => self.rejected.as_ref(),
            PurchaseStatus::Active => self.confirmed.as_ref(),
            _ => None,
        }
    }

    /// Applies `action` to this purchase, enforcing the transition table.
    ///
    /// Returns the mutated copy; the caller owns persisting it atomically
    /// with the activation side effects. The idempotent case (already at the
    /// action's target) is the guard's job and is rejected here as an
    /// invalid transition if it slips through.
    pub fn apply(
        &self,
        action: Action,
        actor: ActorId,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Purchase, EngineError> {
        if !action.sources().contains(&self.status) {
            return Err(EngineError::InvalidTransition {
                current: self.status,
                required: action.required_sources(),
                action,
            });
        }

        let mut next = self.clone();
        next.status = action.target();
        let record = TransitionRecord { actor, at: now };
        match action {
            Action::Approve => {
                next.approved = Some(record);
                if notes.is_some() {
                    next.notes = notes;
                }
            }
            Action::Reject => {
                next.rejected = Some(record);
                next.rejection_reason = notes;
                next.assigned_wallet = None;
            }
            Action::MarkPaid | Action::ConfirmAndActivate => {
                next.confirmed = Some(record);
                if notes.is_some() {
                    next.notes = notes;
                }
                next.assigned_wallet = None;
            }
        }
        Ok(next)
    }
}
