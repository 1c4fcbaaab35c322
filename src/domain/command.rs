use crate::domain::purchase::{Action, ActorId, PurchaseId, PurchaseStatus};
use crate::error::{EngineError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const MAX_NOTES_LEN: usize = 500;

/// An operator command, as read off the CSV command stream.
///
/// `notes` doubles as the rejection reason for `Reject`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Command {
    pub action: Action,
    pub purchase: PurchaseId,
    pub actor: ActorId,
    #[serde(default)]
    pub notes: Option<String>,
}

impl Command {
    pub fn new(action: Action, purchase: PurchaseId, actor: ActorId) -> Self {
        Self {
            action,
            purchase,
            actor,
            notes: None,
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Input validation, applied before any state is touched.
    pub fn validate(&self) -> Result<()> {
        if let Some(notes) = &self.notes
            && notes.len() > MAX_NOTES_LEN
        {
            return Err(EngineError::Validation(format!(
                "notes exceed {MAX_NOTES_LEN} characters"
            )));
        }
        Ok(())
    }

    /// Notes with empty/whitespace rows from the CSV stream normalized away.
    pub fn normalized_notes(&self) -> Option<String> {
        self.notes
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_owned)
    }
}

/// Reply for every command: the status the purchase ended up in, and whether
/// this call was a no-op replay of an earlier transition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TransitionReceipt {
    pub purchase_id: PurchaseId,
    pub status: PurchaseStatus,
    pub actor: Option<ActorId>,
    pub timestamp: DateTime<Utc>,
    pub idempotent: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_oversized_notes_rejected() {
        let cmd = Command::new(Action::Approve, PurchaseId(1), ActorId(1))
            .with_notes("x".repeat(MAX_NOTES_LEN + 1));
        assert!(matches!(cmd.validate(), Err(EngineError::Validation(_))));
    }

    #[test]
    fn test_blank_notes_normalize_to_none() {
        let cmd = Command::new(Action::Reject, PurchaseId(1), ActorId(1)).with_notes("   ");
        assert!(cmd.validate().is_ok());
        assert_eq!(cmd.normalized_notes(), None);

        let cmd = Command::new(Action::Reject, PurchaseId(1), ActorId(1)).with_notes(" late ");
        assert_eq!(cmd.normalized_notes().as_deref(), Some("late"));
    }
}
