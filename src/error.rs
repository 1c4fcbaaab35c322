use crate::domain::purchase::{Action, PurchaseStatus};
use thiserror::Error;

pub type Result<T, E = EngineError> = std::result::Result<T, E>;

/// Errors surfaced to callers of the confirmation core.
///
/// Every variant maps to a stable machine-readable code via [`EngineError::code`].
/// Only [`EngineError::Persistence`] is retryable: a failed commit leaves no
/// partial writes behind.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: u64 },

    #[error("cannot {action} a purchase in {current}; requires {required}")]
    InvalidTransition {
        current: PurchaseStatus,
        required: &'static str,
        action: Action,
    },

    #[error("persistence failure: {0}")]
    Persistence(String),
}

impl EngineError {
    pub fn not_found(entity: &'static str, id: u64) -> Self {
        Self::NotFound { entity, id }
    }

    /// Stable code for API consumers and log correlation.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::InvalidTransition { .. } => "INVALID_STATE_TRANSITION",
            Self::Persistence(_) => "PERSISTENCE_FAILURE",
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Persistence(_))
    }
}

impl From<csv::Error> for EngineError {
    fn from(e: csv::Error) -> Self {
        Self::Validation(format!("malformed command row: {e}"))
    }
}

impl From<std::io::Error> for EngineError {
    fn from(e: std::io::Error) -> Self {
        Self::Persistence(e.to_string())
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(e: serde_json::Error) -> Self {
        Self::Persistence(format!("record serialization: {e}"))
    }
}

#[cfg(feature = "storage-rocksdb")]
impl From<rocksdb::Error> for EngineError {
    fn from(e: rocksdb::Error) -> Self {
        Self::Persistence(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_stable() {
        assert_eq!(EngineError::Validation(String::new()).code(), "VALIDATION");
        assert_eq!(EngineError::not_found("purchase", 7).code(), "NOT_FOUND");
        assert_eq!(
            EngineError::Persistence(String::new()).code(),
            "PERSISTENCE_FAILURE"
        );
    }

    #[test]
    fn test_only_persistence_is_retryable() {
        assert!(EngineError::Persistence("conflict".into()).is_retryable());
        assert!(!EngineError::not_found("user", 1).is_retryable());
        assert!(!EngineError::Validation("bad".into()).is_retryable());
    }
}
