use serde::{Deserialize, Serialize};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub struct UserId(pub u64);

/// A registered user in the referral forest.
///
/// `referred_by` is set once at registration and never mutated, so the
/// relation is acyclic by construction. The chain walk still hard-caps its
/// depth because external data corruption can introduce cycles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    #[serde(default)]
    pub referred_by: Option<UserId>,
    /// Gates commission eligibility: inactive users end the chain walk.
    pub is_active: bool,
}
