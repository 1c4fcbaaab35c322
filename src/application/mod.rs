//! Application layer: the transaction coordinator that turns operator
//! commands into atomic ledger commits, and the idempotency guard that
//! short-circuits replays before any write happens.

pub mod coordinator;
pub mod idempotency;
