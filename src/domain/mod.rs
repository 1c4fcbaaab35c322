//! Domain layer: purchase lifecycle, referral commissions and benefit
//! schedules, plus the ports the application layer drives them through.

pub mod command;
pub mod commission;
pub mod money;
pub mod package;
pub mod ports;
pub mod purchase;
pub mod schedule;
pub mod user;
