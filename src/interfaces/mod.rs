//! Interface adapters for the operator CLI.

pub mod csv;
