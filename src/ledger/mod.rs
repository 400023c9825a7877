//! Ledger module containing account management and journal processing

pub mod account;
pub mod core;
pub mod journal;

pub use account::*;
pub use core::*;
pub use journal::*;
