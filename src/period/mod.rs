//! Accounting period lifecycle and balance snapshotting

pub mod lifecycle;
pub mod snapshot;

pub use lifecycle::*;
pub use snapshot::*;
