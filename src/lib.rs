//! # Ledger Core
//!
//! A double-entry accounting library providing a chart of accounts, journal
//! posting, monthly period lifecycle, and financial reporting.
//!
//! ## Features
//!
//! - **Double-entry bookkeeping**: Balanced journal entries with draft, posted,
//!   and voided states
//! - **Chart of accounts**: Hierarchical accounts classified for statement
//!   placement, with a role mapping for retained earnings and cash accounts
//! - **Period lifecycle**: Open, Closed, and Locked monthly periods with frozen
//!   balance snapshots taken at close
//! - **Financial reporting**: Balance sheet, income statement, cash-flow
//!   statement, and year-end close
//! - **Receivables**: Aging buckets, overdue tracking, and collection metrics
//! - **Storage abstraction**: Database-agnostic design with trait-based storage
//!
//! ## Quick Start
//!
//! ```rust
//! use ledger_core::{Ledger, MemoryStorage, NewEntry, EntrySource, LineScope};
//! use bigdecimal::BigDecimal;
//! use chrono::NaiveDate;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> ledger_core::LedgerResult<()> {
//! let mut ledger = Ledger::new(MemoryStorage::new());
//! let accounts = ledger.setup_standard_chart().await?;
//! ledger.create_period(2025, 1).await?;
//!
//! let date = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
//! let entry = NewEntry::new(date, "Cash sale".to_string(), EntrySource::Sales)
//!     .debit(accounts["cash"].id.clone(), LineScope::Consolidated, BigDecimal::from(1000))
//!     .credit(accounts["sales_revenue"].id.clone(), LineScope::Consolidated, BigDecimal::from(1000));
//! ledger.post_entry(entry, "demo").await?;
//! # Ok(())
//! # }
//! ```

pub mod ledger;
pub mod period;
pub mod statements;
pub mod traits;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use ledger::*;
pub use period::*;
pub use statements::*;
pub use traits::*;
pub use types::*;
pub use utils::memory_storage::MemoryStorage;

// Re-export journal entry patterns for convenience
pub use ledger::journal::patterns;
