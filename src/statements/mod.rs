//! Read-side financial statement generation
//!
//! Every figure here is derived on demand from the journal through the
//! balance primitive; nothing in this module mutates ledger state except the
//! privileged year-end close.

pub mod balance_sheet;
pub mod cash_flow;
pub mod income_statement;
pub mod receivables;
pub mod year_end;

pub use balance_sheet::*;
pub use cash_flow::*;
pub use income_statement::*;
pub use receivables::*;
pub use year_end::*;

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

use crate::types::Account;

/// One account's contribution to a statement section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementLine {
    pub account_id: String,
    pub code: String,
    pub name: String,
    pub amount: BigDecimal,
}

/// A grouped run of statement lines with a rolled-up total
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementSection {
    pub lines: Vec<StatementLine>,
    pub total: BigDecimal,
}

impl StatementSection {
    pub fn new() -> Self {
        Self {
            lines: Vec::new(),
            total: BigDecimal::from(0),
        }
    }

    /// Append an account line and roll its amount into the total
    pub fn push(&mut self, account: &Account, amount: BigDecimal) {
        self.total += &amount;
        self.lines.push(StatementLine {
            account_id: account.id.clone(),
            code: account.code.clone(),
            name: account.name.clone(),
            amount,
        });
    }

    /// Append a line not backed by a chart account (e.g. derived net income)
    pub fn push_derived(&mut self, name: &str, amount: BigDecimal) {
        self.total += &amount;
        self.lines.push(StatementLine {
            account_id: String::new(),
            code: String::new(),
            name: name.to_string(),
            amount,
        });
    }

    /// Order lines by chart code for display
    pub fn sort_by_code(&mut self) {
        self.lines.sort_by(|a, b| a.code.cmp(&b.code));
    }
}

impl Default for StatementSection {
    fn default() -> Self {
        Self::new()
    }
}
