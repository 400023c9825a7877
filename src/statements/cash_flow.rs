//! Cash-flow statement (indirect method)

use bigdecimal::BigDecimal;
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::ledger::account::AccountRegistry;
use crate::ledger::journal::JournalManager;
use crate::statements::income_statement::income_statement;
use crate::traits::LedgerStorage;
use crate::types::*;

/// One adjustment line in the operating-activities section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashFlowItem {
    pub description: String,
    pub amount: BigDecimal,
}

/// Indirect-method cash-flow statement.
///
/// Starts from net income and applies non-cash adjustments; the cash position
/// is reconciled independently by summing the configured cash-role accounts
/// at the day before the window opens and at its close.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashFlowStatement {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub net_income: BigDecimal,
    pub adjustments: Vec<CashFlowItem>,
    pub net_operating_cash_flow: BigDecimal,
    /// Cash-role balances at `from - 1 day`
    pub beginning_cash: BigDecimal,
    /// Cash-role balances at `to`
    pub ending_cash: BigDecimal,
    pub net_cash_change: BigDecimal,
}

/// Generate a cash-flow statement for [from, to].
///
/// Non-cash adjustments (depreciation, provisions) are supplied by the
/// caller; the statement carries net income through unchanged when the list
/// is empty.
pub async fn cash_flow_statement<S: LedgerStorage>(
    registry: &AccountRegistry<S>,
    journal: &JournalManager<S>,
    roles: &AccountRoles,
    from: NaiveDate,
    to: NaiveDate,
    adjustments: Vec<CashFlowItem>,
) -> LedgerResult<CashFlowStatement> {
    let income = income_statement(registry, journal, from, to, &BranchFilter::Consolidated).await?;
    let net_income = income.net_income;

    let adjustment_total: BigDecimal = adjustments.iter().map(|a| &a.amount).sum();
    let net_operating_cash_flow = &net_income + &adjustment_total;

    let day_before = from
        .checked_sub_days(Days::new(1))
        .ok_or_else(|| LedgerError::Validation(format!("Invalid statement start: {}", from)))?;

    let beginning_cash = cash_position(journal, roles, day_before).await?;
    let ending_cash = cash_position(journal, roles, to).await?;
    let net_cash_change = &ending_cash - &beginning_cash;

    Ok(CashFlowStatement {
        from,
        to,
        net_income,
        adjustments,
        net_operating_cash_flow,
        beginning_cash,
        ending_cash,
        net_cash_change,
    })
}

/// Sum of the configured cash-role account balances as of a date
async fn cash_position<S: LedgerStorage>(
    journal: &JournalManager<S>,
    roles: &AccountRoles,
    as_of: NaiveDate,
) -> LedgerResult<BigDecimal> {
    let mut total = BigDecimal::from(0);
    for account_id in &roles.cash_accounts {
        total += journal
            .account_balance(account_id, as_of, &BranchFilter::Consolidated)
            .await?;
    }
    Ok(total)
}
