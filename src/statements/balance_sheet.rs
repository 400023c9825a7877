//! Balance sheet generation

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::ledger::account::AccountRegistry;
use crate::ledger::journal::JournalManager;
use crate::statements::StatementSection;
use crate::traits::LedgerStorage;
use crate::types::*;

/// Balance sheet as of a date, sectioned by account classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceSheet {
    pub as_of: NaiveDate,
    pub branch: BranchFilter,
    pub current_assets: StatementSection,
    pub fixed_assets: StatementSection,
    pub other_assets: StatementSection,
    pub current_liabilities: StatementSection,
    pub long_term_liabilities: StatementSection,
    pub equity: StatementSection,
    pub total_assets: BigDecimal,
    pub total_liabilities: BigDecimal,
    pub total_equity: BigDecimal,
    pub is_balanced: bool,
}

/// Generate a balance sheet as of a date.
///
/// Revenue and expense balances that have not yet been transferred by a
/// year-end close are carried as a derived "Net Income" equity line, so
/// `total_assets == total_liabilities + total_equity` holds whenever the
/// underlying ledger is balanced.
pub async fn balance_sheet<S: LedgerStorage>(
    registry: &AccountRegistry<S>,
    journal: &JournalManager<S>,
    as_of: NaiveDate,
    branch: &BranchFilter,
) -> LedgerResult<BalanceSheet> {
    let zero = BigDecimal::from(0);

    let mut current_assets = StatementSection::new();
    let mut fixed_assets = StatementSection::new();
    let mut other_assets = StatementSection::new();
    let mut current_liabilities = StatementSection::new();
    let mut long_term_liabilities = StatementSection::new();
    let mut equity = StatementSection::new();
    let mut net_income = BigDecimal::from(0);

    for account in registry.list_postable_accounts().await? {
        let balance = journal.account_balance(&account.id, as_of, branch).await?;

        match account.classification {
            AccountClassification::CurrentAsset => current_assets.push(&account, balance),
            AccountClassification::FixedAsset => fixed_assets.push(&account, balance),
            AccountClassification::OtherAsset => other_assets.push(&account, balance),
            AccountClassification::CurrentLiability => {
                current_liabilities.push(&account, balance)
            }
            AccountClassification::LongTermLiability => {
                long_term_liabilities.push(&account, balance)
            }
            AccountClassification::Equity => equity.push(&account, balance),
            AccountClassification::OperatingRevenue | AccountClassification::OtherIncome => {
                net_income += balance;
            }
            AccountClassification::CostOfGoodsSold
            | AccountClassification::OperatingExpense
            | AccountClassification::TaxExpense => {
                net_income -= balance;
            }
        }
    }

    if net_income != zero {
        equity.push_derived("Net Income", net_income);
    }

    for section in [
        &mut current_assets,
        &mut fixed_assets,
        &mut other_assets,
        &mut current_liabilities,
        &mut long_term_liabilities,
        &mut equity,
    ] {
        section.sort_by_code();
    }

    let total_assets = &current_assets.total + &fixed_assets.total + &other_assets.total;
    let total_liabilities = &current_liabilities.total + &long_term_liabilities.total;
    let total_equity = equity.total.clone();
    let is_balanced = total_assets == &total_liabilities + &total_equity;

    Ok(BalanceSheet {
        as_of,
        branch: branch.clone(),
        current_assets,
        fixed_assets,
        other_assets,
        current_liabilities,
        long_term_liabilities,
        equity,
        total_assets,
        total_liabilities,
        total_equity,
        is_balanced,
    })
}
