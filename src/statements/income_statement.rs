//! Income statement generation

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::ledger::account::AccountRegistry;
use crate::ledger::journal::JournalManager;
use crate::statements::StatementSection;
use crate::traits::LedgerStorage;
use crate::types::*;

/// Income statement over a date range, built from period activity rather
/// than since-inception balances
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomeStatement {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub branch: BranchFilter,
    pub operating_revenue: StatementSection,
    pub other_income: StatementSection,
    pub cost_of_goods_sold: StatementSection,
    pub operating_expenses: StatementSection,
    pub tax_expenses: StatementSection,
    pub total_revenue: BigDecimal,
    pub total_expenses: BigDecimal,
    pub gross_profit: BigDecimal,
    pub operating_income: BigDecimal,
    pub net_income: BigDecimal,
    /// Gross profit as a percentage of revenue; None when revenue is zero
    pub gross_margin_pct: Option<BigDecimal>,
    /// Net income as a percentage of revenue; None when revenue is zero
    pub net_margin_pct: Option<BigDecimal>,
}

/// Generate an income statement for [from, to].
///
/// Each account contributes its signed activity within the window, so
/// statements for consecutive windows add up to the statement for the
/// combined window.
pub async fn income_statement<S: LedgerStorage>(
    registry: &AccountRegistry<S>,
    journal: &JournalManager<S>,
    from: NaiveDate,
    to: NaiveDate,
    branch: &BranchFilter,
) -> LedgerResult<IncomeStatement> {
    if from > to {
        return Err(LedgerError::Validation(format!(
            "Statement range is inverted: {} > {}",
            from, to
        )));
    }

    let mut operating_revenue = StatementSection::new();
    let mut other_income = StatementSection::new();
    let mut cost_of_goods_sold = StatementSection::new();
    let mut operating_expenses = StatementSection::new();
    let mut tax_expenses = StatementSection::new();

    for account in registry.list_postable_accounts().await? {
        let section = match account.classification {
            AccountClassification::OperatingRevenue => &mut operating_revenue,
            AccountClassification::OtherIncome => &mut other_income,
            AccountClassification::CostOfGoodsSold => &mut cost_of_goods_sold,
            AccountClassification::OperatingExpense => &mut operating_expenses,
            AccountClassification::TaxExpense => &mut tax_expenses,
            // Balance sheet accounts do not appear on the income statement
            _ => continue,
        };

        let activity = journal
            .account_activity(&account.id, from, to, branch)
            .await?;
        if activity != BigDecimal::from(0) {
            section.push(&account, activity);
        }
    }

    for section in [
        &mut operating_revenue,
        &mut other_income,
        &mut cost_of_goods_sold,
        &mut operating_expenses,
        &mut tax_expenses,
    ] {
        section.sort_by_code();
    }

    let total_revenue = &operating_revenue.total + &other_income.total;
    let total_expenses =
        &cost_of_goods_sold.total + &operating_expenses.total + &tax_expenses.total;
    let gross_profit = &total_revenue - &cost_of_goods_sold.total;
    let operating_income = &gross_profit - &operating_expenses.total;
    let net_income = &operating_income - &tax_expenses.total;

    let gross_margin_pct = margin_pct(&gross_profit, &total_revenue);
    let net_margin_pct = margin_pct(&net_income, &total_revenue);

    Ok(IncomeStatement {
        from,
        to,
        branch: branch.clone(),
        operating_revenue,
        other_income,
        cost_of_goods_sold,
        operating_expenses,
        tax_expenses,
        total_revenue,
        total_expenses,
        gross_profit,
        operating_income,
        net_income,
        gross_margin_pct,
        net_margin_pct,
    })
}

/// value / revenue * 100, guarded against division by zero
fn margin_pct(value: &BigDecimal, revenue: &BigDecimal) -> Option<BigDecimal> {
    if *revenue == BigDecimal::from(0) {
        None
    } else {
        Some(value * BigDecimal::from(100) / revenue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn margin_guards_zero_revenue() {
        assert_eq!(margin_pct(&BigDecimal::from(50), &BigDecimal::from(0)), None);
        assert_eq!(
            margin_pct(&BigDecimal::from(50), &BigDecimal::from(200)),
            Some(BigDecimal::from(25))
        );
    }
}
