//! Year-end close: transfer the year's net result to retained earnings

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use tracing::info;

use crate::ledger::account::AccountRegistry;
use crate::ledger::journal::{JournalManager, NewEntry};
use crate::period::lifecycle::PeriodManager;
use crate::traits::LedgerStorage;
use crate::types::*;

/// Post the year-end closing entry for a calendar year.
///
/// Zeroes every revenue and expense account's yearly activity against the
/// configured retained-earnings account: on profit, revenue accounts are
/// debited, expense accounts credited, and retained earnings credited for the
/// net; a loss mirrors the retained-earnings side.
///
/// Preconditions: December of the year exists and is Closed (or Locked), and
/// no non-voided year-end entry for the year exists yet. Uniqueness is
/// tracked by the entry's `YearEndClose` source tag and date, not by
/// description matching. The entry is written through the internal posting
/// path since December is, by precondition, no longer open.
pub async fn year_end_close<S: LedgerStorage + Clone>(
    registry: &AccountRegistry<S>,
    journal: &mut JournalManager<S>,
    periods: &PeriodManager<S>,
    roles: &AccountRoles,
    year: i32,
    actor: &str,
) -> LedgerResult<JournalEntry> {
    let december = periods
        .find_period(year, 12)
        .await?
        .ok_or_else(|| {
            LedgerError::PeriodState(format!(
                "December {} must exist and be closed before year-end close",
                year
            ))
        })?;
    if december.status == PeriodStatus::Open {
        return Err(LedgerError::PeriodState(format!(
            "December {} is still open; close it before running year-end close",
            year
        )));
    }

    if journal.storage.find_year_end_entry(year).await?.is_some() {
        return Err(LedgerError::PeriodState(format!(
            "Year-end entry for {} already exists",
            year
        )));
    }

    let retained = registry
        .get_account_required(&roles.retained_earnings)
        .await?;

    let jan_1 = NaiveDate::from_ymd_opt(year, 1, 1)
        .ok_or_else(|| LedgerError::Validation(format!("Invalid fiscal year: {}", year)))?;
    let dec_31 = NaiveDate::from_ymd_opt(year, 12, 31)
        .ok_or_else(|| LedgerError::Validation(format!("Invalid fiscal year: {}", year)))?;

    let zero = BigDecimal::from(0);
    let mut entry = NewEntry::new(
        dec_31,
        format!("Year-end closing {}", year),
        EntrySource::YearEndClose,
    );

    let mut total_revenue = BigDecimal::from(0);
    for account in registry.list_accounts_by_type(AccountType::Revenue).await? {
        if !account.postable() {
            continue;
        }
        let activity = journal
            .account_activity(&account.id, jan_1, dec_31, &BranchFilter::Consolidated)
            .await?;
        total_revenue += &activity;
        // Revenue is credit-normal: a debit of its yearly balance zeroes it
        if activity > zero {
            entry = entry.debit(account.id, LineScope::Consolidated, activity);
        } else if activity < zero {
            entry = entry.credit(account.id, LineScope::Consolidated, -activity);
        }
    }

    let mut total_expenses = BigDecimal::from(0);
    for account in registry.list_accounts_by_type(AccountType::Expense).await? {
        if !account.postable() {
            continue;
        }
        let activity = journal
            .account_activity(&account.id, jan_1, dec_31, &BranchFilter::Consolidated)
            .await?;
        total_expenses += &activity;
        if activity > zero {
            entry = entry.credit(account.id, LineScope::Consolidated, activity);
        } else if activity < zero {
            entry = entry.debit(account.id, LineScope::Consolidated, -activity);
        }
    }

    if entry.lines.is_empty() {
        return Err(LedgerError::PeriodState(format!(
            "No revenue or expense activity to close for {}",
            year
        )));
    }

    let net_income = &total_revenue - &total_expenses;
    if net_income > zero {
        entry = entry.credit(
            retained.id.clone(),
            LineScope::Consolidated,
            net_income.clone(),
        );
    } else if net_income < zero {
        entry = entry.debit(
            retained.id.clone(),
            LineScope::Consolidated,
            -net_income.clone(),
        );
    }

    let posted = journal.insert_posted_unchecked(entry, actor).await?;
    info!(year, net_income = %net_income, "year-end close posted");
    Ok(posted)
}
