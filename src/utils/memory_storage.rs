//! In-memory storage implementation for testing

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::traits::*;
use crate::types::*;

/// In-memory storage implementation for testing and development
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    accounts: Arc<RwLock<HashMap<String, Account>>>,
    branches: Arc<RwLock<HashMap<String, Branch>>>,
    entries: Arc<RwLock<HashMap<String, JournalEntry>>>,
    periods: Arc<RwLock<HashMap<String, AccountingPeriod>>>,
    snapshots: Arc<RwLock<HashMap<String, Vec<PeriodSnapshot>>>>,
    receivables: Arc<RwLock<HashMap<String, Receivable>>>,
    payments: Arc<RwLock<HashMap<String, ReceivablePayment>>>,
}

impl MemoryStorage {
    /// Create a new memory storage instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all data (useful for testing)
    pub fn clear(&self) {
        self.accounts.write().unwrap().clear();
        self.branches.write().unwrap().clear();
        self.entries.write().unwrap().clear();
        self.periods.write().unwrap().clear();
        self.snapshots.write().unwrap().clear();
        self.receivables.write().unwrap().clear();
        self.payments.write().unwrap().clear();
    }
}

fn in_range(date: NaiveDate, start: Option<NaiveDate>, end: Option<NaiveDate>) -> bool {
    if let Some(s) = start {
        if date < s {
            return false;
        }
    }
    if let Some(e) = end {
        if date > e {
            return false;
        }
    }
    true
}

#[async_trait]
impl LedgerStorage for MemoryStorage {
    async fn save_account(&mut self, account: &Account) -> LedgerResult<()> {
        self.accounts
            .write()
            .unwrap()
            .insert(account.id.clone(), account.clone());
        Ok(())
    }

    async fn get_account(&self, account_id: &str) -> LedgerResult<Option<Account>> {
        Ok(self.accounts.read().unwrap().get(account_id).cloned())
    }

    async fn get_account_by_code(&self, code: &str) -> LedgerResult<Option<Account>> {
        Ok(self
            .accounts
            .read()
            .unwrap()
            .values()
            .find(|a| a.code == code)
            .cloned())
    }

    async fn list_accounts(&self, account_type: Option<AccountType>) -> LedgerResult<Vec<Account>> {
        let accounts = self.accounts.read().unwrap();
        let mut filtered: Vec<Account> = accounts
            .values()
            .filter(|account| {
                account_type
                    .as_ref()
                    .is_none_or(|t| &account.account_type == t)
            })
            .cloned()
            .collect();
        filtered.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(filtered)
    }

    async fn update_account(&mut self, account: &Account) -> LedgerResult<()> {
        if self.accounts.read().unwrap().contains_key(&account.id) {
            self.accounts
                .write()
                .unwrap()
                .insert(account.id.clone(), account.clone());
            Ok(())
        } else {
            Err(LedgerError::AccountNotFound(account.id.clone()))
        }
    }

    async fn save_branch(&mut self, branch: &Branch) -> LedgerResult<()> {
        self.branches
            .write()
            .unwrap()
            .insert(branch.id.clone(), branch.clone());
        Ok(())
    }

    async fn list_branches(&self) -> LedgerResult<Vec<Branch>> {
        let mut branches: Vec<Branch> = self.branches.read().unwrap().values().cloned().collect();
        branches.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(branches)
    }

    async fn save_entry(&mut self, entry: &JournalEntry) -> LedgerResult<()> {
        self.entries
            .write()
            .unwrap()
            .insert(entry.id.clone(), entry.clone());
        Ok(())
    }

    async fn get_entry(&self, entry_id: &str) -> LedgerResult<Option<JournalEntry>> {
        Ok(self.entries.read().unwrap().get(entry_id).cloned())
    }

    async fn update_entry(&mut self, entry: &JournalEntry) -> LedgerResult<()> {
        if self.entries.read().unwrap().contains_key(&entry.id) {
            self.entries
                .write()
                .unwrap()
                .insert(entry.id.clone(), entry.clone());
            Ok(())
        } else {
            Err(LedgerError::EntryNotFound(entry.id.clone()))
        }
    }

    async fn list_entries(
        &self,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> LedgerResult<Vec<JournalEntry>> {
        let entries = self.entries.read().unwrap();
        let mut filtered: Vec<JournalEntry> = entries
            .values()
            .filter(|e| e.deleted_at.is_none() && in_range(e.date, start_date, end_date))
            .cloned()
            .collect();
        filtered.sort_by(|a, b| a.number.cmp(&b.number));
        Ok(filtered)
    }

    async fn account_entries(
        &self,
        account_id: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> LedgerResult<Vec<JournalEntry>> {
        let entries = self.entries.read().unwrap();
        let filtered: Vec<JournalEntry> = entries
            .values()
            .filter(|e| {
                e.lines.iter().any(|line| line.account_id == account_id)
                    && in_range(e.date, start_date, end_date)
            })
            .cloned()
            .collect();
        Ok(filtered)
    }

    async fn count_draft_entries(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> LedgerResult<usize> {
        let entries = self.entries.read().unwrap();
        Ok(entries
            .values()
            .filter(|e| {
                e.status == EntryStatus::Draft
                    && e.deleted_at.is_none()
                    && in_range(e.date, Some(start_date), Some(end_date))
            })
            .count())
    }

    async fn count_entries_in_month(&self, year: i32, month: u32) -> LedgerResult<usize> {
        let entries = self.entries.read().unwrap();
        Ok(entries
            .values()
            .filter(|e| e.date.year() == year && e.date.month() == month)
            .count())
    }

    async fn find_year_end_entry(&self, year: i32) -> LedgerResult<Option<JournalEntry>> {
        let entries = self.entries.read().unwrap();
        Ok(entries
            .values()
            .find(|e| {
                e.source == EntrySource::YearEndClose
                    && e.date.year() == year
                    && e.status != EntryStatus::Voided
                    && e.deleted_at.is_none()
            })
            .cloned())
    }

    async fn save_period(&mut self, period: &AccountingPeriod) -> LedgerResult<()> {
        self.periods
            .write()
            .unwrap()
            .insert(period.id.clone(), period.clone());
        Ok(())
    }

    async fn get_period(&self, period_id: &str) -> LedgerResult<Option<AccountingPeriod>> {
        Ok(self.periods.read().unwrap().get(period_id).cloned())
    }

    async fn find_period(&self, year: i32, month: u32) -> LedgerResult<Option<AccountingPeriod>> {
        Ok(self
            .periods
            .read()
            .unwrap()
            .values()
            .find(|p| p.year == year && p.month == month)
            .cloned())
    }

    async fn list_periods(&self) -> LedgerResult<Vec<AccountingPeriod>> {
        let mut periods: Vec<AccountingPeriod> =
            self.periods.read().unwrap().values().cloned().collect();
        periods.sort_by_key(|p| p.key());
        Ok(periods)
    }

    async fn update_period(&mut self, period: &AccountingPeriod) -> LedgerResult<()> {
        if self.periods.read().unwrap().contains_key(&period.id) {
            self.periods
                .write()
                .unwrap()
                .insert(period.id.clone(), period.clone());
            Ok(())
        } else {
            Err(LedgerError::PeriodNotFound(period.id.clone()))
        }
    }

    async fn replace_snapshots(
        &mut self,
        period_id: &str,
        snapshots: &[PeriodSnapshot],
    ) -> LedgerResult<()> {
        self.snapshots
            .write()
            .unwrap()
            .insert(period_id.to_string(), snapshots.to_vec());
        Ok(())
    }

    async fn list_snapshots(&self, period_id: &str) -> LedgerResult<Vec<PeriodSnapshot>> {
        Ok(self
            .snapshots
            .read()
            .unwrap()
            .get(period_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn get_snapshot(
        &self,
        period_id: &str,
        account_id: &str,
        scope: &LineScope,
    ) -> LedgerResult<Option<PeriodSnapshot>> {
        Ok(self
            .snapshots
            .read()
            .unwrap()
            .get(period_id)
            .and_then(|rows| {
                rows.iter()
                    .find(|s| s.account_id == account_id && &s.scope == scope)
                    .cloned()
            }))
    }

    async fn save_receivable(&mut self, receivable: &Receivable) -> LedgerResult<()> {
        self.receivables
            .write()
            .unwrap()
            .insert(receivable.id.clone(), receivable.clone());
        Ok(())
    }

    async fn get_receivable(&self, receivable_id: &str) -> LedgerResult<Option<Receivable>> {
        Ok(self.receivables.read().unwrap().get(receivable_id).cloned())
    }

    async fn list_receivables(
        &self,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> LedgerResult<Vec<Receivable>> {
        let receivables = self.receivables.read().unwrap();
        let mut filtered: Vec<Receivable> = receivables
            .values()
            .filter(|r| in_range(r.invoice_date, start_date, end_date))
            .cloned()
            .collect();
        filtered.sort_by(|a, b| a.invoice_date.cmp(&b.invoice_date));
        Ok(filtered)
    }

    async fn apply_payment(
        &mut self,
        receivable: &Receivable,
        payment: &ReceivablePayment,
    ) -> LedgerResult<()> {
        self.receivables
            .write()
            .unwrap()
            .insert(receivable.id.clone(), receivable.clone());
        self.payments
            .write()
            .unwrap()
            .insert(payment.id.clone(), payment.clone());
        Ok(())
    }

    async fn list_payments(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> LedgerResult<Vec<ReceivablePayment>> {
        let payments = self.payments.read().unwrap();
        let mut filtered: Vec<ReceivablePayment> = payments
            .values()
            .filter(|p| in_range(p.date, Some(start_date), Some(end_date)))
            .cloned()
            .collect();
        filtered.sort_by(|a, b| a.date.cmp(&b.date));
        Ok(filtered)
    }
}
