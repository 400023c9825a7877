//! Period state machine: Open -> Closed -> Locked, with ordered reopening

use chrono::NaiveDate;
use tracing::info;

use crate::period::snapshot::SnapshotEngine;
use crate::traits::*;
use crate::types::*;

/// Manages the accounting calendar as a sequence of monthly periods
pub struct PeriodManager<S: LedgerStorage> {
    pub(crate) storage: S,
    snapshots: SnapshotEngine<S>,
}

impl<S: LedgerStorage + Clone> PeriodManager<S> {
    /// Create a new period manager
    pub fn new(storage: S) -> Self {
        Self {
            snapshots: SnapshotEngine::new(storage.clone()),
            storage,
        }
    }

    /// Create an Open period for the given calendar month.
    /// Rejects invalid months and duplicate (year, month) pairs.
    pub async fn create_period(&mut self, year: i32, month: u32) -> LedgerResult<AccountingPeriod> {
        if self.storage.find_period(year, month).await?.is_some() {
            return Err(LedgerError::Validation(format!(
                "Period for {}-{:02} already exists",
                year, month
            )));
        }

        let period = AccountingPeriod::new(uuid::Uuid::new_v4().to_string(), year, month)?;
        self.storage.save_period(&period).await?;
        Ok(period)
    }

    /// Get a period by ID, returning an error if not found
    pub async fn get_period_required(&self, period_id: &str) -> LedgerResult<AccountingPeriod> {
        self.storage
            .get_period(period_id)
            .await?
            .ok_or_else(|| LedgerError::PeriodNotFound(period_id.to_string()))
    }

    /// Find the period covering a (year, month)
    pub async fn find_period(
        &self,
        year: i32,
        month: u32,
    ) -> LedgerResult<Option<AccountingPeriod>> {
        self.storage.find_period(year, month).await
    }

    /// List all periods in calendar order
    pub async fn list_periods(&self) -> LedgerResult<Vec<AccountingPeriod>> {
        let mut periods = self.storage.list_periods().await?;
        periods.sort_by_key(|p| p.key());
        Ok(periods)
    }

    /// The Open period containing `today`, derived on demand rather than
    /// stored as mutable state
    pub async fn current_period(&self, today: NaiveDate) -> LedgerResult<Option<AccountingPeriod>> {
        let periods = self.storage.list_periods().await?;
        Ok(periods
            .into_iter()
            .find(|p| p.status == PeriodStatus::Open && p.contains(today)))
    }

    /// Close an Open period: verify no in-range drafts, freeze balances into
    /// snapshots, then flip the status.
    ///
    /// A single draft dated inside the month aborts the close with no
    /// snapshots written.
    pub async fn close_period(
        &mut self,
        period_id: &str,
        actor: &str,
    ) -> LedgerResult<AccountingPeriod> {
        let mut period = self.get_period_required(period_id).await?;
        if period.status != PeriodStatus::Open {
            return Err(LedgerError::PeriodState(format!(
                "Period {} is already {:?}",
                period.name, period.status
            )));
        }

        let drafts = self
            .storage
            .count_draft_entries(period.start, period.end)
            .await?;
        if drafts > 0 {
            return Err(LedgerError::PeriodState(format!(
                "Period {} has {} draft entries in range; post or delete them before closing",
                period.name, drafts
            )));
        }

        let snapshots = self.snapshots.generate(&period).await?;
        self.storage
            .replace_snapshots(&period.id, &snapshots)
            .await?;

        let now = chrono::Utc::now().naive_utc();
        period.status = PeriodStatus::Closed;
        period.closed_by = Some(actor.to_string());
        period.closed_at = Some(now);
        period.updated_at = now;
        self.storage.update_period(&period).await?;

        info!(period = %period.name, snapshots = snapshots.len(), "closed period");
        Ok(period)
    }

    /// Lock a Closed period so reopening requires deliberate ceremony
    pub async fn lock_period(&mut self, period_id: &str) -> LedgerResult<AccountingPeriod> {
        let mut period = self.get_period_required(period_id).await?;
        if period.status != PeriodStatus::Closed {
            return Err(LedgerError::PeriodState(format!(
                "Only closed periods can be locked, period {} is {:?}",
                period.name, period.status
            )));
        }

        period.status = PeriodStatus::Locked;
        period.updated_at = chrono::Utc::now().naive_utc();
        self.storage.update_period(&period).await?;

        info!(period = %period.name, "locked period");
        Ok(period)
    }

    /// Reopen a Closed or Locked period.
    ///
    /// Permitted only when no strictly later period is Closed or Locked, so
    /// the closed suffix of the calendar stays contiguous. Existing snapshots
    /// are left intact; a later re-close regenerates them wholesale.
    pub async fn reopen_period(&mut self, period_id: &str) -> LedgerResult<AccountingPeriod> {
        let mut period = self.get_period_required(period_id).await?;
        if period.status == PeriodStatus::Open {
            return Err(LedgerError::PeriodState(format!(
                "Period {} is already open",
                period.name
            )));
        }

        let periods = self.storage.list_periods().await?;
        if let Some(later) = periods
            .iter()
            .find(|p| p.key() > period.key() && p.status != PeriodStatus::Open)
        {
            return Err(LedgerError::PeriodState(format!(
                "Cannot reopen {} while {} is {:?}; reopen later periods first",
                period.name, later.name, later.status
            )));
        }

        period.status = PeriodStatus::Open;
        period.closed_by = None;
        period.closed_at = None;
        period.updated_at = chrono::Utc::now().naive_utc();
        self.storage.update_period(&period).await?;

        info!(period = %period.name, "reopened period");
        Ok(period)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::account::{AccountRegistry, NewAccount};
    use crate::ledger::journal::{patterns, JournalManager, NewEntry};
    use crate::utils::memory_storage::MemoryStorage;
    use bigdecimal::BigDecimal;

    async fn seed_accounts(storage: &MemoryStorage) -> (Account, Account) {
        let mut registry = AccountRegistry::new(storage.clone());
        let cash = registry
            .create_account(NewAccount {
                code: "1-101".to_string(),
                name: "Cash".to_string(),
                account_type: AccountType::Asset,
                classification: AccountClassification::CurrentAsset,
                header: false,
                parent_id: None,
            })
            .await
            .unwrap();
        let revenue = registry
            .create_account(NewAccount {
                code: "4-100".to_string(),
                name: "Sales Revenue".to_string(),
                account_type: AccountType::Revenue,
                classification: AccountClassification::OperatingRevenue,
                header: false,
                parent_id: None,
            })
            .await
            .unwrap();
        (cash, revenue)
    }

    #[tokio::test]
    async fn duplicate_and_invalid_months_rejected() {
        let storage = MemoryStorage::new();
        let mut periods = PeriodManager::new(storage);

        periods.create_period(2025, 1).await.unwrap();
        assert!(periods.create_period(2025, 1).await.is_err());
        assert!(periods.create_period(2025, 0).await.is_err());
        assert!(periods.create_period(2025, 13).await.is_err());
    }

    #[tokio::test]
    async fn draft_in_range_blocks_close() {
        let storage = MemoryStorage::new();
        let (cash, revenue) = seed_accounts(&storage).await;
        let mut journal = JournalManager::new(storage.clone());
        let mut periods = PeriodManager::new(storage.clone());

        let period = periods.create_period(2025, 1).await.unwrap();
        let date = chrono::NaiveDate::from_ymd_opt(2025, 1, 20).unwrap();
        let draft = journal
            .draft_entry(
                NewEntry::new(date, "Pending".to_string(), EntrySource::Manual)
                    .debit(cash.id.clone(), LineScope::Consolidated, BigDecimal::from(10))
                    .credit(revenue.id.clone(), LineScope::Consolidated, BigDecimal::from(10)),
            )
            .await
            .unwrap();

        let blocked = periods.close_period(&period.id, "tester").await;
        assert!(blocked.is_err());
        assert!(storage
            .list_snapshots(&period.id)
            .await
            .unwrap()
            .is_empty());

        journal.post_draft(&draft.id, "tester").await.unwrap();
        let closed = periods.close_period(&period.id, "tester").await.unwrap();
        assert_eq!(closed.status, PeriodStatus::Closed);
        assert!(closed.closed_at.is_some());
        assert!(!storage
            .list_snapshots(&period.id)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn close_is_not_idempotent() {
        let storage = MemoryStorage::new();
        seed_accounts(&storage).await;
        let mut periods = PeriodManager::new(storage);

        let period = periods.create_period(2025, 1).await.unwrap();
        periods.close_period(&period.id, "tester").await.unwrap();
        assert!(periods.close_period(&period.id, "tester").await.is_err());
    }

    #[tokio::test]
    async fn lock_requires_closed() {
        let storage = MemoryStorage::new();
        seed_accounts(&storage).await;
        let mut periods = PeriodManager::new(storage);

        let period = periods.create_period(2025, 1).await.unwrap();
        assert!(periods.lock_period(&period.id).await.is_err());

        periods.close_period(&period.id, "tester").await.unwrap();
        let locked = periods.lock_period(&period.id).await.unwrap();
        assert_eq!(locked.status, PeriodStatus::Locked);
    }

    #[tokio::test]
    async fn reopen_enforces_reverse_chronological_order() {
        let storage = MemoryStorage::new();
        seed_accounts(&storage).await;
        let mut periods = PeriodManager::new(storage.clone());

        let nov = periods.create_period(2025, 11).await.unwrap();
        let dec = periods.create_period(2025, 12).await.unwrap();

        // Periods close independently of order
        periods.close_period(&nov.id, "tester").await.unwrap();
        periods.close_period(&dec.id, "tester").await.unwrap();

        // November cannot reopen while December is closed
        assert!(periods.reopen_period(&nov.id).await.is_err());

        periods.reopen_period(&dec.id).await.unwrap();
        let reopened = periods.reopen_period(&nov.id).await.unwrap();
        assert_eq!(reopened.status, PeriodStatus::Open);
        assert!(reopened.closed_at.is_none());

        // Snapshots survive the reopen
        assert!(!storage.list_snapshots(&nov.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn close_out_of_order_is_permitted() {
        let storage = MemoryStorage::new();
        let (cash, revenue) = seed_accounts(&storage).await;
        let mut journal = JournalManager::new(storage.clone());
        let mut periods = PeriodManager::new(storage.clone());

        let nov = periods.create_period(2025, 11).await.unwrap();
        let dec = periods.create_period(2025, 12).await.unwrap();

        journal
            .post_entry(
                patterns::cash_sale(
                    chrono::NaiveDate::from_ymd_opt(2025, 12, 5).unwrap(),
                    "December sale".to_string(),
                    cash.id.clone(),
                    revenue.id.clone(),
                    BigDecimal::from(500),
                    LineScope::Consolidated,
                ),
                "tester",
            )
            .await
            .unwrap();

        // December closes first while November is still open
        let closed = periods.close_period(&dec.id, "tester").await.unwrap();
        assert_eq!(closed.status, PeriodStatus::Closed);

        // November has no snapshot yet, so December opens from zero
        let dec_cash = storage
            .list_snapshots(&dec.id)
            .await
            .unwrap()
            .into_iter()
            .find(|s| s.account_id == cash.id && s.scope == LineScope::Consolidated)
            .unwrap();
        assert_eq!(dec_cash.opening, BigDecimal::from(0));
        assert_eq!(dec_cash.closing, BigDecimal::from(500));

        // With both months closed, reopening still runs newest first
        periods.close_period(&nov.id, "tester").await.unwrap();
        assert!(periods.reopen_period(&nov.id).await.is_err());
    }

    #[tokio::test]
    async fn posting_into_closed_period_rejected() {
        let storage = MemoryStorage::new();
        let (cash, revenue) = seed_accounts(&storage).await;
        let mut journal = JournalManager::new(storage.clone());
        let mut periods = PeriodManager::new(storage);

        let period = periods.create_period(2025, 1).await.unwrap();
        periods.close_period(&period.id, "tester").await.unwrap();

        let rejected = journal
            .post_entry(
                patterns::cash_sale(
                    chrono::NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(),
                    "Backdated".to_string(),
                    cash.id,
                    revenue.id,
                    BigDecimal::from(50),
                    LineScope::Consolidated,
                ),
                "tester",
            )
            .await;
        assert!(matches!(rejected, Err(LedgerError::PeriodState(_))));
    }

    #[tokio::test]
    async fn current_period_is_derived() {
        let storage = MemoryStorage::new();
        seed_accounts(&storage).await;
        let mut periods = PeriodManager::new(storage);

        let jan = periods.create_period(2025, 1).await.unwrap();
        periods.create_period(2025, 2).await.unwrap();

        let today = chrono::NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
        let current = periods.current_period(today).await.unwrap().unwrap();
        assert_eq!(current.id, jan.id);

        periods.close_period(&jan.id, "tester").await.unwrap();
        assert!(periods.current_period(today).await.unwrap().is_none());
    }
}
