//! Journal entry processing and the balance primitive

use bigdecimal::BigDecimal;
use chrono::{Datelike, NaiveDate};
use tracing::info;

use crate::traits::*;
use crate::types::*;

/// Parameters for a journal entry to be posted or drafted.
///
/// External modules (sales, purchasing, expenses, clinic, hotel) build one of
/// these per business transaction; the ledger only checks the arithmetic
/// balance, not the caller's business logic.
#[derive(Debug, Clone)]
pub struct NewEntry {
    pub date: NaiveDate,
    pub description: String,
    pub source: EntrySource,
    pub source_ref: Option<String>,
    pub lines: Vec<JournalLine>,
}

impl NewEntry {
    /// Start a new entry with no lines
    pub fn new(date: NaiveDate, description: String, source: EntrySource) -> Self {
        Self {
            date,
            description,
            source,
            source_ref: None,
            lines: Vec::new(),
        }
    }

    /// Set the reference into the originating record
    pub fn source_ref(mut self, source_ref: String) -> Self {
        self.source_ref = Some(source_ref);
        self
    }

    /// Add a debit line
    pub fn debit(mut self, account_id: String, scope: LineScope, amount: BigDecimal) -> Self {
        let order = self.lines.len() as u32;
        self.lines
            .push(JournalLine::debit(account_id, scope, amount, order));
        self
    }

    /// Add a credit line
    pub fn credit(mut self, account_id: String, scope: LineScope, amount: BigDecimal) -> Self {
        let order = self.lines.len() as u32;
        self.lines
            .push(JournalLine::credit(account_id, scope, amount, order));
        self
    }
}

/// Journal manager: append-only store of balanced entries and the single
/// balance primitive every report folds through
pub struct JournalManager<S: LedgerStorage> {
    pub(crate) storage: S,
    validator: Box<dyn EntryValidator>,
}

impl<S: LedgerStorage> JournalManager<S> {
    /// Create a new journal manager
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            validator: Box::new(DefaultEntryValidator),
        }
    }

    /// Create a new journal manager with a custom validator
    pub fn with_validator(storage: S, validator: Box<dyn EntryValidator>) -> Self {
        Self { storage, validator }
    }

    /// Validate and post a balanced entry in one step.
    ///
    /// Rejects unbalanced line sets, postings to header/inactive accounts,
    /// and entries dated into a Closed or Locked period. Nothing is written
    /// on failure.
    pub async fn post_entry(&mut self, new: NewEntry, actor: &str) -> LedgerResult<JournalEntry> {
        let mut entry = self.build_entry(new).await?;
        self.check_entry(&entry).await?;
        self.check_period_open(entry.date).await?;
        self.mark_posted(&mut entry, actor);
        self.storage.save_entry(&entry).await?;
        info!(number = %entry.number, source = ?entry.source, "posted journal entry");
        Ok(entry)
    }

    /// Create a Draft entry whose lines may still be edited or deleted.
    ///
    /// Drafts do not count toward balances, but an in-range draft blocks its
    /// period from closing until it is posted or deleted.
    pub async fn draft_entry(&mut self, new: NewEntry) -> LedgerResult<JournalEntry> {
        let entry = self.build_entry(new).await?;
        self.storage.save_entry(&entry).await?;
        Ok(entry)
    }

    /// Replace a Draft entry's lines and description
    pub async fn update_draft(
        &mut self,
        entry_id: &str,
        description: String,
        lines: Vec<JournalLine>,
    ) -> LedgerResult<JournalEntry> {
        let mut entry = self.get_entry_required(entry_id).await?;
        if entry.status != EntryStatus::Draft || entry.deleted_at.is_some() {
            return Err(LedgerError::InvalidEntry(format!(
                "Entry '{}' is not an editable draft",
                entry_id
            )));
        }
        entry.description = description;
        entry.lines = lines;
        entry.updated_at = chrono::Utc::now().naive_utc();
        self.storage.update_entry(&entry).await?;
        Ok(entry)
    }

    /// Soft-delete a Draft entry
    pub async fn delete_draft(&mut self, entry_id: &str) -> LedgerResult<()> {
        let mut entry = self.get_entry_required(entry_id).await?;
        if entry.status != EntryStatus::Draft {
            return Err(LedgerError::InvalidEntry(format!(
                "Only draft entries can be deleted, entry '{}' is {:?}",
                entry_id, entry.status
            )));
        }
        let now = chrono::Utc::now().naive_utc();
        entry.deleted_at = Some(now);
        entry.updated_at = now;
        self.storage.update_entry(&entry).await
    }

    /// Promote a Draft entry to Posted, freezing its lines
    pub async fn post_draft(&mut self, entry_id: &str, actor: &str) -> LedgerResult<JournalEntry> {
        let mut entry = self.get_entry_required(entry_id).await?;
        if entry.status != EntryStatus::Draft || entry.deleted_at.is_some() {
            return Err(LedgerError::InvalidEntry(format!(
                "Entry '{}' is not a postable draft",
                entry_id
            )));
        }
        self.check_entry(&entry).await?;
        self.check_period_open(entry.date).await?;
        self.mark_posted(&mut entry, actor);
        self.storage.update_entry(&entry).await?;
        info!(number = %entry.number, "posted draft entry");
        Ok(entry)
    }

    /// Mark a Posted entry Voided with a reason.
    ///
    /// No reversing entry is generated; compensating postings are the
    /// caller's responsibility.
    pub async fn void_entry(
        &mut self,
        entry_id: &str,
        reason: &str,
        actor: &str,
    ) -> LedgerResult<JournalEntry> {
        crate::utils::validation::validate_description(reason)?;

        let mut entry = self.get_entry_required(entry_id).await?;
        if entry.status != EntryStatus::Posted {
            return Err(LedgerError::InvalidEntry(format!(
                "Only posted entries can be voided, entry '{}' is {:?}",
                entry_id, entry.status
            )));
        }

        let now = chrono::Utc::now().naive_utc();
        entry.status = EntryStatus::Voided;
        entry.voided_by = Some(actor.to_string());
        entry.voided_at = Some(now);
        entry.void_reason = Some(reason.to_string());
        entry.updated_at = now;
        self.storage.update_entry(&entry).await?;
        info!(number = %entry.number, reason, "voided journal entry");
        Ok(entry)
    }

    /// Get a journal entry by ID
    pub async fn get_entry(&self, entry_id: &str) -> LedgerResult<Option<JournalEntry>> {
        self.storage.get_entry(entry_id).await
    }

    /// Get a journal entry by ID, returning an error if not found
    pub async fn get_entry_required(&self, entry_id: &str) -> LedgerResult<JournalEntry> {
        self.storage
            .get_entry(entry_id)
            .await?
            .ok_or_else(|| LedgerError::EntryNotFound(entry_id.to_string()))
    }

    /// List all entries within a date range
    pub async fn list_entries(
        &self,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> LedgerResult<Vec<JournalEntry>> {
        self.storage.list_entries(start_date, end_date).await
    }

    /// Account balance as of a date: the single balance primitive.
    ///
    /// Folds every Posted, non-deleted line for the account with entry date
    /// on or before `as_of` through the direction rule, optionally restricted
    /// to one branch. O(lines for the account) per call, no memoization.
    pub async fn account_balance(
        &self,
        account_id: &str,
        as_of: NaiveDate,
        filter: &BranchFilter,
    ) -> LedgerResult<BigDecimal> {
        self.signed_activity(account_id, None, Some(as_of), filter)
            .await
    }

    /// Signed account activity within [from, to], same fold as
    /// [`account_balance`](Self::account_balance) restricted to a window
    pub async fn account_activity(
        &self,
        account_id: &str,
        from: NaiveDate,
        to: NaiveDate,
        filter: &BranchFilter,
    ) -> LedgerResult<BigDecimal> {
        self.signed_activity(account_id, Some(from), Some(to), filter)
            .await
    }

    async fn signed_activity(
        &self,
        account_id: &str,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
        filter: &BranchFilter,
    ) -> LedgerResult<BigDecimal> {
        let account = self
            .storage
            .get_account(account_id)
            .await?
            .ok_or_else(|| LedgerError::AccountNotFound(account_id.to_string()))?;

        let entries = self.storage.account_entries(account_id, from, to).await?;
        let (debits, credits) = line_totals(account_id, &entries, filter);
        Ok(account.normal_balance().signed(&debits, &credits))
    }

    /// Post a pre-validated entry without the period gate.
    ///
    /// Internal closing routines (year-end close) write into periods that are
    /// already Closed; everything else must go through [`post_entry`].
    ///
    /// [`post_entry`]: Self::post_entry
    pub(crate) async fn insert_posted_unchecked(
        &mut self,
        new: NewEntry,
        actor: &str,
    ) -> LedgerResult<JournalEntry> {
        let mut entry = self.build_entry(new).await?;
        self.check_entry(&entry).await?;
        self.mark_posted(&mut entry, actor);
        self.storage.save_entry(&entry).await?;
        info!(number = %entry.number, source = ?entry.source, "posted internal entry");
        Ok(entry)
    }

    async fn build_entry(&self, new: NewEntry) -> LedgerResult<JournalEntry> {
        let number = self.next_entry_number(new.date).await?;
        let mut entry = JournalEntry::new(
            uuid::Uuid::new_v4().to_string(),
            number,
            new.date,
            new.description,
            new.source,
            new.source_ref,
        );
        entry.lines = new.lines;
        Ok(entry)
    }

    /// Balance validation plus account and branch reference checks
    async fn check_entry(&self, entry: &JournalEntry) -> LedgerResult<()> {
        self.validator.validate_entry(entry)?;

        let needs_branches = entry
            .lines
            .iter()
            .any(|l| matches!(l.scope, LineScope::Branch(_)));
        let branches = if needs_branches {
            self.storage.list_branches().await?
        } else {
            Vec::new()
        };

        for line in &entry.lines {
            let account = self
                .storage
                .get_account(&line.account_id)
                .await?
                .ok_or_else(|| LedgerError::AccountNotFound(line.account_id.clone()))?;
            if !account.postable() {
                return Err(LedgerError::InvalidEntry(format!(
                    "Account '{}' ({}) cannot receive postings",
                    account.code, account.name
                )));
            }

            if let LineScope::Branch(branch_id) = &line.scope {
                if !branches.iter().any(|b| b.id == *branch_id && b.active) {
                    return Err(LedgerError::BranchNotFound(branch_id.clone()));
                }
            }
        }

        Ok(())
    }

    /// Entries dated into a Closed or Locked period are rejected
    async fn check_period_open(&self, date: NaiveDate) -> LedgerResult<()> {
        if let Some(period) = self.storage.find_period(date.year(), date.month()).await? {
            if period.status != PeriodStatus::Open {
                return Err(LedgerError::PeriodState(format!(
                    "Period {} is {:?}; entries dated {} are rejected",
                    period.name, period.status, date
                )));
            }
        }
        Ok(())
    }

    fn mark_posted(&self, entry: &mut JournalEntry, actor: &str) {
        let now = chrono::Utc::now().naive_utc();
        entry.status = EntryStatus::Posted;
        entry.posted_by = Some(actor.to_string());
        entry.posted_at = Some(now);
        entry.updated_at = now;
    }

    /// Sequential entry number within the entry's calendar month
    async fn next_entry_number(&self, date: NaiveDate) -> LedgerResult<String> {
        let seq = self
            .storage
            .count_entries_in_month(date.year(), date.month())
            .await?
            + 1;
        Ok(format!("JE-{}{:02}-{:04}", date.year(), date.month(), seq))
    }
}

/// Fold an account's debit/credit totals over effective entries under a
/// branch filter. Shared by the balance primitive and the snapshot engine.
pub(crate) fn line_totals(
    account_id: &str,
    entries: &[JournalEntry],
    filter: &BranchFilter,
) -> (BigDecimal, BigDecimal) {
    let mut debits = BigDecimal::from(0);
    let mut credits = BigDecimal::from(0);

    for entry in entries {
        if !entry.is_effective() {
            continue;
        }
        for line in &entry.lines {
            if line.account_id == account_id && filter.matches(&line.scope) {
                debits += &line.debit;
                credits += &line.credit;
            }
        }
    }

    (debits, credits)
}

/// Common posting patterns used by the external transaction modules
pub mod patterns {
    use super::*;

    /// Cash sale: debit cash, credit revenue
    pub fn cash_sale(
        date: NaiveDate,
        description: String,
        cash_account_id: String,
        revenue_account_id: String,
        amount: BigDecimal,
        scope: LineScope,
    ) -> NewEntry {
        NewEntry::new(date, description, EntrySource::Sales)
            .debit(cash_account_id, scope.clone(), amount.clone())
            .credit(revenue_account_id, scope, amount)
    }

    /// Credit sale: debit receivables, credit revenue
    pub fn credit_sale(
        date: NaiveDate,
        description: String,
        receivables_account_id: String,
        revenue_account_id: String,
        amount: BigDecimal,
        scope: LineScope,
    ) -> NewEntry {
        NewEntry::new(date, description, EntrySource::Sales)
            .debit(receivables_account_id, scope.clone(), amount.clone())
            .credit(revenue_account_id, scope, amount)
    }

    /// Expense payment: debit expense, credit cash
    pub fn expense_payment(
        date: NaiveDate,
        description: String,
        expense_account_id: String,
        cash_account_id: String,
        amount: BigDecimal,
        scope: LineScope,
    ) -> NewEntry {
        NewEntry::new(date, description, EntrySource::Expenses)
            .debit(expense_account_id, scope.clone(), amount.clone())
            .credit(cash_account_id, scope, amount)
    }

    /// Inventory purchase on account: debit inventory, credit payables
    pub fn inventory_purchase(
        date: NaiveDate,
        description: String,
        inventory_account_id: String,
        payables_account_id: String,
        amount: BigDecimal,
        scope: LineScope,
    ) -> NewEntry {
        NewEntry::new(date, description, EntrySource::Purchasing)
            .debit(inventory_account_id, scope.clone(), amount.clone())
            .credit(payables_account_id, scope, amount)
    }

    /// Receivable settlement: debit cash, credit receivables
    pub fn receivable_settlement(
        date: NaiveDate,
        description: String,
        cash_account_id: String,
        receivables_account_id: String,
        amount: BigDecimal,
        scope: LineScope,
    ) -> NewEntry {
        NewEntry::new(date, description, EntrySource::Sales)
            .debit(cash_account_id, scope.clone(), amount.clone())
            .credit(receivables_account_id, scope, amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::account::{AccountRegistry, NewAccount};
    use crate::utils::memory_storage::MemoryStorage;

    async fn setup() -> (MemoryStorage, Account, Account) {
        let storage = MemoryStorage::new();
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
        (storage, cash, revenue)
    }

    #[tokio::test]
    async fn posted_entry_moves_balances_both_ways() {
        let (storage, cash, revenue) = setup().await;
        let mut journal = JournalManager::new(storage);

        let date = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
        journal
            .post_entry(
                patterns::cash_sale(
                    date,
                    "Sale of goods".to_string(),
                    cash.id.clone(),
                    revenue.id.clone(),
                    BigDecimal::from(1000),
                    LineScope::Consolidated,
                ),
                "tester",
            )
            .await
            .unwrap();

        let as_of = NaiveDate::from_ymd_opt(2025, 1, 31).unwrap();
        let cash_balance = journal
            .account_balance(&cash.id, as_of, &BranchFilter::Consolidated)
            .await
            .unwrap();
        let revenue_balance = journal
            .account_balance(&revenue.id, as_of, &BranchFilter::Consolidated)
            .await
            .unwrap();

        assert_eq!(cash_balance, BigDecimal::from(1000));
        assert_eq!(revenue_balance, BigDecimal::from(1000));
    }

    #[tokio::test]
    async fn unbalanced_entry_rejected_without_write() {
        let (storage, cash, revenue) = setup().await;
        let mut journal = JournalManager::new(storage);

        let date = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
        let unbalanced = NewEntry::new(date, "Broken".to_string(), EntrySource::Manual)
            .debit(cash.id.clone(), LineScope::Consolidated, BigDecimal::from(1000))
            .credit(revenue.id.clone(), LineScope::Consolidated, BigDecimal::from(500));

        assert!(journal.post_entry(unbalanced, "tester").await.is_err());
        assert!(journal.list_entries(None, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn header_account_cannot_receive_postings() {
        let (storage, _cash, revenue) = setup().await;
        let mut registry = AccountRegistry::new(storage.clone());
        let header = registry
            .create_account(NewAccount {
                code: "1-100".to_string(),
                name: "Current Assets".to_string(),
                account_type: AccountType::Asset,
                classification: AccountClassification::CurrentAsset,
                header: true,
                parent_id: None,
            })
            .await
            .unwrap();

        let mut journal = JournalManager::new(storage);
        let date = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
        let entry = NewEntry::new(date, "Bad posting".to_string(), EntrySource::Manual)
            .debit(header.id, LineScope::Consolidated, BigDecimal::from(100))
            .credit(revenue.id, LineScope::Consolidated, BigDecimal::from(100));

        assert!(journal.post_entry(entry, "tester").await.is_err());
    }

    #[tokio::test]
    async fn voided_entry_excluded_from_balance() {
        let (storage, cash, revenue) = setup().await;
        let mut journal = JournalManager::new(storage);

        let date = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
        let entry = journal
            .post_entry(
                patterns::cash_sale(
                    date,
                    "Sale".to_string(),
                    cash.id.clone(),
                    revenue.id.clone(),
                    BigDecimal::from(250),
                    LineScope::Consolidated,
                ),
                "tester",
            )
            .await
            .unwrap();

        journal
            .void_entry(&entry.id, "Duplicate capture", "tester")
            .await
            .unwrap();

        let balance = journal
            .account_balance(
                &cash.id,
                NaiveDate::from_ymd_opt(2025, 1, 31).unwrap(),
                &BranchFilter::Consolidated,
            )
            .await
            .unwrap();
        assert_eq!(balance, BigDecimal::from(0));

        // A voided entry cannot be voided again
        assert!(journal
            .void_entry(&entry.id, "Again", "tester")
            .await
            .is_err());
    }

    #[tokio::test]
    async fn draft_lifecycle() {
        let (storage, cash, revenue) = setup().await;
        let mut journal = JournalManager::new(storage);

        let date = NaiveDate::from_ymd_opt(2025, 1, 20).unwrap();
        let draft = journal
            .draft_entry(
                NewEntry::new(date, "Pending sale".to_string(), EntrySource::Manual)
                    .debit(cash.id.clone(), LineScope::Consolidated, BigDecimal::from(40))
                    .credit(revenue.id.clone(), LineScope::Consolidated, BigDecimal::from(40)),
            )
            .await
            .unwrap();
        assert_eq!(draft.status, EntryStatus::Draft);

        // Draft lines do not count toward balances
        let balance = journal
            .account_balance(
                &cash.id,
                NaiveDate::from_ymd_opt(2025, 1, 31).unwrap(),
                &BranchFilter::Consolidated,
            )
            .await
            .unwrap();
        assert_eq!(balance, BigDecimal::from(0));

        // Voiding a draft is rejected
        assert!(journal.void_entry(&draft.id, "No", "tester").await.is_err());

        let posted = journal.post_draft(&draft.id, "tester").await.unwrap();
        assert_eq!(posted.status, EntryStatus::Posted);

        let balance = journal
            .account_balance(
                &cash.id,
                NaiveDate::from_ymd_opt(2025, 1, 31).unwrap(),
                &BranchFilter::Consolidated,
            )
            .await
            .unwrap();
        assert_eq!(balance, BigDecimal::from(40));
    }

    #[tokio::test]
    async fn branch_filter_excludes_other_scopes() {
        let (storage, cash, revenue) = setup().await;
        let mut registry = AccountRegistry::new(storage.clone());
        registry
            .register_branch("branch-a".to_string(), "Branch A".to_string())
            .await
            .unwrap();
        let mut journal = JournalManager::new(storage);

        let date = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        journal
            .post_entry(
                patterns::cash_sale(
                    date,
                    "Branch A sale".to_string(),
                    cash.id.clone(),
                    revenue.id.clone(),
                    BigDecimal::from(300),
                    LineScope::Branch("branch-a".to_string()),
                ),
                "tester",
            )
            .await
            .unwrap();
        journal
            .post_entry(
                patterns::cash_sale(
                    date,
                    "Head-office sale".to_string(),
                    cash.id.clone(),
                    revenue.id.clone(),
                    BigDecimal::from(100),
                    LineScope::Consolidated,
                ),
                "tester",
            )
            .await
            .unwrap();

        let as_of = NaiveDate::from_ymd_opt(2025, 3, 31).unwrap();
        let consolidated = journal
            .account_balance(&cash.id, as_of, &BranchFilter::Consolidated)
            .await
            .unwrap();
        let branch_a = journal
            .account_balance(&cash.id, as_of, &BranchFilter::Branch("branch-a".to_string()))
            .await
            .unwrap();
        let branch_b = journal
            .account_balance(&cash.id, as_of, &BranchFilter::Branch("branch-b".to_string()))
            .await
            .unwrap();

        assert_eq!(consolidated, BigDecimal::from(400));
        assert_eq!(branch_a, BigDecimal::from(300));
        assert_eq!(branch_b, BigDecimal::from(0));
    }

    #[tokio::test]
    async fn unregistered_branch_rejected() {
        let (storage, cash, revenue) = setup().await;
        let mut registry = AccountRegistry::new(storage.clone());
        registry
            .register_branch("branch-a".to_string(), "Branch A".to_string())
            .await
            .unwrap();
        let mut journal = JournalManager::new(storage);

        let date = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let typo = journal
            .post_entry(
                patterns::cash_sale(
                    date,
                    "Mistyped branch".to_string(),
                    cash.id.clone(),
                    revenue.id.clone(),
                    BigDecimal::from(100),
                    LineScope::Branch("branch-b".to_string()),
                ),
                "tester",
            )
            .await;
        assert!(matches!(typo, Err(LedgerError::BranchNotFound(id)) if id == "branch-b"));
        assert!(journal.list_entries(None, None).await.unwrap().is_empty());

        journal
            .post_entry(
                patterns::cash_sale(
                    date,
                    "Registered branch".to_string(),
                    cash.id,
                    revenue.id,
                    BigDecimal::from(100),
                    LineScope::Branch("branch-a".to_string()),
                ),
                "tester",
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn entry_numbers_sequence_within_month() {
        let (storage, cash, revenue) = setup().await;
        let mut journal = JournalManager::new(storage);

        let date = NaiveDate::from_ymd_opt(2025, 1, 5).unwrap();
        let first = journal
            .post_entry(
                patterns::cash_sale(
                    date,
                    "First".to_string(),
                    cash.id.clone(),
                    revenue.id.clone(),
                    BigDecimal::from(10),
                    LineScope::Consolidated,
                ),
                "tester",
            )
            .await
            .unwrap();
        let second = journal
            .post_entry(
                patterns::cash_sale(
                    date,
                    "Second".to_string(),
                    cash.id,
                    revenue.id,
                    BigDecimal::from(20),
                    LineScope::Consolidated,
                ),
                "tester",
            )
            .await
            .unwrap();

        assert_eq!(first.number, "JE-202501-0001");
        assert_eq!(second.number, "JE-202501-0002");
    }
}
