//! Traits for storage abstraction and extensibility

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::types::*;

/// Storage abstraction for the ledger system
///
/// This trait allows the ledger core to work with any storage backend
/// (PostgreSQL, MySQL, SQLite, in-memory, etc.) by implementing these methods.
/// Each write operation is expected to be atomic with no partial visibility of
/// intermediate inserts; `replace_snapshots` in particular replaces a period's
/// whole snapshot set in one step.
#[async_trait]
pub trait LedgerStorage: Send + Sync {
    // --- Chart of accounts ---

    /// Save an account to storage
    async fn save_account(&mut self, account: &Account) -> LedgerResult<()>;

    /// Get an account by ID
    async fn get_account(&self, account_id: &str) -> LedgerResult<Option<Account>>;

    /// Get an account by its chart code
    async fn get_account_by_code(&self, code: &str) -> LedgerResult<Option<Account>>;

    /// List all accounts, optionally filtered by type
    async fn list_accounts(&self, account_type: Option<AccountType>) -> LedgerResult<Vec<Account>>;

    /// Update an account
    async fn update_account(&mut self, account: &Account) -> LedgerResult<()>;

    // --- Branches ---

    /// Save a branch to storage
    async fn save_branch(&mut self, branch: &Branch) -> LedgerResult<()>;

    /// List all branches
    async fn list_branches(&self) -> LedgerResult<Vec<Branch>>;

    // --- Journal entries ---

    /// Save a journal entry and its lines
    async fn save_entry(&mut self, entry: &JournalEntry) -> LedgerResult<()>;

    /// Get a journal entry by ID
    async fn get_entry(&self, entry_id: &str) -> LedgerResult<Option<JournalEntry>>;

    /// Update a journal entry
    async fn update_entry(&mut self, entry: &JournalEntry) -> LedgerResult<()>;

    /// List all entries within a date range
    async fn list_entries(
        &self,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> LedgerResult<Vec<JournalEntry>>;

    /// List entries that have at least one line posting to the account
    async fn account_entries(
        &self,
        account_id: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> LedgerResult<Vec<JournalEntry>>;

    /// Count non-deleted Draft entries dated within [start, end]
    async fn count_draft_entries(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> LedgerResult<usize>;

    /// Count all entries dated within the given calendar month (for numbering)
    async fn count_entries_in_month(&self, year: i32, month: u32) -> LedgerResult<usize>;

    /// Find the non-voided year-end closing entry for a calendar year, if any
    async fn find_year_end_entry(&self, year: i32) -> LedgerResult<Option<JournalEntry>>;

    // --- Accounting periods ---

    /// Save an accounting period
    async fn save_period(&mut self, period: &AccountingPeriod) -> LedgerResult<()>;

    /// Get a period by ID
    async fn get_period(&self, period_id: &str) -> LedgerResult<Option<AccountingPeriod>>;

    /// Find the period covering a (year, month)
    async fn find_period(&self, year: i32, month: u32) -> LedgerResult<Option<AccountingPeriod>>;

    /// List all periods
    async fn list_periods(&self) -> LedgerResult<Vec<AccountingPeriod>>;

    /// Update a period
    async fn update_period(&mut self, period: &AccountingPeriod) -> LedgerResult<()>;

    // --- Period snapshots ---

    /// Replace a period's snapshot set in one atomic step
    async fn replace_snapshots(
        &mut self,
        period_id: &str,
        snapshots: &[PeriodSnapshot],
    ) -> LedgerResult<()>;

    /// List all snapshots for a period
    async fn list_snapshots(&self, period_id: &str) -> LedgerResult<Vec<PeriodSnapshot>>;

    /// Get one snapshot by (period, account, scope)
    async fn get_snapshot(
        &self,
        period_id: &str,
        account_id: &str,
        scope: &LineScope,
    ) -> LedgerResult<Option<PeriodSnapshot>>;

    // --- Receivables ---

    /// Save an outstanding receivable record
    async fn save_receivable(&mut self, receivable: &Receivable) -> LedgerResult<()>;

    /// Get a receivable by ID
    async fn get_receivable(&self, receivable_id: &str) -> LedgerResult<Option<Receivable>>;

    /// List receivables invoiced within a date range
    async fn list_receivables(
        &self,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> LedgerResult<Vec<Receivable>>;

    /// Persist an updated receivable together with the payment applied to it,
    /// in one atomic step
    async fn apply_payment(
        &mut self,
        receivable: &Receivable,
        payment: &ReceivablePayment,
    ) -> LedgerResult<()>;

    /// List payments dated within [start, end]
    async fn list_payments(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> LedgerResult<Vec<ReceivablePayment>>;
}

/// Trait for implementing custom account validation rules
pub trait AccountValidator: Send + Sync {
    /// Validate an account before saving
    fn validate_account(&self, account: &Account) -> LedgerResult<()>;
}

/// Trait for implementing custom journal entry validation rules
pub trait EntryValidator: Send + Sync {
    /// Validate an entry before posting
    fn validate_entry(&self, entry: &JournalEntry) -> LedgerResult<()>;
}

/// Default account validator with basic rules
pub struct DefaultAccountValidator;

impl AccountValidator for DefaultAccountValidator {
    fn validate_account(&self, account: &Account) -> LedgerResult<()> {
        crate::utils::validation::validate_account_code(&account.code)?;
        crate::utils::validation::validate_account_name(&account.name)?;

        if account.classification.account_type() != account.account_type {
            return Err(LedgerError::Validation(format!(
                "Classification {:?} does not belong to account type {:?}",
                account.classification, account.account_type
            )));
        }

        Ok(())
    }
}

/// Default entry validator enforcing double-entry rules
pub struct DefaultEntryValidator;

impl EntryValidator for DefaultEntryValidator {
    fn validate_entry(&self, entry: &JournalEntry) -> LedgerResult<()> {
        crate::utils::validation::validate_description(&entry.description)?;
        entry.validate()
    }
}
