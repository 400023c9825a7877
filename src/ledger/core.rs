//! Main ledger facade that coordinates accounts, journal, periods, and reports

use std::collections::HashMap;

use bigdecimal::BigDecimal;
use chrono::NaiveDate;

use crate::ledger::account::{AccountRegistry, NewAccount};
use crate::ledger::journal::{JournalManager, NewEntry};
use crate::period::lifecycle::PeriodManager;
use crate::statements;
use crate::statements::{
    AgingReport, BalanceSheet, CashFlowItem, CashFlowStatement, CollectionMetrics,
    IncomeStatement,
};
use crate::traits::*;
use crate::types::*;
use crate::utils::validation;

/// Main ledger system that orchestrates all accounting operations
pub struct Ledger<S: LedgerStorage> {
    registry: AccountRegistry<S>,
    journal: JournalManager<S>,
    periods: PeriodManager<S>,
    storage: S,
    roles: Option<AccountRoles>,
}

impl<S: LedgerStorage + Clone> Ledger<S> {
    /// Create a new ledger with the given storage backend
    pub fn new(storage: S) -> Self {
        Self {
            registry: AccountRegistry::new(storage.clone()),
            journal: JournalManager::new(storage.clone()),
            periods: PeriodManager::new(storage.clone()),
            storage,
            roles: None,
        }
    }

    /// Create a new ledger with custom validators
    pub fn with_validators(
        storage: S,
        account_validator: Box<dyn AccountValidator>,
        entry_validator: Box<dyn EntryValidator>,
    ) -> Self {
        Self {
            registry: AccountRegistry::with_validator(storage.clone(), account_validator),
            journal: JournalManager::with_validator(storage.clone(), entry_validator),
            periods: PeriodManager::new(storage.clone()),
            storage,
            roles: None,
        }
    }

    /// Configure the role-to-account mapping used by cash-flow reconciliation
    /// and year-end close
    pub fn set_roles(&mut self, roles: AccountRoles) {
        self.roles = Some(roles);
    }

    fn roles_required(&self) -> LedgerResult<&AccountRoles> {
        self.roles.as_ref().ok_or_else(|| {
            LedgerError::Validation(
                "Account roles are not configured; call set_roles or setup_standard_chart"
                    .to_string(),
            )
        })
    }

    // Account operations

    /// Create a new account in the chart
    pub async fn create_account(&mut self, def: NewAccount) -> LedgerResult<Account> {
        self.registry.create_account(def).await
    }

    /// Get an account by ID
    pub async fn get_account(&self, account_id: &str) -> LedgerResult<Option<Account>> {
        self.registry.get_account(account_id).await
    }

    /// Get an account by its chart code
    pub async fn get_account_by_code(&self, code: &str) -> LedgerResult<Option<Account>> {
        self.registry.get_account_by_code(code).await
    }

    /// List all accounts
    pub async fn list_accounts(&self) -> LedgerResult<Vec<Account>> {
        self.registry.list_accounts().await
    }

    /// List accounts by type
    pub async fn list_accounts_by_type(
        &self,
        account_type: AccountType,
    ) -> LedgerResult<Vec<Account>> {
        self.registry.list_accounts_by_type(account_type).await
    }

    /// Soft-delete an account so it can no longer receive postings
    pub async fn deactivate_account(&mut self, account_id: &str) -> LedgerResult<Account> {
        self.registry.deactivate_account(account_id).await
    }

    /// Get all child accounts of a parent account
    pub async fn child_accounts(&self, parent_id: &str) -> LedgerResult<Vec<Account>> {
        self.registry.child_accounts(parent_id).await
    }

    /// Get the full path to an account, root first
    pub async fn account_path(&self, account_id: &str) -> LedgerResult<Vec<Account>> {
        self.registry.account_path(account_id).await
    }

    /// Register a branch for branch-scoped postings and snapshots
    pub async fn register_branch(&mut self, id: String, name: String) -> LedgerResult<Branch> {
        self.registry.register_branch(id, name).await
    }

    /// Set up the standard retail/clinic/hotel chart of accounts and resolve
    /// the account roles from it
    pub async fn setup_standard_chart(&mut self) -> LedgerResult<HashMap<String, Account>> {
        let (accounts, roles) =
            crate::ledger::account::utils::create_standard_chart(&mut self.registry).await?;
        self.roles = Some(roles);
        Ok(accounts)
    }

    // Journal operations

    /// Validate and post a balanced journal entry
    pub async fn post_entry(&mut self, entry: NewEntry, actor: &str) -> LedgerResult<JournalEntry> {
        self.journal.post_entry(entry, actor).await
    }

    /// Create a Draft entry for later posting
    pub async fn draft_entry(&mut self, entry: NewEntry) -> LedgerResult<JournalEntry> {
        self.journal.draft_entry(entry).await
    }

    /// Replace a Draft entry's lines and description
    pub async fn update_draft(
        &mut self,
        entry_id: &str,
        description: String,
        lines: Vec<JournalLine>,
    ) -> LedgerResult<JournalEntry> {
        self.journal.update_draft(entry_id, description, lines).await
    }

    /// Soft-delete a Draft entry
    pub async fn delete_draft(&mut self, entry_id: &str) -> LedgerResult<()> {
        self.journal.delete_draft(entry_id).await
    }

    /// Promote a Draft entry to Posted
    pub async fn post_draft(&mut self, entry_id: &str, actor: &str) -> LedgerResult<JournalEntry> {
        self.journal.post_draft(entry_id, actor).await
    }

    /// Mark a Posted entry Voided with a reason
    pub async fn void_entry(
        &mut self,
        entry_id: &str,
        reason: &str,
        actor: &str,
    ) -> LedgerResult<JournalEntry> {
        self.journal.void_entry(entry_id, reason, actor).await
    }

    /// Get a journal entry by ID
    pub async fn get_entry(&self, entry_id: &str) -> LedgerResult<Option<JournalEntry>> {
        self.journal.get_entry(entry_id).await
    }

    /// List all entries within a date range
    pub async fn list_entries(
        &self,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> LedgerResult<Vec<JournalEntry>> {
        self.journal.list_entries(start_date, end_date).await
    }

    /// Account balance as of a date
    pub async fn account_balance(
        &self,
        account_id: &str,
        as_of: NaiveDate,
        branch: &BranchFilter,
    ) -> LedgerResult<BigDecimal> {
        self.journal.account_balance(account_id, as_of, branch).await
    }

    /// Signed account activity within [from, to]
    pub async fn account_activity(
        &self,
        account_id: &str,
        from: NaiveDate,
        to: NaiveDate,
        branch: &BranchFilter,
    ) -> LedgerResult<BigDecimal> {
        self.journal
            .account_activity(account_id, from, to, branch)
            .await
    }

    // Period operations

    /// Create an Open period for a calendar month
    pub async fn create_period(&mut self, year: i32, month: u32) -> LedgerResult<AccountingPeriod> {
        self.periods.create_period(year, month).await
    }

    /// Close an Open period, freezing balances into snapshots
    pub async fn close_period(
        &mut self,
        period_id: &str,
        actor: &str,
    ) -> LedgerResult<AccountingPeriod> {
        self.periods.close_period(period_id, actor).await
    }

    /// Lock a Closed period
    pub async fn lock_period(&mut self, period_id: &str) -> LedgerResult<AccountingPeriod> {
        self.periods.lock_period(period_id).await
    }

    /// Reopen a Closed or Locked period, newest first
    pub async fn reopen_period(&mut self, period_id: &str) -> LedgerResult<AccountingPeriod> {
        self.periods.reopen_period(period_id).await
    }

    /// Find the period covering a (year, month)
    pub async fn find_period(
        &self,
        year: i32,
        month: u32,
    ) -> LedgerResult<Option<AccountingPeriod>> {
        self.periods.find_period(year, month).await
    }

    /// List all periods in calendar order
    pub async fn list_periods(&self) -> LedgerResult<Vec<AccountingPeriod>> {
        self.periods.list_periods().await
    }

    /// The Open period containing `today`
    pub async fn current_period(
        &self,
        today: NaiveDate,
    ) -> LedgerResult<Option<AccountingPeriod>> {
        self.periods.current_period(today).await
    }

    /// Frozen balance snapshots written when the period closed
    pub async fn period_snapshots(&self, period_id: &str) -> LedgerResult<Vec<PeriodSnapshot>> {
        self.storage.list_snapshots(period_id).await
    }

    // Statement operations

    /// Generate a balance sheet as of a date
    pub async fn balance_sheet(
        &self,
        as_of: NaiveDate,
        branch: &BranchFilter,
    ) -> LedgerResult<BalanceSheet> {
        statements::balance_sheet(&self.registry, &self.journal, as_of, branch).await
    }

    /// Generate an income statement for [from, to]
    pub async fn income_statement(
        &self,
        from: NaiveDate,
        to: NaiveDate,
        branch: &BranchFilter,
    ) -> LedgerResult<IncomeStatement> {
        statements::income_statement(&self.registry, &self.journal, from, to, branch).await
    }

    /// Generate an indirect-method cash-flow statement for [from, to]
    pub async fn cash_flow_statement(
        &self,
        from: NaiveDate,
        to: NaiveDate,
        adjustments: Vec<CashFlowItem>,
    ) -> LedgerResult<CashFlowStatement> {
        let roles = self.roles_required()?;
        statements::cash_flow_statement(&self.registry, &self.journal, roles, from, to, adjustments)
            .await
    }

    /// Post the year-end closing entry for a calendar year
    pub async fn year_end_close(&mut self, year: i32, actor: &str) -> LedgerResult<JournalEntry> {
        let roles = self
            .roles
            .clone()
            .ok_or_else(|| {
                LedgerError::Validation(
                    "Account roles are not configured; call set_roles or setup_standard_chart"
                        .to_string(),
                )
            })?;
        statements::year_end_close(
            &self.registry,
            &mut self.journal,
            &self.periods,
            &roles,
            year,
            actor,
        )
        .await
    }

    // Receivable operations

    /// Record an outstanding receivable produced by the sales/clinic modules
    pub async fn record_receivable(&mut self, receivable: Receivable) -> LedgerResult<Receivable> {
        validation::validate_positive_amount(&receivable.total)?;
        if receivable.outstanding < BigDecimal::from(0) || receivable.outstanding > receivable.total
        {
            return Err(LedgerError::Validation(format!(
                "Outstanding amount {} must be between zero and the invoice total {}",
                receivable.outstanding, receivable.total
            )));
        }
        self.storage.save_receivable(&receivable).await?;
        Ok(receivable)
    }

    /// Apply a payment against a receivable, reducing its outstanding amount
    pub async fn record_payment(
        &mut self,
        payment: ReceivablePayment,
    ) -> LedgerResult<Receivable> {
        validation::validate_positive_amount(&payment.amount)?;

        let mut receivable = self
            .storage
            .get_receivable(&payment.receivable_id)
            .await?
            .ok_or_else(|| {
                LedgerError::Validation(format!(
                    "Receivable '{}' does not exist",
                    payment.receivable_id
                ))
            })?;

        if payment.amount > receivable.outstanding {
            return Err(LedgerError::Validation(format!(
                "Payment {} exceeds outstanding amount {}",
                payment.amount, receivable.outstanding
            )));
        }

        receivable.outstanding = &receivable.outstanding - &payment.amount;
        self.storage.apply_payment(&receivable, &payment).await?;
        Ok(receivable)
    }

    /// Outstanding receivables bucketed by age, grouped per customer
    pub async fn aging_report(&self, as_of: NaiveDate) -> LedgerResult<AgingReport> {
        statements::aging_report(&self.storage, as_of).await
    }

    /// One customer's open receivables as of a date
    pub async fn customer_outstanding(
        &self,
        customer_id: &str,
        as_of: NaiveDate,
    ) -> LedgerResult<Vec<Receivable>> {
        statements::customer_outstanding(&self.storage, customer_id, as_of).await
    }

    /// Open receivables whose due date has passed
    pub async fn overdue_invoices(&self, as_of: NaiveDate) -> LedgerResult<Vec<Receivable>> {
        statements::overdue_invoices(&self.storage, as_of).await
    }

    /// Collection rate and average days-to-collect over [from, to]
    pub async fn collection_metrics(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> LedgerResult<CollectionMetrics> {
        statements::collection_metrics(&self.storage, from, to).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::journal::patterns;
    use crate::utils::memory_storage::MemoryStorage;

    #[tokio::test]
    async fn facade_end_to_end() {
        let storage = MemoryStorage::new();
        let mut ledger = Ledger::new(storage);

        let accounts = ledger.setup_standard_chart().await.unwrap();
        let period = ledger.create_period(2025, 1).await.unwrap();

        ledger
            .post_entry(
                patterns::cash_sale(
                    NaiveDate::from_ymd_opt(2025, 1, 15).unwrap(),
                    "Sale of goods".to_string(),
                    accounts["cash"].id.clone(),
                    accounts["sales_revenue"].id.clone(),
                    BigDecimal::from(1000),
                    LineScope::Consolidated,
                ),
                "tester",
            )
            .await
            .unwrap();

        let cash_balance = ledger
            .account_balance(
                &accounts["cash"].id,
                NaiveDate::from_ymd_opt(2025, 1, 31).unwrap(),
                &BranchFilter::Consolidated,
            )
            .await
            .unwrap();
        assert_eq!(cash_balance, BigDecimal::from(1000));

        let closed = ledger.close_period(&period.id, "tester").await.unwrap();
        assert_eq!(closed.status, PeriodStatus::Closed);

        let snapshots = ledger.period_snapshots(&period.id).await.unwrap();
        let cash_row = snapshots
            .iter()
            .find(|s| s.account_id == accounts["cash"].id && s.scope == LineScope::Consolidated)
            .unwrap();
        assert_eq!(cash_row.closing, BigDecimal::from(1000));
    }

    #[tokio::test]
    async fn payment_updates_receivable_and_ledger_together() {
        let storage = MemoryStorage::new();
        let mut ledger = Ledger::new(storage);
        ledger.setup_standard_chart().await.unwrap();

        ledger
            .record_receivable(Receivable {
                id: "r1".to_string(),
                customer_id: "c1".to_string(),
                customer_name: "Acme".to_string(),
                source: ReceivableSource::Sales,
                invoice_date: NaiveDate::from_ymd_opt(2025, 5, 1).unwrap(),
                due_date: NaiveDate::from_ymd_opt(2025, 5, 31).unwrap(),
                total: BigDecimal::from(500),
                outstanding: BigDecimal::from(500),
            })
            .await
            .unwrap();

        // Overpayment is rejected before anything is written
        let overpay = ledger
            .record_payment(ReceivablePayment {
                id: "p0".to_string(),
                receivable_id: "r1".to_string(),
                date: NaiveDate::from_ymd_opt(2025, 5, 10).unwrap(),
                amount: BigDecimal::from(600),
            })
            .await;
        assert!(overpay.is_err());

        let metrics = ledger
            .collection_metrics(
                NaiveDate::from_ymd_opt(2025, 5, 1).unwrap(),
                NaiveDate::from_ymd_opt(2025, 5, 31).unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(metrics.total_collected, BigDecimal::from(0));

        // A valid payment lands the updated outstanding and the payment record
        // in one storage step
        let updated = ledger
            .record_payment(ReceivablePayment {
                id: "p1".to_string(),
                receivable_id: "r1".to_string(),
                date: NaiveDate::from_ymd_opt(2025, 5, 10).unwrap(),
                amount: BigDecimal::from(300),
            })
            .await
            .unwrap();
        assert_eq!(updated.outstanding, BigDecimal::from(200));

        let metrics = ledger
            .collection_metrics(
                NaiveDate::from_ymd_opt(2025, 5, 1).unwrap(),
                NaiveDate::from_ymd_opt(2025, 5, 31).unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(metrics.total_collected, BigDecimal::from(300));
        assert_eq!(metrics.average_days_to_collect, Some(BigDecimal::from(9)));
    }
}
