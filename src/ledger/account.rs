//! Chart-of-accounts registry

use std::collections::HashMap;

use crate::traits::*;
use crate::types::*;

/// Parameters for creating a chart account
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub code: String,
    pub name: String,
    pub account_type: AccountType,
    pub classification: AccountClassification,
    /// Header accounts group children and cannot receive postings
    pub header: bool,
    pub parent_id: Option<String>,
}

/// Registry for chart-of-accounts operations
pub struct AccountRegistry<S: LedgerStorage> {
    pub(crate) storage: S,
    validator: Box<dyn AccountValidator>,
}

impl<S: LedgerStorage> AccountRegistry<S> {
    /// Create a new account registry
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            validator: Box::new(DefaultAccountValidator),
        }
    }

    /// Create a new account registry with a custom validator
    pub fn with_validator(storage: S, validator: Box<dyn AccountValidator>) -> Self {
        Self { storage, validator }
    }

    /// Create a new account in the chart
    pub async fn create_account(&mut self, def: NewAccount) -> LedgerResult<Account> {
        let mut account = Account::new(
            uuid::Uuid::new_v4().to_string(),
            def.code,
            def.name,
            def.account_type,
            def.classification,
            def.parent_id,
        );
        account.header = def.header;

        self.validator.validate_account(&account)?;

        // Chart codes are unique
        if self.storage.get_account_by_code(&account.code).await?.is_some() {
            return Err(LedgerError::Validation(format!(
                "Account with code '{}' already exists",
                account.code
            )));
        }

        if let Some(ref parent_id) = account.parent_id {
            if self.storage.get_account(parent_id).await?.is_none() {
                return Err(LedgerError::Validation(format!(
                    "Parent account '{}' does not exist",
                    parent_id
                )));
            }
        }

        self.storage.save_account(&account).await?;

        Ok(account)
    }

    /// Get an account by ID
    pub async fn get_account(&self, account_id: &str) -> LedgerResult<Option<Account>> {
        self.storage.get_account(account_id).await
    }

    /// Get an account by ID, returning an error if not found
    pub async fn get_account_required(&self, account_id: &str) -> LedgerResult<Account> {
        self.storage
            .get_account(account_id)
            .await?
            .ok_or_else(|| LedgerError::AccountNotFound(account_id.to_string()))
    }

    /// Get an account by its chart code
    pub async fn get_account_by_code(&self, code: &str) -> LedgerResult<Option<Account>> {
        self.storage.get_account_by_code(code).await
    }

    /// List all accounts
    pub async fn list_accounts(&self) -> LedgerResult<Vec<Account>> {
        self.storage.list_accounts(None).await
    }

    /// List accounts by type
    pub async fn list_accounts_by_type(
        &self,
        account_type: AccountType,
    ) -> LedgerResult<Vec<Account>> {
        self.storage.list_accounts(Some(account_type)).await
    }

    /// List active non-header accounts, the set eligible for postings
    pub async fn list_postable_accounts(&self) -> LedgerResult<Vec<Account>> {
        let accounts = self.storage.list_accounts(None).await?;
        Ok(accounts.into_iter().filter(|a| a.postable()).collect())
    }

    /// Soft-delete an account so it can no longer receive postings
    pub async fn deactivate_account(&mut self, account_id: &str) -> LedgerResult<Account> {
        let mut account = self.get_account_required(account_id).await?;
        let now = chrono::Utc::now().naive_utc();
        account.active = false;
        account.deactivated_at = Some(now);
        account.updated_at = now;
        self.storage.update_account(&account).await?;
        Ok(account)
    }

    /// Get all child accounts of a parent account
    pub async fn child_accounts(&self, parent_id: &str) -> LedgerResult<Vec<Account>> {
        let all_accounts = self.list_accounts().await?;
        Ok(all_accounts
            .into_iter()
            .filter(|account| account.parent_id.as_deref() == Some(parent_id))
            .collect())
    }

    /// Get the full path to an account, root first (for hierarchical display)
    pub async fn account_path(&self, account_id: &str) -> LedgerResult<Vec<Account>> {
        let mut path = Vec::new();
        let mut current_account_id = Some(account_id.to_string());

        while let Some(id) = current_account_id {
            match self.get_account(&id).await? {
                Some(account) => {
                    current_account_id = account.parent_id.clone();
                    path.insert(0, account);
                }
                None => {
                    return Err(LedgerError::AccountNotFound(id));
                }
            }
        }

        Ok(path)
    }

    /// Register a branch for branch-scoped postings and snapshots
    pub async fn register_branch(&mut self, id: String, name: String) -> LedgerResult<Branch> {
        let branch = Branch {
            id,
            name,
            active: true,
        };
        self.storage.save_branch(&branch).await?;
        Ok(branch)
    }
}

/// Utility functions for working with the chart of accounts
pub mod utils {
    use super::*;

    /// Create a standard chart of accounts for a retail/clinic/hotel business.
    ///
    /// Returns the created accounts keyed by a short handle plus the
    /// [`AccountRoles`] mapping derived from it (retained earnings and the
    /// cash accounts used for cash-flow reconciliation).
    pub async fn create_standard_chart<S: LedgerStorage>(
        registry: &mut AccountRegistry<S>,
    ) -> LedgerResult<(HashMap<String, Account>, AccountRoles)> {
        let mut accounts = HashMap::new();

        let defs: [(&str, &str, &str, AccountType, AccountClassification); 13] = [
            (
                "cash",
                "1-101",
                "Cash",
                AccountType::Asset,
                AccountClassification::CurrentAsset,
            ),
            (
                "bank",
                "1-102",
                "Bank",
                AccountType::Asset,
                AccountClassification::CurrentAsset,
            ),
            (
                "accounts_receivable",
                "1-103",
                "Accounts Receivable",
                AccountType::Asset,
                AccountClassification::CurrentAsset,
            ),
            (
                "inventory",
                "1-104",
                "Inventory",
                AccountType::Asset,
                AccountClassification::CurrentAsset,
            ),
            (
                "equipment",
                "1-201",
                "Equipment",
                AccountType::Asset,
                AccountClassification::FixedAsset,
            ),
            (
                "accounts_payable",
                "2-101",
                "Accounts Payable",
                AccountType::Liability,
                AccountClassification::CurrentLiability,
            ),
            (
                "long_term_loan",
                "2-201",
                "Long-term Loan",
                AccountType::Liability,
                AccountClassification::LongTermLiability,
            ),
            (
                "owner_capital",
                "3-100",
                "Owner Capital",
                AccountType::Equity,
                AccountClassification::Equity,
            ),
            (
                "retained_earnings",
                "3-200",
                "Retained Earnings",
                AccountType::Equity,
                AccountClassification::Equity,
            ),
            (
                "sales_revenue",
                "4-100",
                "Sales Revenue",
                AccountType::Revenue,
                AccountClassification::OperatingRevenue,
            ),
            (
                "other_income",
                "4-900",
                "Other Income",
                AccountType::Revenue,
                AccountClassification::OtherIncome,
            ),
            (
                "cost_of_goods_sold",
                "5-100",
                "Cost of Goods Sold",
                AccountType::Expense,
                AccountClassification::CostOfGoodsSold,
            ),
            (
                "operating_expenses",
                "6-100",
                "Operating Expenses",
                AccountType::Expense,
                AccountClassification::OperatingExpense,
            ),
        ];

        for (handle, code, name, account_type, classification) in defs {
            let account = registry
                .create_account(NewAccount {
                    code: code.to_string(),
                    name: name.to_string(),
                    account_type,
                    classification,
                    header: false,
                    parent_id: None,
                })
                .await?;
            accounts.insert(handle.to_string(), account);
        }

        let roles = AccountRoles {
            retained_earnings: accounts["retained_earnings"].id.clone(),
            cash_accounts: vec![accounts["cash"].id.clone(), accounts["bank"].id.clone()],
        };

        Ok((accounts, roles))
    }
}
