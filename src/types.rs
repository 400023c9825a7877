//! Core types and data structures for the ledger system

use bigdecimal::BigDecimal;
use chrono::{Days, Months, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Account types following standard accounting principles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccountType {
    /// Assets - what the business owns (Cash, Receivables, Equipment, etc.)
    Asset,
    /// Liabilities - what the business owes (Loans, Accounts Payable, etc.)
    Liability,
    /// Equity - owner's interest in the business (Capital, Retained Earnings, etc.)
    Equity,
    /// Revenue - money earned by the business
    Revenue,
    /// Expenses - costs incurred by the business
    Expense,
}

impl AccountType {
    /// Returns the normal balance side for this account type.
    /// Assets and Expenses normally carry debit balances;
    /// Liabilities, Equity, and Revenue normally carry credit balances.
    pub fn normal_balance(&self) -> EntrySide {
        match self {
            AccountType::Asset | AccountType::Expense => EntrySide::Debit,
            AccountType::Liability | AccountType::Equity | AccountType::Revenue => {
                EntrySide::Credit
            }
        }
    }
}

/// The two sides of double-entry bookkeeping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntrySide {
    Debit,
    Credit,
}

impl EntrySide {
    /// The balance direction rule, implemented exactly once.
    ///
    /// For a debit-normal account a debit increases the balance and a credit
    /// decreases it; mirrored for credit-normal accounts. Every balance
    /// computation in the crate folds amounts through this function.
    pub fn signed(&self, debit: &BigDecimal, credit: &BigDecimal) -> BigDecimal {
        match self {
            EntrySide::Debit => debit - credit,
            EntrySide::Credit => credit - debit,
        }
    }
}

/// Statement sub-classification, fixed at account creation.
///
/// Statement generators group by this tag instead of matching substrings in a
/// free-text category field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccountClassification {
    CurrentAsset,
    FixedAsset,
    OtherAsset,
    CurrentLiability,
    LongTermLiability,
    Equity,
    OperatingRevenue,
    OtherIncome,
    CostOfGoodsSold,
    OperatingExpense,
    TaxExpense,
}

impl AccountClassification {
    /// The account type this classification belongs to.
    pub fn account_type(&self) -> AccountType {
        match self {
            AccountClassification::CurrentAsset
            | AccountClassification::FixedAsset
            | AccountClassification::OtherAsset => AccountType::Asset,
            AccountClassification::CurrentLiability
            | AccountClassification::LongTermLiability => AccountType::Liability,
            AccountClassification::Equity => AccountType::Equity,
            AccountClassification::OperatingRevenue | AccountClassification::OtherIncome => {
                AccountType::Revenue
            }
            AccountClassification::CostOfGoodsSold
            | AccountClassification::OperatingExpense
            | AccountClassification::TaxExpense => AccountType::Expense,
        }
    }
}

/// Chart-of-accounts entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// Unique identifier for the account
    pub id: String,
    /// Hierarchical account code, unique across the chart (e.g. "1-101")
    pub code: String,
    /// Human-readable account name
    pub name: String,
    /// Type of account (Asset, Liability, etc.)
    pub account_type: AccountType,
    /// Statement sub-classification
    pub classification: AccountClassification,
    /// Header accounts are grouping nodes and cannot receive postings
    pub header: bool,
    /// Inactive accounts cannot receive postings
    pub active: bool,
    /// Optional parent account for hierarchical chart of accounts
    pub parent_id: Option<String>,
    /// When the account was deactivated (soft delete)
    pub deactivated_at: Option<NaiveDateTime>,
    /// When the account was created
    pub created_at: NaiveDateTime,
    /// When the account was last updated
    pub updated_at: NaiveDateTime,
}

impl Account {
    /// Create a new active, non-header account
    pub fn new(
        id: String,
        code: String,
        name: String,
        account_type: AccountType,
        classification: AccountClassification,
        parent_id: Option<String>,
    ) -> Self {
        let now = chrono::Utc::now().naive_utc();
        Self {
            id,
            code,
            name,
            account_type,
            classification,
            header: false,
            active: true,
            parent_id,
            deactivated_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// The side on which this account's balance naturally increases
    pub fn normal_balance(&self) -> EntrySide {
        self.account_type.normal_balance()
    }

    /// Whether journal lines may post to this account
    pub fn postable(&self) -> bool {
        self.active && !self.header && self.deactivated_at.is_none()
    }
}

/// Which external subsystem generated a journal entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntrySource {
    Sales,
    Purchasing,
    Expenses,
    Clinic,
    Hotel,
    Manual,
    YearEndClose,
}

/// Journal entry lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryStatus {
    /// Lines may be freely edited or deleted
    Draft,
    /// Lines are immutable inputs to balance computations
    Posted,
    /// Cancelled with a reason; excluded from balances
    Voided,
}

/// Which branches a journal line or snapshot applies to.
///
/// A `Consolidated` line belongs to no branch: consolidated balances fold
/// every line exactly once, while branch-filtered balances fold only that
/// branch's lines. This keeps branch sums from double-counting shared lines.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LineScope {
    /// Spans all branches
    Consolidated,
    /// Belongs to one organizational branch
    Branch(String),
}

impl LineScope {
    pub fn branch_id(&self) -> Option<&str> {
        match self {
            LineScope::Consolidated => None,
            LineScope::Branch(id) => Some(id),
        }
    }
}

/// Branch restriction applied to balance queries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BranchFilter {
    /// Fold every line once, regardless of scope
    Consolidated,
    /// Fold only lines scoped to the given branch
    Branch(String),
}

impl BranchFilter {
    /// Whether a line with the given scope participates under this filter
    pub fn matches(&self, scope: &LineScope) -> bool {
        match self {
            BranchFilter::Consolidated => true,
            BranchFilter::Branch(id) => scope.branch_id() == Some(id.as_str()),
        }
    }
}

/// One debit or credit within a journal entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalLine {
    /// Account being posted to
    pub account_id: String,
    /// Branch scope of this line
    pub scope: LineScope,
    /// Debit amount (zero when this is a credit line)
    pub debit: BigDecimal,
    /// Credit amount (zero when this is a debit line)
    pub credit: BigDecimal,
    /// Display ordering within the entry
    pub sort_order: u32,
}

impl JournalLine {
    /// Create a debit line
    pub fn debit(
        account_id: String,
        scope: LineScope,
        amount: BigDecimal,
        sort_order: u32,
    ) -> Self {
        Self {
            account_id,
            scope,
            debit: amount,
            credit: BigDecimal::from(0),
            sort_order,
        }
    }

    /// Create a credit line
    pub fn credit(
        account_id: String,
        scope: LineScope,
        amount: BigDecimal,
        sort_order: u32,
    ) -> Self {
        Self {
            account_id,
            scope,
            debit: BigDecimal::from(0),
            credit: amount,
            sort_order,
        }
    }

    /// Exactly one side must carry a positive amount
    pub fn validate(&self) -> Result<(), LedgerError> {
        let zero = BigDecimal::from(0);
        if self.debit < zero || self.credit < zero {
            return Err(LedgerError::InvalidEntry(
                "Line amounts must not be negative".to_string(),
            ));
        }
        let has_debit = self.debit > zero;
        let has_credit = self.credit > zero;
        if has_debit == has_credit {
            return Err(LedgerError::InvalidEntry(format!(
                "Line for account '{}' must have exactly one of debit or credit set",
                self.account_id
            )));
        }
        Ok(())
    }
}

/// Balanced journal entry with its debit/credit lines
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Unique identifier for the entry
    pub id: String,
    /// Human-readable entry number (e.g. "JE-202501-0001")
    pub number: String,
    /// Business date of the entry
    pub date: NaiveDate,
    /// Free-text description
    pub description: String,
    /// Which subsystem generated the entry
    pub source: EntrySource,
    /// Optional reference into the originating record (invoice id, booking id, ...)
    pub source_ref: Option<String>,
    /// Lifecycle status
    pub status: EntryStatus,
    /// Debit/credit lines
    pub lines: Vec<JournalLine>,
    /// Actor who posted the entry
    pub posted_by: Option<String>,
    /// When the entry was posted
    pub posted_at: Option<NaiveDateTime>,
    /// Actor who voided the entry
    pub voided_by: Option<String>,
    /// When the entry was voided
    pub voided_at: Option<NaiveDateTime>,
    /// Reason given when the entry was voided
    pub void_reason: Option<String>,
    /// Soft-delete timestamp
    pub deleted_at: Option<NaiveDateTime>,
    /// When the entry was created
    pub created_at: NaiveDateTime,
    /// When the entry was last updated
    pub updated_at: NaiveDateTime,
}

impl JournalEntry {
    /// Create a new draft entry with no lines
    pub fn new(
        id: String,
        number: String,
        date: NaiveDate,
        description: String,
        source: EntrySource,
        source_ref: Option<String>,
    ) -> Self {
        let now = chrono::Utc::now().naive_utc();
        Self {
            id,
            number,
            date,
            description,
            source,
            source_ref,
            status: EntryStatus::Draft,
            lines: Vec::new(),
            posted_by: None,
            posted_at: None,
            voided_by: None,
            voided_at: None,
            void_reason: None,
            deleted_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Total of all debit lines
    pub fn total_debits(&self) -> BigDecimal {
        self.lines.iter().map(|l| &l.debit).sum()
    }

    /// Total of all credit lines
    pub fn total_credits(&self) -> BigDecimal {
        self.lines.iter().map(|l| &l.credit).sum()
    }

    /// Check if the entry is balanced (debits = credits)
    pub fn is_balanced(&self) -> bool {
        self.total_debits() == self.total_credits()
    }

    /// Whether this entry's lines count toward balances
    pub fn is_effective(&self) -> bool {
        self.status == EntryStatus::Posted && self.deleted_at.is_none()
    }

    /// Validate the entry for posting
    pub fn validate(&self) -> Result<(), LedgerError> {
        if self.lines.len() < 2 {
            return Err(LedgerError::InvalidEntry(
                "Entry must have at least two lines for double-entry bookkeeping".to_string(),
            ));
        }

        for line in &self.lines {
            line.validate()?;
        }

        if !self.is_balanced() {
            return Err(LedgerError::InvalidEntry(format!(
                "Entry is not balanced: debits = {}, credits = {}",
                self.total_debits(),
                self.total_credits()
            )));
        }

        Ok(())
    }
}

/// Organizational branch (store, clinic location, hotel property)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Branch {
    pub id: String,
    pub name: String,
    pub active: bool,
}

/// Accounting period lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PeriodStatus {
    Open,
    Closed,
    Locked,
}

/// One calendar-month accounting bucket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountingPeriod {
    /// Unique identifier for the period
    pub id: String,
    pub year: i32,
    /// Calendar month, 1-12
    pub month: u32,
    /// Display name, e.g. "January 2025"
    pub name: String,
    /// First day of the month
    pub start: NaiveDate,
    /// Last day of the month
    pub end: NaiveDate,
    pub status: PeriodStatus,
    /// Actor who closed the period
    pub closed_by: Option<String>,
    /// When the period was closed
    pub closed_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl AccountingPeriod {
    /// Create a new open period covering the given calendar month
    pub fn new(id: String, year: i32, month: u32) -> Result<Self, LedgerError> {
        let start = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(|| {
            LedgerError::Validation(format!("Invalid period month: {}-{}", year, month))
        })?;
        let end = start
            .checked_add_months(Months::new(1))
            .and_then(|d| d.checked_sub_days(Days::new(1)))
            .ok_or_else(|| {
                LedgerError::Validation(format!("Invalid period month: {}-{}", year, month))
            })?;
        let now = chrono::Utc::now().naive_utc();
        Ok(Self {
            id,
            year,
            month,
            name: format!("{} {}", month_name(month), year),
            start,
            end,
            status: PeriodStatus::Open,
            closed_by: None,
            closed_at: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Whether a date falls inside this period's month
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// Ordering key for the accounting calendar
    pub fn key(&self) -> (i32, u32) {
        (self.year, self.month)
    }

    /// The (year, month) of the immediately preceding period
    pub fn preceding_key(&self) -> (i32, u32) {
        if self.month == 1 {
            (self.year - 1, 12)
        } else {
            (self.year, self.month - 1)
        }
    }
}

fn month_name(month: u32) -> &'static str {
    const NAMES: [&str; 12] = [
        "January",
        "February",
        "March",
        "April",
        "May",
        "June",
        "July",
        "August",
        "September",
        "October",
        "November",
        "December",
    ];
    NAMES
        .get(month.saturating_sub(1) as usize)
        .copied()
        .unwrap_or("Unknown")
}

/// Frozen per-account balance written when a period closes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodSnapshot {
    pub id: String,
    pub period_id: String,
    pub account_id: String,
    /// Consolidated or scoped to one branch
    pub scope: LineScope,
    /// Closing balance of the preceding period's snapshot, or zero
    pub opening: BigDecimal,
    /// Debit activity within the period
    pub debit_total: BigDecimal,
    /// Credit activity within the period
    pub credit_total: BigDecimal,
    /// opening + signed activity per the account's normal balance
    pub closing: BigDecimal,
}

impl PeriodSnapshot {
    /// Whether the snapshot carries any movement or carried-forward balance
    pub fn is_material(&self) -> bool {
        let zero = BigDecimal::from(0);
        self.opening != zero || self.debit_total != zero || self.credit_total != zero
    }
}

/// Role-to-account mapping resolved at setup time.
///
/// The ledger core carries no magic account-code strings; callers name the
/// retained-earnings account and the cash/bank accounts once, here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountRoles {
    /// Equity account that absorbs the year-end net income/loss transfer
    pub retained_earnings: String,
    /// Cash/bank accounts summed for cash-flow reconciliation
    pub cash_accounts: Vec<String>,
}

/// Where an outstanding receivable originated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReceivableSource {
    Sales,
    Clinic,
}

/// Outstanding amount owed by a customer, tracked outside the journal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Receivable {
    pub id: String,
    pub customer_id: String,
    pub customer_name: String,
    pub source: ReceivableSource,
    /// Date the underlying sale/appointment was invoiced
    pub invoice_date: NaiveDate,
    pub due_date: NaiveDate,
    /// Original invoiced amount
    pub total: BigDecimal,
    /// Amount still unpaid
    pub outstanding: BigDecimal,
}

/// Payment applied against a receivable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceivablePayment {
    pub id: String,
    pub receivable_id: String,
    pub date: NaiveDate,
    pub amount: BigDecimal,
}

/// Day-range classification of how overdue a receivable is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgingBucket {
    /// 0-30 days
    Current,
    Days31To60,
    Days61To90,
    Over90,
}

impl AgingBucket {
    /// Classify an invoice age in days
    pub fn for_age(days: i64) -> Self {
        match days {
            d if d <= 30 => AgingBucket::Current,
            d if d <= 60 => AgingBucket::Days31To60,
            d if d <= 90 => AgingBucket::Days61To90,
            _ => AgingBucket::Over90,
        }
    }
}

/// Errors that can occur in the ledger system
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Invalid entry: {0}")]
    InvalidEntry(String),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Period state error: {0}")]
    PeriodState(String),
    #[error("Account not found: {0}")]
    AccountNotFound(String),
    #[error("Journal entry not found: {0}")]
    EntryNotFound(String),
    #[error("Period not found: {0}")]
    PeriodNotFound(String),
    #[error("Branch not found: {0}")]
    BranchNotFound(String),
}

/// Result type for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_rule_signs() {
        let ten = BigDecimal::from(10);
        let three = BigDecimal::from(3);
        assert_eq!(EntrySide::Debit.signed(&ten, &three), BigDecimal::from(7));
        assert_eq!(EntrySide::Credit.signed(&ten, &three), BigDecimal::from(-7));
    }

    #[test]
    fn normal_balances_by_type() {
        assert_eq!(AccountType::Asset.normal_balance(), EntrySide::Debit);
        assert_eq!(AccountType::Expense.normal_balance(), EntrySide::Debit);
        assert_eq!(AccountType::Liability.normal_balance(), EntrySide::Credit);
        assert_eq!(AccountType::Equity.normal_balance(), EntrySide::Credit);
        assert_eq!(AccountType::Revenue.normal_balance(), EntrySide::Credit);
    }

    #[test]
    fn classification_maps_to_type() {
        assert_eq!(
            AccountClassification::CostOfGoodsSold.account_type(),
            AccountType::Expense
        );
        assert_eq!(
            AccountClassification::LongTermLiability.account_type(),
            AccountType::Liability
        );
    }

    #[test]
    fn line_requires_exactly_one_side() {
        let both = JournalLine {
            account_id: "a1".to_string(),
            scope: LineScope::Consolidated,
            debit: BigDecimal::from(5),
            credit: BigDecimal::from(5),
            sort_order: 0,
        };
        assert!(both.validate().is_err());

        let neither = JournalLine {
            account_id: "a1".to_string(),
            scope: LineScope::Consolidated,
            debit: BigDecimal::from(0),
            credit: BigDecimal::from(0),
            sort_order: 0,
        };
        assert!(neither.validate().is_err());

        let debit = JournalLine::debit(
            "a1".to_string(),
            LineScope::Consolidated,
            BigDecimal::from(5),
            0,
        );
        assert!(debit.validate().is_ok());
    }

    #[test]
    fn entry_balance_check() {
        let mut entry = JournalEntry::new(
            "e1".to_string(),
            "JE-202501-0001".to_string(),
            NaiveDate::from_ymd_opt(2025, 1, 15).unwrap(),
            "Test".to_string(),
            EntrySource::Manual,
            None,
        );
        entry.lines.push(JournalLine::debit(
            "cash".to_string(),
            LineScope::Consolidated,
            BigDecimal::from(100),
            0,
        ));
        assert!(entry.validate().is_err());

        entry.lines.push(JournalLine::credit(
            "revenue".to_string(),
            LineScope::Consolidated,
            BigDecimal::from(100),
            1,
        ));
        assert!(entry.validate().is_ok());
        assert!(entry.is_balanced());
    }

    #[test]
    fn period_month_bounds() {
        let feb = AccountingPeriod::new("p1".to_string(), 2024, 2).unwrap();
        assert_eq!(feb.start, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
        assert_eq!(feb.end, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
        assert_eq!(feb.name, "February 2024");
        assert!(feb.contains(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()));
        assert!(!feb.contains(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()));

        let jan = AccountingPeriod::new("p2".to_string(), 2025, 1).unwrap();
        assert_eq!(jan.preceding_key(), (2024, 12));

        assert!(AccountingPeriod::new("p3".to_string(), 2025, 13).is_err());
    }

    #[test]
    fn aging_bucket_boundaries() {
        assert_eq!(AgingBucket::for_age(0), AgingBucket::Current);
        assert_eq!(AgingBucket::for_age(30), AgingBucket::Current);
        assert_eq!(AgingBucket::for_age(31), AgingBucket::Days31To60);
        assert_eq!(AgingBucket::for_age(60), AgingBucket::Days31To60);
        assert_eq!(AgingBucket::for_age(61), AgingBucket::Days61To90);
        assert_eq!(AgingBucket::for_age(90), AgingBucket::Days61To90);
        assert_eq!(AgingBucket::for_age(91), AgingBucket::Over90);
    }
}
