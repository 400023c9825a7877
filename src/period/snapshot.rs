//! Balance snapshot engine, invoked when a period closes

use bigdecimal::BigDecimal;
use tracing::debug;

use crate::ledger::journal::line_totals;
use crate::traits::*;
use crate::types::*;

/// Computes the frozen per-account balance rows written at period close.
///
/// For every active non-header account: the opening balance is the preceding
/// period's snapshot closing (zero when none exists), activity comes from
/// Posted non-deleted lines dated inside the period, and closing follows the
/// direction rule. The consolidated row folds every line; branch rows fold
/// only that branch's lines and are kept only when material.
pub struct SnapshotEngine<S: LedgerStorage> {
    storage: S,
}

impl<S: LedgerStorage> SnapshotEngine<S> {
    /// Create a new snapshot engine over the given storage
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Generate the full snapshot set for a period without persisting it
    pub async fn generate(&self, period: &AccountingPeriod) -> LedgerResult<Vec<PeriodSnapshot>> {
        let accounts = self.storage.list_accounts(None).await?;
        let branches: Vec<Branch> = self
            .storage
            .list_branches()
            .await?
            .into_iter()
            .filter(|b| b.active)
            .collect();

        let (prior_year, prior_month) = period.preceding_key();
        let prior = self.storage.find_period(prior_year, prior_month).await?;

        let mut snapshots = Vec::new();

        for account in accounts.iter().filter(|a| a.postable()) {
            let entries = self
                .storage
                .account_entries(&account.id, Some(period.start), Some(period.end))
                .await?;

            // One consolidated row per account, unconditionally
            let consolidated = self
                .snapshot_for(
                    period,
                    account,
                    &entries,
                    prior.as_ref(),
                    LineScope::Consolidated,
                )
                .await?;
            snapshots.push(consolidated);

            // Branch rows only where the branch moved or carries a balance
            for branch in &branches {
                let row = self
                    .snapshot_for(
                        period,
                        account,
                        &entries,
                        prior.as_ref(),
                        LineScope::Branch(branch.id.clone()),
                    )
                    .await?;
                if row.is_material() {
                    snapshots.push(row);
                }
            }
        }

        debug!(
            period = %period.name,
            rows = snapshots.len(),
            "generated period snapshots"
        );

        Ok(snapshots)
    }

    async fn snapshot_for(
        &self,
        period: &AccountingPeriod,
        account: &Account,
        entries: &[JournalEntry],
        prior: Option<&AccountingPeriod>,
        scope: LineScope,
    ) -> LedgerResult<PeriodSnapshot> {
        let filter = match &scope {
            LineScope::Consolidated => BranchFilter::Consolidated,
            LineScope::Branch(id) => BranchFilter::Branch(id.clone()),
        };
        let (debit_total, credit_total) = line_totals(&account.id, entries, &filter);

        let opening = match prior {
            Some(prior_period) => self
                .storage
                .get_snapshot(&prior_period.id, &account.id, &scope)
                .await?
                .map(|s| s.closing)
                .unwrap_or_else(|| BigDecimal::from(0)),
            None => BigDecimal::from(0),
        };

        let closing = &opening
            + account
                .normal_balance()
                .signed(&debit_total, &credit_total);

        Ok(PeriodSnapshot {
            id: uuid::Uuid::new_v4().to_string(),
            period_id: period.id.clone(),
            account_id: account.id.clone(),
            scope,
            opening,
            debit_total,
            credit_total,
            closing,
        })
    }
}
