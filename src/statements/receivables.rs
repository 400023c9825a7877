//! Accounts-receivable aging and collection reporting
//!
//! Independent of the journal: buckets outstanding amounts tracked on sales
//! and clinic-appointment records, using their payment records for
//! collection metrics.

use std::collections::HashMap;

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::traits::LedgerStorage;
use crate::types::*;

/// One customer's outstanding amounts split across aging buckets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerAging {
    pub customer_id: String,
    pub customer_name: String,
    pub current: BigDecimal,
    pub days_31_60: BigDecimal,
    pub days_61_90: BigDecimal,
    pub over_90: BigDecimal,
    pub total: BigDecimal,
}

impl CustomerAging {
    fn new(customer_id: String, customer_name: String) -> Self {
        let zero = BigDecimal::from(0);
        Self {
            customer_id,
            customer_name,
            current: zero.clone(),
            days_31_60: zero.clone(),
            days_61_90: zero.clone(),
            over_90: zero.clone(),
            total: zero,
        }
    }

    fn add(&mut self, bucket: AgingBucket, amount: &BigDecimal) {
        match bucket {
            AgingBucket::Current => self.current += amount,
            AgingBucket::Days31To60 => self.days_31_60 += amount,
            AgingBucket::Days61To90 => self.days_61_90 += amount,
            AgingBucket::Over90 => self.over_90 += amount,
        }
        self.total += amount;
    }
}

/// Aging report: outstanding receivables grouped per customer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgingReport {
    pub as_of: NaiveDate,
    pub customers: Vec<CustomerAging>,
    pub totals: CustomerAging,
}

/// Collection performance over a date range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionMetrics {
    pub from: NaiveDate,
    pub to: NaiveDate,
    /// Total invoiced within the range
    pub total_billed: BigDecimal,
    /// Total payments received within the range
    pub total_collected: BigDecimal,
    /// collected / billed * 100; None when nothing was billed
    pub collection_rate_pct: Option<BigDecimal>,
    /// Mean days from invoice to payment; None when no payments landed
    pub average_days_to_collect: Option<BigDecimal>,
}

/// Bucket outstanding receivables by age, grouped per customer
pub async fn aging_report<S: LedgerStorage>(
    storage: &S,
    as_of: NaiveDate,
) -> LedgerResult<AgingReport> {
    let zero = BigDecimal::from(0);
    let receivables = storage.list_receivables(None, Some(as_of)).await?;

    let mut by_customer: HashMap<String, CustomerAging> = HashMap::new();
    let mut totals = CustomerAging::new(String::new(), "All customers".to_string());

    for receivable in receivables {
        if receivable.outstanding <= zero {
            continue;
        }
        let age = (as_of - receivable.invoice_date).num_days();
        let bucket = AgingBucket::for_age(age);

        by_customer
            .entry(receivable.customer_id.clone())
            .or_insert_with(|| {
                CustomerAging::new(
                    receivable.customer_id.clone(),
                    receivable.customer_name.clone(),
                )
            })
            .add(bucket, &receivable.outstanding);
        totals.add(bucket, &receivable.outstanding);
    }

    let mut customers: Vec<CustomerAging> = by_customer.into_values().collect();
    customers.sort_by(|a, b| a.customer_name.cmp(&b.customer_name));

    Ok(AgingReport {
        as_of,
        customers,
        totals,
    })
}

/// One customer's open receivables as of a date
pub async fn customer_outstanding<S: LedgerStorage>(
    storage: &S,
    customer_id: &str,
    as_of: NaiveDate,
) -> LedgerResult<Vec<Receivable>> {
    let zero = BigDecimal::from(0);
    let receivables = storage.list_receivables(None, Some(as_of)).await?;
    Ok(receivables
        .into_iter()
        .filter(|r| r.customer_id == customer_id && r.outstanding > zero)
        .collect())
}

/// Open receivables whose due date has passed
pub async fn overdue_invoices<S: LedgerStorage>(
    storage: &S,
    as_of: NaiveDate,
) -> LedgerResult<Vec<Receivable>> {
    let zero = BigDecimal::from(0);
    let receivables = storage.list_receivables(None, Some(as_of)).await?;
    let mut overdue: Vec<Receivable> = receivables
        .into_iter()
        .filter(|r| r.outstanding > zero && r.due_date < as_of)
        .collect();
    overdue.sort_by_key(|r| r.due_date);
    Ok(overdue)
}

/// Collection rate and average days-to-collect over [from, to]
pub async fn collection_metrics<S: LedgerStorage>(
    storage: &S,
    from: NaiveDate,
    to: NaiveDate,
) -> LedgerResult<CollectionMetrics> {
    let billed: BigDecimal = storage
        .list_receivables(Some(from), Some(to))
        .await?
        .iter()
        .map(|r| &r.total)
        .sum();

    let payments = storage.list_payments(from, to).await?;
    let collected: BigDecimal = payments.iter().map(|p| &p.amount).sum();

    let mut total_days: i64 = 0;
    let mut counted: i64 = 0;
    for payment in &payments {
        let receivable = storage
            .get_receivable(&payment.receivable_id)
            .await?
            .ok_or_else(|| {
                LedgerError::Storage(format!(
                    "Payment '{}' references missing receivable '{}'",
                    payment.id, payment.receivable_id
                ))
            })?;
        total_days += (payment.date - receivable.invoice_date).num_days();
        counted += 1;
    }

    let zero = BigDecimal::from(0);
    let collection_rate_pct = if billed == zero {
        None
    } else {
        Some(&collected * BigDecimal::from(100) / &billed)
    };
    let average_days_to_collect = if counted == 0 {
        None
    } else {
        Some(BigDecimal::from(total_days) / BigDecimal::from(counted))
    };

    Ok(CollectionMetrics {
        from,
        to,
        total_billed: billed,
        total_collected: collected,
        collection_rate_pct,
        average_days_to_collect,
    })
}
