use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::types::{DateWindow, Money};

/// An invoiced amount, dated by billing date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillingRecord {
    pub billing_date: NaiveDate,
    pub amount: Money,
}

/// Revenue billed inside `window`. Zero when nothing was billed.
pub fn revenue_for_window(billing: &[BillingRecord], window: DateWindow) -> Money {
    billing
        .iter()
        .filter(|b| window.contains(b.billing_date))
        .map(|b| b.amount)
        .sum()
}
