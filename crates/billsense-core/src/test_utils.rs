//! Test utilities for billsense-core
//!
//! Builders for bill fixtures so tests stay readable. Enabled for this
//! crate's own tests and for downstream integration tests via the
//! `test-utils` feature.

use chrono::{Months, NaiveDate};

use crate::models::{Bill, BillStatus, BillingCycle, Frequency};

/// Fluent builder for a bill fixture
pub struct BillBuilder {
    bill: Bill,
}

impl BillBuilder {
    /// Unpaid bill with an unknown provider; `due` is `YYYY-MM-DD`.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        total_amount: f64,
        due: &str,
    ) -> Self {
        Self {
            bill: Bill {
                id: id.into(),
                provider_id: "unknown".to_string(),
                name: name.into(),
                total_amount,
                paid_amount: 0.0,
                status: BillStatus::Unpaid,
                due_date: due.parse().expect("valid fixture date"),
                category: None,
                subcategory: None,
                billing_cycle: None,
                is_recurring: false,
                recurring_frequency: None,
                recurring_confidence: None,
                avg_recurring_amount: None,
                amount_deviation_percent: None,
                amount_deviation_flag: None,
            },
        }
    }

    pub fn provider(mut self, provider_id: impl Into<String>) -> Self {
        self.bill.provider_id = provider_id.into();
        self
    }

    pub fn status(mut self, status: BillStatus) -> Self {
        self.bill.status = status;
        self
    }

    pub fn paid_amount(mut self, paid_amount: f64) -> Self {
        self.bill.paid_amount = paid_amount;
        self
    }

    pub fn cycle(mut self, cycle: Option<BillingCycle>) -> Self {
        self.bill.billing_cycle = cycle;
        self
    }

    pub fn recurring(mut self, frequency: Option<Frequency>, confidence: Option<f64>) -> Self {
        self.bill.is_recurring = frequency.is_some();
        self.bill.recurring_frequency = frequency;
        self.bill.recurring_confidence = confidence;
        self
    }

    pub fn deviation_flag(mut self, flag: Option<bool>) -> Self {
        self.bill.amount_deviation_flag = flag;
        self
    }

    pub fn build(self) -> Bill {
        self.bill
    }
}

/// A run of `count` bills for one biller, one calendar month apart.
pub fn monthly_bills(name: &str, amount: f64, count: usize, start: &str) -> Vec<Bill> {
    let start: NaiveDate = start.parse().expect("valid fixture date");

    (0..count)
        .map(|i| {
            let due = start
                .checked_add_months(Months::new(i as u32))
                .expect("fixture date in range");
            BillBuilder::new(
                format!("{}-{}", name.to_lowercase().replace(' ', "-"), i),
                name,
                amount,
                &due.to_string(),
            )
            .build()
        })
        .collect()
}
