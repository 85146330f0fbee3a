//! Upcoming-charge forecast
//!
//! Projects the next expected due date and amount for each recurring
//! biller. Purely informational; scheduling notifications around these
//! dates is the caller's concern.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::models::{Bill, Frequency};
use crate::recurrence::{detect_recurrence, group_bills};

/// One expected future charge
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpcomingCharge {
    pub name: String,
    /// Trailing average for the biller, the best guess for the next amount
    pub amount: f64,
    pub due_date: NaiveDate,
    pub frequency: Frequency,
}

/// Days between charges for forecasting purposes
fn interval_days(frequency: Frequency) -> i64 {
    match frequency {
        Frequency::Monthly => 30,
        Frequency::Quarterly => 91,
        Frequency::Yearly => 365,
    }
}

/// Expected charges within `horizon_days` of `today`, sorted by due date.
pub fn upcoming_charges(
    bills: &[Bill],
    today: NaiveDate,
    horizon_days: i64,
    config: &EngineConfig,
) -> Vec<UpcomingCharge> {
    let detections = detect_recurrence(bills, config);
    let horizon_end = today + Duration::days(horizon_days);

    let mut charges = Vec::new();

    for group in group_bills(bills).values() {
        let latest = group[group.len() - 1];
        let Some(det) = detections.get(&latest.id) else {
            continue;
        };
        if !det.is_recurring {
            continue;
        }
        let Some(frequency) = det.frequency else {
            continue;
        };

        // Advance from the last known due date until we land in the future
        let step = interval_days(frequency);
        let mut next = latest.due_date + Duration::days(step);
        while next <= today {
            next += Duration::days(step);
        }

        if next <= horizon_end {
            charges.push(UpcomingCharge {
                name: latest.name.trim().to_string(),
                amount: det.avg_amount,
                due_date: next,
                frequency,
            });
        }
    }

    charges.sort_by(|a, b| a.due_date.cmp(&b.due_date).then_with(|| a.name.cmp(&b.name)));
    charges
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::monthly_bills;

    fn day(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn test_monthly_biller_projects_next_month() {
        let bills = monthly_bills("Netflix", 15.49, 4, "2026-01-15");
        // Last bill due 2026-04-15
        let charges = upcoming_charges(&bills, day("2026-04-20"), 30, &EngineConfig::default());

        assert_eq!(charges.len(), 1);
        assert_eq!(charges[0].name, "Netflix");
        assert_eq!(charges[0].due_date, day("2026-05-15"));
        assert_eq!(charges[0].amount, 15.49);
    }

    #[test]
    fn test_stale_history_advances_past_today() {
        let bills = monthly_bills("Netflix", 15.49, 4, "2026-01-15");
        // Months after the last bill: the projection rolls forward in
        // 30-day steps instead of reporting a past date
        let charges = upcoming_charges(&bills, day("2026-08-01"), 30, &EngineConfig::default());

        assert_eq!(charges.len(), 1);
        assert!(charges[0].due_date > day("2026-08-01"));
    }

    #[test]
    fn test_outside_horizon_is_silent() {
        let bills = monthly_bills("Netflix", 15.49, 4, "2026-01-15");
        let charges = upcoming_charges(&bills, day("2026-04-16"), 10, &EngineConfig::default());
        assert!(charges.is_empty());
    }

    #[test]
    fn test_non_recurring_billers_are_skipped() {
        let bills = vec![
            crate::test_utils::BillBuilder::new("one", "Plumber", 400.0, "2026-03-01").build(),
        ];
        let charges = upcoming_charges(&bills, day("2026-03-02"), 60, &EngineConfig::default());
        assert!(charges.is_empty());
    }

    #[test]
    fn test_output_sorted_by_due_date() {
        let mut bills = monthly_bills("Netflix", 15.49, 4, "2026-01-20");
        bills.extend(monthly_bills("Con Edison", 120.0, 4, "2026-01-05"));
        let charges = upcoming_charges(&bills, day("2026-04-21"), 40, &EngineConfig::default());

        assert_eq!(charges.len(), 2);
        assert!(charges[0].due_date <= charges[1].due_date);
        assert_eq!(charges[0].name, "Con Edison");
    }
}
