//! Annual spend projection
//!
//! Groups bills by display name (intentionally not provider identity, so a
//! biller keeps its projection history across provider re-resolution),
//! estimates a monthly average from recent amounts, annualizes by billing
//! cadence, and reports a rising/falling/stable trend over the full history.

use std::collections::HashMap;

use tracing::debug;

use crate::config::EngineConfig;
use crate::models::{
    round2, AnnualProjection, Bill, BillingCycle, Frequency, ProviderProjection, Trend,
};

/// Compute per-biller projections and the portfolio total.
pub fn compute_projections(bills: &[Bill], config: &EngineConfig) -> AnnualProjection {
    let mut groups: HashMap<String, Vec<&Bill>> = HashMap::new();
    for bill in bills {
        groups
            .entry(bill.name.trim().to_lowercase())
            .or_default()
            .push(bill);
    }

    let mut providers = Vec::with_capacity(groups.len());

    for group in groups.values_mut() {
        group.sort_by_key(|b| b.due_date);
        let latest = group[group.len() - 1];

        let take = group.len().min(config.recent_window);
        let monthly_avg = round2(
            group.iter().rev().take(take).map(|b| b.total_amount).sum::<f64>() / take as f64,
        );

        let multiplier = annual_multiplier(latest);
        let annual_estimate = round2(monthly_avg * multiplier);

        let amounts: Vec<f64> = group.iter().map(|b| b.total_amount).collect();
        let (trend, trend_percent) = amount_trend(&amounts, config);

        debug!(
            biller = latest.name.trim(),
            monthly_avg,
            multiplier,
            annual_estimate,
            "projection computed"
        );

        providers.push(ProviderProjection {
            name: latest.name.trim().to_string(),
            monthly_avg,
            annual_estimate,
            bill_count: group.len(),
            trend,
            trend_percent,
        });
    }

    providers.sort_by(|a, b| {
        b.annual_estimate
            .partial_cmp(&a.annual_estimate)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.name.cmp(&b.name))
    });

    // Each estimate is already rounded; the sum is rounded once more
    let total_annual = round2(providers.iter().map(|p| p.annual_estimate).sum());

    AnnualProjection {
        providers,
        total_annual,
    }
}

/// Charges per year implied by the bill's declared cycle or detected cadence
fn annual_multiplier(latest: &Bill) -> f64 {
    if latest.billing_cycle == Some(BillingCycle::Biweekly) {
        26.0
    } else if latest.billing_cycle == Some(BillingCycle::Annual)
        || latest.recurring_frequency == Some(Frequency::Yearly)
    {
        1.0
    } else if latest.recurring_frequency == Some(Frequency::Quarterly) {
        4.0
    } else {
        12.0
    }
}

/// Compare the first and second halves of the full amount history.
///
/// The split point is `ceil(n/2)`; deltas beyond the threshold either way
/// are a trend, anything else is stable.
fn amount_trend(amounts: &[f64], config: &EngineConfig) -> (Trend, i64) {
    let mid = amounts.len().div_ceil(2);
    let (first, second) = amounts.split_at(mid);
    if first.is_empty() || second.is_empty() {
        return (Trend::Stable, 0);
    }

    let first_mean: f64 = first.iter().sum::<f64>() / first.len() as f64;
    let second_mean: f64 = second.iter().sum::<f64>() / second.len() as f64;
    if first_mean <= 0.0 {
        return (Trend::Stable, 0);
    }

    let delta = (second_mean - first_mean) / first_mean * 100.0;
    let trend = if delta > config.trend_threshold_percent {
        Trend::Rising
    } else if delta < -config.trend_threshold_percent {
        Trend::Falling
    } else {
        Trend::Stable
    };

    (trend, delta.round() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{monthly_bills, BillBuilder};

    #[test]
    fn test_monthly_bill_annualizes_to_twelve_months() {
        let bills = monthly_bills("Netflix", 100.0, 3, "2026-01-15");
        let projection = compute_projections(&bills, &EngineConfig::default());

        assert_eq!(projection.providers.len(), 1);
        let p = &projection.providers[0];
        assert_eq!(p.monthly_avg, 100.0);
        assert_eq!(p.annual_estimate, 1200.0);
        assert_eq!(p.bill_count, 3);
        assert_eq!(projection.total_annual, 1200.0);
    }

    #[test]
    fn test_yearly_recurrence_uses_single_multiplier() {
        let bills = vec![
            BillBuilder::new("y1", "Amazon Prime", 139.0, "2025-03-01")
                .recurring(Some(Frequency::Yearly), Some(0.6))
                .build(),
            BillBuilder::new("y2", "Amazon Prime", 139.0, "2026-03-01")
                .recurring(Some(Frequency::Yearly), Some(0.6))
                .build(),
        ];
        let projection = compute_projections(&bills, &EngineConfig::default());

        assert_eq!(projection.providers[0].annual_estimate, 139.0);
    }

    #[test]
    fn test_biweekly_cycle_wins_over_frequency() {
        let bills = vec![BillBuilder::new("bw", "Lawn Service", 45.0, "2026-04-03")
            .cycle(Some(BillingCycle::Biweekly))
            .build()];
        let projection = compute_projections(&bills, &EngineConfig::default());

        assert_eq!(projection.providers[0].annual_estimate, round2(45.0 * 26.0));
    }

    #[test]
    fn test_rising_trend_from_history_halves() {
        let amounts = [100.0, 100.0, 120.0, 140.0];
        let (trend, percent) = amount_trend(&amounts, &EngineConfig::default());

        // First half mean 100, second half mean 130
        assert_eq!(trend, Trend::Rising);
        assert_eq!(percent, 30);
    }

    #[test]
    fn test_trend_split_uses_ceiling_midpoint() {
        // Five amounts split 3/2: first mean 100, second mean 90
        let amounts = [100.0, 100.0, 100.0, 90.0, 90.0];
        let (trend, percent) = amount_trend(&amounts, &EngineConfig::default());

        assert_eq!(trend, Trend::Falling);
        assert_eq!(percent, -10);
    }

    #[test]
    fn test_output_sorted_by_descending_estimate() {
        let mut bills = monthly_bills("Netflix", 15.0, 3, "2026-01-10");
        bills.extend(monthly_bills("Con Edison", 120.0, 3, "2026-01-05"));
        let projection = compute_projections(&bills, &EngineConfig::default());

        assert_eq!(projection.providers[0].name, "Con Edison");
        assert_eq!(projection.providers[1].name, "Netflix");
        assert_eq!(
            projection.total_annual,
            round2(120.0 * 12.0 + 15.0 * 12.0)
        );
    }
}
