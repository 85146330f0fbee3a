//! Amount deviation analysis
//!
//! Two related signals over a bill's peer group:
//! - the gated deviation flag used by recurrence detection (relative
//!   threshold with an absolute floor for small bills)
//! - an always-on spike signal for display, independent of whether the
//!   group is classified as recurring

use tracing::debug;

use crate::config::EngineConfig;
use crate::models::{round2, Bill, SpikeAlert, SpikeDirection};
use crate::recurrence::{group_bills, group_key};

/// Percent deviation of an amount from the recent average
pub fn deviation_percent(amount: f64, recent_avg: f64) -> f64 {
    if recent_avg <= 0.0 {
        return 0.0;
    }
    round2((amount - recent_avg) / recent_avg * 100.0)
}

/// Whether an amount trips the deviation thresholds: 15% of the recent
/// average, or 10 currency units, whichever is looser for small bills.
pub fn exceeds_thresholds(amount: f64, recent_avg: f64, config: &EngineConfig) -> bool {
    let diff = (amount - recent_avg).abs();
    diff > config.deviation_relative * recent_avg || diff > config.deviation_absolute
}

/// Spike signal for one bill against its peers (the bill itself excluded).
///
/// Compares the bill's amount to the trailing-3 average of the peer bills;
/// changes of at least the spike threshold are reported either direction.
pub fn spike_for(bill: &Bill, peers: &[&Bill], config: &EngineConfig) -> Option<SpikeAlert> {
    if peers.is_empty() {
        return None;
    }

    let take = peers.len().min(config.recent_window);
    let baseline: f64 =
        peers.iter().rev().take(take).map(|b| b.total_amount).sum::<f64>() / take as f64;
    if baseline <= 0.0 {
        return None;
    }

    let percent = (bill.total_amount - baseline) / baseline * 100.0;
    if percent.abs() < config.spike_percent {
        return None;
    }

    let direction = if percent > 0.0 {
        SpikeDirection::Increase
    } else {
        SpikeDirection::Decrease
    };

    debug!(
        bill = bill.id.as_str(),
        baseline,
        percent,
        "amount spike"
    );

    Some(SpikeAlert {
        bill_id: bill.id.clone(),
        name: bill.name.trim().to_string(),
        direction,
        percent: percent.abs().round(),
    })
}

/// Run spike detection across a bill list, preserving input order.
pub fn detect_spikes(bills: &[Bill], config: &EngineConfig) -> Vec<SpikeAlert> {
    let groups = group_bills(bills);
    let mut alerts = Vec::new();

    for bill in bills {
        let Some(group) = groups.get(&group_key(bill)) else {
            continue;
        };
        let peers: Vec<&Bill> = group
            .iter()
            .filter(|b| b.id != bill.id)
            .copied()
            .collect();
        if let Some(alert) = spike_for(bill, &peers, config) {
            alerts.push(alert);
        }
    }

    alerts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{monthly_bills, BillBuilder};

    #[test]
    fn test_spike_increase_against_peer_baseline() {
        let mut bills = monthly_bills("Con Edison", 100.0, 3, "2026-01-05");
        bills.push(BillBuilder::new("spiky", "Con Edison", 130.0, "2026-04-05").build());

        let alerts = detect_spikes(&bills, &EngineConfig::default());
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].bill_id, "spiky");
        assert_eq!(alerts[0].direction, SpikeDirection::Increase);
        // Peers are the three $100 bills: +30% exactly
        assert_eq!(alerts[0].percent, 30.0);
    }

    #[test]
    fn test_spike_fires_without_recurrence_gate() {
        // Two bills only, 10 days apart: no cadence, but the spike signal
        // still compares against the lone peer
        let bills = vec![
            BillBuilder::new("a", "One-Off Repair", 200.0, "2026-02-01").build(),
            BillBuilder::new("b", "One-Off Repair", 120.0, "2026-02-11").build(),
        ];

        let alerts = detect_spikes(&bills, &EngineConfig::default());
        let drop = alerts.iter().find(|a| a.bill_id == "b").unwrap();
        assert_eq!(drop.direction, SpikeDirection::Decrease);
        assert_eq!(drop.percent, 40.0);
    }

    #[test]
    fn test_small_change_is_quiet() {
        let mut bills = monthly_bills("Netflix", 100.0, 3, "2026-01-15");
        bills.push(BillBuilder::new("mild", "Netflix", 110.0, "2026-04-15").build());

        let alerts = detect_spikes(&bills, &EngineConfig::default());
        assert!(alerts.iter().all(|a| a.bill_id != "mild"));
    }

    #[test]
    fn test_thresholds_absolute_floor() {
        let config = EngineConfig::default();
        // Diff 16 is only 8%, but clears the $10 absolute floor
        assert!(exceeds_thresholds(216.0, 200.0, &config));
        // Diff 6 is 12%: under both thresholds
        assert!(!exceeds_thresholds(56.0, 50.0, &config));
        // Diff 8 is under the floor but is 40% of a small bill
        assert!(exceeds_thresholds(28.0, 20.0, &config));
    }
}
