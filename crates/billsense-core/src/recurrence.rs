//! Recurrence detection
//!
//! Groups a user's bills by provider identity, infers the billing cadence
//! from due-date gaps, and scores how confident the pattern is. Confidence
//! blends gap consistency with sample-size sufficiency; a user-confirmed
//! bill (persisted confidence of exactly 1.0) is never downgraded.

use std::collections::HashMap;

use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::deviation;
use crate::models::{round2, Bill, Frequency, RecurrenceDetection};

/// Grouping key for "same biller": provider identity when known,
/// otherwise the lowercased trimmed display name.
pub(crate) fn group_key(bill: &Bill) -> String {
    if !bill.provider_id.is_empty() && bill.provider_id != "unknown" {
        bill.provider_id.clone()
    } else {
        bill.name.trim().to_lowercase()
    }
}

/// Group bills by biller, each group sorted by due date ascending
pub(crate) fn group_bills(bills: &[Bill]) -> HashMap<String, Vec<&Bill>> {
    let mut groups: HashMap<String, Vec<&Bill>> = HashMap::new();
    for bill in bills {
        groups.entry(group_key(bill)).or_default().push(bill);
    }
    for group in groups.values_mut() {
        group.sort_by_key(|b| b.due_date);
    }
    groups
}

/// Run recurrence detection over one user's bills.
///
/// Returns a detection per bill id. Every bill in a group shares the same
/// frequency, confidence, and recent average; only the most recent bill in
/// a group can carry a deviation flag.
pub fn detect_recurrence(
    bills: &[Bill],
    config: &EngineConfig,
) -> HashMap<String, RecurrenceDetection> {
    let groups = group_bills(bills);
    let mut results = HashMap::with_capacity(bills.len());
    let mut recurring_count = 0usize;

    for (key, group) in &groups {
        // Consecutive day gaps; out-of-order or same-day entries carry no
        // cadence signal and are discarded
        let gaps: Vec<i64> = group
            .windows(2)
            .map(|w| (w[1].due_date - w[0].due_date).num_days())
            .filter(|&g| g > 0)
            .collect();

        let (frequency, confidence) = if gaps.is_empty() {
            (None, 0.0)
        } else {
            let mean_gap = gaps.iter().sum::<i64>() as f64 / gaps.len() as f64;
            match classify_cadence(mean_gap, config) {
                Some((freq, min, max)) => {
                    let in_bucket = gaps.iter().filter(|&&g| g >= min && g <= max).count();
                    let consistency = in_bucket as f64 / gaps.len() as f64;
                    let history =
                        group.len().min(config.history_cap) as f64 / config.history_cap as f64;
                    (Some(freq), consistency * history)
                }
                // Mean gap outside every bucket: not recurring, no matter
                // how many individual gaps would have matched one
                None => (None, 0.0),
            }
        };

        let is_recurring =
            frequency.is_some() && confidence >= config.recurrence_confidence_floor;
        let recent_avg = recent_average(group, config.recent_window);

        debug!(
            group = key.as_str(),
            size = group.len(),
            cadence = ?frequency,
            confidence,
            "cadence classified"
        );

        for (i, bill) in group.iter().enumerate() {
            let is_latest = i == group.len() - 1;

            let mut det = RecurrenceDetection {
                is_recurring,
                frequency,
                confidence,
                avg_amount: recent_avg,
                deviation_percent: 0.0,
                deviation_flag: false,
            };

            if is_latest {
                det.deviation_percent =
                    deviation::deviation_percent(bill.total_amount, recent_avg);
                let flag = is_recurring
                    && deviation::exceeds_thresholds(bill.total_amount, recent_avg, config);
                // A user-dismissed flag stays down until new data arrives;
                // a new bill has no persisted flag and is scored fresh
                det.deviation_flag = if bill.amount_deviation_flag == Some(false) {
                    false
                } else {
                    flag
                };
            }

            apply_confirmed_override(bill, &mut det);
            if det.is_recurring {
                recurring_count += 1;
            }
            results.insert(bill.id.clone(), det);
        }
    }

    info!(
        bills = bills.len(),
        groups = groups.len(),
        recurring = recurring_count,
        "recurrence pass complete"
    );

    results
}

/// Merge a fresh detection pass into bill records. Pure; the caller owns
/// persisting the returned copies.
pub fn apply_recurrence(bills: &[Bill], config: &EngineConfig) -> Vec<Bill> {
    let detections = detect_recurrence(bills, config);

    bills
        .iter()
        .cloned()
        .map(|mut bill| {
            if let Some(det) = detections.get(&bill.id) {
                bill.is_recurring = det.is_recurring;
                bill.recurring_frequency = det.frequency;
                bill.recurring_confidence = Some(det.confidence);
                bill.avg_recurring_amount = Some(det.avg_amount);
                bill.amount_deviation_percent = Some(det.deviation_percent);
                bill.amount_deviation_flag = Some(det.deviation_flag);
            }
            bill
        })
        .collect()
}

/// Bucket a mean due-date gap into a cadence, with the bucket bounds
fn classify_cadence(mean_gap: f64, config: &EngineConfig) -> Option<(Frequency, i64, i64)> {
    let buckets = [
        (Frequency::Monthly, config.monthly_gap_min, config.monthly_gap_max),
        (
            Frequency::Quarterly,
            config.quarterly_gap_min,
            config.quarterly_gap_max,
        ),
        (Frequency::Yearly, config.yearly_gap_min, config.yearly_gap_max),
    ];

    buckets
        .into_iter()
        .find(|&(_, min, max)| mean_gap >= min as f64 && mean_gap <= max as f64)
}

/// Mean of the trailing `window` amounts in a date-sorted group
fn recent_average(sorted: &[&Bill], window: usize) -> f64 {
    let take = sorted.len().min(window);
    if take == 0 {
        return 0.0;
    }
    let sum: f64 = sorted.iter().rev().take(take).map(|b| b.total_amount).sum();
    round2(sum / take as f64)
}

/// User-confirmed bills stay pinned at confidence 1.0 and keep their
/// persisted frequency; detection may still refresh averages and deviation.
fn apply_confirmed_override(bill: &Bill, det: &mut RecurrenceDetection) {
    if bill.recurring_confidence.map_or(false, |c| c >= 1.0) {
        det.confidence = 1.0;
        det.frequency = bill.recurring_frequency.or(det.frequency);
        det.is_recurring = det.frequency.is_some();
    }
}
