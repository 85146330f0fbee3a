//! Duplicate bill detection
//!
//! Scores a freshly extracted or entered bill against a user's existing
//! bills with weighted similarity on provider identity, amount, and due
//! date. The first-match variant honors the caller's bill order, which is
//! part of the contract; a best-match variant is exposed alongside it.

use chrono::NaiveDate;
use tracing::debug;

use crate::config::EngineConfig;
use crate::models::{round2, Bill, DuplicateCheckResult};

/// A candidate bill before acceptance
#[derive(Debug, Clone)]
pub struct DuplicateCandidate {
    /// Vendor or display name as extracted/entered
    pub vendor: String,
    pub amount: f64,
    pub due_date: NaiveDate,
    /// Resolved provider identity, when matching found one
    pub provider_id: Option<String>,
}

/// Check a candidate against existing bills, first match wins.
///
/// Iteration order over `existing` is significant: the first bill whose
/// score reaches the duplicate threshold is reported, not the best one.
/// Callers must supply a stable, documented order (e.g. as fetched).
pub fn check_duplicate(
    candidate: &DuplicateCandidate,
    existing: &[Bill],
    config: &EngineConfig,
) -> DuplicateCheckResult {
    let mut best_score = 0.0f64;

    for bill in existing {
        let (score, matched) = score_pair(candidate, bill, config);

        if score >= config.duplicate_threshold {
            debug!(
                bill = bill.id.as_str(),
                score,
                "duplicate threshold reached"
            );
            return DuplicateCheckResult {
                is_duplicate: true,
                matched_bill_id: Some(bill.id.clone()),
                match_score: round2(score),
                reason: Some(format!(
                    "Matches {} of bill {}",
                    describe(&matched),
                    bill.id
                )),
            };
        }
        if score > best_score {
            best_score = score;
        }
    }

    DuplicateCheckResult {
        is_duplicate: false,
        matched_bill_id: None,
        match_score: round2(best_score),
        reason: None,
    }
}

/// Best-scoring variant: scans every existing bill and reports the highest
/// scorer (earliest on ties). The duplicate flag still uses the threshold.
pub fn best_duplicate_match(
    candidate: &DuplicateCandidate,
    existing: &[Bill],
    config: &EngineConfig,
) -> DuplicateCheckResult {
    let mut best: Option<(f64, &Bill, Vec<&'static str>)> = None;

    for bill in existing {
        let (score, matched) = score_pair(candidate, bill, config);
        if best.as_ref().map_or(true, |(s, _, _)| score > *s) {
            best = Some((score, bill, matched));
        }
    }

    match best {
        Some((score, bill, matched)) if score >= config.duplicate_threshold => {
            DuplicateCheckResult {
                is_duplicate: true,
                matched_bill_id: Some(bill.id.clone()),
                match_score: round2(score),
                reason: Some(format!(
                    "Matches {} of bill {}",
                    describe(&matched),
                    bill.id
                )),
            }
        }
        Some((score, _, _)) => DuplicateCheckResult {
            is_duplicate: false,
            matched_bill_id: None,
            match_score: round2(score),
            reason: None,
        },
        None => DuplicateCheckResult {
            is_duplicate: false,
            matched_bill_id: None,
            match_score: 0.0,
            reason: None,
        },
    }
}

/// Accumulate the three independent checks for one candidate/bill pair.
/// Each check contributes at most once.
fn score_pair(
    candidate: &DuplicateCandidate,
    bill: &Bill,
    config: &EngineConfig,
) -> (f64, Vec<&'static str>) {
    let mut score = 0.0;
    let mut matched = Vec::new();

    // Provider identity: when both sides carry a known id, only exact
    // equality counts; otherwise fall back to display-name comparison
    let candidate_pid = candidate
        .provider_id
        .as_deref()
        .filter(|p| !p.is_empty() && *p != "unknown");
    let bill_pid = (!bill.provider_id.is_empty() && bill.provider_id != "unknown")
        .then_some(bill.provider_id.as_str());

    let provider_hit = match (candidate_pid, bill_pid) {
        (Some(a), Some(b)) => a == b,
        _ => {
            let a = candidate.vendor.trim().to_lowercase();
            let b = bill.name.trim().to_lowercase();
            !a.is_empty() && !b.is_empty() && (a == b || a.contains(&b) || b.contains(&a))
        }
    };
    if provider_hit {
        score += config.duplicate_provider_weight;
        matched.push("provider");
    }

    // Amount
    let diff = (candidate.amount - bill.total_amount).abs();
    if diff <= config.duplicate_amount_tolerance {
        score += config.duplicate_amount_exact_weight;
        matched.push("amount");
    } else if bill.total_amount > 0.0
        && diff / bill.total_amount <= config.duplicate_amount_relative
    {
        score += config.duplicate_amount_close_weight;
        matched.push("amount");
    }

    // Due date
    let days_apart = (candidate.due_date - bill.due_date).num_days().abs();
    if days_apart == 0 {
        score += config.duplicate_date_exact_weight;
        matched.push("due date");
    } else if days_apart <= config.duplicate_date_near_days {
        score += config.duplicate_date_near_weight;
        matched.push("due date");
    }

    (score, matched)
}

fn describe(matched: &[&'static str]) -> String {
    matched.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::BillBuilder;

    fn candidate(vendor: &str, amount: f64, due: &str, provider_id: Option<&str>) -> DuplicateCandidate {
        DuplicateCandidate {
            vendor: vendor.to_string(),
            amount,
            due_date: due.parse().unwrap(),
            provider_id: provider_id.map(|p| p.to_string()),
        }
    }

    #[test]
    fn test_identical_bill_always_flags() {
        let existing = vec![BillBuilder::new("e1", "Netflix", 15.49, "2026-03-01")
            .provider("netflix")
            .build()];
        let c = candidate("Netflix", 15.49, "2026-03-01", Some("netflix"));

        let result = check_duplicate(&c, &existing, &EngineConfig::default());
        assert!(result.is_duplicate);
        assert_eq!(result.matched_bill_id.as_deref(), Some("e1"));
        // 0.4 + 0.35 + 0.25
        assert_eq!(result.match_score, 1.0);
    }

    #[test]
    fn test_first_match_wins_over_better_later_match() {
        let existing = vec![
            // Same provider and amount, 2 days off: 0.4 + 0.35 + 0.1 = 0.85
            BillBuilder::new("first", "Netflix", 15.49, "2026-03-03")
                .provider("netflix")
                .build(),
            // Would score 1.0, but is never reached
            BillBuilder::new("second", "Netflix", 15.49, "2026-03-01")
                .provider("netflix")
                .build(),
        ];
        let c = candidate("Netflix", 15.49, "2026-03-01", Some("netflix"));

        let result = check_duplicate(&c, &existing, &EngineConfig::default());
        assert!(result.is_duplicate);
        assert_eq!(result.matched_bill_id.as_deref(), Some("first"));

        let best = best_duplicate_match(&c, &existing, &EngineConfig::default());
        assert_eq!(best.matched_bill_id.as_deref(), Some("second"));
        assert_eq!(best.match_score, 1.0);
    }

    #[test]
    fn test_known_provider_ids_must_match_exactly() {
        // Both sides carry known ids that differ; the identical display
        // name must not rescue the provider check
        let existing = vec![BillBuilder::new("e1", "Streaming", 15.49, "2026-03-01")
            .provider("hulu")
            .build()];
        let c = candidate("Streaming", 15.49, "2026-03-01", Some("netflix"));

        let result = check_duplicate(&c, &existing, &EngineConfig::default());
        // 0.35 + 0.25, just at the threshold
        assert!(result.is_duplicate);
        assert_eq!(result.match_score, 0.6);
    }

    #[test]
    fn test_name_substring_fallback() {
        let existing = vec![BillBuilder::new("e1", "City Power & Light", 88.0, "2026-03-10").build()];
        let c = candidate("city power", 88.0, "2026-03-10", None);

        let result = check_duplicate(&c, &existing, &EngineConfig::default());
        assert!(result.is_duplicate);
        assert_eq!(result.match_score, 1.0);
    }

    #[test]
    fn test_close_amount_reaches_threshold_without_date() {
        // 0.4 provider + 0.2 close amount (1% off); 5 days apart adds
        // nothing, yet the total still sits at the threshold
        let existing = vec![BillBuilder::new("e1", "Netflix", 100.0, "2026-03-01")
            .provider("netflix")
            .build()];
        let c = candidate("Netflix", 101.0, "2026-03-06", Some("netflix"));

        let result = check_duplicate(&c, &existing, &EngineConfig::default());
        assert!(result.is_duplicate);
        assert_eq!(result.match_score, 0.6);
    }

    #[test]
    fn test_unrelated_bill_reports_best_score() {
        let existing = vec![BillBuilder::new("e1", "Con Edison", 240.0, "2026-06-15").build()];
        let c = candidate("Netflix", 15.49, "2026-03-01", None);

        let result = check_duplicate(&c, &existing, &EngineConfig::default());
        assert!(!result.is_duplicate);
        assert!(result.matched_bill_id.is_none());
        assert!(result.match_score < 0.6);
    }
}
