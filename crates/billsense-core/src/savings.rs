//! Savings score
//!
//! Collapses a user's billing habits into a 0-100 score with the factors
//! that moved it. Adjustments are independent and additive; each fires at
//! most once per pass.

use chrono::NaiveDate;
use tracing::debug;

use crate::config::EngineConfig;
use crate::models::{Bill, BillStatus, FactorImpact, SavingsScore, ScoreFactor, ScoreLabel};
use crate::recurrence::group_bills;

const BASE_SCORE: i64 = 75;
const EMPTY_SCORE: u8 = 50;

// Adjustment bands
const RECURRING_COVERAGE_TARGET: f64 = 0.6;
const PAID_RATIO_STRONG: f64 = 0.8;
const PAID_RATIO_MIXED: f64 = 0.5;
const CV_CONSISTENT: f64 = 30.0;
const CV_VOLATILE: f64 = 60.0;

/// Score a user's bill list.
pub fn compute_savings_score(
    bills: &[Bill],
    today: NaiveDate,
    config: &EngineConfig,
) -> SavingsScore {
    if bills.is_empty() {
        return SavingsScore {
            score: EMPTY_SCORE,
            label: ScoreLabel::for_score(EMPTY_SCORE),
            factors: vec![ScoreFactor {
                label: "No bills yet".to_string(),
                impact: FactorImpact::Neutral,
                detail: "Add bills to see a savings score".to_string(),
            }],
        };
    }

    let mut score = BASE_SCORE;
    let mut factors = Vec::new();
    let total = bills.len();

    // Spike count: bills deviating sharply from their biller's mean,
    // counted only where there are peers to compare against
    let spike_count = count_spikes(bills, config);
    match spike_count {
        0 => {
            score += 10;
            factors.push(ScoreFactor {
                label: "No unusual charges".to_string(),
                impact: FactorImpact::Positive,
                detail: "No bill strays far from its biller's average".to_string(),
            });
        }
        1..=2 => {
            score -= 5;
            factors.push(ScoreFactor {
                label: "A few unusual charges".to_string(),
                impact: FactorImpact::Negative,
                detail: format!(
                    "{} bills deviate more than {:.0}% from their biller's average",
                    spike_count, config.spike_percent
                ),
            });
        }
        _ => {
            score -= 10;
            factors.push(ScoreFactor {
                label: "Many unusual charges".to_string(),
                impact: FactorImpact::Negative,
                detail: format!(
                    "{} bills deviate more than {:.0}% from their biller's average",
                    spike_count, config.spike_percent
                ),
            });
        }
    }

    // Recurring coverage
    let recurring = bills.iter().filter(|b| b.is_recurring).count();
    let coverage = recurring as f64 / total as f64;
    if coverage >= RECURRING_COVERAGE_TARGET {
        score += 5;
        factors.push(ScoreFactor {
            label: "Bills tracked as recurring".to_string(),
            impact: FactorImpact::Positive,
            detail: format!("{:.0}% of bills have a known cadence", coverage * 100.0),
        });
    }

    // Payment completion
    let paid = bills.iter().filter(|b| b.status == BillStatus::Paid).count();
    let paid_ratio = paid as f64 / total as f64;
    if paid_ratio >= PAID_RATIO_STRONG {
        score += 10;
        factors.push(ScoreFactor {
            label: "Strong payment history".to_string(),
            impact: FactorImpact::Positive,
            detail: format!("{:.0}% of bills fully paid", paid_ratio * 100.0),
        });
    } else if paid_ratio >= PAID_RATIO_MIXED {
        factors.push(ScoreFactor {
            label: "Mixed payment history".to_string(),
            impact: FactorImpact::Neutral,
            detail: format!("{:.0}% of bills fully paid", paid_ratio * 100.0),
        });
    } else {
        score -= 10;
        factors.push(ScoreFactor {
            label: "Low payment completion".to_string(),
            impact: FactorImpact::Negative,
            detail: format!("Only {:.0}% of bills fully paid", paid_ratio * 100.0),
        });
    }

    // Overdue bills pull the score down without a floor
    let overdue = bills
        .iter()
        .filter(|b| b.status != BillStatus::Paid && b.due_date < today)
        .count();
    if overdue > 0 {
        score -= 5 * overdue as i64;
        factors.push(ScoreFactor {
            label: "Overdue bills".to_string(),
            impact: FactorImpact::Negative,
            detail: format!("{} bills are past their due date", overdue),
        });
    } else if bills.iter().any(|b| b.status != BillStatus::Paid) {
        score += 5;
        factors.push(ScoreFactor {
            label: "No overdue bills".to_string(),
            impact: FactorImpact::Positive,
            detail: "Everything outstanding is still within its due date".to_string(),
        });
    }

    // Amount variability across the whole portfolio
    if let Some(cv) = coefficient_of_variation(bills) {
        if cv < CV_CONSISTENT {
            score += 5;
            factors.push(ScoreFactor {
                label: "Consistent bill amounts".to_string(),
                impact: FactorImpact::Positive,
                detail: format!("Amount variability is low ({:.0}%)", cv),
            });
        } else if cv > CV_VOLATILE {
            score -= 5;
            factors.push(ScoreFactor {
                label: "Highly variable bill amounts".to_string(),
                impact: FactorImpact::Negative,
                detail: format!("Amount variability is high ({:.0}%)", cv),
            });
        }
    }

    let score = score.clamp(0, 100) as u8;
    let label = ScoreLabel::for_score(score);

    debug!(score, label = %label, factors = factors.len(), "savings score computed");

    SavingsScore {
        score,
        label,
        factors,
    }
}

/// Bills deviating more than the spike threshold from their biller's mean,
/// across billers with at least two bills.
fn count_spikes(bills: &[Bill], config: &EngineConfig) -> usize {
    let mut count = 0;

    for group in group_bills(bills).values() {
        if group.len() < 2 {
            continue;
        }
        let mean: f64 =
            group.iter().map(|b| b.total_amount).sum::<f64>() / group.len() as f64;
        if mean <= 0.0 {
            continue;
        }
        count += group
            .iter()
            .filter(|b| ((b.total_amount - mean).abs() / mean * 100.0) > config.spike_percent)
            .count();
    }

    count
}

/// Population standard deviation over the mean, as a percentage
fn coefficient_of_variation(bills: &[Bill]) -> Option<f64> {
    let n = bills.len() as f64;
    let mean = bills.iter().map(|b| b.total_amount).sum::<f64>() / n;
    if mean <= 0.0 {
        return None;
    }
    let variance = bills
        .iter()
        .map(|b| (b.total_amount - mean).powi(2))
        .sum::<f64>()
        / n;
    Some(variance.sqrt() / mean * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Frequency;
    use crate::test_utils::BillBuilder;
    use chrono::NaiveDate;

    fn day(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn test_empty_list_scores_fixed_moderate() {
        let score = compute_savings_score(&[], day("2026-03-01"), &EngineConfig::default());
        assert_eq!(score.score, 50);
        assert_eq!(score.label, ScoreLabel::Moderate);
        assert_eq!(score.factors.len(), 1);
        assert_eq!(score.factors[0].impact, FactorImpact::Neutral);
    }

    #[test]
    fn test_clean_history_hits_ceiling() {
        // Identical paid monthly bills: +10 spikes, +5 coverage, +10 paid,
        // +5 consistency; no unpaid bills, so no overdue factor either way
        let bills: Vec<_> = ["2026-01-10", "2026-02-10", "2026-03-10"]
            .iter()
            .enumerate()
            .map(|(i, d)| {
                BillBuilder::new(format!("p{}", i), "Netflix", 15.49, d)
                    .status(BillStatus::Paid)
                    .recurring(Some(Frequency::Monthly), Some(0.6))
                    .build()
            })
            .collect();

        let score = compute_savings_score(&bills, day("2026-03-20"), &EngineConfig::default());
        assert_eq!(score.score, 100);
        assert_eq!(score.label, ScoreLabel::Optimized);
        assert!(score
            .factors
            .iter()
            .all(|f| f.impact != FactorImpact::Negative));
    }

    #[test]
    fn test_overdue_penalty_is_per_bill() {
        let bills: Vec<_> = (0..3)
            .map(|i| {
                BillBuilder::new(format!("o{}", i), format!("Biller {}", i), 100.0, "2026-01-01")
                    .build()
            })
            .collect();

        let score = compute_savings_score(&bills, day("2026-03-01"), &EngineConfig::default());
        // 75 + 10 (no spikes) - 10 (nothing paid) - 15 (3 overdue) + 5 (CV 0)
        assert_eq!(score.score, 65);
        assert!(score
            .factors
            .iter()
            .any(|f| f.label == "Overdue bills" && f.impact == FactorImpact::Negative));
    }

    #[test]
    fn test_spike_band_penalty() {
        let mut bills = vec![
            BillBuilder::new("s1", "Con Edison", 100.0, "2026-01-05")
                .status(BillStatus::Paid)
                .build(),
            BillBuilder::new("s2", "Con Edison", 100.0, "2026-02-05")
                .status(BillStatus::Paid)
                .build(),
        ];
        // Group mean becomes 120; only the 160 clears 20% of it
        bills.push(
            BillBuilder::new("s3", "Con Edison", 160.0, "2026-03-05")
                .status(BillStatus::Paid)
                .build(),
        );

        let score = compute_savings_score(&bills, day("2026-03-20"), &EngineConfig::default());
        assert!(score
            .factors
            .iter()
            .any(|f| f.label.contains("unusual charges") && f.impact == FactorImpact::Negative));
    }

    #[test]
    fn test_score_never_leaves_bounds() {
        // Many overdue bills push the raw score far below zero
        let bills: Vec<_> = (0..40)
            .map(|i| {
                BillBuilder::new(format!("b{}", i), format!("Biller {}", i), 100.0, "2025-01-01")
                    .build()
            })
            .collect();

        let score = compute_savings_score(&bills, day("2026-03-01"), &EngineConfig::default());
        assert_eq!(score.score, 0);
        assert_eq!(score.label, ScoreLabel::NeedsAttention);
    }
}
