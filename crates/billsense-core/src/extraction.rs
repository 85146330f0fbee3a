//! Extraction validation
//!
//! Sanitizes raw OCR/LLM output before a bill is accepted. Amounts and
//! dates outside plausible bands become warnings and are kept; only
//! structurally unusable values (not-a-number, not-a-date-at-all) become
//! hard errors that must block acceptance.

use std::sync::OnceLock;

use chrono::{Duration, NaiveDate};
use regex::Regex;
use tracing::debug;

use crate::config::EngineConfig;
use crate::models::{round2, ExtractedFields, ValidatedExtraction};

fn iso_shape() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("valid regex"))
}

fn delimited_triple() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(\d{1,4})([/.\-])(\d{1,2})([/.\-])(\d{1,4})$").expect("valid regex")
    })
}

/// Textual formats tried after delimited-triple parsing fails
const FALLBACK_FORMATS: &[&str] = &["%B %d, %Y", "%b %d, %Y", "%d %B %Y", "%B %d %Y"];

/// Validate and repair one raw extraction.
pub fn validate_extraction(
    raw: &ExtractedFields,
    today: NaiveDate,
    config: &EngineConfig,
) -> ValidatedExtraction {
    let mut out = ValidatedExtraction::default();

    // Amount: null passes through untouched
    if let Some(amount) = raw.amount {
        if !amount.is_finite() {
            out.errors
                .push("Extracted amount is not a usable number".to_string());
        } else {
            let mut value = amount;
            if value < 0.0 {
                out.warnings.push(format!(
                    "Negative amount {:.2}; keeping the absolute value",
                    value
                ));
                value = value.abs();
            }
            if value > config.amount_warn_ceiling {
                out.warnings
                    .push(format!("Amount {:.2} is unusually large", value));
            }
            if value < config.amount_warn_floor {
                out.warnings
                    .push(format!("Amount {:.2} is unusually small", value));
            }
            out.corrected_amount = Some(round2(value));
        }
    }

    // Date: null passes through untouched
    if let Some(raw_date) = raw.due_date.as_deref() {
        let trimmed = raw_date.trim();

        let strict = if iso_shape().is_match(trimmed) {
            NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").ok()
        } else {
            None
        };

        match strict {
            Some(date) => {
                out.corrected_date = Some(trimmed.to_string());
                range_check(date, today, config, &mut out.warnings);
            }
            None => match reparse_date(trimmed) {
                Some(date) => {
                    let formatted = date.format("%Y-%m-%d").to_string();
                    debug!(raw = trimmed, corrected = formatted.as_str(), "due date repaired");
                    out.warnings.push(format!(
                        "Due date reformatted from '{}' to '{}'",
                        trimmed, formatted
                    ));
                    range_check(date, today, config, &mut out.warnings);
                    out.corrected_date = Some(formatted);
                }
                None => {
                    out.errors
                        .push(format!("Unparseable due date '{}'", trimmed));
                }
            },
        }
    }

    out
}

/// Try to recover a date from a non-ISO string.
///
/// Delimited triples are tried first: year-first when the leading field has
/// four digits, otherwise DD/MM when the middle field is a plausible month,
/// falling back to MM/DD when the first field is. Ambiguity is settled by
/// whichever ordering yields a real calendar date. Textual formats are the
/// last resort.
fn reparse_date(s: &str) -> Option<NaiveDate> {
    if let Some(caps) = delimited_triple().captures(s) {
        // Mixed delimiters (e.g. "15/03-2026") are not a date
        if &caps[2] == &caps[4] {
            let a_raw = &caps[1];
            let a: i32 = a_raw.parse().ok()?;
            let b: u32 = caps[3].parse().ok()?;
            let c_raw = &caps[5];
            let c: i32 = c_raw.parse().ok()?;

            if a_raw.len() == 4 {
                // Year-first: literal Y-M-D or nothing
                if let Some(date) = NaiveDate::from_ymd_opt(a, b, c as u32) {
                    return Some(date);
                }
            } else {
                let year = if c_raw.len() == 2 { 2000 + c } else { c };

                // DD/MM when the middle field can be a month
                if (1..=12).contains(&b) {
                    if let Some(date) = NaiveDate::from_ymd_opt(year, b, a as u32) {
                        return Some(date);
                    }
                }
                // Swapped MM/DD when the first field can be a month
                if (1..=12).contains(&a) {
                    if let Some(date) = NaiveDate::from_ymd_opt(year, a as u32, b) {
                        return Some(date);
                    }
                }
            }
        }
    }

    FALLBACK_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}

fn range_check(
    date: NaiveDate,
    today: NaiveDate,
    config: &EngineConfig,
    warnings: &mut Vec<String>,
) {
    if date < today - Duration::days(config.date_past_warn_days) {
        warnings.push(format!("Due date {} is unusually far in the past", date));
    }
    if date > today + Duration::days(config.date_future_warn_days) {
        warnings.push(format!("Due date {} is unusually far in the future", date));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn raw(amount: Option<f64>, due_date: Option<&str>) -> ExtractedFields {
        ExtractedFields {
            amount,
            due_date: due_date.map(|d| d.to_string()),
            ..Default::default()
        }
    }

    fn validate(amount: Option<f64>, due_date: Option<&str>) -> ValidatedExtraction {
        validate_extraction(&raw(amount, due_date), day("2026-06-01"), &EngineConfig::default())
    }

    #[test]
    fn test_clean_extraction_passes_untouched() {
        let out = validate(Some(84.5), Some("2026-07-01"));
        assert_eq!(out.corrected_amount, Some(84.5));
        assert_eq!(out.corrected_date.as_deref(), Some("2026-07-01"));
        assert!(out.warnings.is_empty());
        assert!(out.errors.is_empty());
    }

    #[test]
    fn test_null_fields_pass_through() {
        let out = validate(None, None);
        assert!(out.corrected_amount.is_none());
        assert!(out.corrected_date.is_none());
        assert!(out.warnings.is_empty() && out.errors.is_empty());
    }

    #[test]
    fn test_non_finite_amount_is_a_hard_error() {
        let out = validate(Some(f64::NAN), None);
        assert!(out.corrected_amount.is_none());
        assert_eq!(out.errors.len(), 1);
    }

    #[test]
    fn test_negative_amount_kept_as_absolute() {
        let out = validate(Some(-42.5), None);
        assert_eq!(out.corrected_amount, Some(42.5));
        assert_eq!(out.warnings.len(), 1);
        assert!(out.errors.is_empty());
    }

    #[test]
    fn test_out_of_band_amounts_warn_but_keep() {
        let big = validate(Some(250_000.0), None);
        assert_eq!(big.corrected_amount, Some(250_000.0));
        assert_eq!(big.warnings.len(), 1);

        let tiny = validate(Some(0.001), None);
        assert_eq!(tiny.corrected_amount, Some(0.0));
        assert_eq!(tiny.warnings.len(), 1);
    }

    #[test]
    fn test_impossible_iso_date_is_a_hard_error() {
        let out = validate(None, Some("2026-13-40"));
        assert!(out.corrected_date.is_none());
        assert_eq!(out.errors.len(), 1);
    }

    #[test]
    fn test_day_first_triple_is_repaired() {
        let out = validate(None, Some("15/03/2026"));
        assert_eq!(out.corrected_date.as_deref(), Some("2026-03-15"));
        assert_eq!(out.warnings.len(), 1);
        assert!(out.errors.is_empty());
    }

    #[test]
    fn test_month_first_triple_resolved_by_validity() {
        // 15 cannot be a month, so the slots flip to MM/DD
        let out = validate(None, Some("03/15/2026"));
        assert_eq!(out.corrected_date.as_deref(), Some("2026-03-15"));
        assert_eq!(out.warnings.len(), 1);
    }

    #[test]
    fn test_dot_delimited_triple() {
        let out = validate(None, Some("05.11.2026"));
        assert_eq!(out.corrected_date.as_deref(), Some("2026-11-05"));
    }

    #[test]
    fn test_textual_date_fallback() {
        let out = validate(None, Some("March 3, 2026"));
        assert_eq!(out.corrected_date.as_deref(), Some("2026-03-03"));
        assert_eq!(out.warnings.len(), 1);
    }

    #[test]
    fn test_far_past_date_warns_but_keeps() {
        let out = validate(None, Some("2024-01-01"));
        assert_eq!(out.corrected_date.as_deref(), Some("2024-01-01"));
        assert_eq!(out.warnings.len(), 1);
        assert!(out.errors.is_empty());
    }

    #[test]
    fn test_far_future_date_warns_but_keeps() {
        let out = validate(None, Some("2029-01-01"));
        assert_eq!(out.corrected_date.as_deref(), Some("2029-01-01"));
        assert_eq!(out.warnings.len(), 1);
    }

    #[test]
    fn test_gibberish_date_is_a_hard_error() {
        let out = validate(None, Some("sometime next week"));
        assert!(out.corrected_date.is_none());
        assert_eq!(out.errors.len(), 1);
    }
}
