//! Command implementations for the Billsense CLI

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use tracing::info;

use billsense_core::{
    best_duplicate_match, bills_from_json, check_duplicate, compute_projections,
    compute_savings_score, detect_spikes, fuzzy_match, upcoming_charges, validate_extraction,
    Bill, DuplicateCandidate, EngineConfig, ExtractedFields,
};

fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    match path {
        Some(p) => EngineConfig::load(p).with_context(|| format!("loading {}", p.display())),
        None => Ok(EngineConfig::default()),
    }
}

fn load_bills(path: &Path) -> Result<Vec<Bill>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    bills_from_json(&raw).with_context(|| format!("parsing {}", path.display()))
}

pub fn cmd_report(
    config_path: Option<&Path>,
    file: &Path,
    horizon: i64,
    json: bool,
) -> Result<()> {
    let config = load_config(config_path)?;
    let bills = load_bills(file)?;
    let today = Local::now().date_naive();
    info!(bills = bills.len(), "loaded bill export");

    let analyzed = billsense_core::apply_recurrence(&bills, &config);
    let spikes = detect_spikes(&bills, &config);
    let projection = compute_projections(&bills, &config);
    let score = compute_savings_score(&analyzed, today, &config);
    let upcoming = upcoming_charges(&bills, today, horizon, &config);

    if json {
        let report = serde_json::json!({
            "bills": analyzed,
            "spikes": spikes,
            "projection": projection,
            "savingsScore": score,
            "upcoming": upcoming,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Bills: {}", analyzed.len());

    let recurring: Vec<_> = analyzed.iter().filter(|b| b.is_recurring).collect();
    println!("\nRecurring ({}):", recurring.len());
    for bill in &recurring {
        let freq = bill
            .recurring_frequency
            .map(|f| f.to_string())
            .unwrap_or_else(|| "?".to_string());
        let confidence = bill.recurring_confidence.unwrap_or(0.0);
        println!(
            "  {:<28} {:<10} confidence {:.2}  avg ${:.2}",
            bill.name.trim(),
            freq,
            confidence,
            bill.avg_recurring_amount.unwrap_or(0.0),
        );
    }

    if !spikes.is_empty() {
        println!("\nSpikes:");
        for spike in &spikes {
            println!(
                "  {:<28} {} of {:.0}%",
                spike.name, spike.direction, spike.percent
            );
        }
    }

    println!("\nAnnual projection (${:.2} total):", projection.total_annual);
    for p in &projection.providers {
        println!(
            "  {:<28} ${:>9.2}/yr  ${:>7.2}/mo  {} {:+}%",
            p.name, p.annual_estimate, p.monthly_avg, p.trend, p.trend_percent
        );
    }

    println!("\nSavings score: {} ({})", score.score, score.label);
    for factor in &score.factors {
        println!("  [{}] {}: {}", factor.impact, factor.label, factor.detail);
    }

    if !upcoming.is_empty() {
        println!("\nExpected in the next {} days:", horizon);
        for charge in &upcoming {
            println!(
                "  {}  {:<28} ${:.2} ({})",
                charge.due_date, charge.name, charge.amount, charge.frequency
            );
        }
    }

    Ok(())
}

pub fn cmd_validate(
    config_path: Option<&Path>,
    amount: Option<f64>,
    date: Option<String>,
) -> Result<()> {
    let config = load_config(config_path)?;
    let today = Local::now().date_naive();

    let raw = ExtractedFields {
        amount,
        due_date: date,
        ..Default::default()
    };

    let validated = validate_extraction(&raw, today, &config);

    if let Some(amount) = validated.corrected_amount {
        println!("Amount: {:.2}", amount);
    }
    if let Some(date) = &validated.corrected_date {
        println!("Due date: {}", date);
    }
    for warning in &validated.warnings {
        println!("warning: {}", warning);
    }
    for error in &validated.errors {
        println!("error: {}", error);
    }

    if validated.errors.is_empty() {
        Ok(())
    } else {
        anyhow::bail!("extraction failed validation")
    }
}

pub fn cmd_duplicate(
    config_path: Option<&Path>,
    file: &Path,
    vendor: &str,
    amount: f64,
    due: &str,
) -> Result<()> {
    let config = load_config(config_path)?;
    let bills = load_bills(file)?;

    let due_date: NaiveDate = due
        .parse()
        .with_context(|| format!("invalid due date '{}', expected YYYY-MM-DD", due))?;

    // Resolve the vendor so provider identity can participate in scoring
    let provider_id = fuzzy_match(vendor, &config).map(|m| m.entry.id.to_string());

    let candidate = DuplicateCandidate {
        vendor: vendor.to_string(),
        amount,
        due_date,
        provider_id,
    };

    let result = check_duplicate(&candidate, &bills, &config);
    if result.is_duplicate {
        println!(
            "Duplicate of bill {} (score {:.2})",
            result.matched_bill_id.as_deref().unwrap_or("?"),
            result.match_score
        );
        if let Some(reason) = &result.reason {
            println!("  {}", reason);
        }
    } else {
        let best = best_duplicate_match(&candidate, &bills, &config);
        println!(
            "No duplicate found (best score {:.2})",
            best.match_score
        );
    }

    Ok(())
}
