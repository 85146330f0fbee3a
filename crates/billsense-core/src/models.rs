//! Domain models for Billsense

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Payment status of a bill
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BillStatus {
    #[default]
    Unpaid,
    Partial,
    Paid,
}

impl BillStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unpaid => "unpaid",
            Self::Partial => "partial",
            Self::Paid => "paid",
        }
    }
}

impl std::str::FromStr for BillStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "unpaid" => Ok(Self::Unpaid),
            "partial" => Ok(Self::Partial),
            "paid" => Ok(Self::Paid),
            _ => Err(format!("Unknown bill status: {}", s)),
        }
    }
}

impl std::fmt::Display for BillStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Detected billing cadence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Monthly,
    Quarterly,
    Yearly,
}

impl Frequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Monthly => "monthly",
            Self::Quarterly => "quarterly",
            Self::Yearly => "yearly",
        }
    }
}

impl std::str::FromStr for Frequency {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "monthly" => Ok(Self::Monthly),
            "quarterly" => Ok(Self::Quarterly),
            "yearly" | "annual" => Ok(Self::Yearly),
            _ => Err(format!("Unknown frequency: {}", s)),
        }
    }
}

impl std::fmt::Display for Frequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Billing cycle declared on a bill (distinct from the detected cadence)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillingCycle {
    Biweekly,
    Monthly,
    Quarterly,
    Annual,
}

impl BillingCycle {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Biweekly => "biweekly",
            Self::Monthly => "monthly",
            Self::Quarterly => "quarterly",
            Self::Annual => "annual",
        }
    }
}

impl std::str::FromStr for BillingCycle {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "biweekly" | "bi-weekly" => Ok(Self::Biweekly),
            "monthly" => Ok(Self::Monthly),
            "quarterly" => Ok(Self::Quarterly),
            "annual" | "yearly" => Ok(Self::Annual),
            _ => Err(format!("Unknown billing cycle: {}", s)),
        }
    }
}

impl std::fmt::Display for BillingCycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A bill record as stored by the document store.
///
/// Field names follow the store's camelCase document shape. The engine reads
/// these records and never writes them back itself; `apply_recurrence`
/// returns updated copies for the caller to persist.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bill {
    pub id: String,
    /// Registry key, `custom_<slug>`, or `"unknown"`
    pub provider_id: String,
    /// Display name as entered or extracted
    pub name: String,
    pub total_amount: f64,
    #[serde(default)]
    pub paid_amount: f64,
    #[serde(default)]
    pub status: BillStatus,
    pub due_date: NaiveDate,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub subcategory: Option<String>,
    #[serde(default)]
    pub billing_cycle: Option<BillingCycle>,
    #[serde(default)]
    pub is_recurring: bool,
    #[serde(default)]
    pub recurring_frequency: Option<Frequency>,
    /// Detected confidence, or exactly 1.0 when user-confirmed
    #[serde(default)]
    pub recurring_confidence: Option<f64>,
    #[serde(default)]
    pub avg_recurring_amount: Option<f64>,
    #[serde(default)]
    pub amount_deviation_percent: Option<f64>,
    /// `Some(false)` after a user dismissal; detection will not re-raise it
    #[serde(default)]
    pub amount_deviation_flag: Option<bool>,
}

/// Per-bill recurrence analysis, recomputed from the bill list on every pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurrenceDetection {
    pub is_recurring: bool,
    pub frequency: Option<Frequency>,
    /// In [0, 1]: gap consistency capped by sample-size sufficiency
    pub confidence: f64,
    /// Trailing-3 average of the bill's group
    pub avg_amount: f64,
    pub deviation_percent: f64,
    pub deviation_flag: bool,
}

/// Direction of a spend trend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Rising,
    Falling,
    Stable,
}

impl Trend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rising => "rising",
            Self::Falling => "falling",
            Self::Stable => "stable",
        }
    }
}

impl std::fmt::Display for Trend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Annualized spend estimate for one biller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderProjection {
    pub name: String,
    pub monthly_avg: f64,
    pub annual_estimate: f64,
    pub bill_count: usize,
    pub trend: Trend,
    /// First-half vs second-half delta, rounded to an integer percent
    pub trend_percent: i64,
}

/// Portfolio-wide annual projection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnualProjection {
    /// Sorted by descending annual estimate
    pub providers: Vec<ProviderProjection>,
    pub total_annual: f64,
}

/// How a score factor moved the savings score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FactorImpact {
    Positive,
    Negative,
    Neutral,
}

impl FactorImpact {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Negative => "negative",
            Self::Neutral => "neutral",
        }
    }
}

impl std::fmt::Display for FactorImpact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One contributing factor in a savings score
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreFactor {
    pub label: String,
    pub impact: FactorImpact,
    pub detail: String,
}

/// Savings score band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreLabel {
    Optimized,
    Good,
    Moderate,
    NeedsAttention,
}

impl ScoreLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Optimized => "optimized",
            Self::Good => "good",
            Self::Moderate => "moderate",
            Self::NeedsAttention => "needs_attention",
        }
    }

    /// Band for a clamped score
    pub fn for_score(score: u8) -> Self {
        match score {
            80..=u8::MAX => Self::Optimized,
            65..=79 => Self::Good,
            45..=64 => Self::Moderate,
            _ => Self::NeedsAttention,
        }
    }
}

impl std::fmt::Display for ScoreLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let title = match self {
            Self::Optimized => "Optimized",
            Self::Good => "Good",
            Self::Moderate => "Moderate",
            Self::NeedsAttention => "Needs Attention",
        };
        write!(f, "{}", title)
    }
}

/// Savings score with its contributing factors
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavingsScore {
    /// Clamped to [0, 100]
    pub score: u8,
    pub label: ScoreLabel,
    pub factors: Vec<ScoreFactor>,
}

/// Result of checking a candidate bill against existing bills
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicateCheckResult {
    pub is_duplicate: bool,
    pub matched_bill_id: Option<String>,
    /// In [0, 1]
    pub match_score: f64,
    pub reason: Option<String>,
}

/// Direction of an amount spike
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpikeDirection {
    Increase,
    Decrease,
}

impl SpikeDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Increase => "increase",
            Self::Decrease => "decrease",
        }
    }
}

impl std::fmt::Display for SpikeDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Always-on spike signal for display, independent of the recurrence gate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpikeAlert {
    pub bill_id: String,
    pub name: String,
    pub direction: SpikeDirection,
    /// Absolute percent change vs the peer baseline, rounded to an integer
    pub percent: f64,
}

/// Raw field set returned by the external OCR/LLM extraction call
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedFields {
    #[serde(default)]
    pub vendor: Option<String>,
    #[serde(default)]
    pub amount: Option<f64>,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub account_number: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub confidence_vendor: Option<f64>,
    #[serde(default)]
    pub confidence_amount: Option<f64>,
    #[serde(default)]
    pub confidence_due_date: Option<f64>,
}

/// Sanitized extraction output: corrected values plus warnings and errors
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidatedExtraction {
    pub corrected_amount: Option<f64>,
    /// Always `YYYY-MM-DD` when present
    pub corrected_date: Option<String>,
    /// Soft findings; never block acceptance
    pub warnings: Vec<String>,
    /// Hard findings; must block acceptance
    pub errors: Vec<String>,
}

/// Outcome of a rate-limit check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub remaining: u32,
    pub resets_in_ms: i64,
}

/// Round a monetary value to 2 decimal places. Idempotent.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Parse a document-store bill dump (JSON array)
pub fn bills_from_json(data: &str) -> Result<Vec<Bill>> {
    Ok(serde_json::from_str(data)?)
}
