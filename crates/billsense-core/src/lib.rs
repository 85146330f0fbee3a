//! Billsense Core Library
//!
//! The bill intelligence engine behind Billsense:
//! - Provider registry with exact, slug, and fuzzy vendor matching
//! - Recurrence detection over due-date gap patterns
//! - Amount deviation flags and always-on spike signals
//! - Annual spend projection with per-biller trends
//! - Savings scoring with human-readable factors
//! - Duplicate submission detection
//! - Extraction validation for OCR/LLM output
//! - Rate limiting and content-hash dedup guards
//!
//! Everything here is a pure computation over in-memory records; storage,
//! authentication, payment processing, and the extraction call itself are
//! the host application's responsibility.

pub mod config;
pub mod deviation;
pub mod duplicate;
pub mod error;
pub mod extraction;
pub mod forecast;
pub mod guards;
pub mod models;
pub mod projection;
pub mod providers;
pub mod recurrence;
pub mod savings;

/// Test utilities (bill builders for integration tests)
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use config::EngineConfig;
pub use deviation::{detect_spikes, spike_for};
pub use duplicate::{best_duplicate_match, check_duplicate, DuplicateCandidate};
pub use error::{Error, Result};
pub use extraction::validate_extraction;
pub use forecast::{upcoming_charges, UpcomingCharge};
pub use guards::{content_hash, GuardStore};
pub use models::{
    bills_from_json, round2, AnnualProjection, Bill, BillStatus, BillingCycle,
    DuplicateCheckResult, ExtractedFields, FactorImpact, Frequency, ProviderProjection,
    RateLimitDecision, RecurrenceDetection, SavingsScore, ScoreFactor, ScoreLabel, SpikeAlert,
    SpikeDirection, Trend, ValidatedExtraction,
};
pub use projection::compute_projections;
pub use providers::{fuzzy_match, resolve, FuzzyMatch, ProviderEntry, ProviderResolution};
pub use recurrence::{apply_recurrence, detect_recurrence};
pub use savings::compute_savings_score;
