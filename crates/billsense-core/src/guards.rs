//! Abuse guards for the extraction pipeline
//!
//! Bounds usage of the external extraction call with a fixed-window rate
//! limit and a short-window content-hash dedup. State lives in an injected
//! `GuardStore` rather than module globals so hosts control scope and
//! tests can start clean. Losing the store on restart only weakens the
//! guards; it never touches bill data.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::Utc;
use tracing::debug;

use crate::config::EngineConfig;
use crate::models::RateLimitDecision;

#[derive(Debug)]
struct RateWindow {
    count: u32,
    window_reset_at_ms: i64,
}

#[derive(Debug)]
struct SeenHash {
    hash: String,
    recorded_at_ms: i64,
}

/// Process-lifetime guard state, shared across callers.
///
/// Each check is a single locked step, so concurrent requests against the
/// same key cannot slip past the limit between a read and an increment.
#[derive(Debug, Default)]
pub struct GuardStore {
    rate_windows: Mutex<HashMap<String, RateWindow>>,
    content_hashes: Mutex<HashMap<String, Vec<SeenHash>>>,
}

impl GuardStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fixed-window rate limit check-and-increment for one key
    /// (e.g. a user id, or `ip_<address>`).
    pub fn check_rate_limit(&self, key: &str, config: &EngineConfig) -> RateLimitDecision {
        self.check_rate_limit_at(key, Utc::now().timestamp_millis(), config)
    }

    /// Clock-explicit variant; `check_rate_limit` supplies the wall clock.
    pub fn check_rate_limit_at(
        &self,
        key: &str,
        now_ms: i64,
        config: &EngineConfig,
    ) -> RateLimitDecision {
        let mut windows = self
            .rate_windows
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if let Some(window) = windows.get_mut(key) {
            if now_ms < window.window_reset_at_ms {
                if window.count >= config.rate_limit_max {
                    debug!(key, count = window.count, "rate limit rejected");
                    return RateLimitDecision {
                        allowed: false,
                        remaining: 0,
                        resets_in_ms: window.window_reset_at_ms - now_ms,
                    };
                }
                window.count += 1;
                return RateLimitDecision {
                    allowed: true,
                    remaining: config.rate_limit_max - window.count,
                    resets_in_ms: window.window_reset_at_ms - now_ms,
                };
            }
        }

        // First action in a new or expired window
        windows.insert(
            key.to_string(),
            RateWindow {
                count: 1,
                window_reset_at_ms: now_ms + config.rate_limit_window_ms,
            },
        );
        RateLimitDecision {
            allowed: true,
            remaining: config.rate_limit_max - 1,
            resets_in_ms: config.rate_limit_window_ms,
        }
    }

    /// Content-hash dedup with check-and-insert semantics: the hash is
    /// recorded by the act of checking. Returns whether an identical
    /// submission was already seen inside the window.
    pub fn check_and_record_hash(
        &self,
        user_key: &str,
        hash: &str,
        config: &EngineConfig,
    ) -> bool {
        self.check_and_record_hash_at(user_key, hash, Utc::now().timestamp_millis(), config)
    }

    /// Clock-explicit variant; `check_and_record_hash` supplies the wall clock.
    pub fn check_and_record_hash_at(
        &self,
        user_key: &str,
        hash: &str,
        now_ms: i64,
        config: &EngineConfig,
    ) -> bool {
        let mut hashes = self
            .content_hashes
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let seen = hashes.entry(user_key.to_string()).or_default();
        let cutoff = now_ms - config.hash_window_ms;
        seen.retain(|entry| entry.recorded_at_ms >= cutoff);

        let is_duplicate = seen.iter().any(|entry| entry.hash == hash);
        seen.push(SeenHash {
            hash: hash.to_string(),
            recorded_at_ms: now_ms,
        });

        if is_duplicate {
            debug!(user = user_key, "duplicate content hash rejected");
        }
        is_duplicate
    }
}

/// Lightweight non-cryptographic content hash for dedup.
///
/// Rolls over the first and last 1000 characters of the payload (typically
/// base64) and appends the length as a collision-reducing suffix. Not for
/// anything security-sensitive.
pub fn content_hash(payload: &str) -> String {
    let char_count = payload.chars().count();
    let head = payload.chars().take(1000);
    let tail = payload.chars().skip(char_count.saturating_sub(1000));

    let mut h: u32 = 5381;
    for c in head.chain(tail) {
        h = h.wrapping_mul(33) ^ (c as u32);
    }

    format!("{:08x}_{}", h, payload.len())
}
