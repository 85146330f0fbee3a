//! Provider registry and matching
//!
//! Resolves free-text vendor names to a canonical provider identity. The
//! registry is a constant slice so iteration order is stable; fuzzy-match
//! ties always resolve to the earliest entry.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::EngineConfig;

/// One entry in the static provider registry
#[derive(Debug, Clone, Copy)]
pub struct ProviderEntry {
    /// Slug identifier used as a bill's `providerId`
    pub id: &'static str,
    pub canonical_name: &'static str,
    pub category: &'static str,
    pub subcategory_types: &'static [&'static str],
}

/// Known consumer billers. Reference data, never mutated at runtime.
pub const PROVIDER_REGISTRY: &[ProviderEntry] = &[
    ProviderEntry {
        id: "con_edison",
        canonical_name: "Con Edison",
        category: "utilities",
        subcategory_types: &["electricity", "gas"],
    },
    ProviderEntry {
        id: "pge",
        canonical_name: "Pacific Gas and Electric",
        category: "utilities",
        subcategory_types: &["electricity", "gas"],
    },
    ProviderEntry {
        id: "duke_energy",
        canonical_name: "Duke Energy",
        category: "utilities",
        subcategory_types: &["electricity"],
    },
    ProviderEntry {
        id: "national_grid",
        canonical_name: "National Grid",
        category: "utilities",
        subcategory_types: &["electricity", "gas"],
    },
    ProviderEntry {
        id: "american_water",
        canonical_name: "American Water",
        category: "utilities",
        subcategory_types: &["water"],
    },
    ProviderEntry {
        id: "comcast_xfinity",
        canonical_name: "Comcast Xfinity",
        category: "telecom",
        subcategory_types: &["internet", "cable"],
    },
    ProviderEntry {
        id: "spectrum",
        canonical_name: "Spectrum",
        category: "telecom",
        subcategory_types: &["internet", "cable"],
    },
    ProviderEntry {
        id: "att",
        canonical_name: "AT&T",
        category: "telecom",
        subcategory_types: &["wireless", "internet"],
    },
    ProviderEntry {
        id: "verizon",
        canonical_name: "Verizon Wireless",
        category: "telecom",
        subcategory_types: &["wireless"],
    },
    ProviderEntry {
        id: "tmobile",
        canonical_name: "T-Mobile",
        category: "telecom",
        subcategory_types: &["wireless"],
    },
    ProviderEntry {
        id: "netflix",
        canonical_name: "Netflix",
        category: "entertainment",
        subcategory_types: &["streaming"],
    },
    ProviderEntry {
        id: "spotify",
        canonical_name: "Spotify",
        category: "entertainment",
        subcategory_types: &["music"],
    },
    ProviderEntry {
        id: "hulu",
        canonical_name: "Hulu",
        category: "entertainment",
        subcategory_types: &["streaming"],
    },
    ProviderEntry {
        id: "disney_plus",
        canonical_name: "Disney Plus",
        category: "entertainment",
        subcategory_types: &["streaming"],
    },
    ProviderEntry {
        id: "youtube_premium",
        canonical_name: "YouTube Premium",
        category: "entertainment",
        subcategory_types: &["streaming", "music"],
    },
    ProviderEntry {
        id: "geico",
        canonical_name: "GEICO",
        category: "insurance",
        subcategory_types: &["auto"],
    },
    ProviderEntry {
        id: "state_farm",
        canonical_name: "State Farm",
        category: "insurance",
        subcategory_types: &["auto", "home"],
    },
    ProviderEntry {
        id: "progressive",
        canonical_name: "Progressive",
        category: "insurance",
        subcategory_types: &["auto"],
    },
    ProviderEntry {
        id: "planet_fitness",
        canonical_name: "Planet Fitness",
        category: "fitness",
        subcategory_types: &["gym"],
    },
    ProviderEntry {
        id: "adt",
        canonical_name: "ADT",
        category: "home",
        subcategory_types: &["security"],
    },
];

/// Resolved provider identity for a vendor name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderResolution {
    pub provider_id: String,
    pub canonical_name: String,
    pub is_custom: bool,
}

/// A fuzzy registry match with its combined score
#[derive(Debug, Clone, Copy)]
pub struct FuzzyMatch {
    pub entry: &'static ProviderEntry,
    pub score: f64,
}

/// Resolve a vendor name to a provider identity.
///
/// An exact case-sensitive match on a canonical name wins outright;
/// anything else becomes a synthesized `custom_<slug>` identity.
pub fn resolve(name: &str) -> ProviderResolution {
    for entry in PROVIDER_REGISTRY {
        if entry.canonical_name == name {
            return ProviderResolution {
                provider_id: entry.id.to_string(),
                canonical_name: entry.canonical_name.to_string(),
                is_custom: false,
            };
        }
    }

    ProviderResolution {
        provider_id: format!("custom_{}", slug(name)),
        canonical_name: name.trim().to_string(),
        is_custom: true,
    }
}

/// Slug a vendor name: lowercase, apostrophes stripped, non-alphanumeric
/// runs collapsed to single underscores, trimmed of leading/trailing ones.
pub fn slug(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut last_was_sep = false;

    for c in name.to_lowercase().chars() {
        if c == '\'' || c == '\u{2019}' {
            continue;
        }
        if c.is_ascii_alphanumeric() {
            out.push(c);
            last_was_sep = false;
        } else if !last_was_sep && !out.is_empty() {
            out.push('_');
            last_was_sep = true;
        }
    }

    out.trim_end_matches('_').to_string()
}

/// Fuzzy-match an unrecognized vendor string against the registry.
///
/// Scoring, in order: exact normalized equality is 1.0 and returns
/// immediately; containment either way is 0.9; otherwise a blend of token
/// overlap (60%) and normalized edit distance (40%). Matches below the
/// accept threshold return `None`.
pub fn fuzzy_match(free_text: &str, config: &EngineConfig) -> Option<FuzzyMatch> {
    let needle = normalize(free_text);
    if needle.is_empty() {
        return None;
    }

    let mut best: Option<FuzzyMatch> = None;

    for entry in PROVIDER_REGISTRY {
        let candidate = normalize(entry.canonical_name);

        if candidate == needle {
            return Some(FuzzyMatch { entry, score: 1.0 });
        }

        let score = if candidate.contains(&needle) || needle.contains(&candidate) {
            0.9
        } else {
            combined_score(&needle, &candidate)
        };

        // Strict greater-than keeps the first registry entry on ties
        if best.map_or(true, |b| score > b.score) {
            best = Some(FuzzyMatch { entry, score });
        }
    }

    match best {
        Some(m) if m.score >= config.fuzzy_accept_score => {
            debug!(
                vendor = free_text,
                matched = m.entry.id,
                score = m.score,
                "fuzzy provider match"
            );
            Some(m)
        }
        _ => None,
    }
}

/// Lowercase, map non-alphanumerics to spaces, collapse whitespace
fn normalize(s: &str) -> String {
    s.to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// 0.6 x token overlap + 0.4 x (1 - edit distance / max length)
fn combined_score(a: &str, b: &str) -> f64 {
    let overlap = token_overlap(a, b);

    let max_len = a.chars().count().max(b.chars().count());
    let edit = if max_len == 0 {
        0.0
    } else {
        strsim::levenshtein(a, b) as f64 / max_len as f64
    };

    0.6 * overlap + 0.4 * (1.0 - edit)
}

/// Fraction of tokens in the shorter-token-count string that appear as a
/// substring of (or contain) some token of the other string.
fn token_overlap(a: &str, b: &str) -> f64 {
    let a_tokens: Vec<&str> = a.split_whitespace().collect();
    let b_tokens: Vec<&str> = b.split_whitespace().collect();
    if a_tokens.is_empty() || b_tokens.is_empty() {
        return 0.0;
    }

    let (shorter, longer) = if a_tokens.len() <= b_tokens.len() {
        (&a_tokens, &b_tokens)
    } else {
        (&b_tokens, &a_tokens)
    };

    let matched = shorter
        .iter()
        .filter(|t| longer.iter().any(|o| o.contains(*t) || t.contains(o)))
        .count();

    matched as f64 / shorter.len() as f64
}
