//! Pure score arithmetic: fit, originality, impact.
//! See ARCHITECTURE.md §4.1, §4.3, §4.4
//!
//! Everything here is deterministic and side-effect free; the engine wires
//! these functions to live signals.

use chrono::NaiveDate;

use crate::models::WeightProfile;

/// Originality when an online check ran but nothing was flagged: the text
/// was checked and nothing comparable was found, which is weaker evidence
/// than never having checked at all.
pub const ORIGINALITY_CHECKED_DEFAULT: f64 = 90.0;

/// Originality when no online check was requested.
pub const ORIGINALITY_UNCHECKED: f64 = 100.0;

/// Blend the three signals into a 0–100 fit score. Similarity below zero is
/// treated as unrelated rather than as a penalty; `keyword_points` and
/// `quality_boost` arrive pre-capped from the lexical scorer.
pub fn hybrid_score(
    similarity: f64,
    keyword_points: f64,
    quality_boost: f64,
    profile: &WeightProfile,
) -> f64 {
    let semantic = similarity.clamp(0.0, 1.0) * profile.similarity_max;
    let lexical = keyword_points.min(profile.lexical_max);
    let quality = quality_boost.min(profile.quality_max);
    (semantic + lexical + quality).clamp(0.0, 100.0)
}

/// Originality in [0, 100] from the flagged evidence: the average flagged
/// similarity (0–100) weighs 0.7, the flagged share of the text (percent)
/// weighs 0.3. Higher evidence of overlap never raises originality.
pub fn originality_score(avg_flagged_similarity: f64, coverage_pct: f64) -> f64 {
    (100.0 - (avg_flagged_similarity * 0.7 + coverage_pct * 0.3)).clamp(0.0, 100.0)
}

/// Citation-velocity impact score. Velocity is citations accumulated per day
/// since publication; a year of the current velocity, discounted to 30%, is
/// added on top of the raw count so recent fast movers outrank stale
/// heavyweights with similar totals.
///
/// Returns `(impact, velocity)`. Papers with no publication date fall back
/// to half their citation count at zero velocity.
pub fn impact_score(
    citation_count: u64,
    publication_date: Option<NaiveDate>,
    today: NaiveDate,
) -> (f64, f64) {
    let citations = citation_count as f64;
    match publication_date {
        Some(date) => {
            let days_old = (today - date).num_days().max(1) as f64;
            let velocity = citations / days_old;
            (citations + velocity * 365.0 * 0.3, velocity)
        }
        None => (citations * 0.5, 0.0),
    }
}
