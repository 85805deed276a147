//! Lexical scoring: keyword/substring matching plus a quality-signal boost.
//! See ARCHITECTURE.md §4.1
//!
//! Two profiles share the same matching logic:
//! - the weighted term used inside hybrid scoring (8/5/3 points per field
//!   tier, capped at 30), and
//! - the standalone fallback used when embeddings are unavailable
//!   (20/10 points, plus a steeper quality boost, scaled to 0–100).

use crate::models::Rankable;

pub const KEYWORD_POINTS_CAP: f64 = 30.0;
pub const QUALITY_BOOST_CAP: f64 = 20.0;

const TITLE_POINTS: f64 = 8.0;
const BODY_POINTS: f64 = 5.0;
const DOMAIN_POINTS: f64 = 3.0;

const FALLBACK_TITLE_POINTS: f64 = 20.0;
const FALLBACK_BODY_POINTS: f64 = 10.0;
const FALLBACK_QUALITY_CAP: f64 = 30.0;
const FALLBACK_CEILING: f64 = 100.0;

/// Keyword matching score in [0, 30]: each keyword occurrence in a
/// title-like field outweighs one in a description-like field, which
/// outweighs a domain tag hit.
pub fn keyword_points<T: Rankable>(keywords: &[String], candidate: &T) -> f64 {
    let title = candidate.title_field().to_lowercase();
    let body = candidate.body_field().unwrap_or("").to_lowercase();
    let domain = candidate.domain_field().unwrap_or("").to_lowercase();

    let mut points = 0.0;
    for keyword in keywords {
        let kw = keyword.to_lowercase();
        if kw.is_empty() {
            continue;
        }
        if title.contains(&kw) {
            points += TITLE_POINTS;
        }
        if body.contains(&kw) {
            points += BODY_POINTS;
        }
        if domain.contains(&kw) {
            points += DOMAIN_POINTS;
        }
    }

    points.min(KEYWORD_POINTS_CAP)
}

/// Quality-signal boost in [0, 20]: logarithmic, so an extreme citation
/// count or impact factor cannot dominate the blended score.
pub fn quality_boost(signal: f64) -> f64 {
    if signal <= 0.0 {
        return 0.0;
    }
    ((1.0 + signal).ln() * 8.0).min(QUALITY_BOOST_CAP)
}

/// Standalone lexical score in [0, 100], used as the whole score when the
/// embedding provider is unavailable.
pub fn fallback_score<T: Rankable>(keywords: &[String], candidate: &T) -> f64 {
    let title = candidate.title_field().to_lowercase();
    let body = candidate.body_field().unwrap_or("").to_lowercase();

    let mut score = 0.0;
    for keyword in keywords {
        let kw = keyword.to_lowercase();
        if kw.is_empty() {
            continue;
        }
        if title.contains(&kw) {
            score += FALLBACK_TITLE_POINTS;
        }
        if body.contains(&kw) {
            score += FALLBACK_BODY_POINTS;
        }
    }

    score += (candidate.quality_signal() * 5.0).clamp(0.0, FALLBACK_QUALITY_CAP);
    score.min(FALLBACK_CEILING)
}
