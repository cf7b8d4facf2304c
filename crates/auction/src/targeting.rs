//! Targeting completeness — how thoroughly a campaign's targeting
//! configuration is filled in. Pure; no I/O.

use adserve_core::types::Targeting;

/// Floor score for campaigns with no targeting at all.
const BASE_SCORE: f64 = 0.1;
const KEYWORDS_WEIGHT: f64 = 0.25;
const CITIES_WEIGHT: f64 = 0.25;
const CATEGORIES_WEIGHT: f64 = 0.20;
const DAYS_WEIGHT: f64 = 0.10;
const HOURS_WEIGHT: f64 = 0.10;

/// Score a targeting configuration into `[0.1, 1.0]`. Each populated
/// dimension adds a fixed increment on top of the base; a dimension
/// counts as populated when its list is non-empty.
pub fn completeness_score(targeting: Option<&Targeting>) -> f64 {
    let Some(t) = targeting else {
        return BASE_SCORE;
    };

    let mut score = BASE_SCORE;
    if !t.keywords.is_empty() {
        score += KEYWORDS_WEIGHT;
    }
    if !t.cities.is_empty() {
        score += CITIES_WEIGHT;
    }
    if !t.categories.is_empty() {
        score += CATEGORIES_WEIGHT;
    }
    if !t.days_of_week.is_empty() {
        score += DAYS_WEIGHT;
    }
    if !t.hours_of_day.is_empty() {
        score += HOURS_WEIGHT;
    }
    score.min(1.0)
}
