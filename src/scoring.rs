//! Composite route score.
//!
//! A route is scored from four components, each in [0, 1]:
//!
//! ```text
//! score = 0.4 * quality + 0.3 * distance_efficiency
//!       + 0.2 * spacing_uniformity + 0.1 * variety
//! ```

use serde::{Deserialize, Serialize};

use crate::models::NEUTRAL_SCORE;

pub const QUALITY_WEIGHT: f64 = 0.4;
pub const DISTANCE_WEIGHT: f64 = 0.3;
pub const SPACING_WEIGHT: f64 = 0.2;
pub const VARIETY_WEIGHT: f64 = 0.1;

/// Number of distinct tags that earns full variety.
const VARIETY_SATURATION: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub quality: f64,
    pub distance_efficiency: f64,
    pub spacing_uniformity: f64,
    pub variety: f64,
    pub total: f64,
}

/// Scores ordered routes against the configured detour tolerance.
#[derive(Debug, Clone, Copy)]
pub struct RouteScorer {
    max_detour_ratio: f64,
}

impl RouteScorer {
    pub fn new(max_detour_ratio: f64) -> Self {
        Self { max_detour_ratio }
    }

    /// Score a route given its leg lengths, the direct start-end distance,
    /// the base scores of its stops and its distinct tag count.
    pub fn score(
        &self,
        legs: &[f64],
        direct_km: f64,
        stop_scores: &[f64],
        distinct_tags: usize,
    ) -> ScoreBreakdown {
        let quality = quality(stop_scores);
        let route_km: f64 = legs.iter().sum();
        let distance_efficiency = distance_efficiency(route_km, direct_km, self.max_detour_ratio);
        let spacing_uniformity = spacing_uniformity(legs);
        let variety = variety(distinct_tags);

        let total = quality * QUALITY_WEIGHT
            + distance_efficiency * DISTANCE_WEIGHT
            + spacing_uniformity * SPACING_WEIGHT
            + variety * VARIETY_WEIGHT;

        ScoreBreakdown {
            quality,
            distance_efficiency,
            spacing_uniformity,
            variety,
            total: total.clamp(0.0, 1.0),
        }
    }
}

/// Mean base score; neutral for a route without stops.
pub fn quality(stop_scores: &[f64]) -> f64 {
    if stop_scores.is_empty() {
        return NEUTRAL_SCORE;
    }
    stop_scores.iter().sum::<f64>() / stop_scores.len() as f64
}

/// Route length over direct length.
pub fn route_ratio(route_km: f64, direct_km: f64) -> f64 {
    if direct_km > 0.0 { route_km / direct_km } else { 1.0 }
}

pub fn distance_efficiency(route_km: f64, direct_km: f64, max_detour_ratio: f64) -> f64 {
    let detour = route_ratio(route_km, direct_km) - 1.0;
    (1.0 - detour / max_detour_ratio).clamp(0.0, 1.0)
}

/// `1 / (1 + variance / mean²)` over leg lengths.
pub fn spacing_uniformity(legs: &[f64]) -> f64 {
    if legs.is_empty() {
        return 1.0;
    }
    let n = legs.len() as f64;
    let mean = legs.iter().sum::<f64>() / n;
    if mean <= 0.0 {
        return 1.0;
    }
    let variance = legs.iter().map(|leg| (leg - mean).powi(2)).sum::<f64>() / n;
    1.0 / (1.0 + variance / (mean * mean))
}

pub fn variety(distinct_tags: usize) -> f64 {
    (distinct_tags as f64 / VARIETY_SATURATION).min(1.0)
}
