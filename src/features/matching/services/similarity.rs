//! Similarity scoring between a new report and a candidate of the opposite type.
//!
//! Four independent sub-scores, each in `[0, 1]`, are combined with fixed
//! weights. Everything here is pure: the same pair of profiles always yields
//! the same breakdown.

use std::collections::HashMap;

use serde::Serialize;
use utoipa::ToSchema;

use crate::features::reports::models::MatchProfile;

/// Earth's mean radius in kilometers (for Haversine formula)
const EARTH_RADIUS_KM: f64 = 6371.0;

pub const GEOGRAPHIC_WEIGHT: f64 = 0.35;
pub const DESCRIPTION_WEIGHT: f64 = 0.35;
pub const COLOR_WEIGHT: f64 = 0.25;
pub const RECENCY_WEIGHT: f64 = 0.05;

/// Minimum composite score for a candidate to be linked
pub const MATCH_THRESHOLD: f64 = 0.85;

const MS_PER_DAY: f64 = 86_400_000.0;

/// (distance km, score) breakpoints, linear in between, 0.0 past the last
const DISTANCE_DECAY: [(f64, f64); 6] = [
    (1.0, 1.0),
    (5.0, 0.8),
    (10.0, 0.6),
    (25.0, 0.4),
    (50.0, 0.2),
    (150.0, 0.0),
];

/// (day gap, score) breakpoints; the last segment decays over 365 days past day 90
const RECENCY_DECAY: [(f64, f64); 5] = [
    (1.0, 1.0),
    (7.0, 0.7),
    (30.0, 0.3),
    (90.0, 0.1),
    (90.0 + 365.0, 0.0),
];

/// Substitute for a missing dominant color
const DEFAULT_COLOR: [u8; 3] = [0, 0, 0];

/// Per-factor scores and their weighted total
#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct ScoreBreakdown {
    pub geographic: f64,
    pub description: f64,
    pub color: f64,
    pub recency: f64,
    pub total: f64,
}

impl ScoreBreakdown {
    pub fn from_parts(geographic: f64, description: f64, color: f64, recency: f64) -> Self {
        Self {
            geographic,
            description,
            color,
            recency,
            total: composite_score(geographic, description, color, recency),
        }
    }

    pub fn is_match(&self) -> bool {
        meets_threshold(self.total)
    }
}

/// Score a new report against a candidate
pub fn score_pair(new_report: &MatchProfile<'_>, candidate: &MatchProfile<'_>) -> ScoreBreakdown {
    let geographic = match (coordinates(new_report), coordinates(candidate)) {
        (Some((lat1, lon1)), Some((lat2, lon2))) => geographic_score(lat1, lon1, lat2, lon2),
        _ => 0.0,
    };

    ScoreBreakdown::from_parts(
        geographic,
        description_similarity(new_report.description, candidate.description),
        color_score(new_report.color, candidate.color),
        recency_score(new_report.timestamp_ms, candidate.timestamp_ms),
    )
}

pub fn composite_score(geographic: f64, description: f64, color: f64, recency: f64) -> f64 {
    GEOGRAPHIC_WEIGHT * geographic
        + DESCRIPTION_WEIGHT * description
        + COLOR_WEIGHT * color
        + RECENCY_WEIGHT * recency
}

pub fn meets_threshold(score: f64) -> bool {
    score >= MATCH_THRESHOLD
}

/// Both coordinates, or `None` when either is absent, zero or not finite
fn coordinates(profile: &MatchProfile<'_>) -> Option<(f64, f64)> {
    let usable = |v: Option<f64>| v.filter(|x| x.is_finite() && *x != 0.0);
    Some((usable(profile.latitude)?, usable(profile.longitude)?))
}

/// Great-circle distance between two points in kilometers
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().min(1.0).asin();

    EARTH_RADIUS_KM * c
}

pub fn geographic_score(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    piecewise_decay(haversine_km(lat1, lon1, lat2, lon2), &DISTANCE_DECAY)
}

/// Dice's coefficient over character bigrams, case and surrounding whitespace ignored
pub fn description_similarity(a: &str, b: &str) -> f64 {
    let s1 = a.trim().to_lowercase();
    let s2 = b.trim().to_lowercase();

    if s1 == s2 {
        return 1.0;
    }

    let chars1: Vec<char> = s1.chars().collect();
    let chars2: Vec<char> = s2.chars().collect();
    if chars1.len() < 2 || chars2.len() < 2 {
        return 0.0;
    }

    let bigrams1 = bigram_counts(&chars1);
    let bigrams2 = bigram_counts(&chars2);

    let matches: usize = bigrams1
        .iter()
        .map(|(bigram, count1)| {
            bigrams2
                .get(bigram)
                .map_or(0, |count2| (*count1).min(*count2))
        })
        .sum();

    let total = (chars1.len() - 1) + (chars2.len() - 1);
    (2 * matches) as f64 / total as f64
}

fn bigram_counts(chars: &[char]) -> HashMap<(char, char), usize> {
    let mut counts = HashMap::with_capacity(chars.len());
    for pair in chars.windows(2) {
        *counts.entry((pair[0], pair[1])).or_insert(0) += 1;
    }
    counts
}

/// One minus the normalized Euclidean RGB distance; a missing color counts as black
pub fn color_score(a: Option<[u8; 3]>, b: Option<[u8; 3]>) -> f64 {
    let a = a.unwrap_or(DEFAULT_COLOR);
    let b = b.unwrap_or(DEFAULT_COLOR);

    let distance = a
        .iter()
        .zip(b.iter())
        .map(|(x, y)| (f64::from(*x) - f64::from(*y)).powi(2))
        .sum::<f64>()
        .sqrt();
    let max_distance = (3.0 * 255.0_f64.powi(2)).sqrt();

    (1.0 - distance / max_distance).clamp(0.0, 1.0)
}

pub fn recency_score(timestamp1_ms: i64, timestamp2_ms: i64) -> f64 {
    let days = timestamp1_ms.abs_diff(timestamp2_ms) as f64 / MS_PER_DAY;
    piecewise_decay(days, &RECENCY_DECAY)
}

/// Linear interpolation between breakpoints; flat before the first, last value after the last
fn piecewise_decay(x: f64, points: &[(f64, f64)]) -> f64 {
    let Some(&(first_x, first_y)) = points.first() else {
        return 0.0;
    };
    if x <= first_x {
        return first_y;
    }

    for pair in points.windows(2) {
        let (x0, y0) = pair[0];
        let (x1, y1) = pair[1];
        if x <= x1 {
            let t = (x - x0) / (x1 - x0);
            return (y0 + t * (y1 - y0)).max(0.0);
        }
    }

    points.last().map_or(0.0, |&(_, y)| y.max(0.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;
    const DAY_MS: i64 = 86_400_000;

    fn profile(lat: Option<f64>, lon: Option<f64>, desc: &str) -> MatchProfile<'_> {
        MatchProfile {
            latitude: lat,
            longitude: lon,
            description: desc,
            color: None,
            timestamp_ms: 0,
        }
    }

    #[test]
    fn test_haversine_known_distance() {
        // Kuala Lumpur to Petaling Jaya, roughly 11km
        let distance = haversine_km(3.1390, 101.6869, 3.1073, 101.6067);
        assert!(distance > 9.0 && distance < 11.0, "distance = {}", distance);
    }

    #[test]
    fn test_geographic_identical_points() {
        assert_eq!(geographic_score(3.139, 101.6869, 3.139, 101.6869), 1.0);
    }

    #[test]
    fn test_geographic_missing_coordinates() {
        let a = profile(Some(3.139), Some(101.6869), "x");
        let b = profile(None, Some(101.6869), "x");
        let zero = profile(Some(0.0), Some(101.6869), "x");

        assert_eq!(score_pair(&a, &b).geographic, 0.0);
        assert_eq!(score_pair(&b, &a).geographic, 0.0);
        assert_eq!(score_pair(&a, &zero).geographic, 0.0);
    }

    #[test]
    fn test_distance_decay_breakpoints() {
        assert_eq!(piecewise_decay(0.5, &DISTANCE_DECAY), 1.0);
        assert!((piecewise_decay(3.0, &DISTANCE_DECAY) - 0.9).abs() < EPS);
        assert!((piecewise_decay(5.0, &DISTANCE_DECAY) - 0.8).abs() < EPS);
        assert!((piecewise_decay(7.5, &DISTANCE_DECAY) - 0.7).abs() < EPS);
        assert!((piecewise_decay(25.0, &DISTANCE_DECAY) - 0.4).abs() < EPS);
        assert!((piecewise_decay(100.0, &DISTANCE_DECAY) - 0.1).abs() < EPS);
        assert_eq!(piecewise_decay(150.0, &DISTANCE_DECAY), 0.0);
        assert_eq!(piecewise_decay(4000.0, &DISTANCE_DECAY), 0.0);
    }

    #[test]
    fn test_description_identical_and_empty() {
        assert_eq!(description_similarity("", ""), 1.0);
        assert_eq!(description_similarity("a", "a"), 1.0);
        assert_eq!(description_similarity("  Blue Wallet ", "blue wallet"), 1.0);
    }

    #[test]
    fn test_description_short_strings() {
        assert_eq!(description_similarity("a", "ab"), 0.0);
        assert_eq!(description_similarity("", "wallet"), 0.0);
        assert_eq!(description_similarity("wallet", "x"), 0.0);
    }

    #[test]
    fn test_description_dice_coefficient() {
        // 10 shared bigrams, 10 + 18 total
        let score = description_similarity("blue wallet", "blue leather wallet");
        assert!((score - 20.0 / 28.0).abs() < EPS);

        // Repeated bigrams count at most min(count1, count2) times
        let score = description_similarity("aaaa", "aa");
        assert!((score - 2.0 / 4.0).abs() < EPS);

        assert_eq!(description_similarity("ab", "cd"), 0.0);
    }

    #[test]
    fn test_color_bounds() {
        assert_eq!(color_score(Some([12, 200, 7]), Some([12, 200, 7])), 1.0);
        assert!(color_score(Some([0, 0, 0]), Some([255, 255, 255])).abs() < EPS);
    }

    #[test]
    fn test_missing_color_is_black() {
        assert_eq!(color_score(None, None), 1.0);
        assert_eq!(color_score(None, Some([0, 0, 0])), 1.0);
        assert!(color_score(Some([255, 255, 255]), None).abs() < EPS);
    }

    #[test]
    fn test_recency_within_a_day() {
        assert_eq!(recency_score(0, 0), 1.0);
        assert_eq!(recency_score(0, DAY_MS), 1.0);
        assert_eq!(recency_score(DAY_MS, 0), 1.0);
    }

    #[test]
    fn test_recency_breakpoints() {
        assert!((recency_score(0, 7 * DAY_MS) - 0.7).abs() < EPS);
        assert!((recency_score(0, 30 * DAY_MS) - 0.3).abs() < EPS);
        assert!((recency_score(0, 90 * DAY_MS) - 0.1).abs() < EPS);
        assert_eq!(recency_score(0, 455 * DAY_MS), 0.0);
        assert_eq!(recency_score(0, 2000 * DAY_MS), 0.0);
    }

    #[test]
    fn test_recency_strictly_decreasing() {
        let mut previous = recency_score(0, DAY_MS);
        for day in 2..=455 {
            let current = recency_score(0, day * DAY_MS);
            assert!(current < previous, "day {}: {} !< {}", day, current, previous);
            previous = current;
        }
    }

    #[test]
    fn test_composite_weights() {
        assert!((composite_score(1.0, 1.0, 1.0, 1.0) - 1.0).abs() < EPS);
        assert_eq!(composite_score(0.0, 0.0, 0.0, 0.0), 0.0);
        assert!((composite_score(1.0, 0.0, 0.0, 0.0) - 0.35).abs() < EPS);
        assert!((composite_score(0.0, 1.0, 0.0, 0.0) - 0.35).abs() < EPS);
        assert!((composite_score(0.0, 0.0, 1.0, 0.0) - 0.25).abs() < EPS);
        assert!((composite_score(0.0, 0.0, 0.0, 1.0) - 0.05).abs() < EPS);

        let steps = [0.0, 0.25, 0.5, 0.75, 1.0];
        for g in steps {
            for d in steps {
                for c in steps {
                    for t in steps {
                        let s = composite_score(g, d, c, t);
                        assert!((0.0..=1.0 + EPS).contains(&s));
                    }
                }
            }
        }
    }

    #[test]
    fn test_threshold_boundary() {
        assert!(meets_threshold(0.85));
        assert!(meets_threshold(0.9));
        assert!(!meets_threshold(0.849_999_999));
    }

    #[test]
    fn test_score_is_symmetric() {
        let a = MatchProfile {
            latitude: Some(3.1390),
            longitude: Some(101.6869),
            description: "Black umbrella",
            color: Some([10, 10, 10]),
            timestamp_ms: 0,
        };
        let b = MatchProfile {
            latitude: Some(3.2),
            longitude: Some(101.7),
            description: "black folding umbrella",
            color: Some([30, 20, 25]),
            timestamp_ms: 3 * DAY_MS,
        };

        let ab = score_pair(&a, &b);
        let ba = score_pair(&b, &a);
        assert!((ab.total - ba.total).abs() < EPS);
        assert!((ab.geographic - ba.geographic).abs() < EPS);
    }

    #[test]
    fn test_wallet_scenario_breakdown() {
        let t = 1_700_000_000_000;
        let lost = MatchProfile {
            latitude: Some(3.1390),
            longitude: Some(101.6869),
            description: "blue wallet",
            color: Some([20, 40, 160]),
            timestamp_ms: t,
        };
        let found = MatchProfile {
            latitude: Some(3.1395),
            longitude: Some(101.6875),
            description: "blue leather wallet",
            color: Some([20, 40, 160]),
            timestamp_ms: t + 2 * 60 * 60 * 1000,
        };

        let score = score_pair(&lost, &found);
        assert_eq!(score.geographic, 1.0);
        assert!(score.description > 0.6 && score.description < 0.8);
        assert_eq!(score.color, 1.0);
        assert_eq!(score.recency, 1.0);
        assert!(score.is_match());
    }
}
