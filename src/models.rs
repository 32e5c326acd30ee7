//! Domain types consumed and produced by the route optimizer.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::polyline::Polyline;

/// Score assumed for a city missing from the score map.
pub const NEUTRAL_SCORE: f64 = 0.5;

/// Externally supplied base desirability per city name, in [0, 1].
pub type ScoreMap = HashMap<String, f64>;

/// Resolve a city's base score, falling back to [`NEUTRAL_SCORE`].
pub fn resolve_score(scores: &ScoreMap, name: &str) -> f64 {
    scores
        .get(name)
        .copied()
        .filter(|score| score.is_finite())
        .map(|score| score.clamp(0.0, 1.0))
        .unwrap_or(NEUTRAL_SCORE)
}

#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    InvalidLatitude(f64),
    InvalidLongitude(f64),
    EmptyName,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::InvalidLatitude(value) => {
                write!(f, "latitude {value} outside [-90, 90]")
            }
            ValidationError::InvalidLongitude(value) => {
                write!(f, "longitude {value} outside [-180, 180]")
            }
            ValidationError::EmptyName => write!(f, "city name must not be empty"),
        }
    }
}

impl std::error::Error for ValidationError {}

/// A validated latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCoordinate")]
pub struct Coordinate {
    latitude: f64,
    longitude: f64,
}

#[derive(Deserialize)]
struct RawCoordinate {
    latitude: f64,
    longitude: f64,
}

impl TryFrom<RawCoordinate> for Coordinate {
    type Error = ValidationError;

    fn try_from(raw: RawCoordinate) -> Result<Self, Self::Error> {
        Coordinate::new(raw.latitude, raw.longitude)
    }
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, ValidationError> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(ValidationError::InvalidLatitude(latitude));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(ValidationError::InvalidLongitude(longitude));
        }
        Ok(Self { latitude, longitude })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Bit-level identity, used as a cache key.
    pub(crate) fn identity(&self) -> (u64, u64) {
        (self.latitude.to_bits(), self.longitude.to_bits())
    }
}

/// A city that can serve as an endpoint or an intermediate stop.
///
/// Planning reads only the name, coordinates and tags. `country`, `region`
/// and `population` are caller metadata: they are never scored, and are
/// carried unchanged into [`OptimizedRoute::cities`] so the caller can
/// label stops without a second lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct City {
    pub name: String,
    pub coordinates: Coordinate,
    /// Descriptive labels; distinct tags across the stops drive variety.
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub population: Option<u64>,
}

impl City {
    /// Creates a city, validating its coordinates.
    pub fn new(name: impl Into<String>, latitude: f64, longitude: f64) -> Result<Self, ValidationError> {
        Self::at(name, Coordinate::new(latitude, longitude)?)
    }

    pub fn at(name: impl Into<String>, coordinates: Coordinate) -> Result<Self, ValidationError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }
        Ok(Self {
            name,
            coordinates,
            tags: BTreeSet::new(),
            country: None,
            region: None,
            population: None,
        })
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = Some(country.into());
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_population(mut self, population: u64) -> Self {
        self.population = Some(population);
        self
    }
}

/// Which path through the optimizer produced a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizationMethod {
    NoCandidates,
    SimpleOrdering,
    ExactEnumeration,
    GeneticAlgorithm,
    SimulatedAnnealing,
    GreedyWithLocalSearch,
    GreedyFallback,
}

impl OptimizationMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            OptimizationMethod::NoCandidates => "no_candidates",
            OptimizationMethod::SimpleOrdering => "simple_ordering",
            OptimizationMethod::ExactEnumeration => "exact_enumeration",
            OptimizationMethod::GeneticAlgorithm => "genetic_algorithm",
            OptimizationMethod::SimulatedAnnealing => "simulated_annealing",
            OptimizationMethod::GreedyWithLocalSearch => "greedy_with_local_search",
            OptimizationMethod::GreedyFallback => "greedy_fallback",
        }
    }
}

impl fmt::Display for OptimizationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl PartialEq<&str> for OptimizationMethod {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    /// Route distance divided by the direct start-end distance.
    pub detour_ratio: f64,
    /// Mean leg length; 0 for a direct route.
    pub avg_stop_distance: f64,
    pub spacing_efficiency: f64,
    pub variety_score: f64,
    pub total_cities: usize,
    pub longest_leg_km: f64,
}

/// One driving leg of the final route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteSegment {
    pub from: String,
    pub to: String,
    pub distance_km: f64,
    pub duration_hours: f64,
}

/// Outcome of a single portfolio strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyReport {
    pub method: OptimizationMethod,
    pub score: Option<f64>,
    pub error: Option<String>,
    pub elapsed_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizedRoute {
    /// Intermediate stops in driving order, excluding start and end.
    pub cities: Vec<City>,
    pub total_distance_km: f64,
    pub total_score: f64,
    pub optimization_method: OptimizationMethod,
    pub performance_metrics: PerformanceMetrics,
    pub routing_explanation: String,
    pub segments: Vec<RouteSegment>,
    pub path: Polyline,
    pub strategy_reports: Vec<StrategyReport>,
    pub dropped_cities: Vec<String>,
    pub seed: Option<u64>,
}

impl OptimizedRoute {
    pub fn city_names(&self) -> Vec<&str> {
        self.cities.iter().map(|city| city.name.as_str()).collect()
    }

    pub fn total_duration_hours(&self) -> f64 {
        self.segments.iter().map(|segment| segment.duration_hours).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinate_bounds() {
        assert!(Coordinate::new(90.0, 180.0).is_ok());
        assert!(Coordinate::new(-90.0, -180.0).is_ok());
        assert_eq!(
            Coordinate::new(90.5, 0.0),
            Err(ValidationError::InvalidLatitude(90.5))
        );
        assert_eq!(
            Coordinate::new(0.0, -181.0),
            Err(ValidationError::InvalidLongitude(-181.0))
        );
    }

    #[test]
    fn test_coordinate_rejects_nan() {
        assert!(Coordinate::new(f64::NAN, 0.0).is_err());
        assert!(Coordinate::new(0.0, f64::NAN).is_err());
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: Coordinate = serde_json::from_str(r#"{"latitude": 45.0, "longitude": 7.0}"#).unwrap();
        assert_eq!(ok.latitude(), 45.0);
        let bad = serde_json::from_str::<Coordinate>(r#"{"latitude": 95.0, "longitude": 7.0}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn test_city_requires_name() {
        assert_eq!(City::new("  ", 1.0, 1.0), Err(ValidationError::EmptyName));
    }

    #[test]
    fn test_city_builder() {
        let city = City::new("Lyon", 45.7640, 4.8357)
            .unwrap()
            .with_tags(["food", "history"])
            .with_tag("food")
            .with_country("France")
            .with_population(513_275);
        assert_eq!(city.tags.len(), 2);
        assert_eq!(city.country.as_deref(), Some("France"));
        assert_eq!(city.region, None);
        assert_eq!(city.population, Some(513_275));
    }

    #[test]
    fn test_resolve_score_defaults_and_clamps() {
        let mut scores = ScoreMap::new();
        scores.insert("Nice".to_string(), 1.7);
        scores.insert("Genoa".to_string(), f64::NAN);
        assert_eq!(resolve_score(&scores, "Nice"), 1.0);
        assert_eq!(resolve_score(&scores, "Genoa"), NEUTRAL_SCORE);
        assert_eq!(resolve_score(&scores, "Turin"), NEUTRAL_SCORE);
    }

    #[test]
    fn test_method_names() {
        assert_eq!(OptimizationMethod::GreedyFallback.as_str(), "greedy_fallback");
        assert_eq!(OptimizationMethod::NoCandidates, "no_candidates");
        let json = serde_json::to_string(&OptimizationMethod::SimulatedAnnealing).unwrap();
        assert_eq!(json, "\"simulated_annealing\"");
    }
}
