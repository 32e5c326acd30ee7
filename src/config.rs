//! Optimizer configuration.

use std::fmt;
use std::io;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Assumed average driving speed including short stops, km/h.
const DEFAULT_SPEED_KMH: f64 = 70.0;

#[derive(Debug)]
pub enum ConfigError {
    Invalid(String),
    Io(io::Error),
    Parse(serde_json::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Invalid(reason) => write!(f, "invalid optimizer config: {reason}"),
            ConfigError::Io(err) => write!(f, "failed to read optimizer config: {err}"),
            ConfigError::Parse(err) => write!(f, "failed to parse optimizer config: {err}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Invalid(_) => None,
            ConfigError::Io(err) => Some(err),
            ConfigError::Parse(err) => Some(err),
        }
    }
}

impl From<io::Error> for ConfigError {
    fn from(err: io::Error) -> Self {
        ConfigError::Io(err)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Parse(err)
    }
}

/// Tunables for stop selection and sequencing.
///
/// Missing fields take their defaults when deserialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizationConfig {
    /// Allowed extra distance over the direct route, as a fraction of it.
    pub max_detour_ratio: f64,
    /// Minimum distance between any two stops (including start and end).
    pub min_stop_distance_km: f64,
    /// Legs longer than this are called out in the route explanation.
    pub max_stop_distance_km: f64,

    pub population_size: usize,
    pub generations: usize,
    /// Probability that an offspring is mutated.
    pub mutation_rate: f64,

    pub initial_temperature: f64,
    /// Geometric cooling factor in (0, 1).
    pub cooling_rate: f64,
    pub min_temperature: f64,
    /// Neighbors evaluated at each temperature level.
    pub iterations_per_temperature: usize,

    /// Seed for the randomized strategies. `None` draws a fresh one per call.
    pub seed: Option<u64>,
    /// Run portfolio strategies concurrently.
    pub parallel: bool,
    /// Wall-clock budget per strategy. `None` disables the limit.
    pub strategy_time_limit_ms: Option<u64>,
    /// Used to estimate leg durations.
    pub average_speed_kmh: f64,
}

impl Default for OptimizationConfig {
    fn default() -> Self {
        Self {
            max_detour_ratio: 0.3,
            min_stop_distance_km: 80.0,
            max_stop_distance_km: 200.0,
            population_size: 50,
            generations: 100,
            mutation_rate: 0.1,
            initial_temperature: 1000.0,
            cooling_rate: 0.95,
            min_temperature: 1.0,
            iterations_per_temperature: 1,
            seed: None,
            parallel: true,
            strategy_time_limit_ms: Some(10_000),
            average_speed_kmh: DEFAULT_SPEED_KMH,
        }
    }
}

impl OptimizationConfig {
    pub fn with_max_detour_ratio(mut self, ratio: f64) -> Self {
        self.max_detour_ratio = ratio;
        self
    }

    pub fn with_stop_spacing(mut self, min_km: f64, max_km: f64) -> Self {
        self.min_stop_distance_km = min_km;
        self.max_stop_distance_km = max_km;
        self
    }

    pub fn with_genetic(mut self, population_size: usize, generations: usize, mutation_rate: f64) -> Self {
        self.population_size = population_size;
        self.generations = generations;
        self.mutation_rate = mutation_rate;
        self
    }

    pub fn with_annealing(mut self, initial_temperature: f64, cooling_rate: f64, min_temperature: f64) -> Self {
        self.initial_temperature = initial_temperature;
        self.cooling_rate = cooling_rate;
        self.min_temperature = min_temperature;
        self
    }

    pub fn with_iterations_per_temperature(mut self, iterations: usize) -> Self {
        self.iterations_per_temperature = iterations;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Sub-millisecond limits round up to 1 ms.
    pub fn with_strategy_time_limit(mut self, limit: Option<Duration>) -> Self {
        self.strategy_time_limit_ms = limit.map(|limit| limit.as_micros().div_ceil(1000) as u64);
        self
    }

    pub fn with_average_speed(mut self, speed_kmh: f64) -> Self {
        self.average_speed_kmh = speed_kmh;
        self
    }

    pub fn strategy_time_limit(&self) -> Option<Duration> {
        self.strategy_time_limit_ms.map(Duration::from_millis)
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |reason: String| Err(ConfigError::Invalid(reason));

        if !(self.max_detour_ratio > 0.0) {
            return invalid(format!("max_detour_ratio must be positive, got {}", self.max_detour_ratio));
        }
        if !(self.min_stop_distance_km >= 0.0) {
            return invalid(format!(
                "min_stop_distance_km must be non-negative, got {}",
                self.min_stop_distance_km
            ));
        }
        if !(self.max_stop_distance_km >= self.min_stop_distance_km) {
            return invalid(format!(
                "max_stop_distance_km ({}) must not be below min_stop_distance_km ({})",
                self.max_stop_distance_km, self.min_stop_distance_km
            ));
        }
        if self.population_size < 2 {
            return invalid(format!("population_size must be at least 2, got {}", self.population_size));
        }
        if !(0.0..=1.0).contains(&self.mutation_rate) {
            return invalid(format!("mutation_rate must be in [0, 1], got {}", self.mutation_rate));
        }
        if !(self.min_temperature > 0.0) {
            return invalid(format!("min_temperature must be positive, got {}", self.min_temperature));
        }
        if !(self.initial_temperature > self.min_temperature) {
            return invalid(format!(
                "initial_temperature ({}) must exceed min_temperature ({})",
                self.initial_temperature, self.min_temperature
            ));
        }
        if !(self.cooling_rate > 0.0 && self.cooling_rate < 1.0) {
            return invalid(format!("cooling_rate must be in (0, 1), got {}", self.cooling_rate));
        }
        if self.iterations_per_temperature == 0 {
            return invalid("iterations_per_temperature must be at least 1".to_string());
        }
        if self.strategy_time_limit_ms == Some(0) {
            return invalid("strategy_time_limit_ms must be positive when set".to_string());
        }
        if !(self.average_speed_kmh > 0.0) {
            return invalid(format!("average_speed_kmh must be positive, got {}", self.average_speed_kmh));
        }
        Ok(())
    }
}
