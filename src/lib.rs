//! road-trip-planner
//!
//! Picks a bounded set of intermediate stops between two cities and orders
//! them into a drivable route. Selection runs a portfolio of strategies and
//! keeps the best-scoring subset.

pub mod config;
pub mod haversine;
pub mod models;
pub mod polyline;
pub mod portfolio;
pub mod scoring;
pub mod sequence;
pub mod solver;
pub mod traits;

pub use config::{ConfigError, OptimizationConfig};
pub use models::{City, Coordinate, OptimizationMethod, OptimizedRoute, ScoreMap};
pub use solver::{OptimizationController, PlanningPath, optimize};
