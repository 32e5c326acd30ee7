//! Polyline representation for planned route geometries.
//!
//! A route's geometry is the straight great-circle chain start → stops →
//! end. Encoding to a compact polyline format for map display is left to
//! the caller.

use serde::{Deserialize, Serialize};

use crate::haversine::haversine_km;
use crate::models::{City, Coordinate};

/// A polyline representing a route geometry as decoded coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polyline {
    points: Vec<Coordinate>,
}

impl Polyline {
    pub fn new(points: Vec<Coordinate>) -> Self {
        Self { points }
    }

    /// Builds the chain `start`, each stop in order, `end`.
    pub fn through(start: &City, stops: &[City], end: &City) -> Self {
        let points = std::iter::once(start)
            .chain(stops)
            .chain(std::iter::once(end))
            .map(|city| city.coordinates)
            .collect();
        Self { points }
    }

    pub fn points(&self) -> &[Coordinate] {
        &self.points
    }

    pub fn into_points(self) -> Vec<Coordinate> {
        self.points
    }

    /// Great-circle length of each leg.
    pub fn leg_lengths_km(&self) -> Vec<f64> {
        self.points
            .windows(2)
            .map(|pair| haversine_km(pair[0], pair[1]))
            .collect()
    }

    pub fn length_km(&self) -> f64 {
        self.leg_lengths_km().iter().sum()
    }
}
