//! Great-circle geometry for route planning.
//!
//! Every distance the optimizer uses, for scoring and for constraint checks,
//! comes from [`haversine_km`]. [`GeoMetrics`] memoizes it per coordinate
//! pair and builds dense matrices for the selection strategies.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use crate::models::{City, Coordinate};
use crate::traits::DistanceMatrixProvider;

/// Earth radius in kilometers.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Calculate haversine distance between two points in kilometers.
pub fn haversine_km(from: Coordinate, to: Coordinate) -> f64 {
    let lat1_rad = from.latitude().to_radians();
    let lat2_rad = to.latitude().to_radians();
    let delta_lat = (to.latitude() - from.latitude()).to_radians();
    let delta_lng = (to.longitude() - from.longitude()).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().min(1.0).asin();

    EARTH_RADIUS_KM * c
}

/// Initial bearing from `from` towards `to`, in radians.
fn bearing_rad(from: Coordinate, to: Coordinate) -> f64 {
    let lat1 = from.latitude().to_radians();
    let lat2 = to.latitude().to_radians();
    let delta_lng = (to.longitude() - from.longitude()).to_radians();

    let y = delta_lng.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * delta_lng.cos();
    y.atan2(x)
}

/// Convert a distance to driving hours at the given average speed.
pub fn travel_hours(km: f64, speed_kmh: f64) -> f64 {
    km / speed_kmh
}

/// Dense symmetric distance matrix in km, stored row-major.
#[derive(Debug, Clone)]
pub struct DistanceMatrix {
    data: Vec<f64>,
    size: usize,
}

impl DistanceMatrix {
    pub fn new(size: usize) -> Self {
        Self {
            data: vec![0.0; size * size],
            size,
        }
    }

    #[inline]
    pub fn get(&self, from: usize, to: usize) -> f64 {
        self.data[from * self.size + to]
    }

    fn set_symmetric(&mut self, a: usize, b: usize, km: f64) {
        self.data[a * self.size + b] = km;
        self.data[b * self.size + a] = km;
    }
}

type PairKey = ((u64, u64), (u64, u64));

fn pair_key(a: Coordinate, b: Coordinate) -> PairKey {
    let (a, b) = (a.identity(), b.identity());
    if a <= b { (a, b) } else { (b, a) }
}

/// Memoizing great-circle distance service.
///
/// The cache is keyed by the unordered coordinate pair and is safe to share
/// across threads. Call [`GeoMetrics::clear_cache`] between unrelated
/// planning sessions to bound its growth.
#[derive(Debug, Default)]
pub struct GeoMetrics {
    cache: Mutex<HashMap<PairKey, f64>>,
}

impl GeoMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn distance(&self, a: Coordinate, b: Coordinate) -> f64 {
        let key = pair_key(a, b);
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        *cache.entry(key).or_insert_with(|| haversine_km(a, b))
    }

    /// Extra distance incurred by passing through `city` on the way from
    /// `start` to `end`.
    pub fn detour(&self, city: Coordinate, start: Coordinate, end: Coordinate) -> f64 {
        let via = self.distance(start, city) + self.distance(city, end);
        (via - self.distance(start, end)).max(0.0)
    }

    /// Cross-track distance (km) from `point` to the great circle through
    /// `start` and `end`.
    pub fn perpendicular_deviation(&self, point: Coordinate, start: Coordinate, end: Coordinate) -> f64 {
        let from_start = self.distance(start, point);
        if self.distance(start, end) == 0.0 {
            return from_start;
        }
        let angular = from_start / EARTH_RADIUS_KM;
        let delta_bearing = bearing_rad(start, point) - bearing_rad(start, end);
        ((angular.sin() * delta_bearing.sin()).clamp(-1.0, 1.0).asin() * EARTH_RADIUS_KM).abs()
    }

    /// Coarse route-proximity filter: keeps cities whose path via the city is
    /// at most `max_detour_factor` times the direct distance. Cities sitting on
    /// the start or end are dropped.
    pub fn corridor<'a>(
        &self,
        candidates: &'a [City],
        start: &City,
        end: &City,
        max_detour_factor: f64,
    ) -> Vec<&'a City> {
        let direct = self.distance(start.coordinates, end.coordinates);
        candidates
            .iter()
            .filter(|city| {
                city.coordinates != start.coordinates && city.coordinates != end.coordinates
            })
            .filter(|city| {
                let via = self.distance(start.coordinates, city.coordinates)
                    + self.distance(city.coordinates, end.coordinates);
                if direct > 0.0 {
                    via / direct <= max_detour_factor
                } else {
                    false
                }
            })
            .collect()
    }

    pub fn cache_len(&self) -> usize {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn clear_cache(&self) {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }
}

impl DistanceMatrixProvider for GeoMetrics {
    fn matrix_for(&self, locations: &[Coordinate]) -> DistanceMatrix {
        let n = locations.len();
        let mut matrix = DistanceMatrix::new(n);

        for (i, from) in locations.iter().enumerate() {
            for (j, to) in locations.iter().enumerate().skip(i + 1) {
                matrix.set_symmetric(i, j, self.distance(*from, *to));
            }
        }

        matrix
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coord(lat: f64, lng: f64) -> Coordinate {
        Coordinate::new(lat, lng).unwrap()
    }

    #[test]
    fn test_haversine_same_point() {
        let dist = haversine_km(coord(43.5297, 5.4474), coord(43.5297, 5.4474));
        assert!(dist < 0.001, "Same point should have ~0 distance");
    }

    #[test]
    fn test_haversine_known_distance() {
        // Paris (48.8566, 2.3522) to Lyon (45.7640, 4.8357)
        // Great-circle distance ~392 km
        let dist = haversine_km(coord(48.8566, 2.3522), coord(45.7640, 4.8357));
        assert!(dist > 380.0 && dist < 400.0, "Paris to Lyon should be ~392km, got {}", dist);
    }

    #[test]
    fn test_haversine_antipodes() {
        let dist = haversine_km(coord(0.0, 0.0), coord(0.0, 180.0));
        assert!((dist - std::f64::consts::PI * EARTH_RADIUS_KM).abs() < 1e-6);
    }

    #[test]
    fn test_distance_is_cached_symmetrically() {
        let geo = GeoMetrics::new();
        let a = coord(45.4642, 9.1900);
        let b = coord(45.4408, 12.3155);
        let ab = geo.distance(a, b);
        let ba = geo.distance(b, a);
        assert_eq!(ab, ba);
        assert_eq!(geo.cache_len(), 1);

        geo.clear_cache();
        assert_eq!(geo.cache_len(), 0);
    }

    #[test]
    fn test_detour_non_negative() {
        let geo = GeoMetrics::new();
        let start = coord(0.0, 0.0);
        let end = coord(0.0, 10.0);
        let on_route = geo.detour(coord(0.0, 5.0), start, end);
        let off_route = geo.detour(coord(2.0, 5.0), start, end);
        assert!(on_route.abs() < 1e-6);
        assert!(off_route > 0.0);
    }

    #[test]
    fn test_perpendicular_deviation_from_equator() {
        let geo = GeoMetrics::new();
        let start = coord(0.0, 0.0);
        let end = coord(0.0, 10.0);

        let on_line = geo.perpendicular_deviation(coord(0.0, 4.0), start, end);
        assert!(on_line < 1e-6);

        // One degree of latitude is ~111.2 km.
        let off_line = geo.perpendicular_deviation(coord(1.0, 5.0), start, end);
        assert!((off_line - 111.19).abs() < 0.5, "got {}", off_line);

        // Beyond the segment the infinite line still applies.
        let beyond = geo.perpendicular_deviation(coord(-1.0, 20.0), start, end);
        assert!((beyond - 111.19).abs() < 0.5, "got {}", beyond);
    }

    #[test]
    fn test_perpendicular_deviation_degenerate_line() {
        let geo = GeoMetrics::new();
        let here = coord(45.0, 7.0);
        let point = coord(46.0, 7.0);
        let dev = geo.perpendicular_deviation(point, here, here);
        assert!((dev - haversine_km(here, point)).abs() < 1e-9);
    }

    #[test]
    fn test_matrix_diagonal_is_zero() {
        let geo = GeoMetrics::new();
        let locations = vec![coord(45.0, 7.0), coord(45.5, 8.0), coord(46.0, 9.0)];
        let matrix = geo.matrix_for(&locations);

        for i in 0..locations.len() {
            assert_eq!(matrix.get(i, i), 0.0, "Diagonal should be zero");
        }
    }

    #[test]
    fn test_matrix_symmetric() {
        let geo = GeoMetrics::new();
        let locations = vec![coord(45.0, 7.0), coord(45.5, 8.0)];
        let matrix = geo.matrix_for(&locations);

        assert_eq!(matrix.get(0, 1), matrix.get(1, 0), "Matrix should be symmetric");
        assert_eq!(matrix.get(0, 1), geo.distance(locations[0], locations[1]));
    }

    #[test]
    fn test_corridor_filters_far_cities() {
        let geo = GeoMetrics::new();
        let start = City::new("Start", 0.0, 0.0).unwrap();
        let end = City::new("End", 0.0, 10.0).unwrap();
        let candidates = vec![
            City::new("Near", 0.5, 5.0).unwrap(),
            City::new("Far", 8.0, 5.0).unwrap(),
            City::new("StartTwin", 0.0, 0.0).unwrap(),
        ];

        let kept = geo.corridor(&candidates, &start, &end, 1.5);
        let names: Vec<_> = kept.iter().map(|city| city.name.as_str()).collect();
        assert_eq!(names, vec!["Near"]);
    }

    #[test]
    fn test_travel_hours() {
        // 140 km at 70 km/h = 2 hours
        assert!((travel_hours(140.0, 70.0) - 2.0).abs() < 1e-12);
    }
}
