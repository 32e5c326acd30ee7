//! Real European cities for route planning fixtures.
//!
//! Coordinates are city-centre positions rounded to four decimals.

use std::collections::HashMap;

use road_trip_planner::{City, ScoreMap};

/// A named place with coordinates and a few descriptive tags.
#[derive(Debug, Clone, Copy)]
pub struct Place {
    pub name: &'static str,
    pub lat: f64,
    pub lng: f64,
    pub tags: &'static [&'static str],
}

impl Place {
    pub const fn new(name: &'static str, lat: f64, lng: f64, tags: &'static [&'static str]) -> Self {
        Self { name, lat, lng, tags }
    }

    pub fn city(&self) -> City {
        City::new(self.name, self.lat, self.lng)
            .expect("fixture coordinates are valid")
            .with_tags(self.tags.iter().copied())
    }
}

pub const AIX_EN_PROVENCE: Place = Place::new("Aix-en-Provence", 43.5297, 5.4474, &["historic", "culture"]);
pub const VENICE: Place = Place::new("Venice", 45.4408, 12.3155, &["historic", "waterfront"]);
pub const MARSEILLE: Place = Place::new("Marseille", 43.2965, 5.3698, &["port", "food"]);
pub const PARIS: Place = Place::new("Paris", 48.8566, 2.3522, &["culture", "food"]);
pub const BERLIN: Place = Place::new("Berlin", 52.5200, 13.4050, &["culture", "nightlife"]);

// ============================================================================
// Provence to the Veneto
// ============================================================================

pub const NORTHERN_ITALY: &[Place] = &[
    Place::new("Nice", 43.7102, 7.2620, &["coastal", "food"]),
    Place::new("Lyon", 45.7640, 4.8357, &["food", "culture"]),
    Place::new("Milan", 45.4642, 9.1900, &["fashion", "culture"]),
    Place::new("Turin", 45.0703, 7.6869, &["food", "historic"]),
    Place::new("Genoa", 44.4056, 8.9463, &["coastal", "historic"]),
];

// ============================================================================
// Between Paris and Berlin
// ============================================================================

pub const RHINELAND: &[Place] = &[
    Place::new("Reims", 49.2583, 4.0317, &["wine", "historic"]),
    Place::new("Luxembourg", 49.6116, 6.1319, &["finance", "historic"]),
    Place::new("Brussels", 50.8503, 4.3517, &["food", "culture"]),
    Place::new("Cologne", 50.9375, 6.9603, &["historic", "nightlife"]),
    Place::new("Frankfurt", 50.1109, 8.6821, &["finance", "culture"]),
    Place::new("Kassel", 51.3127, 9.4797, &["art"]),
    Place::new("Hanover", 52.3759, 9.7320, &["trade"]),
    Place::new("Leipzig", 51.3397, 12.3731, &["music", "historic"]),
    Place::new("Strasbourg", 48.5734, 7.7521, &["historic", "food"]),
    Place::new("Metz", 49.1193, 6.1757, &["historic"]),
    Place::new("Dortmund", 51.5136, 7.4653, &["sport"]),
    Place::new("Erfurt", 50.9848, 11.0299, &["historic"]),
    Place::new("Magdeburg", 52.1205, 11.6276, &["historic"]),
    Place::new("Wurzburg", 49.7913, 9.9534, &["wine", "historic"]),
    Place::new("Nuremberg", 49.4521, 11.0767, &["historic", "food"]),
    Place::new("Amsterdam", 52.3676, 4.9041, &["canals", "culture"]),
    Place::new("Munich", 48.1351, 11.5820, &["beer", "culture"]),
    Place::new("Hamburg", 53.5511, 9.9937, &["port", "nightlife"]),
];

pub fn cities(places: &[Place]) -> Vec<City> {
    places.iter().map(Place::city).collect()
}

/// Scores keyed by city name.
pub fn scores(entries: &[(&str, f64)]) -> ScoreMap {
    entries
        .iter()
        .map(|&(name, score)| (name.to_string(), score))
        .collect::<HashMap<_, _>>()
}

/// A synthetic pool of `count` towns scattered along a straight corridor.
pub fn corridor(count: usize) -> (City, City, Vec<City>) {
    let start = City::new("West End", 46.0, 0.0).expect("valid");
    let end = City::new("East End", 46.0, 18.0).expect("valid");
    let towns = (0..count)
        .map(|i| {
            let lng = 0.6 + 16.8 * i as f64 / count as f64;
            let lat = 46.0 + ((i * 7) % 5) as f64 * 0.25 - 0.5;
            City::new(format!("Town {i:02}"), lat, lng)
                .expect("valid")
                .with_tag(format!("kind-{}", i % 5))
        })
        .collect();
    (start, end, towns)
}
