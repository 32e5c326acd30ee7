mod fixtures;

use road_trip_planner::haversine::haversine_km;
use road_trip_planner::{OptimizationConfig, OptimizationController, OptimizationMethod, ScoreMap};

use fixtures::{AIX_EN_PROVENCE, NORTHERN_ITALY, VENICE, cities};

fn uniform_scores(names: &[&str], score: f64) -> ScoreMap {
    names.iter().map(|name| (name.to_string(), score)).collect()
}

#[test]
fn smoke_provence_to_venice() {
    let start = AIX_EN_PROVENCE.city();
    let end = VENICE.city();
    let candidates = cities(NORTHERN_ITALY);
    let names: Vec<&str> = NORTHERN_ITALY.iter().map(|place| place.name).collect();
    let scores = uniform_scores(&names, 0.8);

    let controller = OptimizationController::new(OptimizationConfig::default().with_seed(2024)).unwrap();
    let route = controller.optimize(&start, &end, &candidates, 3, &scores);

    assert!(!route.cities.is_empty());
    assert!(route.cities.len() <= 3);
    assert!(route.performance_metrics.detour_ratio <= 1.3, "{:?}", route.performance_metrics);

    let first = route.cities.first().unwrap();
    let last = route.cities.last().unwrap();
    for city in &route.cities {
        assert!(haversine_km(start.coordinates, first.coordinates) <= haversine_km(start.coordinates, city.coordinates));
        assert!(haversine_km(end.coordinates, last.coordinates) <= haversine_km(end.coordinates, city.coordinates));
    }

    // Five candidates: exact enumeration runs and nothing beats it.
    let exact = route
        .strategy_reports
        .iter()
        .find(|report| report.method == OptimizationMethod::ExactEnumeration)
        .and_then(|report| report.score)
        .unwrap();
    for report in &route.strategy_reports {
        if let Some(score) = report.score {
            assert!(score <= exact + 1e-12, "{report:?}");
        }
    }
    assert_eq!(route.strategy_reports.len(), 4);
}

#[test]
fn smoke_empty_pool() {
    let start = AIX_EN_PROVENCE.city();
    let end = VENICE.city();

    let route = OptimizationController::default().optimize(&start, &end, &[], 3, &ScoreMap::new());

    assert_eq!(route.optimization_method, "no_candidates");
    assert!(route.cities.is_empty());
    let direct = haversine_km(start.coordinates, end.coordinates);
    assert!((route.total_distance_km - direct).abs() < 1e-9);
    assert_eq!(route.segments.len(), 1);
    assert!(route.strategy_reports.is_empty());
    assert_eq!(route.seed, None);
}

#[test]
fn smoke_pool_smaller_than_budget() {
    let start = AIX_EN_PROVENCE.city();
    let end = VENICE.city();
    let candidates = cities(&[NORTHERN_ITALY[3], NORTHERN_ITALY[2]]);

    let route = OptimizationController::default().optimize(&start, &end, &candidates, 5, &ScoreMap::new());

    assert_eq!(route.optimization_method, "simple_ordering");
    assert_eq!(route.city_names(), vec!["Turin", "Milan"]);
    assert!(route.dropped_cities.is_empty());
}
