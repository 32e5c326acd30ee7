//! Test fixtures for road-trip-planner.
//!
//! Provides realistic European city data with real coordinates and
//! helpers for turning them into candidate pools.

#![allow(dead_code)]

pub mod european_cities;

pub use european_cities::*;
