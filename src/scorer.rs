//! Great-circle distance and proximity score for a single guess.

use serde::Serialize;

use crate::coordinate::Coordinate;

/// Mean Earth radius.
pub const EARTH_RADIUS_KM: f64 = 6371.0;
pub const MAX_SCORE: u32 = 5000;
/// Guesses closer than this count as a perfect hit.
pub const PERFECT_HIT_KM: f64 = 0.05;
/// e-folding distance of the score decay.
pub const DECAY_KM: f64 = 10.0;

/// Outcome of a submitted guess. Fields are read-only once built.
#[derive(Serialize, Debug, Clone, Copy, PartialEq)]
pub struct RoundResult {
    distance_km: f64,
    score: u32,
}

impl RoundResult {
    pub fn distance_km(&self) -> f64 {
        self.distance_km
    }

    pub fn score(&self) -> u32 {
        self.score
    }
}

/// Haversine distance between two coordinates, in kilometres.
pub fn compute_distance_km(reference: Coordinate, guess: Coordinate) -> f64 {
    let lat0 = reference.lat().to_radians();
    let lat1 = guess.lat().to_radians();
    let d_lat = (guess.lat() - reference.lat()).to_radians();
    let d_lon = (guess.lon() - reference.lon()).to_radians();

    let a = (d_lat / 2.0).sin().powi(2) + lat0.cos() * lat1.cos() * (d_lon / 2.0).sin().powi(2);
    // rounding can push a just past 1 near antipodes
    let a = a.clamp(0.0, 1.0);
    let central_angle = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * central_angle
}

pub fn compute_score(distance_km: f64) -> u32 {
    if distance_km < PERFECT_HIT_KM {
        return MAX_SCORE;
    }
    let raw = (MAX_SCORE as f64 * (-distance_km / DECAY_KM).exp()).floor();
    raw.clamp(0.0, MAX_SCORE as f64) as u32
}

pub fn score_guess(reference: Coordinate, guess: Coordinate) -> RoundResult {
    let distance_km = compute_distance_km(reference, guess);
    RoundResult {
        distance_km,
        score: compute_score(distance_km),
    }
}
