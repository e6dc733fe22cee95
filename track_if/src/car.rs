//! # Vehicle model interface
//!
//! The racing line solver treats the vehicle's physics as a black box which maps the local
//! shape of the path, the grip of the surface and the attitude of the track onto speed limits.
//! Implementations must be pure, any state they depend on (mass, fuel, aero) is fixed for the
//! duration of a call.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// The curvature triplet describing the shape of the path at a point.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Curvatures {
    /// Planar curvature in 1/meters, positive to the left.
    pub k: f64,

    /// Bump curvature, based on height changes along the path.
    pub kz: f64,

    /// Vertical curvature relative to the local track plane.
    pub kv: f64,
}

/// Conditions of the track surface under the car.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackConditions {
    /// Friction coefficient of the surface
    pub friction: f64,

    /// Roll angle of the track, positive when the right side of the track is higher than the
    /// left.
    pub roll_rad: f64,

    /// Pitch angle of the track, positive uphill.
    pub pitch_rad: f64,
}

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// A vehicle physics model.
pub trait CarModel {
    /// Overall width of the car in meters.
    fn width_m(&self) -> f64;

    /// Maximum speed at which the car can hold a path with the given shape, in m/s.
    fn max_speed(&self, curv: Curvatures, cond: TrackConditions) -> f64;

    /// The highest speed at which the car can start an interval of length `dist_m` and still
    /// slow to `target_speed_ms` by the end of it.
    ///
    /// `from` describes the path at the start of the interval, `to` at the end.
    fn braking(
        &self,
        from: Curvatures,
        to: Curvatures,
        target_speed_ms: f64,
        dist_m: f64,
        cond: TrackConditions,
    ) -> f64;

    /// The highest speed the car can reach at the end of an interval of length `dist_m` having
    /// started it at `start_speed_ms`.
    fn acceleration(
        &self,
        from: Curvatures,
        to: Curvatures,
        start_speed_ms: f64,
        dist_m: f64,
        cond: TrackConditions,
    ) -> f64;
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Curvatures {
    pub fn new(k: f64, kz: f64, kv: f64) -> Self {
        Self { k, kz, kv }
    }
}

impl TrackConditions {
    /// Flat, level track with the given friction.
    pub fn flat(friction: f64) -> Self {
        Self {
            friction,
            roll_rad: 0.0,
            pitch_rad: 0.0,
        }
    }
}
