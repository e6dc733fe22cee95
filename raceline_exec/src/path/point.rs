//! Path point definition

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use nalgebra::Vector3;
use serde::Serialize;
use track_if::car::Curvatures;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// The state of the path at one track sample.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathPoint {
    /// Lateral offset from the sample's centreline point, +ve to the right
    pub offset_m: f64,

    /// The point on the track surface at the offset
    pub pt: Vector3<f64>,

    /// Planar curvature, +ve to the left
    pub k: f64,

    /// Bump curvature from height changes along the path
    pub kz: f64,

    /// Curvature in the vertical plane relative to the track surface
    pub kv: f64,

    /// Curvature in the plane of the track surface
    pub kh: f64,

    /// Pitch of the path, +ve uphill
    pub pitch_rad: f64,

    /// Roll of the track, +ve when the right side is higher
    pub roll_rad: f64,

    /// Highest speed the car can take this point at
    pub max_spd_ms: f64,

    /// Speed after braking has been accounted for
    pub spd_ms: f64,

    /// Speed after both braking and acceleration have been accounted for
    pub acc_spd_ms: f64,

    /// Estimated ride height above the surface
    pub h_m: f64,

    /// Extra distance to keep from the left edge
    pub left_buf_m: f64,

    /// Extra distance to keep from the right edge
    pub right_buf_m: f64,

    /// Fixed points are never moved by the optimisers
    pub fixed: bool,

    /// Mean absolute curvature over the path ahead
    pub fwd_k: f64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl PathPoint {
    /// A point at the given position with everything else zeroed.
    pub fn new(offset_m: f64, pt: Vector3<f64>) -> Self {
        Self {
            offset_m,
            pt,
            k: 0.0,
            kz: 0.0,
            kv: 0.0,
            kh: 0.0,
            pitch_rad: 0.0,
            roll_rad: 0.0,
            max_spd_ms: 0.0,
            spd_ms: 0.0,
            acc_spd_ms: 0.0,
            h_m: 0.0,
            left_buf_m: 0.0,
            right_buf_m: 0.0,
            fixed: false,
            fwd_k: 0.0,
        }
    }

    /// The curvature triplet passed to the car model.
    pub fn curvatures(&self) -> Curvatures {
        Curvatures::new(self.k, self.kz, self.kv)
    }
}
