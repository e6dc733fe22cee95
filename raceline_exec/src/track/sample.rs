//! Track sample definitions

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use nalgebra::Vector3;
use serde::Serialize;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A single fixed-spacing slice of the track.
#[derive(Debug, Clone, Serialize)]
pub struct TrackSample {
    /// Distance along the centreline from the start of the track
    pub dist_m: f64,

    /// Reference point on the centreline
    pub pt: Vector3<f64>,

    /// Lateral axis, pointing to the right. The XY part is a unit vector and the Z part is the
    /// cross slope, so that `pt + norm * offset` lies on the surface.
    pub norm: Vector3<f64>,

    /// Heading of the centreline relative to the +ve X axis
    pub heading_rad: f64,

    /// Half width of the main surface
    pub half_width_m: f64,

    /// Raceable distance from the centreline to the left edge
    pub width_left_m: f64,

    /// Raceable distance from the centreline to the right edge
    pub width_right_m: f64,

    /// Physical distance from the centreline to the left boundary
    pub extent_left_m: f64,

    /// Physical distance from the centreline to the right boundary
    pub extent_right_m: f64,

    /// Why the left raceable edge is where it is
    pub clip_left: EdgeClip,

    /// Why the right raceable edge is where it is
    pub clip_right: EdgeClip,

    /// Index of the bend this sample lies in, if any
    pub bend: Option<usize>,

    /// Index of the track piece this sample lies in
    pub piece: usize,

    /// Fraction of the way through the piece
    pub piece_frac: f64,

    /// Friction of the main surface
    pub friction: f64,
}

/// A maximal run of samples turning in the same direction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bend {
    /// First sample in the bend
    pub start: usize,

    /// Last sample in the bend (inclusive, may be less than `start` if the bend crosses the
    /// start line)
    pub end: usize,

    /// Sign of the curvature of the bend, +1 for left, -1 for right
    pub sign: f64,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// The reason a raceable edge was placed where it is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EdgeClip {
    /// Every side strip is usable
    Open,

    /// A side strip's surface was unsuitable
    Surface,

    /// A raised curb
    Curb,

    /// The safety margin to a wall
    Wall,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl TrackSample {
    /// Point at the given lateral offset from the centreline.
    pub fn point_at(&self, offset_m: f64) -> Vector3<f64> {
        self.pt + self.norm * offset_m
    }
}

impl Bend {
    /// Number of samples in the bend.
    pub fn len(&self, num_samples: usize) -> usize {
        if self.end >= self.start {
            self.end - self.start + 1
        } else {
            num_samples - self.start + self.end + 1
        }
    }

    /// Index of the sample halfway through the bend.
    pub fn mid(&self, num_samples: usize) -> usize {
        if num_samples == 0 {
            return 0;
        }
        (self.start + self.len(num_samples) / 2) % num_samples
    }
}
