//! # Track description
//!
//! A track is described as a closed loop of pieces, each of which is either a straight or a
//! constant-radius arc. Each piece carries its width, the heights of its left and right edges
//! at its start and end (which give both the slope and the banking), the surface of the main
//! racing area, and the strips ("sides") which border it on the left and right.
//!
//! ```text
//!  LEFT                                                RIGHT
//!  wall ┃ side n ┃ .. ┃ side 0 ┃   main surface   ┃ side 0 ┃ .. ┃ side n ┃ wall
//!       ┃        ┃    ┃        ┃◄─── width_m ────►┃        ┃    ┃        ┃
//! ```
//!
//! Distances to walls are measured outwards from the edge of the main surface.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A full track description.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackDesc {
    /// Human readable name of the track
    pub name: String,

    /// X position of the start of the first piece
    #[serde(default)]
    pub start_x_m: f64,

    /// Y position of the start of the first piece
    #[serde(default)]
    pub start_y_m: f64,

    /// Heading of the start of the first piece, relative to the +ve X axis
    #[serde(default)]
    pub start_heading_rad: f64,

    /// The pieces making up the loop, in driving order
    pub pieces: Vec<PieceDesc>,
}

/// A single piece of track.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PieceDesc {
    /// The shape of the piece's centreline
    pub shape: PieceShape,

    /// Width of the main surface at the start of the piece
    pub width_start_m: f64,

    /// Width of the main surface at the end of the piece
    pub width_end_m: f64,

    /// Heights of the edges of the main surface
    #[serde(default)]
    pub heights: EdgeHeights,

    /// Surface of the main racing area
    #[serde(default)]
    pub surface: SurfaceDesc,

    /// Side strips on the left, innermost first
    #[serde(default)]
    pub left_sides: Vec<SideDesc>,

    /// Side strips on the right, innermost first
    #[serde(default)]
    pub right_sides: Vec<SideDesc>,

    /// Distance from the left edge of the main surface to the left wall, if there is one
    #[serde(default)]
    pub left_wall_m: Option<f64>,

    /// Distance from the right edge of the main surface to the right wall, if there is one
    #[serde(default)]
    pub right_wall_m: Option<f64>,
}

/// Heights of the edges of the main surface at the start and end of a piece.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct EdgeHeights {
    pub start_left_m: f64,
    pub start_right_m: f64,
    pub end_left_m: f64,
    pub end_right_m: f64,
}

/// Properties of a driving surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurfaceDesc {
    /// Friction coefficient relative to a nominal tyre
    pub friction: f64,

    /// Rolling resistance coefficient
    pub rolling_resistance: f64,

    /// Amplitude of surface roughness
    pub roughness: f64,
}

/// A strip bordering the main surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SideDesc {
    /// Width of the strip at the start of the piece
    pub width_start_m: f64,

    /// Width of the strip at the end of the piece
    pub width_end_m: f64,

    /// Surface of the strip
    pub surface: SurfaceDesc,

    /// What kind of strip this is
    pub kind: SideKind,

    /// Rise of the strip per meter, measured outwards from the track
    #[serde(default)]
    pub slope: f64,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Shape of a piece's centreline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PieceShape {
    /// A straight of the given length
    Straight { length_m: f64 },

    /// A constant radius arc, turning through `angle_rad` (always positive) in the direction
    /// given by `turn`.
    Arc {
        radius_m: f64,
        angle_rad: f64,
        turn: Turn,
    },
}

/// Direction of a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Turn {
    Left,
    Right,
}

/// The kind of a side strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SideKind {
    Tarmac,
    Grass,
    Gravel,

    /// A curb. Raised curbs upset the car and are excluded from the racing area unless
    /// explicitly permitted.
    Curb { raised: bool },
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for SurfaceDesc {
    fn default() -> Self {
        Self {
            friction: 1.0,
            rolling_resistance: 0.001,
            roughness: 0.0,
        }
    }
}

impl Turn {
    /// The sign of the curvature of a turn in this direction, positive being left.
    pub fn sign(&self) -> f64 {
        match self {
            Turn::Left => 1.0,
            Turn::Right => -1.0,
        }
    }
}

impl PieceShape {
    /// Length of the centreline of this shape.
    pub fn length_m(&self) -> f64 {
        match *self {
            PieceShape::Straight { length_m } => length_m,
            PieceShape::Arc {
                radius_m,
                angle_rad,
                ..
            } => radius_m * angle_rad,
        }
    }

    /// Signed curvature of the centreline, positive being left.
    pub fn curvature_m(&self) -> f64 {
        match *self {
            PieceShape::Straight { .. } => 0.0,
            PieceShape::Arc { radius_m, turn, .. } => {
                if radius_m > 0.0 {
                    turn.sign() / radius_m
                } else {
                    0.0
                }
            }
        }
    }
}

impl PieceDesc {
    /// A flat piece with a plain main surface, no sides and no walls.
    pub fn plain(shape: PieceShape, width_m: f64) -> Self {
        Self {
            shape,
            width_start_m: width_m,
            width_end_m: width_m,
            heights: EdgeHeights::default(),
            surface: SurfaceDesc::default(),
            left_sides: Vec::new(),
            right_sides: Vec::new(),
            left_wall_m: None,
            right_wall_m: None,
        }
    }
}

impl TrackDesc {
    /// Build a flat oval made of two straights joined by two half circles, driven in the
    /// given direction.
    pub fn oval(straight_m: f64, radius_m: f64, width_m: f64, turn: Turn) -> Self {
        let straight = PieceDesc::plain(
            PieceShape::Straight {
                length_m: straight_m,
            },
            width_m,
        );
        let bend = PieceDesc::plain(
            PieceShape::Arc {
                radius_m,
                angle_rad: std::f64::consts::PI,
                turn,
            },
            width_m,
        );

        Self {
            name: format!("oval_{:.0}_{:.0}", straight_m, radius_m),
            start_x_m: 0.0,
            start_y_m: 0.0,
            start_heading_rad: 0.0,
            pieces: vec![straight.clone(), bend.clone(), straight, bend],
        }
    }

    /// Build a flat circular track, which is the degenerate case of a single bend that never
    /// ends.
    pub fn circle(radius_m: f64, width_m: f64, turn: Turn) -> Self {
        let half = PieceDesc::plain(
            PieceShape::Arc {
                radius_m,
                angle_rad: std::f64::consts::PI,
                turn,
            },
            width_m,
        );

        Self {
            name: format!("circle_{:.0}", radius_m),
            start_x_m: 0.0,
            start_y_m: 0.0,
            start_heading_rad: 0.0,
            pieces: vec![half.clone(), half],
        }
    }

    /// Total length of the track centreline.
    pub fn length_m(&self) -> f64 {
        self.pieces.iter().map(|p| p.shape.length_m()).sum()
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
