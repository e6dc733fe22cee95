//! Walking the track description
//!
//! Each piece's centreline is computed in closed form from the pose at its start, so the only
//! accumulated state is the start pose of each piece.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use nalgebra::{Vector2, Vector3};
use track_if::track::{PieceDesc, PieceShape, TrackDesc};
use util::maths::lerp;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Pose of the centreline at some point along the track.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose2 {
    pub pos: Vector2<f64>,
    pub heading_rad: f64,
}

/// Centreline geometry at a point within a piece.
#[derive(Debug, Clone, Copy)]
pub struct PieceGeom {
    pub pt: Vector3<f64>,
    pub norm: Vector3<f64>,
    pub heading_rad: f64,
    pub half_width_m: f64,

    /// Rise of the surface per meter to the right
    pub cross_slope: f64,
}

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Unit vector pointing to the right of the given heading.
pub fn right_of(heading_rad: f64) -> Vector2<f64> {
    Vector2::new(heading_rad.sin(), -heading_rad.cos())
}

/// Pose at `dist_m` along a piece which starts at `start`.
pub fn pose_in_piece(shape: &PieceShape, start: &Pose2, dist_m: f64) -> Pose2 {
    match *shape {
        PieceShape::Straight { .. } => {
            let dir = Vector2::new(start.heading_rad.cos(), start.heading_rad.sin());
            Pose2 {
                pos: start.pos + dir * dist_m,
                heading_rad: start.heading_rad,
            }
        }
        PieceShape::Arc { radius_m, turn, .. } => {
            if radius_m <= 0.0 {
                return *start;
            }

            let sign = turn.sign();
            let centre = start.pos - right_of(start.heading_rad) * sign * radius_m;
            let heading_rad = start.heading_rad + sign * dist_m / radius_m;

            Pose2 {
                pos: centre + right_of(heading_rad) * sign * radius_m,
                heading_rad,
            }
        }
    }
}

/// Compute the start pose of every piece, plus the pose at the end of the last piece.
pub fn piece_starts(desc: &TrackDesc) -> (Vec<Pose2>, Pose2) {
    let mut pose = Pose2 {
        pos: Vector2::new(desc.start_x_m, desc.start_y_m),
        heading_rad: desc.start_heading_rad,
    };

    let mut starts = Vec::with_capacity(desc.pieces.len());
    for piece in &desc.pieces {
        starts.push(pose);
        pose = pose_in_piece(&piece.shape, &pose, piece.shape.length_m());
    }

    (starts, pose)
}

/// Full geometry of the centreline at `frac` of the way through a piece.
pub fn piece_geom(piece: &PieceDesc, start: &Pose2, frac: f64) -> PieceGeom {
    let pose = pose_in_piece(&piece.shape, start, frac * piece.shape.length_m());

    let width = lerp(piece.width_start_m, piece.width_end_m, frac).max(0.0);
    let h_left = lerp(piece.heights.start_left_m, piece.heights.end_left_m, frac);
    let h_right = lerp(piece.heights.start_right_m, piece.heights.end_right_m, frac);

    let cross_slope = if width > 0.0 {
        (h_right - h_left) / width
    } else {
        0.0
    };

    let right = right_of(pose.heading_rad);

    PieceGeom {
        pt: Vector3::new(pose.pos.x, pose.pos.y, 0.5 * (h_left + h_right)),
        norm: Vector3::new(right.x, right.y, cross_slope),
        heading_rad: pose.heading_rad,
        half_width_m: 0.5 * width,
        cross_slope,
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use std::f64::consts::PI;
    use track_if::track::{EdgeHeights, Turn};

    #[test]
    fn test_oval_closes() {
        let desc = TrackDesc::oval(100.0, 30.0, 10.0, Turn::Right);
        let (starts, end) = piece_starts(&desc);

        assert_eq!(starts.len(), 4);
        assert!((end.pos - starts[0].pos).norm() < 1e-9);

        // A right hand oval starting along +X is below the start line
        assert!((starts[2].pos - Vector2::new(100.0, -60.0)).norm() < 1e-9);
        assert!((starts[2].heading_rad + PI).abs() < 1e-12);
    }

    #[test]
    fn test_arc_geometry() {
        let start = Pose2 {
            pos: Vector2::zeros(),
            heading_rad: 0.0,
        };
        let left = PieceShape::Arc {
            radius_m: 10.0,
            angle_rad: PI,
            turn: Turn::Left,
        };

        let quarter = pose_in_piece(&left, &start, 0.5 * PI * 10.0);
        assert!((quarter.pos - Vector2::new(10.0, 10.0)).norm() < 1e-9);
        assert!((quarter.heading_rad - 0.5 * PI).abs() < 1e-12);
    }

    #[test]
    fn test_banked_piece() {
        let mut piece = PieceDesc::plain(PieceShape::Straight { length_m: 50.0 }, 10.0);
        piece.heights = EdgeHeights {
            start_left_m: 0.0,
            start_right_m: 1.0,
            end_left_m: 2.0,
            end_right_m: 3.0,
        };
        let start = Pose2 {
            pos: Vector2::zeros(),
            heading_rad: 0.0,
        };

        let geom = piece_geom(&piece, &start, 0.5);
        assert!((geom.pt - Vector3::new(25.0, 0.0, 1.5)).norm() < 1e-12);
        assert!((geom.cross_slope - 0.1).abs() < 1e-12);

        // The edges of the main surface sit at the given heights
        let right_edge = geom.pt + geom.norm * geom.half_width_m;
        let left_edge = geom.pt - geom.norm * geom.half_width_m;
        assert!((right_edge.z - 2.0).abs() < 1e-12);
        assert!((left_edge.z - 1.0).abs() < 1e-12);
        assert!((right_edge.y + 5.0).abs() < 1e-12);
    }
}
