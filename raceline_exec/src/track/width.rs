//! Raceable width calculation
//!
//! The raceable edge on each side is found by walking outwards over the side strips from the
//! edge of the main surface, stopping at the first strip that isn't fit to race on. Walls then
//! limit the result to a safe distance from the barrier.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use track_if::track::{PieceDesc, SideDesc, SideKind};
use util::maths::lerp;

use super::{EdgeClip, SegmentParams};
use crate::ring::Ring;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Raceable and physical width on one side of a sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SideWidth {
    /// Distance from the centreline to the raceable edge
    pub usable_m: f64,

    /// Distance from the centreline to the physical boundary
    pub extent_m: f64,

    /// Reason for the raceable edge
    pub clip: EdgeClip,
}

/// Which side of the track is being measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Compute the raceable width on one side of the track.
///
/// - `frac`: fraction of the way through the piece.
/// - `cross_slope`: rise of the main surface per meter to the right.
/// - `curb_permitted`: whether raised curbs on this side may be raced over.
pub fn side_width(
    piece: &PieceDesc,
    side: Side,
    frac: f64,
    cross_slope: f64,
    curb_permitted: bool,
    params: &SegmentParams,
) -> SideWidth {
    let half = 0.5 * lerp(piece.width_start_m, piece.width_end_m, frac).max(0.0);

    let (strips, wall) = match side {
        Side::Left => (&piece.left_sides, piece.left_wall_m),
        Side::Right => (&piece.right_sides, piece.right_wall_m),
    };

    // Rise of the main surface per meter, measured outwards
    let outward_slope = match side {
        Side::Left => -cross_slope,
        Side::Right => cross_slope,
    };

    let mut usable = half;
    let mut extent = half;
    let mut clip = EdgeClip::Open;

    for strip in strips {
        let w = strip_width(strip, frac);

        if clip == EdgeClip::Open {
            match reject_strip(piece, strip, outward_slope, curb_permitted, params) {
                Some(reason) => clip = reason,
                None => usable += w,
            }
        }

        extent += w;
    }

    if let Some(wall_m) = wall {
        extent = half + wall_m.max(0.0);

        let safe = (extent - params.wall_margin_m).max(0.0);
        if safe < usable {
            usable = safe;
            clip = EdgeClip::Wall;
        }
    }

    SideWidth {
        usable_m: usable.min(extent),
        extent_m: extent,
        clip,
    }
}

/// Width of a strip at the given fraction of the way through the piece.
pub fn strip_width(strip: &SideDesc, frac: f64) -> f64 {
    lerp(strip.width_start_m, strip.width_end_m, frac).max(0.0)
}

/// Limit the change in width between neighbouring samples to `max_step_m`.
///
/// Widths are only ever reduced. Two passes are made in each direction so that the limit holds
/// across the start line.
pub fn relax_widths(widths: &mut [f64], max_step_m: f64) {
    let ring = Ring::new(widths.len());

    for j in 0..2 * ring.len() {
        let i = j % ring.len();
        let limit = widths[ring.prev(i)] + max_step_m;
        if widths[i] > limit {
            widths[i] = limit;
        }
    }

    for j in (0..2 * ring.len()).rev() {
        let i = j % ring.len();
        let limit = widths[ring.next(i)] + max_step_m;
        if widths[i] > limit {
            widths[i] = limit;
        }
    }
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Check whether a strip is fit to race on, returning the reason if it isn't.
fn reject_strip(
    piece: &PieceDesc,
    strip: &SideDesc,
    outward_slope: f64,
    curb_permitted: bool,
    params: &SegmentParams,
) -> Option<EdgeClip> {
    if let SideKind::Curb { raised } = strip.kind {
        if curb_permitted {
            return None;
        }
        if raised && params.exclude_raised_curbs {
            return Some(EdgeClip::Curb);
        }
    }

    let main = &piece.surface;
    let friction_ratio = if main.friction > 0.0 {
        strip.surface.friction / main.friction
    } else {
        1.0
    };

    if friction_ratio < params.min_friction_ratio
        || strip.surface.rolling_resistance > params.max_rolling_resistance
        || strip.surface.roughness > params.max_roughness
        || (strip.slope - outward_slope).abs() > params.max_slope_mismatch
    {
        return Some(EdgeClip::Surface);
    }

    None
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
