//! Fixtures shared by the unit tests

use std::sync::Arc;

use track_if::track::{EdgeHeights, PieceDesc, PieceShape, TrackDesc, Turn};

use crate::car::PointMassCar;
use crate::context::RunContext;
use crate::track::{SegmentParams, Track};

/// Straight length giving a 1000 m oval with 50 m radius ends.
pub const OVAL_STRAIGHT_M: f64 = 342.92;

/// 1000 m oval, 12 m wide, with two 180 degree ends of radius 50 m.
pub fn oval_track(turn: Turn) -> Track {
    Track::segment(
        TrackDesc::oval(OVAL_STRAIGHT_M, 50.0, 12.0, turn),
        SegmentParams::default(),
        &mut RunContext::new("test"),
    )
    .unwrap()
}

/// Shared version of `oval_track`.
pub fn oval_arc(turn: Turn) -> Arc<Track> {
    Arc::new(oval_track(turn))
}

/// The 1000 m oval with a 3 m high crest just before the first bend. Each ramp is 30 m long.
pub fn crest_oval_arc(turn: Turn) -> Arc<Track> {
    let mut desc = TrackDesc::oval(OVAL_STRAIGHT_M, 50.0, 12.0, turn);

    let piece = |length_m: f64, start_m: f64, end_m: f64| PieceDesc {
        heights: EdgeHeights {
            start_left_m: start_m,
            start_right_m: start_m,
            end_left_m: end_m,
            end_right_m: end_m,
        },
        ..PieceDesc::plain(PieceShape::Straight { length_m }, 12.0)
    };
    let rest = desc.pieces.split_off(1);
    desc.pieces = vec![
        piece(OVAL_STRAIGHT_M - 60.0, 0.0, 0.0),
        piece(30.0, 0.0, 3.0),
        piece(30.0, 3.0, 0.0),
    ];
    desc.pieces.extend(rest);

    Arc::new(
        Track::segment(desc, SegmentParams::default(), &mut RunContext::new("test")).unwrap(),
    )
}

/// Circle of the given radius, 10 m wide, sampled every `spacing_m`.
pub fn circle_arc(radius_m: f64, spacing_m: f64, turn: Turn) -> Arc<Track> {
    Arc::new(
        Track::segment(
            TrackDesc::circle(radius_m, 10.0, turn),
            SegmentParams {
                spacing_m,
                ..SegmentParams::default()
            },
            &mut RunContext::new("test"),
        )
        .unwrap(),
    )
}

/// Small, coarsely sampled oval for tests which run many optimisations.
pub fn small_oval_arc() -> Arc<Track> {
    Arc::new(
        Track::segment(
            TrackDesc::oval(60.0, 25.0, 10.0, Turn::Left),
            SegmentParams {
                spacing_m: 8.0,
                ..SegmentParams::default()
            },
            &mut RunContext::new("test"),
        )
        .unwrap(),
    )
}

/// The 2 m wide reference car.
pub fn test_car() -> PointMassCar {
    PointMassCar::default()
}
