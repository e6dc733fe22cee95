//! # Track segmentation
//!
//! The track description is converted once, at load, into `N` samples of equal arc length. Each
//! sample carries the centreline point, the lateral axis (whose Z component is the cross slope),
//! the raceable and physical widths on each side, and the bend it belongs to.
//!
//! Segmentation proceeds as:
//!
//! 1. Walk the pieces to find each piece's start pose.
//! 2. For each sample find the enclosing piece and compute its geometry in closed form.
//! 3. Split the loop into bends using the sign of the piece curvature.
//! 4. Compute the raceable widths, then relax them so they change gradually.
//!
//! The resulting `Track` is immutable and is shared between paths with an `Arc`.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod bends;
mod build;
mod sample;
mod width;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use track_if::track::TrackDesc;
use util::maths::{rem_euclid, sign_or_zero};

use crate::context::RunContext;
use crate::ring::Ring;

pub use bends::find_bends;
pub use build::{piece_geom, piece_starts, pose_in_piece, right_of, Pose2};
pub use sample::{Bend, EdgeClip, TrackSample};
pub use width::{relax_widths, side_width, strip_width, Side, SideWidth};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Fewest samples a track may be split into.
pub const MIN_SAMPLES: usize = 8;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Parameters controlling segmentation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentParams {
    /// Nominal spacing between samples
    pub spacing_m: f64,

    /// Lowest ratio of side strip friction to main surface friction which is raceable
    pub min_friction_ratio: f64,

    /// Highest rolling resistance which is raceable
    pub max_rolling_resistance: f64,

    /// Highest surface roughness which is raceable
    pub max_roughness: f64,

    /// Largest difference between a strip's slope and the main surface's slope which is
    /// raceable
    pub max_slope_mismatch: f64,

    /// Distance to keep from walls
    pub wall_margin_m: f64,

    /// Largest change in raceable width between neighbouring samples
    pub max_width_step_m: f64,

    /// Whether raised curbs are excluded from the raceable width
    pub exclude_raised_curbs: bool,

    /// Bends whose inside curb may be raced over
    pub inside_curb_bends: Vec<usize>,

    /// Largest gap between the end and the start of the loop before a warning is raised
    pub closure_tolerance_m: f64,
}

/// The segmented track.
#[derive(Debug, Clone)]
pub struct Track {
    /// Name of the track
    pub name: String,

    /// The samples making up the loop
    pub samples: Vec<TrackSample>,

    /// The bends in the loop, in order from the start line
    pub bends: Vec<Bend>,

    /// Total centreline length
    pub length_m: f64,

    /// Spacing between samples
    pub delta_m: f64,

    /// Parameters used for the segmentation
    pub params: SegmentParams,

    desc: TrackDesc,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Errors which can occur during segmentation.
#[derive(Debug, thiserror::Error)]
pub enum TrackError {
    #[error("The track description contains no pieces")]
    NoPieces,

    #[error("Piece {0} has an invalid length ({1} m)")]
    InvalidPieceLength(usize, f64),

    #[error("Invalid sample spacing ({0} m)")]
    InvalidSpacing(f64),

    #[error("The track is too short ({length_m} m) to be split into samples of {spacing_m} m")]
    TooShort { length_m: f64, spacing_m: f64 },
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for SegmentParams {
    fn default() -> Self {
        Self {
            spacing_m: 3.0,
            min_friction_ratio: 0.9,
            max_rolling_resistance: 0.01,
            max_roughness: 0.02,
            max_slope_mismatch: 0.1,
            wall_margin_m: 0.5,
            max_width_step_m: 1.0,
            exclude_raised_curbs: true,
            inside_curb_bends: Vec::new(),
            closure_tolerance_m: 1.0,
        }
    }
}

impl Track {
    /// Segment the given track description.
    pub fn segment(
        desc: TrackDesc,
        params: SegmentParams,
        ctx: &mut RunContext,
    ) -> Result<Self, TrackError> {
        // ---- VALIDATE ----

        if desc.pieces.is_empty() {
            return Err(TrackError::NoPieces);
        }

        for (i, piece) in desc.pieces.iter().enumerate() {
            let len = piece.shape.length_m();
            if !(len > 0.0) || !len.is_finite() {
                return Err(TrackError::InvalidPieceLength(i, len));
            }
        }

        if !(params.spacing_m > 0.0) || !params.spacing_m.is_finite() {
            return Err(TrackError::InvalidSpacing(params.spacing_m));
        }

        let length_m = desc.length_m();
        let num_samples = (length_m / params.spacing_m).floor() as usize;
        if num_samples < MIN_SAMPLES {
            return Err(TrackError::TooShort {
                length_m,
                spacing_m: params.spacing_m,
            });
        }
        let delta_m = length_m / num_samples as f64;

        info!(
            target: ctx.target(),
            "Segmenting track \"{}\": {:.3} m in {} samples of {:.3} m",
            desc.name,
            length_m,
            num_samples,
            delta_m
        );

        // ---- WALK PIECES ----

        let (starts, end) = piece_starts(&desc);
        let gap_m = (end.pos - starts[0].pos).norm();
        if gap_m > params.closure_tolerance_m {
            warn!(
                target: ctx.target(),
                "Track \"{}\" does not close, the end is {:.3} m from the start", desc.name, gap_m
            );
        }

        // Find the enclosing piece of each sample
        let mut locs = Vec::with_capacity(num_samples);
        let mut piece_idx = 0;
        let mut piece_start_m = 0.0;
        for i in 0..num_samples {
            let dist_m = i as f64 * delta_m;

            while piece_idx + 1 < desc.pieces.len()
                && dist_m >= piece_start_m + desc.pieces[piece_idx].shape.length_m()
            {
                piece_start_m += desc.pieces[piece_idx].shape.length_m();
                piece_idx += 1;
            }

            let len = desc.pieces[piece_idx].shape.length_m();
            let frac = ((dist_m - piece_start_m) / len).max(0.0).min(1.0);
            locs.push((dist_m, piece_idx, frac));
        }

        // ---- BENDS ----

        let signs: Vec<f64> = locs
            .iter()
            .map(|&(_, p, _)| sign_or_zero(desc.pieces[p].shape.curvature_m()))
            .collect();
        let bends = find_bends(&signs);

        let mut bend_of = vec![None; num_samples];
        let ring = Ring::new(num_samples);
        for (b, bend) in bends.iter().enumerate() {
            for j in 0..bend.len(num_samples) {
                bend_of[ring.offset(bend.start, j as isize)] = Some(b);
            }
        }

        debug!(target: ctx.target(), "Found {} bends", bends.len());

        // ---- SAMPLES ----

        let mut samples = Vec::with_capacity(num_samples);
        for (i, &(dist_m, p, frac)) in locs.iter().enumerate() {
            let piece = &desc.pieces[p];
            let geom = piece_geom(piece, &starts[p], frac);

            // The inside curb may be permitted on a per bend basis
            let (left_curb, right_curb) = match bend_of[i] {
                Some(b) if params.inside_curb_bends.contains(&b) => {
                    (bends[b].sign > 0.0, bends[b].sign < 0.0)
                }
                _ => (false, false),
            };

            let left = side_width(piece, Side::Left, frac, geom.cross_slope, left_curb, &params);
            let right = side_width(
                piece,
                Side::Right,
                frac,
                geom.cross_slope,
                right_curb,
                &params,
            );

            samples.push(TrackSample {
                dist_m,
                pt: geom.pt,
                norm: geom.norm,
                heading_rad: geom.heading_rad,
                half_width_m: geom.half_width_m,
                width_left_m: left.usable_m,
                width_right_m: right.usable_m,
                extent_left_m: left.extent_m,
                extent_right_m: right.extent_m,
                clip_left: left.clip,
                clip_right: right.clip,
                bend: bend_of[i],
                piece: p,
                piece_frac: frac,
                friction: piece.surface.friction,
            });
        }

        // ---- RELAX WIDTHS ----

        let mut lefts: Vec<f64> = samples.iter().map(|s| s.width_left_m).collect();
        let mut rights: Vec<f64> = samples.iter().map(|s| s.width_right_m).collect();
        relax_widths(&mut lefts, params.max_width_step_m);
        relax_widths(&mut rights, params.max_width_step_m);
        for (s, (l, r)) in samples.iter_mut().zip(lefts.into_iter().zip(rights.into_iter())) {
            s.width_left_m = l;
            s.width_right_m = r;
        }

        Ok(Self {
            name: desc.name.clone(),
            samples,
            bends,
            length_m,
            delta_m,
            params,
            desc,
        })
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Ring over the samples.
    pub fn ring(&self) -> Ring {
        Ring::new(self.samples.len())
    }

    /// Wrap a distance along the track into `[0, length_m)`.
    pub fn wrap_pos(&self, pos_m: f64) -> f64 {
        let pos_m = rem_euclid(pos_m, self.length_m);

        // Rounding can land tiny negative distances exactly on the end of the loop
        if pos_m >= self.length_m {
            0.0
        } else {
            pos_m
        }
    }

    /// Index of the sample containing the given distance along the track. Distances outside the
    /// loop are wrapped.
    pub fn index_from_pos(&self, pos_m: f64) -> usize {
        let pos_m = self.wrap_pos(pos_m);
        ((pos_m / self.delta_m).floor() as usize).min(self.len().saturating_sub(1))
    }

    /// Friction of the surface at the given lateral offset from sample `idx`.
    pub fn friction_at(&self, idx: usize, offset_m: f64) -> f64 {
        let sample = &self.samples[idx % self.len()];
        let piece = &self.desc.pieces[sample.piece];

        if offset_m.abs() <= sample.half_width_m {
            return piece.surface.friction;
        }

        let (strips, beyond_m) = if offset_m < 0.0 {
            (&piece.left_sides, -offset_m - sample.half_width_m)
        } else {
            (&piece.right_sides, offset_m - sample.half_width_m)
        };

        let mut acc_m = 0.0;
        for strip in strips {
            acc_m += strip_width(strip, sample.piece_frac);
            if beyond_m <= acc_m {
                return strip.surface.friction;
            }
        }

        strips
            .last()
            .map(|s| s.surface.friction)
            .unwrap_or(piece.surface.friction)
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use track_if::track::{PieceDesc, PieceShape, SideDesc, SideKind, SurfaceDesc, Turn};

    #[test]
    fn test_segment_oval() {
        let track = crate::test_utils::oval_track(Turn::Left);

        assert_eq!(track.len(), 333);
        assert!((track.delta_m * 333.0 - track.length_m).abs() < 1e-9);
        assert_eq!(track.bends.len(), 2);

        // Every sample is 12 m wide with nothing to clip it
        for s in &track.samples {
            assert_eq!(s.width_left_m, 6.0);
            assert_eq!(s.width_right_m, 6.0);
            assert_eq!(s.clip_left, EdgeClip::Open);
            assert!((s.norm.xy().norm() - 1.0).abs() < 1e-12);
        }

        // Samples are evenly spaced along the straights
        let d = (track.samples[1].pt - track.samples[0].pt).norm();
        assert!((d - track.delta_m).abs() < 1e-9);

        // Bends cover the arcs
        for bend in &track.bends {
            assert_eq!(bend.sign, 1.0);
            let mid = &track.samples[bend.mid(track.len())];
            assert_eq!(mid.bend, Some(track.bends.iter().position(|b| b == bend).unwrap()));
        }
        assert_eq!(track.samples[0].bend, None);
    }

    #[test]
    fn test_circle_has_no_bends() {
        let track = Track::segment(
            TrackDesc::circle(40.0, 10.0, Turn::Right),
            SegmentParams::default(),
            &mut RunContext::new("test"),
        )
        .unwrap();

        assert!(track.bends.is_empty());
        assert!(track.samples.iter().all(|s| s.bend.is_none()));
    }

    #[test]
    fn test_invalid_descriptions() {
        let mut ctx = RunContext::new("test");
        let mut desc = TrackDesc::oval(100.0, 20.0, 10.0, Turn::Left);

        let params = SegmentParams {
            spacing_m: 0.0,
            ..SegmentParams::default()
        };
        assert!(matches!(
            Track::segment(desc.clone(), params, &mut ctx),
            Err(TrackError::InvalidSpacing(_))
        ));

        let params = SegmentParams {
            spacing_m: 100.0,
            ..SegmentParams::default()
        };
        assert!(matches!(
            Track::segment(desc.clone(), params, &mut ctx),
            Err(TrackError::TooShort { .. })
        ));

        desc.pieces[1] = PieceDesc::plain(PieceShape::Straight { length_m: -1.0 }, 10.0);
        assert!(matches!(
            Track::segment(desc.clone(), SegmentParams::default(), &mut ctx),
            Err(TrackError::InvalidPieceLength(1, _))
        ));

        desc.pieces.clear();
        assert!(matches!(
            Track::segment(desc, SegmentParams::default(), &mut ctx),
            Err(TrackError::NoPieces)
        ));
    }

    #[test]
    fn test_unclosed_track_still_segments() {
        let mut desc = TrackDesc::oval(100.0, 20.0, 10.0, Turn::Left);
        desc.pieces.pop();

        let track = Track::segment(desc, SegmentParams::default(), &mut RunContext::new("test"));
        assert!(track.is_ok());
    }

    #[test]
    fn test_friction_and_index() {
        let grass = SideDesc {
            width_start_m: 2.0,
            width_end_m: 2.0,
            surface: SurfaceDesc {
                friction: 0.6,
                rolling_resistance: 0.05,
                roughness: 0.1,
            },
            kind: SideKind::Grass,
            slope: 0.0,
        };
        let mut desc = TrackDesc::oval(100.0, 20.0, 10.0, Turn::Left);
        for piece in desc.pieces.iter_mut() {
            piece.right_sides = vec![grass.clone()];
        }

        let track =
            Track::segment(desc, SegmentParams::default(), &mut RunContext::new("test")).unwrap();

        assert_eq!(track.friction_at(0, 0.0), 1.0);
        assert_eq!(track.friction_at(0, -5.5), 1.0);
        assert_eq!(track.friction_at(0, 6.0), 0.6);
        assert_eq!(track.friction_at(0, 20.0), 0.6);
        assert_eq!(track.samples[0].clip_right, EdgeClip::Surface);
        assert_eq!(track.samples[0].width_right_m, 5.0);
        assert_eq!(track.samples[0].extent_right_m, 7.0);

        assert_eq!(track.index_from_pos(0.0), 0);
        assert_eq!(track.index_from_pos(track.length_m), 0);
        assert_eq!(track.index_from_pos(-0.5 * track.delta_m), track.len() - 1);
        assert_eq!(track.index_from_pos(2.5 * track.delta_m), 2);
    }
}
