//! # Path
//!
//! A path is a lateral offset at every track sample, together with quantities derived from the
//! resulting points: curvatures, attitude, speeds and ride height. Paths share the segmented
//! track by reference so that several lanes can be solved over the same samples.
//!
//! All offsets are kept within the raceable bounds of their sample:
//!
//! ```text
//! lo = -min(max_left, width_left) + margin
//! hi =  min(max_right, width_right) - margin
//! ```
//!
//! where `margin` is half the car's width plus the edge margin. On the outside of a turn the
//! optimisers keep a further safety buffer, but a point which is already inside the buffer may
//! stay where it is.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod info;
mod options;
mod point;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::sync::Arc;

use nalgebra::Vector2;
use track_if::car::{CarModel, Curvatures, TrackConditions};
use util::maths::sign_or_zero;

use crate::bump::damping_for_height;
use crate::geom::{curvature_2d, curvature_xy, curvature_z, line_crosses_line_xy};
use crate::ring::Ring;
use crate::track::{EdgeClip, Track};

pub use info::{PointInfo, PointRow};
pub use options::{BumpMode, Lane, PathOptions};
pub use point::PathPoint;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Offset step used to estimate the change in curvature with offset.
pub const OFFSET_DELTA_M: f64 = 0.0001;

/// Curvature changes smaller than this are not used to solve for an offset.
const MIN_CURVATURE_SLOPE: f64 = 1e-9;

/// Amplification of the bump curvature.
const KZ_GAIN: f64 = 6.0;

/// Half width, in samples, of the bump curvature stencil.
const KZ_STENCIL: isize = 3;

/// Lateral distance towards the outside of the turn at which the surface friction is sampled.
const FRICTION_PROBE_M: f64 = 0.75;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A closed path around the track.
#[derive(Debug, Clone)]
pub struct Path {
    /// The track the path is laid over
    pub track: Arc<Track>,

    /// One point per track sample
    pub points: Vec<PathPoint>,

    /// Options used to optimise the path
    pub options: PathOptions,

    margin_m: f64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Path {
    /// Create a new path following the centreline, or as close to it as the bounds allow.
    pub fn new(track: Arc<Track>, car: &dyn CarModel, options: PathOptions) -> Self {
        let margin_m = 0.5 * car.width_m() + options.edge_margin_m;

        let points = track
            .samples
            .iter()
            .map(|s| {
                let mut p = PathPoint::new(0.0, s.pt);
                if s.clip_left == EdgeClip::Wall {
                    p.left_buf_m = options.wall_buffer_m;
                }
                if s.clip_right == EdgeClip::Wall {
                    p.right_buf_m = options.wall_buffer_m;
                }
                p
            })
            .collect();

        let mut path = Self {
            track,
            points,
            options,
            margin_m,
        };

        for i in 0..path.len() {
            path.set_offset_hard(i, 0.0);
        }
        path.calc_all();

        path
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Ring over the points.
    pub fn ring(&self) -> Ring {
        Ring::new(self.points.len())
    }

    /// Distance kept between the path and the raceable edges.
    pub fn margin_m(&self) -> f64 {
        self.margin_m
    }

    /// All offsets in order.
    pub fn offsets(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.offset_m).collect()
    }

    /// Hard bounds on the offset at sample `i`, as `(lo, hi)`.
    ///
    /// If the track is too narrow for the car both bounds are the middle of the raceable width.
    pub fn bounds(&self, i: usize) -> (f64, f64) {
        let s = &self.track.samples[i];
        let max_l = self.options.max_left_m.unwrap_or(std::f64::INFINITY);
        let max_r = self.options.max_right_m.unwrap_or(std::f64::INFINITY);

        let lo = -s.width_left_m.min(max_l) + self.margin_m;
        let hi = s.width_right_m.min(max_r) - self.margin_m;

        if lo > hi {
            let mid = 0.5 * (lo + hi);
            (mid, mid)
        } else {
            (lo, hi)
        }
    }

    /// Physical bounds on the offset at sample `i`, ignoring the raceable width.
    pub fn extent_bounds(&self, i: usize) -> (f64, f64) {
        let s = &self.track.samples[i];
        let lo = -s.extent_left_m + self.margin_m;
        let hi = s.extent_right_m - self.margin_m;

        if lo > hi {
            let mid = 0.5 * (lo + hi);
            (mid, mid)
        } else {
            (lo, hi)
        }
    }

    /// Move point `i` towards the offset `t`, keeping the safety buffer on the outside of the
    /// turn given by the point's current curvature. Returns the offset actually set.
    pub fn set_offset(&mut self, i: usize, t: f64) -> f64 {
        let (lo, hi) = self.bounds(i);
        let p = &self.points[i];

        let buf = self
            .options
            .safety_limit_m
            .min(self.options.safety_multiplier * p.k.abs());
        let current = p.offset_m;

        let mut t = t;
        if p.k >= 0.0 {
            // Turning left, the outside is on the right
            let limit = hi - p.right_buf_m - buf;
            if t < lo {
                t = lo;
            } else if t > limit {
                t = if current > limit { t.min(current) } else { limit };
            }
        } else {
            let limit = lo + p.left_buf_m + buf;
            if t > hi {
                t = hi;
            } else if t < limit {
                t = if current < limit { t.max(current) } else { limit };
            }
        }

        self.apply_offset(i, t.max(lo).min(hi))
    }

    /// Set the offset of point `i`, clamped only to the hard bounds. Returns the offset actually
    /// set.
    pub fn set_offset_hard(&mut self, i: usize, t: f64) -> f64 {
        let (lo, hi) = self.bounds(i);
        self.apply_offset(i, t.max(lo).min(hi))
    }

    /// Set the offset of point `i` with no clamping at all.
    pub(crate) fn apply_offset(&mut self, i: usize, t: f64) -> f64 {
        let s = &self.track.samples[i];
        let p = &mut self.points[i];
        p.offset_m = t;
        p.pt = s.point_at(t);
        t
    }

    /// Solve for the offset of point `i` which gives it curvature `target_k` with respect to
    /// points `prev` and `next`, using one Newton step from the line between them. When `bump`
    /// is set the step is damped by the point's ride height.
    ///
    /// Returns the offset actually set.
    pub fn adjust_offset(
        &mut self,
        i: usize,
        prev: usize,
        next: usize,
        target_k: f64,
        bump: bool,
    ) -> f64 {
        let s = &self.track.samples[i];
        let p_prev = self.points[prev].pt;
        let p_next = self.points[next].pt;
        let old = self.points[i].offset_m;

        let mut t = match line_crosses_line_xy(&s.pt, &s.norm, &p_prev, &(p_next - p_prev)) {
            Some((t, _)) => t,
            None => return old,
        };

        let dk = curvature_xy(&p_prev, &s.point_at(t + OFFSET_DELTA_M), &p_next);
        if dk.abs() > MIN_CURVATURE_SLOPE {
            t += OFFSET_DELTA_M * target_k / dk;
        }

        if bump {
            t = old + (t - old) * damping_for_height(self.points[i].h_m);
        }

        self.points[i].k = target_k;
        self.set_offset(i, t)
    }

    /// Fill in the points between the points solved at resolution `step`, by blending the
    /// curvature of the solved points either side and solving for the offset which gives it.
    pub fn smooth_between(&mut self, step: usize, bump: bool) {
        if step <= 1 {
            return;
        }

        let ring = self.ring();
        let active = ring.stepped(step);
        let m = active.len();
        if m < 3 {
            return;
        }

        for j in 0..m {
            let i0 = active[(j + m - 1) % m];
            let i1 = active[j];
            let i2 = active[(j + 1) % m];
            let i3 = active[(j + 2) % m];

            let (p0, p1, p2, p3) = (
                self.points[i0].pt,
                self.points[i1].pt,
                self.points[i2].pt,
                self.points[i3].pt,
            );
            let k1 = curvature_xy(&p0, &p1, &p2);
            let k2 = curvature_xy(&p1, &p2, &p3);

            for g in 1..ring.forward_dist(i1, i2) {
                let i = ring.offset(i1, g as isize);
                if self.points[i].fixed {
                    continue;
                }

                let s = &self.track.samples[i];
                let old = self.points[i].offset_m;

                let mut t = match line_crosses_line_xy(&s.pt, &s.norm, &p1, &(p2 - p1)) {
                    Some((t, _)) => t,
                    None => continue,
                };

                let on_line = s.point_at(t);
                let len1 = (on_line.xy() - p1.xy()).norm();
                let len2 = (p2.xy() - on_line.xy()).norm();
                let kappa = if len1 + len2 > 0.0 {
                    (k1 * len2 + k2 * len1) / (len1 + len2)
                } else {
                    k1
                };

                if kappa != 0.0 {
                    let dk = curvature_xy(&p1, &s.point_at(t + OFFSET_DELTA_M), &p2);
                    if dk.abs() > MIN_CURVATURE_SLOPE {
                        t += OFFSET_DELTA_M * kappa / dk;
                    }
                }

                if bump {
                    t = old + (t - old) * damping_for_height(self.points[i].h_m);
                }

                self.points[i].k = kappa;
                self.set_offset(i, t);
            }
        }
    }

    /// Recompute every derived quantity of the points from their offsets.
    pub fn calc_all(&mut self) {
        let n = self.len();
        for i in 0..n {
            let t = self.points[i].offset_m;
            self.apply_offset(i, t);
        }

        self.calc_curvatures_xy(1);
        self.calc_curvatures_z();
        self.calc_curvatures_vh();
        self.calc_angles();
        self.calc_fwd_k();
    }

    /// Recompute planar curvature of the points at resolution `step`, using the neighbouring
    /// points at the same resolution.
    pub fn calc_curvatures_xy(&mut self, step: usize) {
        let active = self.ring().stepped(step);
        let m = active.len();
        if m < 3 {
            return;
        }

        let ks: Vec<f64> = (0..m)
            .map(|j| {
                curvature_xy(
                    &self.points[active[(j + m - 1) % m]].pt,
                    &self.points[active[j]].pt,
                    &self.points[active[(j + 1) % m]].pt,
                )
            })
            .collect();

        for (j, k) in ks.into_iter().enumerate() {
            self.points[active[j]].k = k;
        }
    }

    /// Recompute the bump curvature of every point.
    pub fn calc_curvatures_z(&mut self) {
        let ring = self.ring();
        let kzs: Vec<f64> = (0..self.len())
            .map(|i| {
                KZ_GAIN
                    * curvature_z(
                        &self.points[ring.offset(i, -KZ_STENCIL)].pt,
                        &self.points[i].pt,
                        &self.points[ring.offset(i, KZ_STENCIL)].pt,
                    )
            })
            .collect();

        for (p, kz) in self.points.iter_mut().zip(kzs) {
            p.kz = kz;
        }
    }

    /// Recompute the curvatures of every point relative to the local plane of the track: `kv`
    /// in the vertical plane through the direction of travel, `kh` in the track plane.
    pub fn calc_curvatures_vh(&mut self) {
        let ring = self.ring();

        let kvh: Vec<(f64, f64)> = (0..self.len())
            .map(|i| {
                let pt = self.points[i].pt;
                let d_prev = self.points[ring.prev(i)].pt - pt;
                let d_next = self.points[ring.next(i)].pt - pt;

                let chord = d_next - d_prev;
                if chord.norm() <= 0.0 {
                    return (0.0, 0.0);
                }
                let tangent = chord.normalize();

                let up = self.track.samples[i].norm.cross(&tangent);
                if up.norm() <= 0.0 {
                    return (0.0, 0.0);
                }
                let up = up.normalize();
                let left = up.cross(&tangent);

                let origin = Vector2::zeros();
                let kv = curvature_2d(
                    Vector2::new(d_prev.dot(&tangent), d_prev.dot(&up)),
                    origin,
                    Vector2::new(d_next.dot(&tangent), d_next.dot(&up)),
                );
                let kh = curvature_2d(
                    Vector2::new(d_prev.dot(&tangent), d_prev.dot(&left)),
                    origin,
                    Vector2::new(d_next.dot(&tangent), d_next.dot(&left)),
                );

                (kv, kh)
            })
            .collect();

        for (p, (kv, kh)) in self.points.iter_mut().zip(kvh) {
            p.kv = kv;
            p.kh = kh;
        }
    }

    /// Recompute the pitch and roll of every point.
    pub fn calc_angles(&mut self) {
        let ring = self.ring();

        for i in 0..self.len() {
            let d = self.points[ring.next(i)].pt - self.points[ring.prev(i)].pt;
            let pitch = d.z.atan2(d.xy().norm());
            let roll = self.track.samples[i].norm.z.atan();

            let p = &mut self.points[i];
            p.pitch_rad = pitch;
            p.roll_rad = roll;
        }
    }

    /// Recompute the look ahead curvature of every point, the mean absolute curvature of the
    /// points within `fwd_k_range_m` ahead.
    pub fn calc_fwd_k(&mut self) {
        let ring = self.ring();
        let window = ((self.options.fwd_k_range_m / self.track.delta_m).ceil() as usize).max(1);

        let fwd: Vec<f64> = (0..self.len())
            .map(|i| {
                let sum: f64 = (0..window)
                    .map(|j| self.points[ring.offset(i, j as isize)].k.abs())
                    .sum();
                sum / window as f64
            })
            .collect();

        for (p, f) in self.points.iter_mut().zip(fwd) {
            p.fwd_k = f;
        }
    }

    /// The curvature triplet at point `i`.
    pub fn curvatures(&self, i: usize) -> Curvatures {
        self.points[i].curvatures()
    }

    /// The surface conditions at point `i`, with friction sampled towards the outside of the
    /// turn where the load is carried.
    pub fn conditions(&self, i: usize) -> TrackConditions {
        let p = &self.points[i];
        TrackConditions {
            friction: self
                .track
                .friction_at(i, p.offset_m + sign_or_zero(p.k) * FRICTION_PROBE_M),
            roll_rad: p.roll_rad,
            pitch_rad: p.pitch_rad,
        }
    }

    /// Distance along the path from point `i` to the next point, following the arc implied by
    /// their curvature where possible.
    pub fn arc_dist(&self, i: usize) -> f64 {
        let next = self.ring().next(i);
        let chord = (self.points[next].pt - self.points[i].pt).norm();
        let k = 0.5 * (self.points[i].k + self.points[next].k).abs();

        if k > 1e-6 {
            let half_angle = 0.5 * chord * k;
            if half_angle < 1.0 {
                return 2.0 * half_angle.asin() / k;
            }
        }

        chord
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
