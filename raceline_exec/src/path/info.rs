//! Path queries at arbitrary track positions

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use nalgebra::Vector2;
use serde::Serialize;
use util::maths::lerp;

use super::Path;
use crate::geom::ParamCubic;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// The state of the path at a position along the track.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PointInfo {
    /// Index of the sample containing the position
    pub idx: usize,

    /// The position along the track, wrapped into the loop
    pub pos_m: f64,

    /// Point on the path in the ground plane
    pub pt: Vector2<f64>,

    /// Curvature of the path, +ve to the left
    pub k: f64,

    /// Lateral offset from the centreline
    pub offset_m: f64,

    /// Heading of the path relative to the +ve X axis
    pub heading_rad: f64,

    /// Target speed
    pub spd_ms: f64,

    /// Target acceleration
    pub acc_ms2: f64,

    /// Distance from the path to the raceable left edge
    pub to_left_m: f64,

    /// Distance from the path to the raceable right edge
    pub to_right_m: f64,
}

/// A `PointInfo` flattened into a single archive row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PointRow {
    pub idx: usize,
    pub pos_m: f64,
    pub x_m: f64,
    pub y_m: f64,
    pub k: f64,
    pub offset_m: f64,
    pub heading_rad: f64,
    pub spd_ms: f64,
    pub acc_ms2: f64,
    pub to_left_m: f64,
    pub to_right_m: f64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Path {
    /// Get the state of the path at any position along the track. Positions outside the loop,
    /// including negative ones, are wrapped.
    pub fn get_point_info(&self, pos_m: f64) -> PointInfo {
        let track = &self.track;
        let ring = self.ring();

        let pos_m = track.wrap_pos(pos_m);
        let idx = track.index_from_pos(pos_m);
        let frac = ((pos_m - idx as f64 * track.delta_m) / track.delta_m)
            .max(0.0)
            .min(1.0);

        let i0 = ring.prev(idx);
        let i2 = ring.next(idx);
        let i3 = ring.next(i2);

        let pts: [Vector2<f64>; 4] = [
            self.points[i0].pt.xy(),
            self.points[idx].pt.xy(),
            self.points[i2].pt.xy(),
            self.points[i3].pt.xy(),
        ];

        let cubic = ParamCubic::fit(pts);
        let t = cubic.middle_param(frac);
        let pt = cubic.calc(t);
        let tangent = cubic.tangent(t);

        let heading_rad = if tangent.norm() > 0.0 {
            tangent.y.atan2(tangent.x)
        } else {
            track.samples[idx].heading_rad
        };

        // Blend the curvatures either side by distance from each
        let len1 = (pt - pts[1]).norm();
        let len2 = (pts[2] - pt).norm();
        let (k1, k2) = (self.points[idx].k, self.points[i2].k);
        let k = if len1 + len2 > 0.0 {
            (k1 * len2 + k2 * len1) / (len1 + len2)
        } else {
            k1
        };

        let offset_m = lerp(self.points[idx].offset_m, self.points[i2].offset_m, frac);
        let left_m = lerp(
            track.samples[idx].width_left_m,
            track.samples[i2].width_left_m,
            frac,
        );
        let right_m = lerp(
            track.samples[idx].width_right_m,
            track.samples[i2].width_right_m,
            frac,
        );

        PointInfo {
            idx,
            pos_m,
            pt,
            k,
            offset_m,
            heading_rad,
            spd_ms: lerp(
                self.points[idx].acc_spd_ms,
                self.points[i2].acc_spd_ms,
                frac,
            ),
            acc_ms2: lerp(self.segment_accel(idx), self.segment_accel(i2), frac),
            to_left_m: left_m + offset_m,
            to_right_m: right_m - offset_m,
        }
    }

    /// Acceleration needed to go from the speed at point `i` to the speed at the next point.
    fn segment_accel(&self, i: usize) -> f64 {
        let next = self.ring().next(i);
        let ds = (self.points[next].pt.xy() - self.points[i].pt.xy()).norm();
        if ds <= 0.0 {
            return 0.0;
        }

        let v0 = self.points[i].acc_spd_ms;
        let v1 = self.points[next].acc_spd_ms;
        (v1 * v1 - v0 * v0) / (2.0 * ds)
    }
}

impl From<PointInfo> for PointRow {
    fn from(info: PointInfo) -> Self {
        Self {
            idx: info.idx,
            pos_m: info.pos_m,
            x_m: info.pt.x,
            y_m: info.pt.y,
            k: info.k,
            offset_m: info.offset_m,
            heading_rad: info.heading_rad,
            spd_ms: info.spd_ms,
            acc_ms2: info.acc_ms2,
            to_left_m: info.to_left_m,
            to_right_m: info.to_right_m,
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::path::PathOptions;
    use crate::test_utils::{circle_arc, oval_arc, test_car};
    use track_if::track::Turn;

    #[test]
    fn test_point_info_wraps() {
        let mut path = Path::new(oval_arc(Turn::Left), &test_car(), PathOptions::default());
        for (i, p) in path.points.iter_mut().enumerate() {
            p.acc_spd_ms = 20.0 + (i % 7) as f64;
        }

        let length = path.track.length_m;
        let start = path.get_point_info(0.0);
        assert_eq!(start, path.get_point_info(length));
        assert_eq!(start, path.get_point_info(-length));
        assert_eq!(start.idx, 0);

        // Continuous across the start line
        let before = path.get_point_info(length - 1e-6);
        assert!((before.pt - start.pt).norm() < 1e-4);
        assert!((before.offset_m - start.offset_m).abs() < 1e-4);
        assert!((before.spd_ms - start.spd_ms).abs() < 1e-4);

        let after = path.get_point_info(-0.5 * path.track.delta_m);
        assert_eq!(after.idx, path.len() - 1);
    }

    #[test]
    fn test_point_info_tiny_wraps() {
        let path = Path::new(oval_arc(Turn::Left), &test_car(), PathOptions::default());
        let length = path.track.length_m;
        let start = path.get_point_info(0.0);

        for &pos in &[-1e-14, -1e-300, length - 1e-13] {
            let info = path.get_point_info(pos);
            assert!(
                (info.pt - start.pt).norm() < 1e-6,
                "position {} is {} m from the start",
                pos,
                (info.pt - start.pt).norm()
            );
            assert!(info.pos_m < length);
        }

        assert_eq!(path.get_point_info(-1e-300).idx, 0);
        assert_eq!(path.get_point_info(length - 1e-13).idx, path.len() - 1);
    }

    #[test]
    fn test_point_info_on_samples() {
        let path = Path::new(circle_arc(50.0, 3.0, Turn::Left), &test_car(), PathOptions::default());

        let at = path.get_point_info((10.0 + 1e-9) * path.track.delta_m);
        assert_eq!(at.idx, 10);
        assert!((at.pt - path.points[10].pt.xy()).norm() < 1e-6);
        assert!((at.k - path.points[10].k).abs() < 1e-12);
        assert_eq!(at.to_left_m, 5.0);
        assert_eq!(at.to_right_m, 5.0);

        // Halfway between samples the point stays on the circle and heads along it
        let centre = Vector2::new(0.0, 50.0);
        let mid = path.get_point_info(10.5 * path.track.delta_m);
        assert!(((mid.pt - centre).norm() - 50.0).abs() < 1e-3);
        let radial = (mid.pt - centre).normalize();
        let heading = Vector2::new(mid.heading_rad.cos(), mid.heading_rad.sin());
        assert!(radial.dot(&heading).abs() < 1e-3);
        assert!((mid.k - 0.02).abs() < 1e-6);
    }
}
