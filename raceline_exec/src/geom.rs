//! # Geometry helpers
//!
//! Curvature estimates from three points, line intersection in the ground plane, and the
//! parametric cubic used to interpolate the path between samples.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use nalgebra::{Vector2, Vector3};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Denominators smaller than this are treated as zero.
const MIN_DENOM: f64 = 1e-12;

/// Minimum spacing between cubic knots before the fit falls back to uniform knots.
const MIN_KNOT_SPACING_M: f64 = 1e-9;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A parametric cubic in the ground plane passing through four points, parameterised by
/// cumulative chord length (Lagrange form).
#[derive(Debug, Clone, Copy)]
pub struct ParamCubic {
    knots: [f64; 4],
    pts: [Vector2<f64>; 4],
}

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Signed curvature of the circle through three points, positive when the points turn left.
///
/// Collinear or coincident points give zero.
pub fn curvature_2d(p0: Vector2<f64>, p1: Vector2<f64>, p2: Vector2<f64>) -> f64 {
    let a = p1 - p0;
    let b = p2 - p1;
    let c = p2 - p0;

    let denom = a.norm() * b.norm() * c.norm();
    if denom < MIN_DENOM {
        return 0.0;
    }

    2.0 * cross_2d(&a, &b) / denom
}

/// Signed curvature of three points projected onto the ground plane.
pub fn curvature_xy(p0: &Vector3<f64>, p1: &Vector3<f64>, p2: &Vector3<f64>) -> f64 {
    curvature_2d(p0.xy(), p1.xy(), p2.xy())
}

/// Curvature of three points in the distance-height plane, positive when the points are
/// concave upwards (a compression).
pub fn curvature_z(p0: &Vector3<f64>, p1: &Vector3<f64>, p2: &Vector3<f64>) -> f64 {
    let s1 = (p1.xy() - p0.xy()).norm();
    let s2 = s1 + (p2.xy() - p1.xy()).norm();

    curvature_2d(
        Vector2::new(0.0, p0.z),
        Vector2::new(s1, p1.z),
        Vector2::new(s2, p2.z),
    )
}

/// Find where the line `p0 + t * v0` crosses the line `p1 + u * v1` in the ground plane.
///
/// Returns `(t, u)`, or `None` if the lines are parallel.
pub fn line_crosses_line_xy(
    p0: &Vector3<f64>,
    v0: &Vector3<f64>,
    p1: &Vector3<f64>,
    v1: &Vector3<f64>,
) -> Option<(f64, f64)> {
    let v0 = v0.xy();
    let v1 = v1.xy();

    let denom = cross_2d(&v0, &v1);
    if denom.abs() < MIN_DENOM {
        return None;
    }

    let d = p1.xy() - p0.xy();
    Some((cross_2d(&d, &v1) / denom, cross_2d(&d, &v0) / denom))
}

/// z component of the cross product of two planar vectors.
pub fn cross_2d(a: &Vector2<f64>, b: &Vector2<f64>) -> f64 {
    a.x * b.y - a.y * b.x
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl ParamCubic {
    /// Fit the cubic through the four points in order.
    pub fn fit(pts: [Vector2<f64>; 4]) -> Self {
        let mut knots = [0.0; 4];
        for i in 1..4 {
            knots[i] = knots[i - 1] + (pts[i] - pts[i - 1]).norm();
        }

        // Coincident points would give repeated knots and a singular basis
        if (1..4).any(|i| knots[i] - knots[i - 1] < MIN_KNOT_SPACING_M) {
            knots = [0.0, 1.0, 2.0, 3.0];
        }

        Self { knots, pts }
    }

    /// Parameter value at the given fraction of the way between the second and third points.
    pub fn middle_param(&self, frac: f64) -> f64 {
        self.knots[1] + frac * (self.knots[2] - self.knots[1])
    }

    /// Position on the cubic at parameter `t`.
    pub fn calc(&self, t: f64) -> Vector2<f64> {
        (0..4).fold(Vector2::zeros(), |acc, j| acc + self.pts[j] * self.basis(j, t))
    }

    /// Derivative of the position with respect to `t`.
    pub fn tangent(&self, t: f64) -> Vector2<f64> {
        (0..4).fold(Vector2::zeros(), |acc, j| {
            acc + self.pts[j] * self.basis_deriv(j, t)
        })
    }

    fn basis(&self, j: usize, t: f64) -> f64 {
        (0..4)
            .filter(|&m| m != j)
            .map(|m| (t - self.knots[m]) / (self.knots[j] - self.knots[m]))
            .product()
    }

    fn basis_deriv(&self, j: usize, t: f64) -> f64 {
        (0..4)
            .filter(|&l| l != j)
            .map(|l| {
                let prod: f64 = (0..4)
                    .filter(|&m| m != j && m != l)
                    .map(|m| (t - self.knots[m]) / (self.knots[j] - self.knots[m]))
                    .product();
                prod / (self.knots[j] - self.knots[l])
            })
            .sum()
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    fn on_circle(r: f64, angle: f64) -> Vector3<f64> {
        Vector3::new(r * angle.cos(), r * angle.sin(), 0.0)
    }

    #[test]
    fn test_curvature_sign() {
        // Counter clockwise around a circle is a left turn
        let (a, b, c) = (on_circle(20.0, 0.0), on_circle(20.0, 0.1), on_circle(20.0, 0.2));
        assert!((curvature_xy(&a, &b, &c) - 0.05).abs() < 1e-9);
        assert!((curvature_xy(&c, &b, &a) + 0.05).abs() < 1e-9);

        // Collinear and coincident points
        let p = Vector3::new(1.0, 1.0, 0.0);
        assert_eq!(curvature_xy(&p, &p, &p), 0.0);
        assert_eq!(
            curvature_xy(&Vector3::zeros(), &p, &(p * 2.0)),
            0.0
        );
    }

    #[test]
    fn test_curvature_z() {
        // A dip is concave upwards
        let p0 = Vector3::new(0.0, 0.0, 1.0);
        let p1 = Vector3::new(3.0, 4.0, 0.0);
        let p2 = Vector3::new(6.0, 8.0, 1.0);
        assert!(curvature_z(&p0, &p1, &p2) > 0.0);
        assert!(curvature_z(&(-p0), &(-p1), &(-p2)) < 0.0);
    }

    #[test]
    fn test_line_crossing() {
        let p0 = Vector3::new(0.0, 0.0, 0.0);
        let v0 = Vector3::new(0.0, 1.0, 0.0);
        let p1 = Vector3::new(-1.0, 2.0, 0.0);
        let v1 = Vector3::new(4.0, 0.0, 0.0);

        let (t, u) = line_crosses_line_xy(&p0, &v0, &p1, &v1).unwrap();
        assert!((t - 2.0).abs() < 1e-12);
        assert!((u - 0.25).abs() < 1e-12);

        assert!(line_crosses_line_xy(&p0, &v0, &p1, &v0).is_none());
    }

    #[test]
    fn test_param_cubic() {
        // Points on a straight line with uneven spacing are reproduced exactly
        let pts = [
            Vector2::new(0.0, 0.0),
            Vector2::new(1.0, 1.0),
            Vector2::new(3.0, 3.0),
            Vector2::new(4.0, 4.0),
        ];
        let cubic = ParamCubic::fit(pts);

        let mid = cubic.calc(cubic.middle_param(0.5));
        assert!((mid - Vector2::new(2.0, 2.0)).norm() < 1e-9);
        assert!((cubic.calc(cubic.middle_param(0.0)) - pts[1]).norm() < 1e-9);

        let tangent = cubic.tangent(cubic.middle_param(0.25)).normalize();
        assert!((tangent - Vector2::new(1.0, 1.0).normalize()).norm() < 1e-9);

        // Repeated points still evaluate
        let cubic = ParamCubic::fit([pts[0], pts[0], pts[2], pts[3]]);
        assert!(cubic.calc(cubic.middle_param(0.5)).x.is_finite());
    }
}
