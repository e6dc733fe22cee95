//! # Spring optimiser
//!
//! Every active point is a mass which can slide along its track normal. Consecutive points are
//! joined by torsional springs whose torque grows faster than linearly with the curvature at the
//! joint, so the relaxed path spreads its turning out as evenly as the track allows.
//!
//! Each iteration first computes the force on every point from the current positions, then moves
//! every point with a position Verlet step. A point which hits the edge of the track loses its
//! velocity.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};
use util::maths::sign_or_zero;

use crate::bump::damping_for_height;
use crate::context::RunContext;
use crate::geom::curvature_2d;
use crate::path::Path;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Difference between the requested and applied offsets above which a step counts as clamped.
const CLAMP_TOL_M: f64 = 1e-12;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Parameters of the spring optimiser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpringParams {
    /// Curvature scale of the springs
    pub strength: f64,

    /// Power the scaled curvature is raised to
    pub exponent: f64,

    /// Quadratic velocity damping coefficient
    pub damping: f64,

    /// Mass of every point
    pub mass: f64,

    /// Time step at the finest resolution, coarser levels use `base_dt_s * sqrt(step)`
    pub base_dt_s: f64,

    /// Number of iterations per level
    pub iterations: usize,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for SpringParams {
    fn default() -> Self {
        Self {
            strength: 100.0,
            exponent: 2.1,
            damping: 1.0,
            mass: 1.0,
            base_dt_s: 0.05,
            iterations: 200,
        }
    }
}

impl SpringParams {
    /// The restoring torque of a spring with curvature `k` at its joint.
    pub fn torque(&self, k: f64) -> f64 {
        sign_or_zero(k) * (self.strength * k).abs().powf(self.exponent)
    }
}

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Relax the path at resolution `step`.
pub(crate) fn optimise_level(path: &mut Path, step: usize, bump: bool, ctx: &mut RunContext) {
    let active = path.ring().stepped(step);
    let m = active.len();
    if m < 3 {
        return;
    }

    let params = path.options.spring.clone();
    let dt = params.base_dt_s * (step as f64).sqrt();
    let mass = if params.mass > 0.0 { params.mass } else { 1.0 };

    let mut prev_offsets: Vec<f64> = active.iter().map(|&i| path.points[i].offset_m).collect();

    for _ in 0..params.iterations {
        let (forces, ks) = spring_forces(path, &active, &params);

        for j in 0..m {
            let i = active[j];
            if path.points[i].fixed {
                continue;
            }

            // Only the component along the normal can move the point
            let norm = path.track.samples[i].norm.xy();
            if norm.norm() <= 0.0 {
                continue;
            }
            let f = forces[j].dot(&norm.normalize());

            let current = path.points[i].offset_m;
            let vel = (current - prev_offsets[j]) / dt;
            let mut acc = (f - params.damping * vel * vel.abs()) / mass;
            if bump {
                acc *= damping_for_height(path.points[i].h_m);
            }

            let target = 2.0 * current - prev_offsets[j] + acc * dt * dt;

            path.points[i].k = ks[j];
            let applied = path.set_offset(i, target);

            ctx.stats.offset_steps += 1;
            if (applied - target).abs() > CLAMP_TOL_M {
                prev_offsets[j] = applied;
                ctx.stats.clamped_steps += 1;
            } else {
                prev_offsets[j] = current;
            }
        }

        ctx.stats.optim_sweeps += 1;
    }

    path.smooth_between(step, bump);
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// The net spring force on every active point, and the curvature at each.
fn spring_forces(
    path: &Path,
    active: &[usize],
    params: &SpringParams,
) -> (Vec<Vector2<f64>>, Vec<f64>) {
    let m = active.len();
    let mut forces = vec![Vector2::zeros(); m];
    let mut ks = vec![0.0; m];

    for j in 0..m {
        let ja = (j + m - 1) % m;
        let jb = (j + 1) % m;

        let pa = path.points[active[ja]].pt.xy();
        let pc = path.points[active[j]].pt.xy();
        let pb = path.points[active[jb]].pt.xy();

        let k = curvature_2d(pa, pc, pb);
        ks[j] = k;

        let chord = pb - pa;
        let len = chord.norm();
        if len <= 0.0 {
            continue;
        }

        // The ends are pushed away from the inside of the turn and the joint towards it, so
        // the spring as a whole carries no net force
        let left = Vector2::new(-chord.y, chord.x) / len;
        let f_end = -left * params.torque(k) / len;

        forces[ja] += f_end;
        forces[jb] += f_end;
        forces[j] -= 2.0 * f_end;
    }

    (forces, ks)
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::path::PathOptions;
    use crate::test_utils::{oval_arc, test_car};
    use track_if::track::Turn;

    #[test]
    fn test_torque() {
        let params = SpringParams::default();

        assert_eq!(params.torque(0.0), 0.0);
        assert!((params.torque(0.01) - 1.0).abs() < 1e-12);
        assert!((params.torque(-0.02) + 2f64.powf(2.1)).abs() < 1e-9);
    }

    #[test]
    fn test_forces_balance() {
        let mut path = Path::new(oval_arc(Turn::Left), &test_car(), PathOptions::default());
        for i in 0..path.len() {
            path.set_offset_hard(i, 2.0 * (i as f64 * 0.1).sin());
        }

        let active = path.ring().stepped(2);
        let (forces, _) = spring_forces(&path, &active, &path.options.spring);

        let total = forces.iter().fold(Vector2::zeros(), |acc, f| acc + f);
        assert!(total.norm() < 1e-6);
    }

    #[test]
    fn test_straight_has_no_force() {
        let path = Path::new(oval_arc(Turn::Left), &test_car(), PathOptions::default());
        let active = path.ring().stepped(1);
        let (forces, ks) = spring_forces(&path, &active, &path.options.spring);

        // Samples well inside the first straight
        for j in 10..20 {
            assert!(ks[j].abs() < 1e-9);
            assert!(forces[j].norm() < 1e-12);
        }
    }

    #[test]
    fn test_relaxes_within_bounds() {
        let mut path = Path::new(oval_arc(Turn::Left), &test_car(), PathOptions::default());
        let mut ctx = RunContext::new("test");

        optimise_level(&mut path, 8, false, &mut ctx);
        optimise_level(&mut path, 1, false, &mut ctx);

        for i in 0..path.len() {
            let (lo, hi) = path.bounds(i);
            assert!(path.points[i].offset_m >= lo && path.points[i].offset_m <= hi);
        }
        assert_eq!(ctx.stats.optim_sweeps, 2 * path.options.spring.iterations);
    }
}
