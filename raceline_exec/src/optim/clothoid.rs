//! # Clothoid optimiser
//!
//! Each active point is moved to the offset which gives it the chord-length weighted mean of the
//! curvatures of its neighbours, which over many sweeps makes the curvature of the path vary
//! linearly along it. On bend entries and exits the growing curvature is amplified slightly,
//! which pushes the path to the outside before the bend and cuts it into the apex.
//!
//! Only the weaker of the two chord curvatures, the one on the straight side of the point, is
//! amplified. Scaling both by the same factor would scale the blended target as a whole and
//! tighten the path evenly, rather than letting the curvature build earlier through the entry
//! and fall later through the exit.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use crate::context::RunContext;
use crate::geom::curvature_xy;
use crate::path::Path;

use super::Window;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Number of times each level is repeated.
const REPEATS: usize = 6;

/// Number of sweeps over the loop per repeat.
const SWEEPS: usize = 25;

/// Ratio by which the curvature either side must grow before it is amplified.
const GROWTH_RATIO: f64 = 1.02;

/// Curvatures below this on both sides are gently straightened.
const GENTLE_K: f64 = 0.00175;

/// Straightening applied to gentle curvature.
const GENTLE_RELAX: f64 = 0.9;

/// Weighting of the larger neighbour when blending the two sides of an S bend.
const S_BEND_BLEND: f64 = 0.75;

/// Look ahead curvature at which the full amplification factor applies, in 1/(1/m).
const FWD_K_FULL_SCALE: f64 = 50.0;

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Optimise the path at resolution `step`.
pub(crate) fn optimise_level(path: &mut Path, step: usize, bump: bool, ctx: &mut RunContext) {
    for _ in 0..REPEATS {
        path.calc_curvatures_xy(1);
        path.calc_fwd_k();

        for _ in 0..SWEEPS {
            sweep(path, step, bump, ctx);
        }

        path.smooth_between(step, bump);
    }
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// One pass over every active point of the level.
fn sweep(path: &mut Path, step: usize, bump: bool, ctx: &mut RunContext) {
    let active = path.ring().stepped(step);
    if active.len() < 5 {
        return;
    }

    for j in 0..active.len() {
        let win = Window::around(&active, j);
        let i = win.centre();
        if path.points[i].fixed {
            continue;
        }

        let target_k = target_curvature(path, &win);
        let old = path.points[i].offset_m;
        let t = path.adjust_offset(i, win.idx[2], win.idx[4], target_k, bump);

        ctx.stats.offset_steps += 1;
        let (lo, hi) = path.bounds(i);
        if t <= lo || t >= hi {
            ctx.stats.clamped_steps += 1;
        }

        // Carry part of the move over to the neighbours
        let apex_factor = path.options.apex_factor;
        if apex_factor != 0.0 {
            let delta = (t - old) * apex_factor;
            for &n in &[win.idx[2], win.idx[4]] {
                if !path.points[n].fixed {
                    let offset = path.points[n].offset_m;
                    path.set_offset(n, offset + delta);
                }
            }
        }
    }

    ctx.stats.optim_sweeps += 1;
}

/// The curvature the centre of the window should have.
///
/// On an entry the chord behind the point, `k1`, is amplified. On an exit the chord ahead of it,
/// `k2`, is.
fn target_curvature(path: &Path, win: &Window) -> f64 {
    let p = |n: usize| &path.points[win.idx[n]].pt;

    let mut k1 = curvature_xy(p(1), p(2), p(3));
    let mut k2 = curvature_xy(p(3), p(4), p(5));
    let len1 = (p(3).xy() - p(2).xy()).norm();
    let len2 = (p(4).xy() - p(3).xy()).norm();

    if k1 * k2 > 0.0 {
        let k0 = curvature_xy(p(0), p(1), p(2));
        let k3 = curvature_xy(p(4), p(5), p(6));

        if k0 * k1 > 0.0 && k2 * k3 > 0.0 {
            let factor = amplification(path, win.centre());

            if k0.abs() < k1.abs() && k1.abs() * GROWTH_RATIO < k2.abs() {
                // Entry, curvature growing
                k1 *= factor;
            } else if k3.abs() < k2.abs() && k2.abs() * GROWTH_RATIO < k1.abs() {
                // Exit, curvature shrinking
                k2 *= factor;
            }
        }
    } else if k1 * k2 < 0.0 {
        if k1.abs() < k2.abs() {
            k1 = (1.0 - S_BEND_BLEND) * k1 + S_BEND_BLEND * k2;
        } else {
            k2 = (1.0 - S_BEND_BLEND) * k2 + S_BEND_BLEND * k1;
        }
    }

    let mut k = if len1 + len2 > 0.0 {
        (len2 * k1 + len1 * k2) / (len1 + len2)
    } else {
        0.5 * (k1 + k2)
    };

    if k1 * k2 > 0.0 && k1.abs() < GENTLE_K && k2.abs() < GENTLE_K {
        k *= GENTLE_RELAX;
    }

    k
}

/// Amplification factor at point `i`, scaled down where the path ahead is straight.
fn amplification(path: &Path, i: usize) -> f64 {
    let factor = path.options.factor_for(path.track.samples[i].bend);
    let scale = (path.points[i].fwd_k * FWD_K_FULL_SCALE).max(0.0).min(1.0);

    1.0 + (factor - 1.0) * scale
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
