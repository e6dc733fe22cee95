//! # Lane search
//!
//! A greedy local search over the offsets of individual points. Each candidate point is pinned
//! at a slightly different offset, the rest of the path is relaxed around it, and the change is
//! kept if the estimated lap time improves. The search is repeated with finer spacing between
//! candidates and smaller moves.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{debug, trace};
use serde::{Deserialize, Serialize};
use track_if::car::CarModel;

use crate::context::RunContext;
use crate::path::Path;

use super::{solve, spring};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Number of passes, each halving the index and lane steps.
const SEARCH_PASSES: usize = 5;

/// Moves smaller than this are treated as blocked by the track edge.
const MIN_MOVE_M: f64 = 1e-9;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Parameters of the lane search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchParams {
    /// Spacing in samples between candidate points on the first pass
    pub initial_index_step: usize,

    /// Size of each offset move on the first pass
    pub initial_lane_step_m: f64,

    /// Most moves tried in each direction at each candidate
    pub max_increments: usize,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            initial_index_step: 16,
            initial_lane_step_m: 1.0,
            max_increments: 3,
        }
    }
}

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Search for offsets which lower the lap time given by `estimator`.
///
/// The path must already be optimised and have an up to date speed profile. Points fixed before
/// the search are left alone. Points the search keeps a move at are left fixed.
pub fn search_lanes(
    path: &mut Path,
    car: &dyn CarModel,
    estimator: &dyn Fn(&Path) -> f64,
    ctx: &mut RunContext,
) {
    let params = path.options.search.clone();
    let pinned_before: Vec<bool> = path.points.iter().map(|p| p.fixed).collect();

    let mut best = estimator(path);
    let mut index_step = params.initial_index_step.max(1);
    let mut lane_step_m = params.initial_lane_step_m;

    debug!(
        target: ctx.target(),
        "Lane search starting from {:.3} s",
        best
    );

    for pass in 0..SEARCH_PASSES {
        for i in path.ring().stepped(index_step) {
            if pinned_before[i] {
                continue;
            }

            let mut improved = false;
            for &dir in &[1.0, -1.0] {
                for _ in 0..params.max_increments {
                    match try_move(path, car, estimator, i, dir * lane_step_m, best, ctx) {
                        Some(time) => {
                            best = time;
                            improved = true;
                        }
                        None => break,
                    }
                }

                if improved {
                    break;
                }
            }
        }

        debug!(
            target: ctx.target(),
            "Lane search pass {} (every {} samples, {:.3} m) done, lap time {:.3} s",
            pass,
            index_step,
            lane_step_m,
            best
        );

        index_step = (index_step / 2).max(1);
        lane_step_m *= 0.5;
    }
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Pin point `i` at its offset moved by `delta_m` and relax the path around it. Keeps the move
/// and returns the new lap time if it beats `best`, otherwise restores the path.
fn try_move(
    path: &mut Path,
    car: &dyn CarModel,
    estimator: &dyn Fn(&Path) -> f64,
    i: usize,
    delta_m: f64,
    best: f64,
    ctx: &mut RunContext,
) -> Option<f64> {
    let snapshot = path.points.clone();

    let old = path.points[i].offset_m;
    let new = path.set_offset_hard(i, old + delta_m);
    if (new - old).abs() < MIN_MOVE_M {
        path.points = snapshot;
        return None;
    }
    path.points[i].fixed = true;

    solve(path, car, spring::optimise_level, ctx);
    let time = estimator(path);

    ctx.stats.search_trials += 1;
    trace!(
        target: ctx.target(),
        "Point {} moved {:+.3} m to {:.3} m, lap time {:.4} s (best {:.4} s)",
        i,
        delta_m,
        new,
        time,
        best
    );

    if time < best {
        ctx.stats.search_accepted += 1;
        Some(time)
    } else {
        path.points = snapshot;
        None
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
