//! # Path optimisation
//!
//! All optimisers work coarse to fine. At each level only every `step`-th point is moved, with
//! the points in between filled in afterwards, and `step` halves from level to level until every
//! point is optimised. Coarse levels quickly find the overall shape of the path, fine levels
//! smooth it.
//!
//! The first `step` is the largest power of two not above a quarter of the loop, so halving
//! always ends on exactly 1. The coarsest level therefore has between four and eight active
//! points.
//!
//! When bump mode is on the path is solved once, ride heights are estimated from the resulting
//! speeds, and the finer levels are solved again with corrections damped where the car is light.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod clothoid;
mod search;
mod spring;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::path::Path as FilePath;
use std::sync::Arc;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use track_if::car::CarModel;

use crate::bump::calc_ride_heights;
use crate::cache::{load_path, save_path};
use crate::context::RunContext;
use crate::path::{BumpMode, Path, PathOptions};
use crate::speed::{calc_speeds, estimate_lap_time};
use crate::track::Track;

pub use search::{search_lanes, SearchParams};
pub use spring::SpringParams;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Fraction of the loop, as a divisor, spanned by one step of the coarsest level.
const COARSE_DIVISOR: usize = 4;

/// Level the solve restarts from once ride heights are known.
const BUMP_RESTART_STEP: usize = 4;

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Available path optimisers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Optimiser {
    /// Curvature blending with amplification through bend entries and exits
    Clothoid,

    /// Relaxation of a chain of torsional springs
    Spring,

    /// Spring relaxation followed by a lane search on estimated lap time
    Search,
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Seven consecutive active points centred on the point being optimised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Window {
    pub idx: [usize; 7],
}

/// A single level of an optimiser.
type LevelFn = fn(&mut Path, usize, bool, &mut RunContext);

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Window {
    /// The window centred on `active[j]`, wrapping around the loop.
    pub fn around(active: &[usize], j: usize) -> Self {
        let m = active.len();
        let mut idx = [0; 7];
        if m == 0 {
            return Self { idx };
        }

        for (d, slot) in idx.iter_mut().enumerate() {
            *slot = active[(j + m * 3 + d - 3) % m];
        }

        Self { idx }
    }

    /// The point being optimised.
    pub fn centre(&self) -> usize {
        self.idx[3]
    }
}

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Create a path over the track and optimise it.
pub fn make_smooth_path(
    track: Arc<Track>,
    car: &dyn CarModel,
    options: PathOptions,
    ctx: &mut RunContext,
) -> Path {
    let mut path = Path::new(track, car, options);

    info!(
        target: ctx.target(),
        "Optimising path over {} samples with {:?} optimiser",
        path.len(),
        path.options.optimiser
    );

    optimise(&mut path, car, ctx);

    info!(
        target: ctx.target(),
        "Path optimised, estimated lap time {:.3} s",
        estimate_lap_time(&path)
    );

    path
}

/// Load the path from the cache file if it matches the track, otherwise optimise a new path and
/// write it to the cache file.
pub fn make_or_load_smooth_path(
    track: Arc<Track>,
    car: &dyn CarModel,
    options: PathOptions,
    cache_path: &FilePath,
    ctx: &mut RunContext,
) -> Path {
    match load_path(cache_path, track.clone(), car, options.clone(), ctx) {
        Ok(path) => {
            ctx.stats.loaded_from_cache = true;
            info!(
                target: ctx.target(),
                "Path loaded from {:?}",
                cache_path
            );
            return path;
        }
        Err(e) => warn!(
            target: ctx.target(),
            "Could not load path from {:?}, optimising a new one: {}",
            cache_path,
            e
        ),
    }

    let path = make_smooth_path(track, car, options, ctx);

    if let Err(e) = save_path(&path, cache_path) {
        warn!(
            target: ctx.target(),
            "Could not save path to {:?}: {}",
            cache_path,
            e
        );
    }

    path
}

/// Optimise the path with the optimiser set in its options, and recalculate its speeds.
pub fn optimise(path: &mut Path, car: &dyn CarModel, ctx: &mut RunContext) {
    match path.options.optimiser {
        Optimiser::Clothoid => solve(path, car, clothoid::optimise_level, ctx),
        Optimiser::Spring => solve(path, car, spring::optimise_level, ctx),
        Optimiser::Search => {
            solve(path, car, spring::optimise_level, ctx);
            search_lanes(path, car, &estimate_lap_time, ctx);
        }
    }
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Run every level of an optimiser from coarse to fine, then recalculate the path.
fn solve(path: &mut Path, car: &dyn CarModel, level: LevelFn, ctx: &mut RunContext) {
    let start = initial_step(path.len());

    run_levels(path, start, false, level, ctx);
    path.calc_all();
    calc_speeds(path, car, ctx);

    if path.options.bump_mode == BumpMode::Damped {
        calc_ride_heights(path, ctx);

        run_levels(path, start.min(BUMP_RESTART_STEP), true, level, ctx);
        path.calc_all();
        calc_speeds(path, car, ctx);
    }
}

fn run_levels(path: &mut Path, start: usize, bump: bool, level: LevelFn, ctx: &mut RunContext) {
    for step in steps_from(start) {
        level(path, step, bump, ctx);
        debug!(
            target: ctx.target(),
            "Level {} done ({} sweeps, {} clamped steps so far)",
            step,
            ctx.stats.optim_sweeps,
            ctx.stats.clamped_steps
        );
    }
}

/// The coarsest step for a loop of `n` points, the largest power of two not above `n / 4`.
fn initial_step(n: usize) -> usize {
    let mut step = 1;
    while step * 2 * COARSE_DIVISOR <= n {
        step *= 2;
    }
    step
}

/// The steps of every level starting from `start` and halving down to 1.
fn steps_from(start: usize) -> Vec<usize> {
    let mut steps = Vec::new();
    let mut step = start.max(1);
    loop {
        steps.push(step);
        if step == 1 {
            break;
        }
        step = (step + 1) / 2;
    }
    steps
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_utils::{crest_oval_arc, oval_arc, test_car};
    use track_if::car::TrackConditions;
    use track_if::track::Turn;

    #[test]
    fn test_steps() {
        assert_eq!(initial_step(333), 64);
        assert_eq!(initial_step(256), 64);
        assert_eq!(initial_step(255), 32);
        assert_eq!(initial_step(7), 1);
        assert_eq!(initial_step(8), 2);
        assert_eq!(initial_step(3), 1);
        assert_eq!(steps_from(64), vec![64, 32, 16, 8, 4, 2, 1]);
        assert_eq!(steps_from(3), vec![3, 2, 1]);
        assert_eq!(steps_from(0), vec![1]);
    }

    #[test]
    fn test_window_wraps() {
        let active = [0, 4, 8, 12, 16, 20, 24, 28];

        assert_eq!(Window::around(&active, 0).idx, [20, 24, 28, 0, 4, 8, 12]);
        assert_eq!(Window::around(&active, 7).idx, [16, 20, 24, 28, 0, 4, 8]);
        assert_eq!(Window::around(&active, 7).centre(), 28);
    }

    #[test]
    fn test_oval_apex_cut() {
        let car = test_car();
        let mut ctx = RunContext::new("test");
        let path = make_smooth_path(oval_arc(Turn::Left), &car, PathOptions::default(), &mut ctx);
        let n = path.len();
        let ring = path.ring();

        for i in 0..n {
            let (lo, hi) = path.bounds(i);
            assert!(path.points[i].offset_m >= lo && path.points[i].offset_m <= hi);
        }

        // Outside, inside, outside through each bend. Left turns have their inside on the left,
        // which is a negative offset.
        for bend in path.track.bends.iter() {
            let apex = bend.mid(n);
            let entry = ring.offset(bend.start, -10);
            let exit = ring.offset(bend.end, 10);

            assert!(path.points[apex].offset_m < -2.0);
            assert!(path.points[entry].offset_m > 1.0);
            assert!(path.points[exit].offset_m > 1.0);
        }

        // The straights between bends stay on the outside
        let bends = &path.track.bends;
        for (b, bend) in bends.iter().enumerate() {
            let next = &bends[(b + 1) % bends.len()];
            let exit = ring.offset(bend.end, 10);
            let entry = ring.offset(next.start, -10);
            let mid = ring.offset(exit, (ring.forward_dist(exit, entry) / 2) as isize);

            assert!(path.points[mid].offset_m > 1.0);
            for g in 0..=ring.forward_dist(exit, entry) {
                assert!(path.points[ring.offset(exit, g as isize)].offset_m > 0.5);
            }
        }

        assert!(ctx.stats.optim_sweeps > 0);
        assert_eq!(ctx.stats.speed_calcs, 1);
    }

    #[test]
    fn test_oval_speed_profile() {
        let car = test_car();
        let mut ctx = RunContext::new("test");
        let path = make_smooth_path(oval_arc(Turn::Left), &car, PathOptions::default(), &mut ctx);
        let ring = path.ring();

        for bend in path.track.bends.iter() {
            for j in 1..=5 {
                let i = ring.offset(bend.start, -(j as isize));
                assert!(path.points[i].spd_ms > path.points[ring.next(i)].spd_ms);
            }
            for j in 1..=5 {
                let i = ring.offset(bend.end, j as isize);
                assert!(path.points[i].acc_spd_ms > path.points[ring.prev(i)].acc_spd_ms);
            }
        }

        // The tightest point runs at the car's cornering limit
        let tightest = (0..path.len())
            .max_by(|&a, &b| {
                path.points[a]
                    .k
                    .abs()
                    .partial_cmp(&path.points[b].k.abs())
                    .unwrap()
            })
            .unwrap();
        let p = &path.points[tightest];
        let expected = car.max_speed(
            p.curvatures(),
            TrackConditions {
                friction: 1.0,
                roll_rad: p.roll_rad,
                pitch_rad: p.pitch_rad,
            },
        );
        assert!((p.max_spd_ms - expected).abs() < 1e-9);

        // No point is ever faster than its curvature allows
        for i in 0..path.len() {
            let p = &path.points[i];
            let limit = car.max_speed(path.curvatures(i), path.conditions(i));
            assert!(p.max_spd_ms <= limit + 1e-9);
            assert!(p.spd_ms <= p.max_spd_ms);
            assert!(p.acc_spd_ms <= p.spd_ms);
        }
    }

    #[test]
    fn test_idempotent() {
        let car = test_car();
        let track = oval_arc(Turn::Right);

        let a = make_smooth_path(
            track.clone(),
            &car,
            PathOptions::default(),
            &mut RunContext::new("a"),
        );
        let b = make_smooth_path(track, &car, PathOptions::default(), &mut RunContext::new("b"));

        assert_eq!(a.offsets(), b.offsets());
    }

    #[test]
    fn test_spring_apex_cut() {
        let car = test_car();
        let mut ctx = RunContext::new("test");
        let options = PathOptions {
            optimiser: Optimiser::Spring,
            ..PathOptions::default()
        };
        let path = make_smooth_path(oval_arc(Turn::Left), &car, options, &mut ctx);
        let n = path.len();

        for i in 0..n {
            let (lo, hi) = path.bounds(i);
            assert!(path.points[i].offset_m >= lo && path.points[i].offset_m <= hi);
        }
        for bend in path.track.bends.iter() {
            assert!(path.points[bend.mid(n)].offset_m < 0.0);
        }
    }

    #[test]
    fn test_bump_mode_solves_twice() {
        let car = test_car();
        let mut ctx = RunContext::new("test");
        let options = PathOptions {
            bump_mode: BumpMode::Damped,
            ..PathOptions::default()
        };
        let path = make_smooth_path(oval_arc(Turn::Left), &car, options, &mut ctx);

        assert_eq!(ctx.stats.speed_calcs, 2);
        assert!(path.points.iter().all(|p| p.h_m == 0.0));
    }

    #[test]
    fn test_bump_mode_damps_over_crest() {
        let car = test_car();
        let track = crest_oval_arc(Turn::Left);

        let mut ctx = RunContext::new("test");
        let options = PathOptions {
            bump_mode: BumpMode::Damped,
            ..PathOptions::default()
        };
        let damped = make_smooth_path(track.clone(), &car, options, &mut ctx);
        let plain = make_smooth_path(
            track.clone(),
            &car,
            PathOptions::default(),
            &mut RunContext::new("plain"),
        );
        let n = damped.len();

        assert_eq!(ctx.stats.speed_calcs, 2);
        assert!(plain.points.iter().all(|p| p.h_m == 0.0));

        let airborne: Vec<usize> = (0..n).filter(|&i| damped.points[i].h_m > 0.1).collect();
        assert!(!airborne.is_empty());

        for i in 0..n {
            let (lo, hi) = damped.bounds(i);
            assert!(damped.points[i].offset_m >= lo && damped.points[i].offset_m <= hi);
        }
        assert_ne!(damped.offsets(), plain.offsets());

        // From the same start, a level run with ride heights moves the airborne points
        // differently
        let mut with_heights = Path::new(track, &car, PathOptions::default());
        for i in 0..n {
            with_heights.points[i].h_m = damped.points[i].h_m;
        }
        let mut without = with_heights.clone();
        run_levels(&mut with_heights, 1, true, clothoid::optimise_level, &mut ctx);
        run_levels(&mut without, 1, false, clothoid::optimise_level, &mut ctx);

        let max_diff = airborne
            .iter()
            .map(|&i| (with_heights.points[i].offset_m - without.points[i].offset_m).abs())
            .fold(0.0, f64::max);
        assert!(max_diff > 1e-6);

        for i in 0..n {
            let (lo, hi) = with_heights.bounds(i);
            let offset = with_heights.points[i].offset_m;
            assert!(offset >= lo && offset <= hi);
        }
    }

    #[test]
    fn test_bounds_hold_after_every_level() {
        let car = test_car();
        let mut ctx = RunContext::new("test");
        let levels: [LevelFn; 2] = [clothoid::optimise_level, spring::optimise_level];

        for &level in levels.iter() {
            let mut path = Path::new(oval_arc(Turn::Right), &car, PathOptions::default());

            for step in steps_from(initial_step(path.len())) {
                level(&mut path, step, false, &mut ctx);

                for i in 0..path.len() {
                    let (lo, hi) = path.bounds(i);
                    let offset = path.points[i].offset_m;
                    assert!(
                        offset >= lo && offset <= hi,
                        "offset {} of point {} outside ({}, {}) after step {}",
                        offset,
                        i,
                        lo,
                        hi,
                        step
                    );
                }
            }
        }
    }
}
