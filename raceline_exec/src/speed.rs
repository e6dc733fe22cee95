//! # Speed profile
//!
//! The speed profile is built in three stages. First each point gets the highest speed the car
//! could take it at in isolation. Braking is then propagated backwards around the loop, so that
//! the car can always slow down in time for the points ahead, and finally acceleration is
//! propagated forwards, so that the car is never asked to gain speed faster than it can.
//!
//! Both propagations walk the loop twice so that limits near the start line are carried across
//! it.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::debug;
use track_if::car::CarModel;

use crate::bump::RIDE_HEIGHT_BRAKE_M;
use crate::context::RunContext;
use crate::path::Path;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Number of times each propagation walks the loop.
const PROPAGATION_PASSES: usize = 2;

/// Lowest mean speed used when estimating the time taken over a segment.
const MIN_SEGMENT_SPEED_MS: f64 = 0.1;

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Set the speeds of every point to the car's maximum speed at that point.
pub fn calc_max_speeds(path: &mut Path, car: &dyn CarModel) {
    for i in 0..path.len() {
        let spd = car.max_speed(path.curvatures(i), path.conditions(i));

        let p = &mut path.points[i];
        p.max_spd_ms = spd;
        p.spd_ms = spd;
        p.acc_spd_ms = spd;
    }
}

/// Lower the speed of every point which is too fast to brake for the point after it.
pub fn propagate_braking(path: &mut Path, car: &dyn CarModel) {
    let n = path.len();
    if n < 2 {
        return;
    }
    let ring = path.ring();

    for _ in 0..PROPAGATION_PASSES {
        for i in (0..n).rev() {
            let next = ring.next(i);
            let next_spd = path.points[next].spd_ms;
            if path.points[i].spd_ms <= next_spd {
                continue;
            }

            let entry_spd = car.braking(
                path.curvatures(i),
                path.curvatures(next),
                next_spd,
                path.arc_dist(i),
                path.conditions(i),
            );

            let p = &mut path.points[i];
            p.spd_ms = p.spd_ms.min(entry_spd);

            // Off the ground the car can't brake at all
            if p.h_m > RIDE_HEIGHT_BRAKE_M {
                p.spd_ms = next_spd;
            }

            p.acc_spd_ms = p.acc_spd_ms.min(p.spd_ms);
        }
    }
}

/// Lower the speed of every point which the car can't accelerate up to from the point before it.
pub fn propagate_acceleration(path: &mut Path, car: &dyn CarModel) {
    let n = path.len();
    if n < 2 {
        return;
    }
    let ring = path.ring();

    for _ in 0..PROPAGATION_PASSES {
        for i in 0..n {
            let next = ring.next(i);
            let spd = path.points[i].acc_spd_ms;
            if path.points[next].acc_spd_ms <= spd {
                continue;
            }

            let exit_spd = car.acceleration(
                path.curvatures(i),
                path.curvatures(next),
                spd,
                path.arc_dist(i),
                path.conditions(i),
            );

            let p = &mut path.points[next];
            p.acc_spd_ms = p.acc_spd_ms.min(exit_spd);
        }
    }
}

/// Recalculate the full speed profile of the path.
pub fn calc_speeds(path: &mut Path, car: &dyn CarModel, ctx: &mut RunContext) {
    calc_max_speeds(path, car);
    propagate_braking(path, car);
    propagate_acceleration(path, car);

    ctx.stats.speed_calcs += 1;
    debug!(
        target: ctx.target(),
        "Speeds calculated, estimated lap time {:.3} s",
        estimate_lap_time(path)
    );
}

/// Estimate the time taken to drive one lap of the path at its speed profile.
pub fn estimate_lap_time(path: &Path) -> f64 {
    let ring = path.ring();

    (0..path.len())
        .map(|i| {
            let next = ring.next(i);
            let spd = 0.5 * (path.points[i].acc_spd_ms + path.points[next].acc_spd_ms);
            path.arc_dist(i) / spd.max(MIN_SEGMENT_SPEED_MS)
        })
        .sum()
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
    fn test_speeds_ordered() {
        let car = test_car();
        let mut path = Path::new(oval_arc(Turn::Left), &car, PathOptions::default());
        let mut ctx = RunContext::new("test");

        calc_speeds(&mut path, &car, &mut ctx);
        assert_eq!(ctx.stats.speed_calcs, 1);

        for p in path.points.iter() {
            assert!(p.spd_ms <= p.max_spd_ms);
            assert!(p.acc_spd_ms <= p.spd_ms);
            assert!(p.acc_spd_ms > 0.0);
        }
    }

    #[test]
    fn test_braking_is_feasible() {
        let car = test_car();
        let mut path = Path::new(oval_arc(Turn::Left), &car, PathOptions::default());
        calc_max_speeds(&mut path, &car);
        propagate_braking(&mut path, &car);

        let ring = path.ring();
        for i in 0..path.len() {
            let next = ring.next(i);
            let limit = car.braking(
                path.curvatures(i),
                path.curvatures(next),
                path.points[next].spd_ms,
                path.arc_dist(i),
                path.conditions(i),
            );
            assert!(path.points[i].spd_ms <= limit + 1e-6);
        }
    }

    #[test]
    fn test_braking_into_bend() {
        let car = test_car();
        let mut path = Path::new(oval_arc(Turn::Left), &car, PathOptions::default());
        let mut ctx = RunContext::new("test");
        calc_speeds(&mut path, &car, &mut ctx);

        let ring = path.ring();
        for bend in path.track.bends.iter() {
            for j in 1..=5 {
                let i = ring.offset(bend.start, -(j as isize));
                let next = ring.next(i);
                assert!(path.points[i].spd_ms > path.points[next].spd_ms);
            }

            for j in 0..5 {
                let i = ring.offset(bend.end, j as isize);
                let next = ring.next(i);
                assert!(path.points[next].acc_spd_ms > path.points[i].acc_spd_ms);
            }
        }
    }

    #[test]
    fn test_airborne_points_dont_brake() {
        let car = test_car();
        let mut path = Path::new(oval_arc(Turn::Left), &car, PathOptions::default());
        calc_max_speeds(&mut path, &car);

        let start = path.track.bends[0].start;
        let ring = path.ring();
        let before = ring.prev(start);
        path.points[before].h_m = 0.5;
        propagate_braking(&mut path, &car);

        assert_eq!(path.points[before].spd_ms, path.points[start].spd_ms);
    }

    #[test]
    fn test_lap_time_on_circle() {
        let car = test_car();
        let mut path = Path::new(circle_arc(50.0, 3.0, Turn::Left), &car, PathOptions::default());
        let mut ctx = RunContext::new("test");
        calc_speeds(&mut path, &car, &mut ctx);

        // Constant speed all the way round
        let spd = path.points[0].acc_spd_ms;
        assert!(path.points.iter().all(|p| (p.acc_spd_ms - spd).abs() < 1e-6));

        let expected = path.track.length_m / spd;
        assert!((estimate_lap_time(&path) - expected).abs() / expected < 1e-3);
    }
}
