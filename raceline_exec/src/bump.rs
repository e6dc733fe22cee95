//! # Ride height analysis
//!
//! Over crests the car can leave the ground, at which point it can neither turn nor brake. The
//! ride height is estimated by flying a point mass along the path at the solved speeds and
//! letting it fall under gravity, landing it whenever it would go below the surface.
//!
//! Because the car needs to be settled before it reaches a crest, the heights are smeared
//! backwards over a braking zone so each sample is at least as high as any sample shortly
//! after it.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::debug;

use crate::car::G_MS2;
use crate::context::RunContext;
use crate::path::Path;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Ride height above which the car is treated as unable to brake.
pub const RIDE_HEIGHT_BRAKE_M: f64 = 0.1;

/// Lowest speed used to fly the mass along the path.
const MIN_BALLISTIC_SPEED_MS: f64 = 10.0;

/// Length of track ahead of each sample over which its ride height is smeared.
const SMEAR_DIST_M: f64 = 15.0;

/// Number of laps flown. The first lap settles the state of the mass at the start line.
const NUM_LAPS: usize = 2;

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Damping applied to corrections made at a point with ride height `h_m`.
pub fn damping_for_height(h_m: f64) -> f64 {
    if h_m <= 0.07 {
        1.0
    } else if h_m <= 0.10 {
        0.97
    } else if h_m <= 0.20 {
        0.90
    } else if h_m <= 0.30 {
        0.80
    } else {
        0.70
    }
}

/// Estimate the ride height at every point of the path from its current speed profile.
pub fn calc_ride_heights(path: &mut Path, ctx: &RunContext) {
    let n = path.len();
    if n < 3 {
        return;
    }
    let ring = path.ring();

    let mut heights = vec![0.0; n];
    let mut z = path.points[0].pt.z;
    let mut vz = 0.0;

    for _ in 0..NUM_LAPS {
        for i in 0..n {
            let next = ring.next(i);
            let spd = path.points[i].acc_spd_ms.max(MIN_BALLISTIC_SPEED_MS);
            let dt = path.arc_dist(i) / spd;
            if dt <= 0.0 {
                continue;
            }

            let old_z = z;
            z += vz * dt - 0.5 * G_MS2 * dt * dt;
            vz -= G_MS2 * dt;

            let surface_z = path.points[next].pt.z;
            if z < surface_z {
                vz = vz.max((surface_z - old_z) / dt);
                z = surface_z;
            }

            heights[next] = z - surface_z;
        }
    }

    let window = ((SMEAR_DIST_M / path.track.delta_m).ceil() as usize).max(1);
    let mut max_h: f64 = 0.0;
    for i in 0..n {
        let h = (0..=window)
            .map(|j| heights[ring.offset(i, j as isize)])
            .fold(0.0, f64::max);
        path.points[i].h_m = h;
        max_h = max_h.max(h);
    }

    debug!(
        target: ctx.target(),
        "Ride heights calculated, highest {:.3} m",
        max_h
    );
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
