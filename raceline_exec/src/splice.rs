//! # Pit lane splicing
//!
//! The pit lane is a detour from the racing line between an entry and an exit position. The
//! spliced path leaves the racing line along a smoothstep transition, holds the pit offset, and
//! rejoins the racing line along a mirrored transition. Every spliced point is fixed so that
//! later optimisation leaves the detour alone, and its speed is capped at the pit lane limit.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::info;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use track_if::car::CarModel;
use util::maths::{lerp, smoothstep};

use crate::context::RunContext;
use crate::path::Path;
use crate::speed::{calc_max_speeds, propagate_acceleration, propagate_braking};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Parameters of a pit lane detour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PitLaneParams {
    /// Position along the track at which the detour leaves the racing line
    pub entry_m: f64,

    /// Position along the track at which the detour rejoins the racing line
    pub exit_m: f64,

    /// Offset of the pit lane from the centreline
    pub offset_m: f64,

    /// Length of the transitions between the racing line and the pit lane
    pub transition_m: f64,

    /// Speed limit in the pit lane
    pub speed_limit_ms: f64,

    /// Allow the detour to use the full extent of the track rather than the raceable width
    pub use_extent: bool,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum SpliceError {
    #[error("The pit entry and exit are both at sample {0}")]
    EntryEqualsExit(usize),

    #[error("The pit lane transition length must be positive, found {0} m")]
    InvalidTransition(f64),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for PitLaneParams {
    fn default() -> Self {
        Self {
            entry_m: 0.0,
            exit_m: 200.0,
            offset_m: 6.0,
            transition_m: 40.0,
            speed_limit_ms: 22.2,
            use_extent: true,
        }
    }
}

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Build a copy of `main` which takes the pit lane between the entry and exit.
pub fn splice_pit_lane(
    main: &Path,
    params: &PitLaneParams,
    car: &dyn CarModel,
    ctx: &mut RunContext,
) -> Result<Path, SpliceError> {
    if !(params.transition_m > 0.0) {
        return Err(SpliceError::InvalidTransition(params.transition_m));
    }

    let track = main.track.clone();
    let entry = track.index_from_pos(params.entry_m);
    let exit = track.index_from_pos(params.exit_m);
    if entry == exit {
        return Err(SpliceError::EntryEqualsExit(entry));
    }

    let mut path = main.clone();
    let ring = path.ring();
    let span = ring.forward_dist(entry, exit);

    for g in 0..=span {
        let i = ring.offset(entry, g as isize);

        let d_in = g as f64 * track.delta_m;
        let d_out = (span - g) as f64 * track.delta_m;
        let w = smoothstep(d_in.min(d_out) / params.transition_m);

        let (lo, hi) = if params.use_extent {
            path.extent_bounds(i)
        } else {
            path.bounds(i)
        };
        let pit_m = params.offset_m.max(lo).min(hi);

        let t = lerp(main.points[i].offset_m, pit_m, w);
        path.apply_offset(i, t.max(lo).min(hi));
        path.points[i].fixed = true;
    }

    path.calc_all();
    calc_max_speeds(&mut path, car);
    for g in 0..=span {
        let p = &mut path.points[ring.offset(entry, g as isize)];
        p.max_spd_ms = p.max_spd_ms.min(params.speed_limit_ms);
        p.spd_ms = p.max_spd_ms;
        p.acc_spd_ms = p.max_spd_ms;
    }
    propagate_braking(&mut path, car);
    propagate_acceleration(&mut path, car);
    ctx.stats.speed_calcs += 1;

    info!(
        target: ctx.target(),
        "Pit lane spliced over samples {} to {} ({} samples)",
        entry,
        exit,
        span + 1
    );

    Ok(path)
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
