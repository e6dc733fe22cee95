//! Path tuning options

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use crate::optim::{Optimiser, SearchParams, SpringParams};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Options controlling how a path is optimised.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathOptions {
    /// Which optimiser to use
    pub optimiser: Optimiser,

    /// Curvature amplification factor applied at bend entries and exits
    pub factor: f64,

    /// Per bend amplification factors, indexed by bend. Bends past the end of the list use
    /// `factor`.
    pub bend_factors: Vec<f64>,

    /// Fraction of each correction which is also applied to the corrected point's neighbours
    pub apex_factor: f64,

    /// How the optimisers respond to the car leaving the ground over bumps
    pub bump_mode: BumpMode,

    /// Largest extra margin kept on the outside of a turn
    pub safety_limit_m: f64,

    /// Extra margin kept on the outside of a turn per unit curvature
    pub safety_multiplier: f64,

    /// Furthest the path may go left of the centreline
    pub max_left_m: Option<f64>,

    /// Furthest the path may go right of the centreline
    pub max_right_m: Option<f64>,

    /// Margin kept between the side of the car and the raceable edge
    pub edge_margin_m: f64,

    /// Extra margin kept on sides bounded by a wall
    pub wall_buffer_m: f64,

    /// Distance ahead over which the look ahead curvature is averaged
    pub fwd_k_range_m: f64,

    /// Spring optimiser parameters
    pub spring: SpringParams,

    /// Lane search parameters
    pub search: SearchParams,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// How the optimisers respond to ride height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BumpMode {
    /// Ride height is ignored
    Off,

    /// Ride height is estimated after the first solve, and corrections are damped where the car
    /// is light on the ground
    Damped,
}

/// Which lane of the track a path is restricted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Lane {
    /// The full raceable width
    Race,

    /// Left of the centreline only
    Left,

    /// Right of the centreline only
    Right,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for PathOptions {
    fn default() -> Self {
        Self {
            optimiser: Optimiser::Clothoid,
            factor: 1.005,
            bend_factors: Vec::new(),
            apex_factor: 0.0,
            bump_mode: BumpMode::Off,
            safety_limit_m: 1.5,
            safety_multiplier: 100.0,
            max_left_m: None,
            max_right_m: None,
            edge_margin_m: 0.02,
            wall_buffer_m: 0.5,
            fwd_k_range_m: 60.0,
            spring: SpringParams::default(),
            search: SearchParams::default(),
        }
    }
}

impl PathOptions {
    /// The amplification factor for the given bend.
    pub fn factor_for(&self, bend: Option<usize>) -> f64 {
        bend.and_then(|b| self.bend_factors.get(b).copied())
            .unwrap_or(self.factor)
    }

    /// These options restricted to the given lane.
    pub fn for_lane(&self, lane: Lane) -> Self {
        let mut options = self.clone();
        match lane {
            Lane::Race => (),
            Lane::Left => options.max_right_m = Some(0.0),
            Lane::Right => options.max_left_m = Some(0.0),
        }
        options
    }
}

impl std::str::FromStr for Lane {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "race" => Ok(Lane::Race),
            "left" => Ok(Lane::Left),
            "right" => Ok(Lane::Right),
            _ => Err(format!("Unknown lane \"{}\", expected race, left or right", s)),
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_factor_for() {
        let options = PathOptions {
            bend_factors: vec![1.01, 1.02],
            ..PathOptions::default()
        };

        assert_eq!(options.factor_for(Some(1)), 1.02);
        assert_eq!(options.factor_for(Some(2)), options.factor);
        assert_eq!(options.factor_for(None), options.factor);
    }

    #[test]
    fn test_lanes() {
        let options = PathOptions::default();

        assert_eq!(options.for_lane(Lane::Race), options);
        assert_eq!(options.for_lane(Lane::Left).max_right_m, Some(0.0));
        assert_eq!(options.for_lane(Lane::Right).max_left_m, Some(0.0));
        assert_eq!("Left".parse::<Lane>(), Ok(Lane::Left));
        assert!("middle".parse::<Lane>().is_err());
    }
}
