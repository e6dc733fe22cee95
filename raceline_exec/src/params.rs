//! # Racing Line Executable Parameters
//!
//! This module provides parameters for the racing line executable.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use crate::car::PointMassCar;
use crate::line_ctrl;
use crate::splice::PitLaneParams;
use crate::track::SegmentParams;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RacelineExecParams {
    /// Track segmentation parameters
    pub segment: SegmentParams,

    /// The car the path is optimised for
    pub car: PointMassCar,

    /// Racing line control parameters
    pub line: line_ctrl::Params,

    /// Pit lane to splice onto the racing line, if the track has one
    pub pit: Option<PitLaneParams>,
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::optim::Optimiser;
    use crate::path::{BumpMode, Lane};

    #[test]
    fn test_params_file() {
        let path = std::env::temp_dir().join("raceline_exec_params_test.toml");
        std::fs::write(
            &path,
            r#"
[segment]
spacing_m = 2.0

[car]
mass_kg = 650.0

[line]
lane = "Left"
fuel_recalc_kg = 2.5

[line.options]
optimiser = "Spring"
bump_mode = "Damped"
bend_factors = [1.01, 1.0]

[line.options.spring]
iterations = 100

[pit]
exit_m = 300.0
"#,
        )
        .unwrap();

        let params: RacelineExecParams = util::params::load_file(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(params.segment.spacing_m, 2.0);
        assert_eq!(params.segment.wall_margin_m, SegmentParams::default().wall_margin_m);
        assert_eq!(params.car.mass_kg, 650.0);
        assert_eq!(params.car.mu, PointMassCar::default().mu);
        assert_eq!(params.line.lane, Lane::Left);
        assert_eq!(params.line.fuel_recalc_kg, 2.5);
        assert_eq!(params.line.options.optimiser, Optimiser::Spring);
        assert_eq!(params.line.options.bump_mode, BumpMode::Damped);
        assert_eq!(params.line.options.bend_factors, vec![1.01, 1.0]);
        assert_eq!(params.line.options.spring.iterations, 100);
        assert_eq!(params.line.options.spring.exponent, 2.1);

        let pit = params.pit.unwrap();
        assert_eq!(pit.exit_m, 300.0);
        assert_eq!(pit.offset_m, PitLaneParams::default().offset_m);
        assert_eq!(RacelineExecParams::default().pit, None);
    }
}
