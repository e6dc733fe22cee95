//! Implementations for the LineCtrl state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{info, trace};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

// Internal
use super::{LineCtrlError, Params};
use crate::car::PointMassCar;
use crate::context::{RunContext, RunStats};
use crate::optim::{make_or_load_smooth_path, make_smooth_path};
use crate::path::{Path, PointInfo, PointRow};
use crate::speed::{calc_speeds, estimate_lap_time};
use crate::track::Track;
use util::{
    archive::{ArchiveError, Archiver},
    module::State,
    session::Session,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Racing line control module state
#[derive(Default)]
pub struct LineCtrl {
    pub(crate) params: Params,

    car: PointMassCar,

    path: Option<Path>,

    ctx: RunContext,

    /// Fuel burnt or added since the speeds were last calculated
    pending_fuel_kg: f64,

    /// Lap time at the last speed calculation
    lap_time_s: f64,

    arch_output: Archiver,
}

/// Data needed to initialise LineCtrl.
pub struct InitData {
    /// The segmented track
    pub track: Arc<Track>,

    /// The car the path is optimised for
    pub car: PointMassCar,

    /// Module parameters
    pub params: Params,
}

/// Input data to LineCtrl.
#[derive(Clone, Copy, Default, Debug)]
pub struct InputData {
    /// Position of the car along the track.
    ///
    /// Units: meters
    pub track_pos_m: f64,

    /// Change in the car's fuel load since the last cycle.
    ///
    /// Units: kilograms
    pub fuel_change_kg: f64,
}

/// Status report for LineCtrl processing.
#[derive(Clone, Copy, Default, Serialize, Debug)]
pub struct StatusReport {
    /// The speed profile was recalculated this cycle
    pub speeds_recalculated: bool,

    /// Estimated lap time at the current speed profile
    pub lap_time_s: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl State for LineCtrl {
    type InitData = InitData;
    type InitError = LineCtrlError;

    type InputData = InputData;
    type OutputData = PointInfo;
    type StatusReport = StatusReport;
    type ProcError = LineCtrlError;

    /// Initialise the LineCtrl module, optimising or loading the path.
    fn init(
        &mut self,
        init_data: Self::InitData,
        session: Option<&Session>,
    ) -> Result<(), Self::InitError> {
        self.params = init_data.params;
        self.car = init_data.car;
        self.ctx = RunContext::new(&format!("line_ctrl::{:?}", self.params.lane).to_lowercase());
        self.pending_fuel_kg = 0.0;

        let options = self.params.options.for_lane(self.params.lane);

        let path = match self.params.cache_file {
            Some(ref file) => make_or_load_smooth_path(
                init_data.track,
                &self.car,
                options,
                &PathBuf::from(file),
                &mut self.ctx,
            ),
            None => make_smooth_path(init_data.track, &self.car, options, &mut self.ctx),
        };

        self.lap_time_s = estimate_lap_time(&path);
        self.path = Some(path);

        if let Some(session) = session {
            self.arch_output = Archiver::from_path(session, "line_ctrl/output.csv")?;
        }

        info!(
            target: self.ctx.target(),
            "LineCtrl initialised, estimated lap time {:.3} s",
            self.lap_time_s
        );

        Ok(())
    }

    /// Report the state of the path at the car's position.
    fn proc(
        &mut self,
        input_data: &Self::InputData,
    ) -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError> {
        let path = self.path.as_mut().ok_or(LineCtrlError::NotInitialised)?;
        let mut report = StatusReport::default();

        if input_data.fuel_change_kg != 0.0 {
            self.car.change_fuel(input_data.fuel_change_kg);
            self.pending_fuel_kg += input_data.fuel_change_kg.abs();
        }

        // The fuel load changes slowly, so only recalculate once it has moved far enough to matter
        if self.pending_fuel_kg >= self.params.fuel_recalc_kg {
            calc_speeds(path, &self.car, &mut self.ctx);
            self.lap_time_s = estimate_lap_time(path);
            self.pending_fuel_kg = 0.0;
            report.speeds_recalculated = true;
        }
        report.lap_time_s = self.lap_time_s;

        let output = path.get_point_info(input_data.track_pos_m);

        trace!(
            target: self.ctx.target(),
            "LineCtrl output: idx {}, offset {:.3} m, speed {:.2} m/s",
            output.idx,
            output.offset_m,
            output.spd_ms
        );

        match self.arch_output.serialise(PointRow::from(output)) {
            Ok(()) | Err(ArchiveError::NotInitialised) => (),
            Err(e) => return Err(e.into()),
        }

        Ok((output, report))
    }
}

impl LineCtrl {
    /// The path, once initialised.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_ref()
    }

    /// Counters accumulated while building and maintaining the path.
    pub fn stats(&self) -> &RunStats {
        &self.ctx.stats
    }

    /// The car the speeds are currently calculated for.
    pub fn car(&self) -> &PointMassCar {
        &self.car
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::optim::Optimiser;
    use crate::path::{Lane, PathOptions};
    use crate::test_utils::small_oval_arc;

    fn init_data(params: Params) -> InitData {
        InitData {
            track: small_oval_arc(),
            car: PointMassCar {
                fuel_kg: 50.0,
                ..PointMassCar::default()
            },
            params,
        }
    }

    fn spring_params() -> Params {
        let mut options = PathOptions::default();
        options.optimiser = Optimiser::Spring;
        options.spring.iterations = 50;

        Params {
            options,
            ..Params::default()
        }
    }

    #[test]
    fn test_proc_before_init() {
        let mut ctrl = LineCtrl::default();
        assert!(matches!(
            ctrl.proc(&InputData::default()),
            Err(LineCtrlError::NotInitialised)
        ));
    }

    #[test]
    fn test_proc_reports_path() {
        let mut ctrl = LineCtrl::default();
        ctrl.init(init_data(spring_params()), None).unwrap();

        let (output, report) = ctrl
            .proc(&InputData {
                track_pos_m: 20.0,
                fuel_change_kg: 0.0,
            })
            .unwrap();

        assert_eq!(output, ctrl.path().unwrap().get_point_info(20.0));
        assert!(!report.speeds_recalculated);
        assert!(report.lap_time_s > 0.0);
    }

    #[test]
    fn test_fuel_recalculates_speeds() {
        let mut ctrl = LineCtrl::default();
        ctrl.init(init_data(spring_params()), None).unwrap();

        let burn = InputData {
            track_pos_m: 0.0,
            fuel_change_kg: -0.6,
        };
        let (_, first) = ctrl.proc(&burn).unwrap();
        assert!(!first.speeds_recalculated);

        let (_, second) = ctrl.proc(&burn).unwrap();
        assert!(second.speeds_recalculated);
        assert!(second.lap_time_s <= first.lap_time_s);
        assert!((ctrl.car().fuel_kg - 48.8).abs() < 1e-9);
    }

    #[test]
    fn test_lane_restriction() {
        let mut ctrl = LineCtrl::default();
        ctrl.init(
            init_data(Params {
                lane: Lane::Left,
                ..spring_params()
            }),
            None,
        )
        .unwrap();

        let path = ctrl.path().unwrap();
        for i in 0..path.len() {
            assert!(path.points[i].offset_m <= path.bounds(i).1);
            assert!(path.bounds(i).1 <= -path.margin_m() + 1e-12);
        }
    }

    #[test]
    fn test_output_archived() {
        let session = Session::new(
            "line_ctrl_test",
            std::env::temp_dir().join("raceline_line_ctrl_sessions"),
        )
        .unwrap();

        let mut ctrl = LineCtrl::default();
        ctrl.init(init_data(spring_params()), Some(&session)).unwrap();
        for i in 0..3 {
            ctrl.proc(&InputData {
                track_pos_m: 10.0 * i as f64,
                fuel_change_kg: 0.0,
            })
            .unwrap();
        }

        let csv = std::fs::read_to_string(session.arch_root.join("line_ctrl/output.csv")).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("idx,pos_m,x_m,y_m"));

        std::fs::remove_dir_all(&session.session_root).ok();
    }

    #[test]
    fn test_cache_is_reused() {
        let file = std::env::temp_dir().join("raceline_line_ctrl_cache_test.txt");
        std::fs::remove_file(&file).ok();
        let params = Params {
            cache_file: Some(file.to_string_lossy().into_owned()),
            ..spring_params()
        };

        let mut first = LineCtrl::default();
        first.init(init_data(params.clone()), None).unwrap();
        assert!(!first.stats().loaded_from_cache);
        assert!(file.exists());

        let mut second = LineCtrl::default();
        second.init(init_data(params), None).unwrap();
        assert!(second.stats().loaded_from_cache);

        let a = first.path().unwrap().offsets();
        let b = second.path().unwrap().offsets();
        for (x, y) in a.iter().zip(b.iter()) {
            assert!((x - y).abs() < 1e-8);
        }

        std::fs::remove_file(&file).ok();
    }
}
