//! Main racing line executable entry point.
//!
//! # Architecture
//!
//! The executable precomputes the racing line for one track:
//!
//!     - Load the parameters and the track description
//!     - Segment the track into samples
//!     - Initialise LineCtrl, which loads the path from the cache or optimises a new one
//!     - Drive LineCtrl around one lap, archiving its output at every sample
//!     - Splice the pit lane onto the path if one is configured
//!     - Save a summary of the run into the session directory

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{
    eyre::{eyre, WrapErr},
    Report,
};
use log::{info, warn};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use structopt::StructOpt;

// Internal
use raceline_lib::{
    context::{RunContext, RunStats},
    line_ctrl::{self, LineCtrl},
    optim::Optimiser,
    params::RacelineExecParams,
    path::{Lane, PointRow},
    speed::estimate_lap_time,
    splice::splice_pit_lane,
    track::Track,
};
use track_if::track::TrackDesc;
use util::{
    archive::Archiver,
    logger::{logger_init, LevelFilter},
    module::State,
    session::Session,
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Name of the parameter file used when none is given on the command line.
const DEFAULT_PARAMS_FILE: &str = "raceline_exec.toml";

// ---------------------------------------------------------------------------
// STRUCTS
// ---------------------------------------------------------------------------

/// Command line options.
#[derive(Debug, StructOpt)]
#[structopt(name = "raceline_exec", about = "Precompute the racing line around a track")]
struct Opts {
    /// Track description file
    #[structopt(long, parse(from_os_str))]
    track: PathBuf,

    /// Parameter file, defaults to `raceline_exec.toml` in the params directory
    #[structopt(long, parse(from_os_str))]
    params: Option<PathBuf>,

    /// Lane to restrict the path to (race, left or right)
    #[structopt(long)]
    lane: Option<Lane>,

    /// Cache file to load the path from, or save it to
    #[structopt(long, parse(from_os_str))]
    cache: Option<PathBuf>,
}

/// Summary of the run saved into the session directory.
#[derive(Debug, Serialize)]
struct Summary {
    track_name: String,
    length_m: f64,
    num_samples: usize,
    num_bends: usize,
    lane: Lane,
    optimiser: Optimiser,
    lap_time_s: f64,
    pit_lap_time_s: Option<f64>,
    stats: RunStats,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    color_eyre::install()?;

    let opts = Opts::from_args();

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session =
        Session::new("raceline_exec", "sessions").wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(LevelFilter::Debug, &session).wrap_err("Failed to initialise logging")?;

    info!("Racing Line Executable\n");
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let mut params: RacelineExecParams = match opts.params {
        Some(ref file) => util::params::load_file(file)
            .wrap_err_with(|| format!("Could not load exec params from {:?}", file))?,
        None => match util::params::load(DEFAULT_PARAMS_FILE) {
            Ok(p) => p,
            Err(e) => {
                warn!("Could not load {}, using defaults: {}", DEFAULT_PARAMS_FILE, e);
                RacelineExecParams::default()
            }
        },
    };

    if let Some(lane) = opts.lane {
        params.line.lane = lane;
    }
    if let Some(ref cache) = opts.cache {
        params.line.cache_file = Some(cache.to_string_lossy().into_owned());
    }

    info!("Exec parameters loaded");

    let desc: TrackDesc = util::params::load_file(&opts.track)
        .wrap_err_with(|| format!("Could not load the track from {:?}", opts.track))?;

    // ---- SEGMENT THE TRACK ----

    let mut ctx = RunContext::new("segment");
    let track = Arc::new(
        Track::segment(desc, params.segment.clone(), &mut ctx)
            .wrap_err("Failed to segment the track")?,
    );

    // ---- INITIALISE LINE CONTROL ----

    let mut line_ctrl = LineCtrl::default();
    line_ctrl
        .init(
            line_ctrl::InitData {
                track: track.clone(),
                car: params.car.clone(),
                params: params.line.clone(),
            },
            Some(&session),
        )
        .wrap_err("Failed to initialise LineCtrl")?;

    // ---- DRIVE ONE LAP ----

    let mut lap_time_s = 0.0;
    for i in 0..track.len() {
        let (_, report) = line_ctrl
            .proc(&line_ctrl::InputData {
                track_pos_m: i as f64 * track.delta_m,
                fuel_change_kg: 0.0,
            })
            .wrap_err_with(|| format!("LineCtrl processing failed at sample {}", i))?;
        lap_time_s = report.lap_time_s;
    }

    info!("Racing line archived, estimated lap time {:.3} s", lap_time_s);

    // ---- PIT LANE ----

    let pit_lap_time_s = match params.pit {
        Some(ref pit) => {
            let path = line_ctrl
                .path()
                .ok_or_else(|| eyre!("LineCtrl has no path after initialisation"))?;

            let mut pit_ctx = RunContext::new("pit");
            let pit_path = splice_pit_lane(path, pit, line_ctrl.car(), &mut pit_ctx)
                .wrap_err("Failed to splice the pit lane")?;

            let mut arch = Archiver::from_path(&session, "pit_lane.csv")
                .wrap_err("Failed to create the pit lane archive")?;
            for i in 0..track.len() {
                let info = pit_path.get_point_info(i as f64 * track.delta_m);
                arch.serialise(PointRow::from(info))
                    .wrap_err("Failed to archive the pit lane")?;
            }

            let time = estimate_lap_time(&pit_path);
            info!("Pit lane archived, estimated lap time {:.3} s", time);
            Some(time)
        }
        None => None,
    };

    // ---- SUMMARY ----

    let summary = Summary {
        track_name: track.name.clone(),
        length_m: track.length_m,
        num_samples: track.len(),
        num_bends: track.bends.len(),
        lane: params.line.lane,
        optimiser: params.line.options.optimiser,
        lap_time_s,
        pit_lap_time_s,
        stats: line_ctrl.stats().clone(),
    };

    info!(
        "Run summary:\n{}",
        serde_json::to_string_pretty(&summary).wrap_err("Failed to serialise the run summary")?
    );

    session
        .save("summary.json", &summary)
        .wrap_err("Failed to save the run summary")?;

    info!("End of execution");

    Ok(())
}
