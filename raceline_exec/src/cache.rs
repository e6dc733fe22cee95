//! # Path cache
//!
//! Optimising a path is slow, so paths are cached in a small text file next to the track:
//!
//! ```text
//! RACELINE_VERSION
//! 0
//! TRACK_LENGTH
//! 1000.000000000
//! NUM_POINTS
//! 333
//! <one line per point>
//! END
//! ```
//!
//! The point lines depend on the version:
//!
//! - `0`: the offset of each sample. The number of points must match the number of samples.
//! - `1`: `distance offset` pairs, interpolated onto the samples by distance.
//! - `2`: `x y` positions of a closed polyline, which is re-projected onto the sample normals.
//!
//! Paths are always written as version 0. A cache which does not match the track is rejected so
//! that the caller can optimise a fresh path.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::fs::{read_to_string, File};
use std::io::{BufWriter, Write};
use std::path::Path as FilePath;
use std::str::FromStr;
use std::sync::Arc;

use nalgebra::Vector3;
use ordered_float::NotNan;
use thiserror::Error;
use track_if::car::CarModel;
use util::maths::lerp;

use crate::context::RunContext;
use crate::geom::line_crosses_line_xy;
use crate::path::{Path, PathOptions};
use crate::speed::calc_speeds;
use crate::track::Track;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

const VERSION_TAG: &str = "RACELINE_VERSION";
const LENGTH_TAG: &str = "TRACK_LENGTH";
const NUM_POINTS_TAG: &str = "NUM_POINTS";
const END_TAG: &str = "END";

/// Largest difference between the cached and actual track lengths.
const LENGTH_TOL_M: f64 = 0.01;

/// Tolerance on the polyline segment parameter when re-projecting version 2 points.
const SEGMENT_TOL: f64 = 1e-9;

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Errors which can occur reading or writing a cache file.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cannot access the cache file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Expected {expected} but found {found:?}")]
    UnexpectedToken { expected: &'static str, found: String },

    #[error("The file ended early, expected {0}")]
    UnexpectedEnd(&'static str),

    #[error("Cache version {0} is not supported")]
    UnsupportedVersion(u32),

    #[error("Cached track length {file_m} m doesn't match the track length {track_m} m")]
    TrackLengthMismatch { file_m: f64, track_m: f64 },

    #[error("Cache holds {file} points but the track has {track} samples")]
    PointCountMismatch { file: usize, track: usize },

    #[error("Cache holds too few points ({0}) to describe a path")]
    TooFewPoints(usize),

    #[error("No cached path segment crosses the normal of sample {0}")]
    NoCrossing(usize),
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Reads whitespace separated lines from a cache file.
struct Reader<'a> {
    lines: Box<dyn Iterator<Item = &'a str> + 'a>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl<'a> Reader<'a> {
    fn new(content: &'a str) -> Self {
        Self {
            lines: Box::new(content.lines().map(str::trim).filter(|l| !l.is_empty())),
        }
    }

    fn line(&mut self, expected: &'static str) -> Result<&'a str, CacheError> {
        self.lines.next().ok_or(CacheError::UnexpectedEnd(expected))
    }

    fn tag(&mut self, tag: &'static str) -> Result<(), CacheError> {
        let line = self.line(tag)?;
        if line == tag {
            Ok(())
        } else {
            Err(CacheError::UnexpectedToken {
                expected: tag,
                found: line.to_string(),
            })
        }
    }

    fn value<T: FromStr>(&mut self, expected: &'static str) -> Result<T, CacheError> {
        let line = self.line(expected)?;
        parse(line, expected)
    }

    fn pair(&mut self, expected: &'static str) -> Result<(f64, f64), CacheError> {
        let line = self.line(expected)?;
        let mut parts = line.split_whitespace();

        match (parts.next(), parts.next(), parts.next()) {
            (Some(a), Some(b), None) => Ok((parse(a, expected)?, parse(b, expected)?)),
            _ => Err(CacheError::UnexpectedToken {
                expected,
                found: line.to_string(),
            }),
        }
    }
}

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Write the offsets of the path to a version 0 cache file.
pub fn save_path(path: &Path, file: &FilePath) -> Result<(), CacheError> {
    let mut w = BufWriter::new(File::create(file)?);

    writeln!(w, "{}", VERSION_TAG)?;
    writeln!(w, "0")?;
    writeln!(w, "{}", LENGTH_TAG)?;
    writeln!(w, "{:.9}", path.track.length_m)?;
    writeln!(w, "{}", NUM_POINTS_TAG)?;
    writeln!(w, "{}", path.len())?;
    for p in path.points.iter() {
        writeln!(w, "{:.9}", p.offset_m)?;
    }
    writeln!(w, "{}", END_TAG)?;

    w.flush()?;
    Ok(())
}

/// Load a path over the track from a cache file. The loaded path has its curvatures and speeds
/// recalculated.
pub fn load_path(
    file: &FilePath,
    track: Arc<Track>,
    car: &dyn CarModel,
    options: PathOptions,
    ctx: &mut RunContext,
) -> Result<Path, CacheError> {
    let content = read_to_string(file)?;
    let offsets = parse_offsets(&content, &track)?;

    let mut path = Path::new(track, car, options);
    for (i, offset) in offsets.into_iter().enumerate() {
        path.set_offset_hard(i, offset);
    }
    path.calc_all();
    calc_speeds(&mut path, car, ctx);

    Ok(path)
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn parse<T: FromStr>(s: &str, expected: &'static str) -> Result<T, CacheError> {
    s.parse().map_err(|_| CacheError::UnexpectedToken {
        expected,
        found: s.to_string(),
    })
}

/// Read the cache and return the offset of every sample of the track.
fn parse_offsets(content: &str, track: &Track) -> Result<Vec<f64>, CacheError> {
    let mut r = Reader::new(content);

    r.tag(VERSION_TAG)?;
    let version: u32 = r.value("version")?;
    if version > 2 {
        return Err(CacheError::UnsupportedVersion(version));
    }

    r.tag(LENGTH_TAG)?;
    let length_m: f64 = r.value("track length")?;
    if !((length_m - track.length_m).abs() <= LENGTH_TOL_M) {
        return Err(CacheError::TrackLengthMismatch {
            file_m: length_m,
            track_m: track.length_m,
        });
    }

    r.tag(NUM_POINTS_TAG)?;
    let num_points: usize = r.value("number of points")?;

    let offsets = match version {
        0 => {
            if num_points != track.len() {
                return Err(CacheError::PointCountMismatch {
                    file: num_points,
                    track: track.len(),
                });
            }
            (0..num_points)
                .map(|_| r.value("offset"))
                .collect::<Result<Vec<f64>, _>>()?
        }
        1 => {
            let pairs = (0..num_points)
                .map(|_| r.pair("distance and offset"))
                .collect::<Result<Vec<_>, _>>()?;
            offsets_from_distances(&pairs, track)?
        }
        _ => {
            let pairs = (0..num_points)
                .map(|_| r.pair("x and y"))
                .collect::<Result<Vec<_>, _>>()?;
            offsets_from_points(&pairs, track)?
        }
    };

    r.tag(END_TAG)?;

    Ok(offsets)
}

/// Interpolate `(distance, offset)` pairs onto the samples, wrapping around the start line.
fn offsets_from_distances(pairs: &[(f64, f64)], track: &Track) -> Result<Vec<f64>, CacheError> {
    if pairs.len() < 2 {
        return Err(CacheError::TooFewPoints(pairs.len()));
    }

    let mut pairs = pairs.to_vec();
    pairs.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

    let offsets = track
        .samples
        .iter()
        .map(|s| {
            let d = s.dist_m;
            let k = pairs.iter().rposition(|p| p.0 <= d);

            // Before the first pair the previous pair is the last one, a lap behind
            let (d0, o0, d1, o1) = match k {
                Some(k) if k + 1 < pairs.len() => {
                    (pairs[k].0, pairs[k].1, pairs[k + 1].0, pairs[k + 1].1)
                }
                Some(k) => (
                    pairs[k].0,
                    pairs[k].1,
                    pairs[0].0 + track.length_m,
                    pairs[0].1,
                ),
                None => {
                    let last = pairs[pairs.len() - 1];
                    (last.0 - track.length_m, last.1, pairs[0].0, pairs[0].1)
                }
            };

            if d1 - d0 > 0.0 {
                lerp(o0, o1, (d - d0) / (d1 - d0))
            } else {
                o0
            }
        })
        .collect();

    Ok(offsets)
}

/// Find the offset of every sample by crossing its normal with a closed polyline through the
/// given points, using the crossing nearest the centreline.
fn offsets_from_points(pairs: &[(f64, f64)], track: &Track) -> Result<Vec<f64>, CacheError> {
    if pairs.len() < 3 {
        return Err(CacheError::TooFewPoints(pairs.len()));
    }

    let pts: Vec<Vector3<f64>> = pairs.iter().map(|&(x, y)| Vector3::new(x, y, 0.0)).collect();
    let m = pts.len();

    track
        .samples
        .iter()
        .enumerate()
        .map(|(i, s)| {
            (0..m)
                .filter_map(|j| {
                    let a = pts[j];
                    let b = pts[(j + 1) % m];
                    let (t, u) = line_crosses_line_xy(&s.pt, &s.norm, &a, &(b - a))?;

                    let on_segment = u >= -SEGMENT_TOL && u <= 1.0 + SEGMENT_TOL;
                    let on_track = t >= -s.extent_left_m && t <= s.extent_right_m;
                    if on_segment && on_track {
                        Some((NotNan::new(t.abs()).ok()?, t))
                    } else {
                        None
                    }
                })
                .min_by_key(|&(dist, _)| dist)
                .map(|(_, t)| t)
                .ok_or(CacheError::NoCrossing(i))
        })
        .collect()
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
