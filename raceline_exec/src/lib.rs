//! # Racing line library.
//!
//! This library allows other crates in the workspace, and the benchmarks, to access items
//! defined inside the racing line crate.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Bump analysis - estimates where the car leaves the ground over crests
pub mod bump;

/// Path cache - reads and writes precomputed paths
pub mod cache;

/// Point mass car model used for speed limits
pub mod car;

/// Per-run logging target and counters
pub mod context;

/// Small geometry helpers shared by the track and path
pub mod geom;

/// Racing line control module - serves the path to the car as it drives
pub mod line_ctrl;

/// Path optimisers
pub mod optim;

/// Executable parameters
pub mod params;

/// The racing line and its interpolation
pub mod path;

/// Circular indexing
pub mod ring;

/// Speed profile propagation
pub mod speed;

/// Pit lane splicing
pub mod splice;

/// Track segmentation - splits a track description into evenly spaced samples
pub mod track;

#[cfg(test)]
mod test_utils;
