//! # Run context
//!
//! All state which lives for the length of one solve is carried in a `RunContext` which is passed
//! explicitly into every pipeline call. It holds the log target used by the library so that the
//! output of different runs (for example the race line and the pit lane) can be told apart, and a
//! set of counters which are reported at the end of the run.
//!
//! The solver is fully deterministic and consumes no randomness, so the context carries no seed.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::Serialize;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Context for a single solve.
#[derive(Debug, Clone)]
pub struct RunContext {
    /// Target used for all log messages emitted during the run
    pub log_target: String,

    /// Counters accumulated during the run
    pub stats: RunStats,
}

/// Counters accumulated during a run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunStats {
    /// Number of optimiser sweeps over the loop
    pub optim_sweeps: usize,

    /// Number of offset corrections made by the optimisers
    pub offset_steps: usize,

    /// Number of corrections limited by the edges of the track
    pub clamped_steps: usize,

    /// Number of full speed profile calculations
    pub speed_calcs: usize,

    /// Number of lane search trials run
    pub search_trials: usize,

    /// Number of lane search trials which improved the lap time
    pub search_accepted: usize,

    /// Whether the path came from a cache file
    pub loaded_from_cache: bool,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl RunContext {
    /// Create a new context for the run with the given name.
    pub fn new(run_name: &str) -> Self {
        Self {
            log_target: format!("raceline::{}", run_name),
            stats: RunStats::default(),
        }
    }

    /// The log target for this run.
    pub fn target(&self) -> &str {
        &self.log_target
    }
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new("default")
    }
}
