//! Parameters structure for LineCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use crate::path::{Lane, PathOptions};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for racing line control.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Params {
    /// The lane the path is restricted to.
    pub lane: Lane,

    /// Options used to optimise the path.
    pub options: PathOptions,

    /// File the path is cached in. If not set the path is always optimised from scratch.
    pub cache_file: Option<String>,

    /// Change in fuel load after which the speed profile is recalculated.
    ///
    /// Units: kilograms
    pub fuel_recalc_kg: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            lane: Lane::Race,
            options: PathOptions::default(),
            cache_file: None,
            fuel_recalc_kg: 1.0,
        }
    }
}
