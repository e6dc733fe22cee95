//! Racing line control module
//!
//! LineCtrl owns the optimised path for one lane of the track. It builds (or loads) the path on
//! initialisation, then on every cycle reports the state of the path at the car's position along
//! the track, recalculating the speed profile as the car's fuel load changes.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

pub use params::*;
pub use state::*;

use util::archive::ArchiveError;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during LineCtrl operation.
#[derive(Debug, thiserror::Error)]
pub enum LineCtrlError {
    #[error("LineCtrl has not been initialised")]
    NotInitialised,

    #[error("Cannot archive LineCtrl data: {0}")]
    ArchiveError(#[from] ArchiveError),
}
