//! Runtime module interface
//!
//! A runtime module is initialised once, when the track is loaded, and then processed every
//! cycle while the car drives. `raceline_exec::line_ctrl::LineCtrl` is the reference
//! implementation.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use crate::session::Session;

// ---------------------------------------------------------------------------
// MODULE STATE
// ---------------------------------------------------------------------------

/// State of a runtime module.
pub trait State {
    /// Everything the module needs to set itself up
    type InitData;
    type InitError;

    /// Per cycle input
    type InputData;
    /// Per cycle output
    type OutputData;
    /// Per cycle status, for logging and monitoring
    type StatusReport;
    type ProcError;

    /// Initialise the module.
    ///
    /// Modules archive their output into `session` when one is given. Without a session, as in
    /// unit tests, nothing is written to disk.
    fn init(
        &mut self,
        init_data: Self::InitData,
        session: Option<&Session>,
    ) -> Result<(), Self::InitError>;

    /// Run one cycle of the module.
    ///
    /// Calling this before `init` is an error rather than a panic.
    fn proc(
        &mut self,
        input_data: &Self::InputData,
    ) -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError>;
}
