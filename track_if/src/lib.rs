//! # Track interface crate.
//!
//! Provides the descriptions and interfaces shared between the racing line solver and the
//! outside world: the native track geometry it consumes, and the vehicle model it queries.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Native track geometry description
pub mod track;

/// Vehicle physics model interface
pub mod car;
