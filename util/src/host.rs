//! Host platform utility functions

use std::env;
use std::path::PathBuf;

/// Name of the environment variable pointing at the root of the workspace.
pub const ROOT_ENV_VAR: &str = "RACELINE_ROOT";

/// Get the root directory of the software, as given by the `RACELINE_ROOT` environment
/// variable.
pub fn get_raceline_root() -> Result<PathBuf, env::VarError> {
    env::var(ROOT_ENV_VAR).map(PathBuf::from)
}
