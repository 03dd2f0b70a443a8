//! Host platform utility functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::path::PathBuf;
use thiserror::Error;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Name of the environment variable pointing at the software root directory.
pub const SW_ROOT_ENV_VAR: &str = "ARTCAR_SW_ROOT";

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors associated with the host environment.
#[derive(Debug, Error)]
pub enum HostError {
    #[error("The software root environment variable (ARTCAR_SW_ROOT) is not set")]
    SwRootNotSet,
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Get the path to the software root directory.
///
/// The root is read from the `ARTCAR_SW_ROOT` environment variable and is
/// the directory containing `params` and `sessions`.
pub fn get_artcar_sw_root() -> Result<PathBuf, HostError> {
    match std::env::var(SW_ROOT_ENV_VAR) {
        Ok(s) => Ok(PathBuf::from(s)),
        Err(_) => Err(HostError::SwRootNotSet),
    }
}

/// Get a short description of the host platform.
pub fn get_platform_desc() -> String {
    format!("{} ({})", std::env::consts::OS, std::env::consts::ARCH)
}
