//! # Vehicle profile module
//!
//! A vehicle profile is the complete description of one drivable vehicle:
//! speed and acceleration limits, turn capability, geometry and control
//! feel. Profiles are loaded from a TOML parameter file, validated into an
//! immutable [`VehicleConfig`], and applied to the controllers as a single
//! atomic swap between ticks so that no tick ever runs with a partially
//! replaced set of limits.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod config;
mod params;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use config::*;
pub use params::*;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors raised when validating a vehicle profile.
///
/// These signal configuration bugs and fail fast at the controller
/// boundary; they are never substituted with defaults.
#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    #[error("Vehicle '{vehicle}': {field} must be positive, found {value}")]
    NonPositive {
        vehicle: String,
        field: String,
        value: f64,
    },

    #[error("Vehicle '{vehicle}': {field} must be within (0, 1], found {value}")]
    OutOfUnitRange {
        vehicle: String,
        field: String,
        value: f64,
    },
}
