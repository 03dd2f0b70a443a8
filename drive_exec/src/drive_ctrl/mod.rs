//! # Drive control module
//!
//! The complete per-tick motion-control pipeline for the skid-steer
//! vehicle:
//!
//! 1. the operator vector is shaped (jog scaling, turn-knob softening),
//! 2. the turn-rate limiter derives the permissible heading rate from the
//!    current body speed,
//! 3. the speed controller filters the lever into a jerk-limited body
//!    speed,
//! 4. per-wheel targets `body_speed -/+ 0.5 * omega * axle_width` drive the
//!    two wheel controllers,
//! 5. the exact per-tick wheel displacements are integrated into the
//!    vehicle pose,
//! 6. a read-only snapshot of pose and instrumentation is produced for the
//!    external display layers.
//!
//! Each tick is a pure function of the persisted controller state, the
//! tick's inputs and the measured delta-time; a late tick only widens the
//! next delta-time, which every stage handles for arbitrary steps.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod input;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use input::*;
pub use state::*;

use crate::motion::{MotionError, MotionQuantity};
use crate::profile::ProfileError;
use util::params;

// ---------------------------------------------------------------------------
// QUANTITIES
// ---------------------------------------------------------------------------

/// The softened turn-knob deflection as a profiled quantity.
///
/// In this interpretation the motion profile's value is the unitless knob
/// deflection in [-1, 1], its rate the deflection rate in 1/second, and
/// its acceleration limit the knob acceleration in 1/second^2.
pub struct KnobTravel;

impl MotionQuantity for KnobTravel {
    const LABEL: &'static str = "turn knob";
}

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Braking factors at or above this level light the braking flag.
pub const BRAKING_FACTOR_THRESHOLD: f64 = 0.05;

/// Mean wheel speeds below this are reported as reversing.
///
/// Units: meters/second
pub const REVERSING_SPEED_THRESHOLD_MS: f64 = -0.001;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during DriveCtrl operation.
#[derive(Debug, thiserror::Error)]
pub enum DriveCtrlError {
    #[error("Could not load parameters: {0}")]
    ParamLoadError(params::LoadError),

    #[error("No vehicles defined in the profile file")]
    NoVehicles,

    #[error("Unknown vehicle '{0}'")]
    UnknownVehicle(String),

    #[error("Invalid vehicle profile: {0}")]
    InvalidProfile(#[from] ProfileError),

    #[error("Failed to create archive: {0}")]
    ArchiveInitError(String),

    #[error("No vehicle has been configured")]
    NoVehicle,

    #[error("Negative delta-time: {0}")]
    NegativeDeltaTime(f64),

    #[error(transparent)]
    MotionError(#[from] MotionError),
}
