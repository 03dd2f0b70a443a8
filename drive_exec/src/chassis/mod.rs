//! # Chassis module
//!
//! The differential-drive pose integrator. Consumes the exact per-tick
//! displacement of each wheel (not an instantaneous speed sample) and the
//! axle width, and updates the vehicle position and orientation. Also
//! derives the instrumentation consumed by external display layers: turn
//! centre, angular velocity, lateral and forward acceleration, and a tyre
//! scrub estimate per wheel.
//!
//! Frame convention: right-handed land-vehicle body frame with +x forward,
//! +y left and +z up. Positive heading is measured anticlockwise from the
//! world +x axis.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod pose;
mod state;
mod wheel;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use pose::*;
pub use state::*;
pub use wheel::*;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Below this wheel displacement difference the motion is treated as a
/// straight translation.
///
/// Units: meters
pub const DIFF_EPSILON_M: f64 = 1e-6;

/// Below this turn radius the motion is treated as a pure rotation about
/// the traction point.
///
/// Units: meters
pub const RADIUS_EPSILON_M: f64 = 1e-6;
