//! # Speed control module
//!
//! Filters an operator lever position into a jerk-limited vehicle speed and
//! acceleration. A base [`SpeedCtrl`] drives a velocity-domain motion
//! profile under a set of motor acceleration limits; [`DriveSpeedCtrl`]
//! adds the operator-facing layer: throttle smoothing, the joystick-brake
//! state machine and cruise/braking limit blending.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod limits;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use limits::*;
pub use state::*;

use crate::motion::MotionQuantity;

// ---------------------------------------------------------------------------
// QUANTITIES
// ---------------------------------------------------------------------------

/// The vehicle body speed as a profiled quantity.
///
/// In this interpretation the motion profile's value is the body speed in
/// meters/second, its rate is the body acceleration in meters/second^2, and
/// its acceleration limit is the jerk limit in meters/second^3.
pub struct BodySpeed;

impl MotionQuantity for BodySpeed {
    const LABEL: &'static str = "body speed";
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// State of the joystick-brake handling in [`DriveSpeedCtrl`].
///
/// Braking is entered when the vehicle is moving faster than the threshold
/// and the smoothed lever target reverses past the threshold in the
/// opposite direction; it is left once the lever target itself falls back
/// through the threshold in the braking direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub enum JoyBrakeState {
    /// Not braking; the lever commands speed.
    Idle,
    /// Braking against forward motion with the lever held negative.
    BrakingNeg,
    /// Braking against reverse motion with the lever held positive.
    BrakingPos,
}

impl Default for JoyBrakeState {
    fn default() -> Self {
        JoyBrakeState::Idle
    }
}
