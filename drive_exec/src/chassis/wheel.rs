//! Wheel state and per-tick wheel motion

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Serialize;

// Internal
use util::maths::{clamp, rem_euclid};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Gain of the tyre scrub build-up per radian of body rotation.
const TWIST_GAIN: f64 = 5.0;

/// Decay rate of tyre scrub with rolled speed.
///
/// Units: 1/meters
const TWIST_DECAY: f64 = 15.0;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// State of one drive wheel as tracked by the chassis.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct WheelState {
    /// Wheel radius.
    ///
    /// Units: meters
    pub radius_m: f64,

    /// Tyre width.
    ///
    /// Units: meters
    pub width_m: f64,

    /// Spin angle of the wheel about its axle, wrapped to [0, 2*pi).
    ///
    /// Units: radians
    pub angle_rad: f64,

    /// Current linear ground speed.
    ///
    /// Units: meters/second
    pub speed_ms: f64,

    /// Displacement covered over the last tick.
    ///
    /// Units: meters
    pub displacement_m: f64,

    /// Scrubbing stress estimate, -1 to +1. Builds while the body rotates
    /// and decays as the wheel rolls.
    pub twist: f64,
}

/// Exact motion of one wheel over a tick, as produced by its controller.
#[derive(Clone, Copy, Debug, Default)]
pub struct WheelMotion {
    /// Displacement covered over the tick (the time-integral of wheel
    /// speed, not speed times delta-time).
    ///
    /// Units: meters
    pub displacement_m: f64,

    /// Wheel speed at the end of the tick.
    ///
    /// Units: meters/second
    pub speed_ms: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl WheelState {
    /// Create a wheel with the given geometry, at rest.
    pub fn new(radius_m: f64, width_m: f64) -> Self {
        Self {
            radius_m,
            width_m,
            angle_rad: 0.0,
            speed_ms: 0.0,
            displacement_m: 0.0,
            twist: 0.0,
        }
    }

    /// Roll the wheel through the given ground displacement, spinning it
    /// by exactly `displacement / radius`.
    pub fn roll(&mut self, displacement_m: f64) {
        self.displacement_m = displacement_m;
        self.angle_rad = rem_euclid(
            self.angle_rad + displacement_m / self.radius_m,
            std::f64::consts::TAU,
        );
    }

    /// Apply one tick of the scrub model: accumulate the given twist
    /// increment, then decay with the distance rolled.
    pub fn scrub(&mut self, twist_increment: f64, delta_time_s: f64) {
        self.twist += twist_increment;
        self.twist *= (-TWIST_DECAY * self.speed_ms.abs() * delta_time_s).exp();
        self.twist = clamp(self.twist, -1.0, 1.0);
    }

    /// Twist increment for a body rotating at `omega_rads` over a tick.
    pub fn twist_increment(omega_rads: f64, delta_time_s: f64) -> f64 {
        TWIST_GAIN * omega_rads * delta_time_s
    }
}

impl Default for WheelState {
    fn default() -> Self {
        Self::new(0.25, 0.2)
    }
}
