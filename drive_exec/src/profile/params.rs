//! Vehicle profile parameter structures

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Deserialize;

// Internal
use crate::speed_ctrl::MotorAccLimits;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The set of vehicle profiles loaded from the parameter file.
#[derive(Debug, Deserialize, Clone)]
pub struct VehicleProfiles {
    /// All available vehicles, in selection order. The first is the
    /// default.
    pub vehicles: Vec<VehicleProfile>,
}

/// Raw description of one vehicle, as read from the parameter file.
///
/// A profile must pass [`VehicleProfile::validate`](crate::profile) before
/// use; the validated [`super::VehicleConfig`] is what the controllers
/// consume.
#[derive(Debug, Deserialize, Clone)]
pub struct VehicleProfile {
    /// Display name of the vehicle.
    pub name: String,

    /// Maximum speed either wheel may be driven at.
    ///
    /// Units: meters/second
    pub max_wheel_speed_ms: f64,

    /// First-order low-pass factor for the lever-derived target speed.
    pub throttle_factor: f64,

    /// Speed and lever threshold for joystick-brake engagement.
    ///
    /// Units: meters/second
    #[serde(default = "default_joy_brake_speed_threshold_ms")]
    pub joy_brake_speed_threshold_ms: f64,

    /// Body acceleration limits while cruising.
    pub cruise_accel_limits: MotorAccLimits,

    /// Body acceleration limits under full braking.
    pub braking_accel_limits: MotorAccLimits,

    /// Per-motor acceleration limits for the wheel controllers.
    pub wheel_accel_limits: MotorAccLimits,

    /// Ceiling on the heading rate. Clamped during validation so the
    /// implied per-wheel differential never exceeds the wheel speed limit.
    ///
    /// Units: radians/second
    pub max_turn_rate_rads: f64,

    /// Maximum lateral acceleration sustained in a turn.
    ///
    /// Units: meters/second^2
    pub max_lat_accel_mss: f64,

    /// Slope of the reversing logistic for the car-like turn convention.
    ///
    /// Units: 1/(meters/second)
    pub reversing_omega_slope: f64,

    /// Turn convention under reversal: `false` preserves the heading-rate
    /// sign (skid-steer), `true` preserves the turning circle (car-like).
    #[serde(default)]
    pub reverse_turns: bool,

    /// Rate limit of the softened turn knob.
    ///
    /// Units: 1/second (of full knob deflection)
    pub max_knob_vel: f64,

    /// Acceleration limit of the softened turn knob.
    ///
    /// Units: 1/second^2 (of full knob deflection)
    pub max_knob_acc: f64,

    /// Lever scale applied while jogging straight.
    pub jog_factor: f64,

    /// Knob scale applied while jogging a turn.
    pub turn_jog_factor: f64,

    /// Distance between the drive wheels.
    ///
    /// Units: meters
    pub axle_width_m: f64,

    /// Drive wheel radius.
    ///
    /// Units: meters
    pub wheel_radius_m: f64,

    /// Drive wheel tyre width.
    ///
    /// Units: meters
    pub wheel_width_m: f64,

    /// Offset of the traction point from the vehicle origin, in the body
    /// frame.
    ///
    /// Units: meters
    pub traction_offset_m: [f64; 3],
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

fn default_joy_brake_speed_threshold_ms() -> f64 {
    0.2
}
