//! Input data for the drive control module

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Serialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Per-tick input to DriveCtrl.
///
/// The operator vector arrives already dead-zone-corrected from the
/// external input-mapping layer. All overrides are per-tick: nothing here
/// is latched by the module.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct InputData {
    /// Operator vector, each axis in [-1, 1]. `x` is the turn axis
    /// (positive right), `y` the speed lever (positive forward).
    pub operator_xy: [f64; 2],

    /// External braking factor override in [0, 1] (e.g. a trigger input).
    /// Always takes precedence over the joystick brake.
    pub braking_factor: f64,

    /// Raw per-wheel target speeds from an external device, bypassing the
    /// operator vector entirely for this tick.
    pub wheel_override: Option<WheelSpeedOverride>,

    /// Jog input, -1/0/+1 per axis. A non-zero jog replaces the operator
    /// vector with the profile's jog deflections and disables the joystick
    /// brake for the tick.
    pub jog_xy: [i8; 2],

    /// Per-wheel trim factors in [0, 1], left then right. 1 is nominal.
    pub wheel_trim: [f64; 2],

    /// Control-shaping switches.
    pub switches: CtrlSwitches,

    /// Measured wall-clock time since the previous tick.
    ///
    /// Units: seconds
    pub delta_time_s: f64,
}

/// Direct per-wheel target speeds from an alternate input source.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct WheelSpeedOverride {
    /// Left wheel target speed.
    ///
    /// Units: meters/second
    pub left_ms: f64,

    /// Right wheel target speed.
    ///
    /// Units: meters/second
    pub right_ms: f64,
}

/// Operator-selectable control shaping.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct CtrlSwitches {
    /// Limit the heading rate by lateral acceleration at speed.
    pub limit_turn_rate: bool,

    /// Soften the speed lever through the speed controller. When off the
    /// commanded speed is applied directly.
    pub soften_speed: bool,

    /// Soften the turn knob through its motion profile. When off the knob
    /// follows the operator instantly.
    pub soften_turns: bool,

    /// Reversing the lever past the threshold while moving brakes instead
    /// of commanding reverse.
    pub enable_joy_brake: bool,

    /// Apply the profile's throttle smoothing to the lever target.
    pub enable_throttle: bool,

    /// Bypass the wheel motor limits: wheels snap to their targets.
    pub motors_are_magic: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for CtrlSwitches {
    fn default() -> Self {
        Self {
            limit_turn_rate: true,
            soften_speed: true,
            soften_turns: true,
            enable_joy_brake: false,
            enable_throttle: true,
            motors_are_magic: false,
        }
    }
}

impl Default for InputData {
    fn default() -> Self {
        Self {
            operator_xy: [0.0, 0.0],
            braking_factor: 0.0,
            wheel_override: None,
            jog_xy: [0, 0],
            wheel_trim: [1.0, 1.0],
            switches: CtrlSwitches::default(),
            delta_time_s: 0.0,
        }
    }
}
