//! Speed controller state structures

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
use super::{BodySpeed, JoyBrakeState, MotorAccLimits};
use crate::motion::{MotionError, MotionProfile, MotionQuantity};
use util::maths::clamp;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Base speed controller: tracks a target speed under a set of motor
/// acceleration limits, with jerk-limited acceleration.
pub struct SpeedCtrl<Q: MotionQuantity> {
    /// Acceleration limits currently in force.
    pub mal: MotorAccLimits,

    /// The velocity-domain motion profile. The profile's value is this
    /// controller's speed (m/s), its rate the acceleration (m/s^2) and its
    /// acceleration limit the jerk limit (m/s^3).
    profile: MotionProfile<Q>,

    /// Speed the controller is driving towards.
    ///
    /// Units: meters/second
    pub target_speed_ms: f64,

    /// Jerk-limited current speed.
    ///
    /// Units: meters/second
    pub current_speed_ms: f64,

    /// Jerk-limited current acceleration.
    ///
    /// Units: meters/second^2
    pub current_accel_mss: f64,
}

/// Operator-facing speed controller for the vehicle body.
///
/// Wraps a [`SpeedCtrl`] with throttle smoothing, the joystick-brake state
/// machine and blending of the cruise and braking acceleration limits by
/// the braking factor.
pub struct DriveSpeedCtrl {
    /// The underlying body-speed controller. Its `mal` holds the blended
    /// *effective* limits.
    pub ctrl: SpeedCtrl<BodySpeed>,

    cruise_mal: MotorAccLimits,
    braking_mal: MotorAccLimits,

    /// First-order low-pass factor applied to the lever-derived target
    /// speed per tick (1 = no smoothing).
    pub throttle_factor: f64,

    /// If false the throttle factor is ignored (treated as 1).
    pub enable_throttle: bool,

    /// If true reversing the lever past the threshold while moving engages
    /// the joystick brake.
    pub enable_joy_brake: bool,

    /// Speed and lever-target threshold for joystick-brake engagement.
    ///
    /// Units: meters/second
    pub joy_brake_speed_threshold_ms: f64,

    /// Maximum commanded body speed, scaling the lever position.
    ///
    /// Units: meters/second
    pub max_speed_ms: f64,

    /// Operator lever position, -1 to +1.
    pub lever_pos: f64,

    /// Externally supplied braking factor override, 0 to 1. Always takes
    /// precedence over the joystick brake via max().
    pub input_braking_factor: f64,

    effective_braking_factor: f64,
    joy_brake_state: JoyBrakeState,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<Q: MotionQuantity> SpeedCtrl<Q> {
    /// Create a controller at rest with the given limits.
    pub fn new(mal: MotorAccLimits) -> Self {
        Self {
            mal,
            profile: MotionProfile::new(),
            target_speed_ms: 0.0,
            current_speed_ms: 0.0,
            current_accel_mss: 0.0,
        }
    }

    /// Configure the motion profile for this tick.
    ///
    /// The applicable acceleration and deceleration limits are selected by
    /// the direction of travel: while reversing, speeding up means a more
    /// negative speed.
    pub fn animate(&mut self) {
        let (max_acc, max_dec) = if self.current_speed_ms >= 0.0 {
            (self.mal.max_fwd_accel_mss, self.mal.max_fwd_decel_mss)
        } else {
            (self.mal.max_rev_decel_mss, self.mal.max_rev_accel_mss)
        };

        let q = &mut self.profile;
        q.max_fwd_v = max_acc;
        q.max_rev_v = max_dec;
        q.max_a = self.mal.max_jerk_msss;
        q.x = self.current_speed_ms;
        q.v = self.current_accel_mss;
        q.target_x = self.target_speed_ms;
    }

    /// Advance the profile by `delta_time_s` seconds.
    pub fn advance(&mut self, delta_time_s: f64) -> Result<(), MotionError> {
        self.profile.advance(delta_time_s)?;
        self.current_accel_mss = self.profile.v;
        self.current_speed_ms = self.profile.x;
        Ok(())
    }

    /// Snap the controller to the given speed with zero acceleration,
    /// bypassing the jerk limit.
    pub fn force_speed(&mut self, speed_ms: f64) {
        self.target_speed_ms = speed_ms;
        self.current_speed_ms = speed_ms;
        self.current_accel_mss = 0.0;
        self.profile.x = speed_ms;
        self.profile.target_x = speed_ms;
        self.profile.v = 0.0;
    }

    /// Zero the accumulated time-integral of speed.
    pub fn zero_integral(&mut self) {
        self.profile.integral = 0.0;
    }

    /// Accumulated time-integral of speed, i.e. the exact distance covered
    /// since the integral was last zeroed.
    ///
    /// Units: meters
    pub fn speed_integral_m(&self) -> f64 {
        self.profile.integral
    }
}

impl<Q: MotionQuantity> Default for SpeedCtrl<Q> {
    fn default() -> Self {
        Self::new(MotorAccLimits::default())
    }
}

impl DriveSpeedCtrl {
    /// Create a controller with the given cruise and braking limit records.
    pub fn new(cruise_mal: MotorAccLimits, braking_mal: MotorAccLimits) -> Self {
        Self {
            ctrl: SpeedCtrl::new(cruise_mal),
            cruise_mal,
            braking_mal,
            throttle_factor: 1.0,
            enable_throttle: true,
            enable_joy_brake: false,
            joy_brake_speed_threshold_ms: 0.2,
            max_speed_ms: 0.1,
            lever_pos: 0.0,
            input_braking_factor: 0.0,
            effective_braking_factor: 0.0,
            joy_brake_state: JoyBrakeState::Idle,
        }
    }

    /// Replace the cruise and braking limit records. Part of the atomic
    /// vehicle swap; the effective record is rebuilt on the next call to
    /// `animate`.
    pub fn set_limits(&mut self, cruise_mal: MotorAccLimits, braking_mal: MotorAccLimits) {
        self.cruise_mal = cruise_mal;
        self.braking_mal = braking_mal;
        self.ctrl.mal = cruise_mal;
    }

    /// Braking factor in force after the last `animate`, 0 to 1.
    pub fn effective_braking_factor(&self) -> f64 {
        self.effective_braking_factor
    }

    /// Current state of the joystick brake.
    pub fn joy_brake_state(&self) -> JoyBrakeState {
        self.joy_brake_state
    }

    /// True while the joystick brake is engaged.
    pub fn joy_brake_engaged(&self) -> bool {
        self.joy_brake_state != JoyBrakeState::Idle
    }

    /// Reset the joystick brake to idle.
    pub fn reset_joy_brake(&mut self) {
        self.joy_brake_state = JoyBrakeState::Idle;
    }

    /// Run the per-tick command shaping and configure the underlying
    /// controller.
    pub fn animate(&mut self) {
        let current = self.ctrl.current_speed_ms;
        let lever_target = self.max_speed_ms * self.lever_pos;
        let etf = if self.enable_throttle {
            self.throttle_factor
        } else {
            1.0
        };
        let mut target = current + etf * (lever_target - current);

        // The braking factor defaults to zero unless a condition this tick
        // sets it.
        let mut braking_factor = 0.0;

        if self.enable_joy_brake {
            if current.abs() >= self.joy_brake_speed_threshold_ms
                && lever_target.abs() >= self.joy_brake_speed_threshold_ms
                && (lever_target < 0.0) != (current < 0.0)
            {
                self.joy_brake_state = if lever_target < 0.0 {
                    JoyBrakeState::BrakingNeg
                } else {
                    JoyBrakeState::BrakingPos
                };
            }
        } else {
            self.joy_brake_state = JoyBrakeState::Idle;
        }

        match self.joy_brake_state {
            JoyBrakeState::BrakingNeg => {
                if lever_target < -self.joy_brake_speed_threshold_ms {
                    braking_factor = -self.lever_pos;
                    target = target.max(0.0);
                } else {
                    self.joy_brake_state = JoyBrakeState::Idle;
                }
            }
            JoyBrakeState::BrakingPos => {
                if lever_target > self.joy_brake_speed_threshold_ms {
                    braking_factor = self.lever_pos;
                    target = target.min(0.0);
                } else {
                    self.joy_brake_state = JoyBrakeState::Idle;
                }
            }
            JoyBrakeState::Idle => (),
        }

        // An external braking input (e.g. a trigger) always wins.
        braking_factor = braking_factor.max(clamp(self.input_braking_factor, 0.0, 1.0));
        self.effective_braking_factor = braking_factor;

        self.ctrl
            .mal
            .blend_from(&self.cruise_mal, &self.braking_mal, braking_factor);
        target *= 1.0 - braking_factor;

        self.ctrl.target_speed_ms = target;
        self.ctrl.animate();
    }

    /// Advance the underlying controller by `delta_time_s` seconds.
    pub fn advance(&mut self, delta_time_s: f64) -> Result<(), MotionError> {
        self.ctrl.advance(delta_time_s)
    }
}

impl Default for DriveSpeedCtrl {
    fn default() -> Self {
        Self::new(MotorAccLimits::default(), MotorAccLimits::default())
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    fn drive_ctrl() -> DriveSpeedCtrl {
        // Acceleration-dominated configuration: jerk high enough that the
        // 2 m/s^2 limit shapes the ramp.
        let cruise = MotorAccLimits::symmetric(2.0, 1000.0);
        let braking = MotorAccLimits::symmetric(10.0, 1000.0);
        let mut ctrl = DriveSpeedCtrl::new(cruise, braking);
        ctrl.max_speed_ms = 3.0;
        ctrl.throttle_factor = 1.0;
        ctrl
    }

    #[test]
    fn test_full_lever_ramp_to_max_speed() {
        let mut ctrl = drive_ctrl();
        ctrl.lever_pos = 1.0;

        let dt = 0.01;
        let mut prev = 0.0;
        let mut t = 0.0;
        let mut t_at_max = None;

        for _ in 0..500 {
            ctrl.animate();
            ctrl.advance(dt).unwrap();
            t += dt;

            let v = ctrl.ctrl.current_speed_ms;
            assert!(v >= prev - 1e-9, "speed not monotonic at t = {}", t);
            assert!(v <= 3.0 + 1e-9, "speed limit exceeded at t = {}", t);
            if t_at_max.is_none() && v >= 2.99 {
                t_at_max = Some(t);
            }
            prev = v;
        }

        // v / a = 3 / 2 = 1.5 s, plus a little jerk transient.
        let t_at_max = t_at_max.expect("never reached max speed");
        assert!(
            t_at_max < 1.6,
            "reached max speed too late: t = {}",
            t_at_max
        );
        assert!((ctrl.ctrl.current_speed_ms - 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_joy_brake_engages_and_releases() {
        let mut ctrl = drive_ctrl();
        ctrl.enable_joy_brake = true;
        ctrl.ctrl.force_speed(2.0);

        // Reversing the lever while moving forward brakes instead of
        // commanding reverse.
        ctrl.lever_pos = -1.0;
        ctrl.animate();
        assert_eq!(ctrl.joy_brake_state(), JoyBrakeState::BrakingNeg);
        assert!((ctrl.effective_braking_factor() - 1.0).abs() < 1e-12);
        assert!(ctrl.ctrl.target_speed_ms.abs() < 1e-12);

        // Easing the lever back inside the threshold releases the brake.
        ctrl.lever_pos = -0.05;
        ctrl.animate();
        assert_eq!(ctrl.joy_brake_state(), JoyBrakeState::Idle);
        assert_eq!(ctrl.effective_braking_factor(), 0.0);
    }

    #[test]
    fn test_joy_brake_not_entered_when_slow() {
        let mut ctrl = drive_ctrl();
        ctrl.enable_joy_brake = true;
        ctrl.ctrl.force_speed(0.1);

        ctrl.lever_pos = -1.0;
        ctrl.animate();
        assert_eq!(ctrl.joy_brake_state(), JoyBrakeState::Idle);
    }

    #[test]
    fn test_external_braking_factor_takes_precedence() {
        let mut ctrl = drive_ctrl();
        ctrl.lever_pos = 1.0;
        ctrl.input_braking_factor = 0.6;
        ctrl.animate();

        assert!((ctrl.effective_braking_factor() - 0.6).abs() < 1e-12);

        // Effective limits are the affine blend of cruise and braking.
        assert!((ctrl.ctrl.mal.max_fwd_accel_mss - (2.0 + 0.6 * 8.0)).abs() < 1e-12);

        // The target is scaled down by the braking factor.
        assert!(ctrl.ctrl.target_speed_ms < 3.0 * 0.4 + 1e-12);
    }

    #[test]
    fn test_reverse_limits_selected_when_reversing() {
        let cruise = MotorAccLimits {
            max_fwd_accel_mss: 1.0,
            max_fwd_decel_mss: 2.0,
            max_rev_accel_mss: 3.0,
            max_rev_decel_mss: 4.0,
            max_jerk_msss: 100.0,
        };
        let mut ctrl: SpeedCtrl<BodySpeed> = SpeedCtrl::new(cruise);

        ctrl.force_speed(-1.0);
        ctrl.target_speed_ms = -2.0;
        ctrl.animate();
        ctrl.advance(0.1).unwrap();

        // While reversing, speeding up (more negative) is limited by the
        // reverse acceleration limit.
        assert!(ctrl.current_accel_mss >= -3.0 - 1e-9);
    }
}
