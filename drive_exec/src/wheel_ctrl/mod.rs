//! # Wheel control module
//!
//! Each drive wheel gets its own [`SpeedCtrl`] with motor-specific
//! acceleration limits, tracking a target speed of
//! `vehicle_speed -/+ 0.5 * omega * axle_width` (left minus, right plus).
//! Besides the jerk-limited wheel speed, the controller produces the exact
//! per-tick displacement of the wheel (the time-integral of its speed),
//! which the chassis integrator consumes for odometry.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
use crate::motion::{MotionError, MotionQuantity};
use crate::speed_ctrl::{MotorAccLimits, SpeedCtrl};
use util::maths::clamp;

// ---------------------------------------------------------------------------
// QUANTITIES
// ---------------------------------------------------------------------------

/// A wheel's linear ground speed as a profiled quantity.
///
/// In this interpretation the motion profile's value is the wheel speed in
/// meters/second, its rate the wheel acceleration in meters/second^2, and
/// its acceleration limit the motor jerk limit in meters/second^3.
pub struct WheelSpeed;

impl MotionQuantity for WheelSpeed {
    const LABEL: &'static str = "wheel speed";
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Controller for one drive wheel.
pub struct WheelCtrl {
    /// The underlying wheel-speed controller.
    pub ctrl: SpeedCtrl<WheelSpeed>,

    /// Trim factor scaling this wheel's produced motion, 0 to 1. Models an
    /// under-inflated tyre or an operator trim adjustment; 1 is nominal.
    pub trim_factor: f64,

    /// Trimmed displacement covered by the wheel over the last tick.
    ///
    /// Units: meters
    displacement_m: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl WheelCtrl {
    /// Create a wheel controller with the given motor limits.
    pub fn new(mal: MotorAccLimits) -> Self {
        Self {
            ctrl: SpeedCtrl::new(mal),
            trim_factor: 1.0,
            displacement_m: 0.0,
        }
    }

    /// Set the wheel target speed for this tick.
    ///
    /// Units: meters/second
    pub fn set_target(&mut self, speed_ms: f64) {
        self.ctrl.target_speed_ms = speed_ms;
    }

    /// Configure the underlying controller for this tick.
    pub fn animate(&mut self) {
        self.ctrl.animate();
    }

    /// Advance the wheel by `delta_time_s` seconds, producing the exact
    /// trimmed displacement for the tick.
    ///
    /// With `magic` set the motor limits are bypassed and the wheel snaps
    /// to its target speed, covering `target * delta_time` exactly.
    pub fn advance(&mut self, delta_time_s: f64, magic: bool) -> Result<(), MotionError> {
        if magic {
            let target = self.ctrl.target_speed_ms;
            self.ctrl.force_speed(target);
            self.displacement_m = self.trim_factor * target * delta_time_s;
        } else {
            self.ctrl.zero_integral();
            self.ctrl.advance(delta_time_s)?;
            self.displacement_m = self.trim_factor * self.ctrl.speed_integral_m();
        }
        Ok(())
    }

    /// Trimmed displacement covered over the last tick.
    ///
    /// Units: meters
    pub fn displacement_m(&self) -> f64 {
        self.displacement_m
    }

    /// Trimmed current ground speed of the wheel.
    ///
    /// Units: meters/second
    pub fn speed_ms(&self) -> f64 {
        self.trim_factor * self.ctrl.current_speed_ms
    }

    /// Set the trim factor, clamped to [0, 1].
    pub fn set_trim(&mut self, trim_factor: f64) {
        self.trim_factor = clamp(trim_factor, 0.0, 1.0);
    }
}

impl Default for WheelCtrl {
    fn default() -> Self {
        Self::new(MotorAccLimits::default())
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    fn wheel() -> WheelCtrl {
        WheelCtrl::new(MotorAccLimits::symmetric(7.0, 1000.0))
    }

    #[test]
    fn test_displacement_matches_distance_covered() {
        let mut w = wheel();
        w.set_target(2.0);

        let dt = 0.01;
        let mut distance = 0.0;
        for _ in 0..300 {
            w.animate();
            w.advance(dt, false).unwrap();
            distance += w.displacement_m();
        }

        // After 3 s the wheel has long been at 2 m/s; the covered distance
        // equals the ramp distance plus the cruise distance. Compare with
        // a coarse bound and with the steady-state rate.
        assert!((w.speed_ms() - 2.0).abs() < 1e-9);
        assert!(distance > 5.0 && distance < 6.0);

        // At steady state each tick covers speed * dt exactly.
        w.animate();
        w.advance(dt, false).unwrap();
        assert!((w.displacement_m() - 2.0 * dt).abs() < 1e-12);
    }

    #[test]
    fn test_trim_scales_motion() {
        let mut w = wheel();
        w.set_trim(0.5);
        w.set_target(2.0);
        w.ctrl.force_speed(2.0);

        w.animate();
        w.advance(0.01, false).unwrap();

        assert!((w.speed_ms() - 1.0).abs() < 1e-9);
        assert!((w.displacement_m() - 0.5 * 2.0 * 0.01).abs() < 1e-12);
    }

    #[test]
    fn test_magic_motors_snap_to_target() {
        let mut w = wheel();
        w.set_target(3.0);
        w.animate();
        w.advance(0.01, true).unwrap();

        assert_eq!(w.speed_ms(), 3.0);
        assert!((w.displacement_m() - 3.0 * 0.01).abs() < 1e-12);
    }

    #[test]
    fn test_trim_clamped() {
        let mut w = wheel();
        w.set_trim(1.5);
        assert_eq!(w.trim_factor, 1.0);
        w.set_trim(-0.5);
        assert_eq!(w.trim_factor, 0.0);
    }
}
