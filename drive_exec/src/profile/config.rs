//! Validated vehicle configuration

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, warn};

// Internal
use super::{ProfileError, VehicleProfile};
use crate::speed_ctrl::MotorAccLimits;
use crate::turn_caps::TurnCaps;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Cap on the fixed-point body-speed reduction. The reduction converges in
/// a handful of steps for any sane profile; the cap bounds it for
/// pathological ones.
const MAX_SPEED_REDUCTION_ITERS: usize = 1000;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// An immutable, validated vehicle configuration.
///
/// Produced by [`VehicleProfile::validate`] and applied to the controllers
/// as one atomic swap.
#[derive(Debug, Clone)]
pub struct VehicleConfig {
    /// The validated source profile.
    pub profile: VehicleProfile,

    /// Turn capability with the turn-rate ceiling already clamped to what
    /// the wheels can deliver.
    pub turn_caps: TurnCaps,

    /// Maximum commandable body speed, reduced so that the worst-case
    /// per-wheel differential at that speed stays within the wheel speed
    /// limit.
    ///
    /// Units: meters/second
    pub max_body_speed_ms: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl VehicleProfile {
    /// Validate the profile into a [`VehicleConfig`].
    ///
    /// Fails fast on any non-positive limit, speed or geometry value.
    /// On success the turn-rate ceiling is clamped to
    /// `2 * max_wheel_speed / axle_width`, and the maximum body speed is
    /// reduced by fixed-point iteration until
    /// `max_body_speed + 0.5 * omega(max_body_speed) * axle_width` fits
    /// within the wheel speed limit.
    pub fn validate(&self) -> Result<VehicleConfig, ProfileError> {
        self.check_positive("max_wheel_speed_ms", self.max_wheel_speed_ms)?;
        self.check_positive("max_turn_rate_rads", self.max_turn_rate_rads)?;
        self.check_positive("max_lat_accel_mss", self.max_lat_accel_mss)?;
        self.check_positive("reversing_omega_slope", self.reversing_omega_slope)?;
        self.check_positive("max_knob_vel", self.max_knob_vel)?;
        self.check_positive("max_knob_acc", self.max_knob_acc)?;
        self.check_positive("axle_width_m", self.axle_width_m)?;
        self.check_positive("wheel_radius_m", self.wheel_radius_m)?;
        self.check_positive("wheel_width_m", self.wheel_width_m)?;
        self.check_positive(
            "joy_brake_speed_threshold_ms",
            self.joy_brake_speed_threshold_ms,
        )?;
        self.check_unit_range("throttle_factor", self.throttle_factor)?;
        self.check_unit_range("jog_factor", self.jog_factor)?;
        self.check_unit_range("turn_jog_factor", self.turn_jog_factor)?;

        self.check_limits("cruise_accel_limits", &self.cruise_accel_limits)?;
        self.check_limits("braking_accel_limits", &self.braking_accel_limits)?;
        self.check_limits("wheel_accel_limits", &self.wheel_accel_limits)?;

        // The fastest conceivable pivot has the wheels at full speed in
        // opposite directions.
        let max_pivot_omega = 2.0 * self.max_wheel_speed_ms / self.axle_width_m;

        let turn_caps = TurnCaps {
            max_lat_accel_mss: self.max_lat_accel_mss,
            max_turn_rate_rads: self.max_turn_rate_rads.min(max_pivot_omega),
            reversing_omega_slope: self.reversing_omega_slope,
            reverse_turns: self.reverse_turns,
        };

        // Reduce the body speed until body speed plus the half-differential
        // implied by the turn-rate limit at that speed fits in the wheel
        // speed limit.
        let mut max_body_speed_ms = self.max_wheel_speed_ms;
        let mut iters = 0;
        loop {
            let omega = turn_caps.max_turn_rate_for_speed(max_body_speed_ms);
            let half_diff_ms = 0.5 * omega * self.axle_width_m;
            if max_body_speed_ms + half_diff_ms > self.max_wheel_speed_ms {
                let reduced = self.max_wheel_speed_ms - half_diff_ms;
                if reduced < max_body_speed_ms {
                    max_body_speed_ms = reduced;
                    iters += 1;
                    if iters < MAX_SPEED_REDUCTION_ITERS {
                        continue;
                    }
                    warn!(
                        "Body speed reduction for '{}' stopped after {} iterations",
                        self.name, iters
                    );
                }
            }
            break;
        }

        debug!(
            "Vehicle '{}': max body speed {:.3} m/s (wheel limit {:.3} m/s)",
            self.name, max_body_speed_ms, self.max_wheel_speed_ms
        );

        Ok(VehicleConfig {
            profile: self.clone(),
            turn_caps,
            max_body_speed_ms,
        })
    }

    fn check_positive(&self, field: &str, value: f64) -> Result<(), ProfileError> {
        if value <= 0.0 {
            return Err(ProfileError::NonPositive {
                vehicle: self.name.clone(),
                field: String::from(field),
                value,
            });
        }
        Ok(())
    }

    fn check_unit_range(&self, field: &str, value: f64) -> Result<(), ProfileError> {
        if value <= 0.0 || value > 1.0 {
            return Err(ProfileError::OutOfUnitRange {
                vehicle: self.name.clone(),
                field: String::from(field),
                value,
            });
        }
        Ok(())
    }

    fn check_limits(&self, field: &str, limits: &MotorAccLimits) -> Result<(), ProfileError> {
        // A zero or negative acceleration or jerk limit would make the
        // trajectory solver divide by zero.
        for &(name, value) in [
            ("max_fwd_accel_mss", limits.max_fwd_accel_mss),
            ("max_fwd_decel_mss", limits.max_fwd_decel_mss),
            ("max_rev_accel_mss", limits.max_rev_accel_mss),
            ("max_rev_decel_mss", limits.max_rev_decel_mss),
            ("max_jerk_msss", limits.max_jerk_msss),
        ]
        .iter()
        {
            self.check_positive(&format!("{}.{}", field, name), value)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    /// A profile close to the slow art car.
    fn profile() -> VehicleProfile {
        VehicleProfile {
            name: String::from("Test Car"),
            max_wheel_speed_ms: 8.0 / 3.6,
            throttle_factor: 0.1,
            joy_brake_speed_threshold_ms: 0.2,
            cruise_accel_limits: MotorAccLimits::symmetric(0.5, 5.0),
            braking_accel_limits: MotorAccLimits::symmetric(2.0, 12.0),
            wheel_accel_limits: MotorAccLimits::symmetric(1.0, 15.0),
            max_turn_rate_rads: 20f64.to_radians(),
            max_lat_accel_mss: 4.0,
            reversing_omega_slope: 0.4,
            reverse_turns: false,
            max_knob_vel: 3.0,
            max_knob_acc: 5.0,
            jog_factor: 0.2,
            turn_jog_factor: 0.2,
            axle_width_m: 2.5,
            wheel_radius_m: 0.48,
            wheel_width_m: 0.285,
            traction_offset_m: [0.0, 0.0, -0.3],
        }
    }

    #[test]
    fn test_valid_profile_accepted() {
        let config = profile().validate().unwrap();
        assert!(config.max_body_speed_ms > 0.0);
        assert!(config.max_body_speed_ms <= config.profile.max_wheel_speed_ms);
    }

    #[test]
    fn test_reduction_is_consistent() {
        let config = profile().validate().unwrap();

        // At the reduced body speed, body speed plus the implied half
        // differential fits within the wheel speed limit.
        let omega = config
            .turn_caps
            .max_turn_rate_for_speed(config.max_body_speed_ms);
        let half_diff = 0.5 * omega * config.profile.axle_width_m;
        assert!(
            config.max_body_speed_ms + half_diff
                <= config.profile.max_wheel_speed_ms + 1e-9
        );
    }

    #[test]
    fn test_turn_rate_clamped_to_pivot_limit() {
        let mut p = profile();
        p.max_turn_rate_rads = 100.0;
        let config = p.validate().unwrap();

        let max_pivot = 2.0 * p.max_wheel_speed_ms / p.axle_width_m;
        assert!((config.turn_caps.max_turn_rate_rads - max_pivot).abs() < 1e-12);
    }

    #[test]
    fn test_non_positive_limit_rejected() {
        let mut p = profile();
        p.wheel_accel_limits.max_jerk_msss = 0.0;
        assert!(matches!(
            p.validate(),
            Err(ProfileError::NonPositive { .. })
        ));

        let mut p = profile();
        p.max_wheel_speed_ms = -1.0;
        assert!(p.validate().is_err());

        let mut p = profile();
        p.axle_width_m = 0.0;
        assert!(p.validate().is_err());
    }

    #[test]
    fn test_throttle_factor_range_checked() {
        let mut p = profile();
        p.throttle_factor = 1.5;
        assert!(matches!(
            p.validate(),
            Err(ProfileError::OutOfUnitRange { .. })
        ));
    }
}
