//! Turn capability of the vehicle
//!
//! The turn-rate limiter maps the current body speed to the maximum
//! permissible heading rate, so that lateral acceleration stays bounded at
//! speed while slow manoeuvres keep the full configured turn rate.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
use util::maths::clamp;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Below this speed the turn rate saturates to the configured ceiling
/// rather than being derived from the lateral-acceleration curve.
const SPEED_EPSILON_MS: f64 = 1e-15;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Turn capability record for the active vehicle.
///
/// Swapped atomically as a whole record when the vehicle changes.
#[derive(Clone, Copy, Debug)]
pub struct TurnCaps {
    /// Maximum lateral acceleration sustained in a turn.
    ///
    /// Units: meters/second^2 (1.47 m/s^2 is a standard highway maximum)
    pub max_lat_accel_mss: f64,

    /// Ceiling on the heading rate, approached as speed tends to zero.
    ///
    /// Units: radians/second
    pub max_turn_rate_rads: f64,

    /// Slope of the reversing logistic for the car-like convention.
    ///
    /// Units: 1/(meters/second)
    pub reversing_omega_slope: f64,

    /// Reversing convention: `false` preserves the sign of the heading rate
    /// under reversal (skid-steer, RC tank, excavator); `true` preserves
    /// the turning-circle geometry instead (car-like, stick pointed
    /// towards the turn centre), flipping the heading-rate sign as the
    /// speed crosses zero.
    pub reverse_turns: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for TurnCaps {
    fn default() -> Self {
        Self {
            max_lat_accel_mss: 4.0,
            max_turn_rate_rads: 90f64.to_radians(),
            reversing_omega_slope: 1.0,
            reverse_turns: false,
        }
    }
}

impl TurnCaps {
    /// Maximum permissible heading rate at the given body speed.
    ///
    /// The product `omega * speed` follows a logistic curve which
    /// approaches `max_lat_accel` asymptotically, so the returned rate
    /// never implies a lateral acceleration beyond the configured bound,
    /// and saturates to `max_turn_rate` near zero speed.
    pub fn max_turn_rate_for_speed(&self, speed_ms: f64) -> f64 {
        let mla = self.max_lat_accel_mss;
        let max_omega = self.max_turn_rate_rads;

        let lat_accel =
            mla * (-1.0 + 2.0 / (1.0 + (-2.0 * max_omega / mla * speed_ms).exp()));

        let mut omega = if speed_ms.abs() >= SPEED_EPSILON_MS {
            clamp(lat_accel / speed_ms, 0.0, max_omega)
        } else {
            max_omega
        };

        if self.reverse_turns {
            // Reversing the vehicle preserves the direction of the turning
            // circle but reverses the sign of the rate of change of the
            // heading. (The joystick is pointed towards the turning
            // centre.)
            omega *= -1.0
                + 2.0 / (1.0 + (-2.0 * self.reversing_omega_slope * speed_ms).exp());
        } else {
            // Reversing the vehicle preserves the sign of the rate of
            // change of the heading but flips the side on which the
            // turning circle appears.
        }

        omega
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_lateral_accel_bounded() {
        let caps = TurnCaps {
            max_lat_accel_mss: 4.0,
            max_turn_rate_rads: 1.0,
            reversing_omega_slope: 0.5,
            reverse_turns: false,
        };

        let max_speed = 30.0;
        let n = 2_000;
        for i in 0..=n {
            let v = -max_speed + 2.0 * max_speed * (i as f64) / (n as f64);
            let omega = caps.max_turn_rate_for_speed(v);
            assert!(
                (omega * v).abs() <= caps.max_lat_accel_mss + 1e-9,
                "lateral accel exceeded at v = {}: {}",
                v,
                omega * v
            );
        }
    }

    #[test]
    fn test_zero_speed_saturates_to_ceiling() {
        let caps = TurnCaps::default();
        assert_eq!(
            caps.max_turn_rate_for_speed(0.0),
            caps.max_turn_rate_rads
        );
    }

    #[test]
    fn test_skid_steer_preserves_omega_sign() {
        let caps = TurnCaps::default();
        let fwd = caps.max_turn_rate_for_speed(2.0);
        let rev = caps.max_turn_rate_for_speed(-2.0);
        assert!(fwd > 0.0);
        assert!((fwd - rev).abs() < 1e-12);
    }

    #[test]
    fn test_car_like_flips_omega_sign_in_reverse() {
        let caps = TurnCaps {
            reverse_turns: true,
            ..TurnCaps::default()
        };
        let fwd = caps.max_turn_rate_for_speed(2.0);
        let rev = caps.max_turn_rate_for_speed(-2.0);
        assert!(fwd > 0.0);
        assert!(rev < 0.0);
        assert!((fwd + rev).abs() < 1e-12);
    }
}
