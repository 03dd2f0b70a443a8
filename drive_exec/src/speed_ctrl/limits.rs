//! Motor acceleration limit records

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Acceleration and jerk limits for a motor or for the vehicle body.
///
/// Immutable per vehicle selection; an *effective* record is produced each
/// tick by affine-blending the cruise and braking records by the braking
/// factor.
#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
pub struct MotorAccLimits {
    /// Maximum acceleration while moving forward.
    ///
    /// Units: meters/second^2
    pub max_fwd_accel_mss: f64,

    /// Maximum deceleration while moving forward.
    ///
    /// Units: meters/second^2
    pub max_fwd_decel_mss: f64,

    /// Maximum acceleration while reversing.
    ///
    /// Units: meters/second^2
    pub max_rev_accel_mss: f64,

    /// Maximum deceleration while reversing.
    ///
    /// Units: meters/second^2
    pub max_rev_decel_mss: f64,

    /// Maximum rate of change of acceleration.
    ///
    /// Units: meters/second^3
    pub max_jerk_msss: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl MotorAccLimits {
    /// Create a record with the same limit in all four directions.
    pub fn symmetric(accel_mss: f64, jerk_msss: f64) -> Self {
        Self {
            max_fwd_accel_mss: accel_mss,
            max_fwd_decel_mss: accel_mss,
            max_rev_accel_mss: accel_mss,
            max_rev_decel_mss: accel_mss,
            max_jerk_msss: jerk_msss,
        }
    }

    /// Load this record with the affine blend of two others.
    ///
    /// `t = 0` gives `src0`, `t = 1` gives `src1`. Every field is blended.
    pub fn blend_from(&mut self, src0: &Self, src1: &Self, t: f64) {
        fn blend(a: f64, b: f64, t: f64) -> f64 {
            a + t * (b - a)
        }

        self.max_fwd_accel_mss = blend(src0.max_fwd_accel_mss, src1.max_fwd_accel_mss, t);
        self.max_fwd_decel_mss = blend(src0.max_fwd_decel_mss, src1.max_fwd_decel_mss, t);
        self.max_rev_accel_mss = blend(src0.max_rev_accel_mss, src1.max_rev_accel_mss, t);
        self.max_rev_decel_mss = blend(src0.max_rev_decel_mss, src1.max_rev_decel_mss, t);
        self.max_jerk_msss = blend(src0.max_jerk_msss, src1.max_jerk_msss, t);
    }
}

impl Default for MotorAccLimits {
    /// A weak placeholder limit, replaced when a vehicle profile is
    /// applied.
    fn default() -> Self {
        Self::symmetric(0.1, 1.0)
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_blend_endpoints_and_midpoint() {
        let cruise = MotorAccLimits::symmetric(2.0, 10.0);
        let braking = MotorAccLimits::symmetric(10.0, 100.0);

        let mut eff = MotorAccLimits::default();

        eff.blend_from(&cruise, &braking, 0.0);
        assert_eq!(eff.max_fwd_accel_mss, 2.0);
        assert_eq!(eff.max_jerk_msss, 10.0);

        eff.blend_from(&cruise, &braking, 1.0);
        assert_eq!(eff.max_rev_decel_mss, 10.0);
        assert_eq!(eff.max_jerk_msss, 100.0);

        eff.blend_from(&cruise, &braking, 0.5);
        assert_eq!(eff.max_fwd_decel_mss, 6.0);
        assert_eq!(eff.max_jerk_msss, 55.0);
    }
}
