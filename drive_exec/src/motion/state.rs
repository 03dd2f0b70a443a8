//! Limited motion profile state and solver

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use std::marker::PhantomData;

// Internal
use super::{MotionError, MotionQuantity, Segment, NUM_SEGMENTS};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A jerk-free view of the trajectory primitive: a value `x` driven toward
/// `target_x` under the rate limits `max_fwd_v`/`max_rev_v` and the
/// second-derivative limit `max_a`.
///
/// The state is owned exclusively by one controller instance and mutated
/// only by its own [`MotionProfile::advance`] call.
pub struct MotionProfile<Q: MotionQuantity> {
    /// Current value of the profiled quantity.
    pub x: f64,

    /// Current rate of change of the profiled quantity.
    pub v: f64,

    /// Target value toward which the profile is driven.
    pub target_x: f64,

    /// Rate limit in the positive direction (a positive number).
    pub max_fwd_v: f64,

    /// Rate limit in the negative direction (a positive number).
    pub max_rev_v: f64,

    /// Second-derivative limit (a positive number).
    pub max_a: f64,

    /// Accumulated time-integral of `x` across `advance` calls.
    ///
    /// The integral is exact: it is evaluated from the closed-form cubic of
    /// every trajectory piece overlapping the advanced interval, not
    /// sampled.
    pub integral: f64,

    _quantity: PhantomData<Q>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<Q: MotionQuantity> MotionProfile<Q> {
    /// Create a profile at rest at zero with effectively unbounded limits.
    pub fn new() -> Self {
        Self {
            x: 0.0,
            v: 0.0,
            target_x: 0.0,
            max_fwd_v: 1e6,
            max_rev_v: 1e6,
            max_a: 1e6,
            integral: 0.0,
            _quantity: PhantomData,
        }
    }

    /// Reset the accumulated integral, returning the previous value.
    pub fn take_integral(&mut self) -> f64 {
        let i = self.integral;
        self.integral = 0.0;
        i
    }

    /// Advance the profile by `delta_time` seconds.
    ///
    /// The trajectory is built from six pieces with non-decreasing start
    /// times:
    ///
    /// 1. Rein — correct any overspeeding at `max_a` (zero length when the
    ///    current rate is within its limit).
    /// 2. Turn — full deceleration to rest, present only when the target
    ///    lies behind the direction of travel or full deceleration would
    ///    overshoot it. Otherwise the following pieces are back-projected
    ///    to a hypothetical past rest state so they can be generated
    ///    uniformly.
    /// 3. Lurch — accelerate toward the target.
    /// 4. Cruise — hold the directional rate limit (zero length for
    ///    triangular profiles).
    /// 5. Brake — decelerate to reach exactly zero rate at the target.
    /// 6. Rest — hold the target thereafter.
    ///
    /// All formulas work directly for negative displacements and rates;
    /// only the directional rate limit is selected by sign. After `advance`
    /// the rate magnitude is within its direction's limit except while the
    /// Rein piece of the same call is still correcting an externally forced
    /// overspeed.
    pub fn advance(&mut self, delta_time: f64) -> Result<(), MotionError> {
        if self.max_a <= 0.0 {
            return Err(MotionError::NonPositiveMaxAccel {
                quantity: Q::LABEL,
                max_a: self.max_a,
            });
        }

        let decel = -self.max_a.copysign(self.v);

        // Rein in the current rate if it is beyond the limit for its
        // direction.
        let dv_rein = if self.v > self.max_fwd_v {
            self.max_fwd_v - self.v
        } else if self.v < -self.max_rev_v {
            -self.max_rev_v - self.v
        } else {
            0.0
        };
        let dt_rein = dv_rein.abs() / self.max_a;
        let dx_rein = (self.v + 0.5 * decel * dt_rein) * dt_rein;

        let rein = Segment {
            t0: 0.0,
            x0: self.x,
            v0: self.v,
            a: decel,
        };
        let turn = Segment {
            t0: rein.t0 + dt_rein,
            x0: rein.x0 + dx_rein,
            v0: rein.v0 + dv_rein,
            a: decel,
        };

        // With any overspeeding corrected, (turn.t0, turn.x0, turn.v0) is
        // the initial state. Find the minimum stopping time and the
        // displacement at that time under full deceleration.
        let dt_msd = turn.v0.abs() / self.max_a;
        let dx_msd = dt_msd * (turn.v0 + 0.5 * dt_msd * decel);
        let x_at_msd = turn.x0 + dx_msd;

        let heading_wrong_way = (self.target_x < turn.x0) != (turn.v0 < 0.0);
        let will_overshoot_anyway = (self.target_x < x_at_msd) != (dx_msd < 0.0);

        let mut lurch;
        let t_bp_lurch;
        let x_bp_lurch;
        if heading_wrong_way || will_overshoot_anyway {
            // Decelerate to a stop and lurch in the other direction. The
            // back-projected rest state coincides with the start of the
            // lurch piece.
            lurch = Segment {
                t0: turn.t0 + dt_msd,
                x0: turn.x0 + dx_msd,
                v0: 0.0,
                a: 0.0,
            };
            t_bp_lurch = lurch.t0;
            x_bp_lurch = lurch.x0;
        } else {
            // No turning necessary: proceed to lurch (or lurch even more),
            // back-projecting to the instant the lurch would have begun
            // from rest.
            lurch = Segment {
                t0: turn.t0,
                x0: turn.x0,
                v0: turn.v0,
                a: 0.0,
            };
            t_bp_lurch = lurch.t0 - dt_msd;
            x_bp_lurch = lurch.x0 - dx_msd;
        }

        // From here the trajectory is monotonic toward the target.
        let dx = self.target_x - x_bp_lurch;
        let adx = dx.abs();
        let accel = self.max_a.copysign(dx);
        let decel = -accel;
        let max_v = if dx <= 0.0 {
            self.max_rev_v
        } else {
            self.max_fwd_v
        };
        let max_dx_for_triangular_v = (max_v * max_v) / self.max_a;

        let dt_vramp;
        let dx_for_triangular_v;
        let lin_seg_dx;
        let lin_seg_dt;
        let inflection_v;
        if adx <= max_dx_for_triangular_v {
            // The rate limit is not reached: triangular profile.
            dt_vramp = (adx / self.max_a).sqrt();
            dx_for_triangular_v = adx;
            lin_seg_dx = 0.0;
            lin_seg_dt = 0.0;
            inflection_v = self.max_a * dt_vramp;
        } else {
            // Linear piece where the rate limit is sustained.
            dt_vramp = max_v / self.max_a;
            dx_for_triangular_v = max_dx_for_triangular_v;
            lin_seg_dx = adx - max_dx_for_triangular_v;
            lin_seg_dt = lin_seg_dx / max_v.max(1e-12);
            inflection_v = max_v;
        }

        lurch.a = accel;

        let cruise = Segment {
            t0: t_bp_lurch + dt_vramp,
            x0: x_bp_lurch + 0.5 * dx_for_triangular_v.copysign(dx),
            v0: inflection_v.copysign(dx),
            a: 0.0,
        };
        let brake = Segment {
            t0: cruise.t0 + lin_seg_dt,
            x0: cruise.x0 + lin_seg_dx.copysign(dx),
            v0: cruise.v0,
            a: decel,
        };
        let rest = Segment {
            t0: brake.t0 + dt_vramp,
            x0: self.target_x,
            v0: 0.0,
            a: 0.0,
        };

        let segments = [rein, turn, lurch, cruise, brake, rest];

        // Find the unique piece whose window contains delta_time.
        let seg_ix = if delta_time < lurch.t0 {
            if delta_time < turn.t0 {
                0
            } else {
                1
            }
        } else if delta_time < brake.t0 {
            if delta_time < cruise.t0 {
                2
            } else {
                3
            }
        } else if delta_time < rest.t0 {
            4
        } else {
            5
        };

        // Accumulate the exact integral of x over [0, delta_time] from
        // every piece whose window overlaps it.
        for (i, segment) in segments.iter().enumerate().take(seg_ix + 1) {
            let t_end = if i + 1 < NUM_SEGMENTS {
                segments[i + 1].t0
            } else {
                f64::INFINITY
            };
            let t1 = delta_time.min(t_end);
            if t1 >= 0.0 {
                self.integral += segment.integral_to(t1);
            }
        }

        let segment = &segments[seg_ix];
        self.x = segment.value_at(delta_time);
        self.v = segment.rate_at(delta_time);

        Ok(())
    }
}

impl<Q: MotionQuantity> Default for MotionProfile<Q> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Q: MotionQuantity> Copy for MotionProfile<Q> {}

impl<Q: MotionQuantity> Clone for MotionProfile<Q> {
    fn clone(&self) -> Self {
        *self
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    struct TestQty;

    impl MotionQuantity for TestQty {
        const LABEL: &'static str = "test";
    }

    /// A profile preloaded with the given state and limits.
    fn profile(
        x: f64,
        v: f64,
        target_x: f64,
        max_fwd_v: f64,
        max_rev_v: f64,
        max_a: f64,
    ) -> MotionProfile<TestQty> {
        let mut p = MotionProfile::<TestQty>::new();
        p.x = x;
        p.v = v;
        p.target_x = target_x;
        p.max_fwd_v = max_fwd_v;
        p.max_rev_v = max_rev_v;
        p.max_a = max_a;
        p
    }

    /// Six scenarios covering every trajectory shape: rest to rest,
    /// below top rate, at top rate, overshoot, overspeed, and overspeed
    /// with overshoot.
    fn scenarios() -> Vec<MotionProfile<TestQty>> {
        vec![
            profile(-1.0, 0.0, 1.5, 3.0, 3.0, 5.0),
            profile(-1.0, 1.5, 3.5, 3.5, 3.5, 3.0),
            profile(1.5, -4.0, -2.0, 4.0, 4.0, 4.0),
            profile(-0.5, 3.5, 0.5, 3.5, 3.5, 3.0),
            profile(1.5, -4.0, -2.0, 2.0, 2.0, 4.0),
            profile(-0.5, 5.5, 0.5, 3.5, 3.5, 3.0),
        ]
    }

    #[test]
    fn test_convergence() {
        for mut p in scenarios() {
            let target = p.target_x;
            p.advance(100.0).unwrap();
            assert!(
                (p.x - target).abs() < 1e-9,
                "did not reach target: x = {}, target = {}",
                p.x,
                target
            );
            assert!(p.v.abs() < 1e-9, "did not come to rest: v = {}", p.v);
        }
    }

    #[test]
    fn test_continuity_against_stepped_advance() {
        // Advancing in one call must agree with advancing in many small
        // steps across every piece boundary, since re-solving from any
        // on-trajectory state continues the same trajectory.
        for p0 in scenarios() {
            let mut whole = p0;
            let mut stepped = p0;

            let n = 400;
            let total = 8.0;
            let dt = total / n as f64;

            whole.advance(total).unwrap();
            for _ in 0..n {
                stepped.advance(dt).unwrap();
            }

            assert!(
                (whole.x - stepped.x).abs() < 1e-6,
                "x diverged: {} vs {}",
                whole.x,
                stepped.x
            );
            assert!(
                (whole.v - stepped.v).abs() < 1e-6,
                "v diverged: {} vs {}",
                whole.v,
                stepped.v
            );
            assert!(
                (whole.integral - stepped.integral).abs() < 1e-6,
                "integral diverged: {} vs {}",
                whole.integral,
                stepped.integral
            );
        }
    }

    #[test]
    fn test_odd_symmetry() {
        let dts = [0.05, 0.31, 0.77, 1.3, 2.9, 6.0];
        for p0 in scenarios() {
            for &dt in dts.iter() {
                let mut p = p0;
                let mut m = p0;
                m.x = -p0.x;
                m.v = -p0.v;
                m.target_x = -p0.target_x;
                m.max_fwd_v = p0.max_rev_v;
                m.max_rev_v = p0.max_fwd_v;

                p.advance(dt).unwrap();
                m.advance(dt).unwrap();

                assert!(
                    (p.x + m.x).abs() < 1e-9,
                    "x not odd-symmetric: {} vs {}",
                    p.x,
                    m.x
                );
                assert!(
                    (p.v + m.v).abs() < 1e-9,
                    "v not odd-symmetric: {} vs {}",
                    p.v,
                    m.v
                );
            }
        }
    }

    #[test]
    fn test_integral_matches_quadrature() {
        // Midpoint-rule quadrature of x(t) over a window spanning several
        // pieces, against the closed-form accumulated integral.
        for p0 in scenarios() {
            let total = 4.0;
            let n = 40_000;
            let h = total / n as f64;

            let mut quad = 0.0;
            for i in 0..n {
                let mut p = p0;
                p.advance((i as f64 + 0.5) * h).unwrap();
                quad += p.x * h;
            }

            let mut p = p0;
            p.advance(total).unwrap();

            assert!(
                (p.integral - quad).abs() < 1e-4,
                "integral {} differs from quadrature {}",
                p.integral,
                quad
            );
        }
    }

    #[test]
    fn test_rein_correction() {
        // Starting above the forward rate limit the earliest part of the
        // tick decelerates at exactly max_a until the limit is met.
        let p0 = profile(0.0, 5.0, 100.0, 2.0, 2.0, 4.0);
        let t_rein = (5.0 - 2.0) / 4.0;

        let mut p = p0;
        p.advance(0.5 * t_rein).unwrap();
        assert!((p.v - (5.0 - 4.0 * 0.5 * t_rein)).abs() < 1e-12);

        let mut p = p0;
        p.advance(t_rein).unwrap();
        assert!((p.v - 2.0).abs() < 1e-12);

        // Beyond the rein the rate stays within the limit.
        let mut p = p0;
        p.advance(t_rein + 0.25).unwrap();
        assert!(p.v <= 2.0 + 1e-12);
    }

    #[test]
    fn test_hold_at_target() {
        let mut p = profile(2.0, 0.0, 2.0, 1.0, 1.0, 1.0);
        p.advance(0.7).unwrap();
        assert_eq!(p.x, 2.0);
        assert_eq!(p.v, 0.0);
    }

    #[test]
    fn test_non_positive_max_accel_rejected() {
        let mut p = profile(0.0, 0.0, 1.0, 1.0, 1.0, 0.0);
        assert!(matches!(
            p.advance(0.1),
            Err(MotionError::NonPositiveMaxAccel { .. })
        ));
    }
}
