//! Chassis state and the differential-drive integrator

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use nalgebra::Vector3;

// Internal
use super::{VehiclePose, WheelMotion, WheelState, DIFF_EPSILON_M, RADIUS_EPSILON_M};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The vehicle chassis: pose, wheel states and derived instrumentation.
#[derive(Clone, Copy, Debug)]
pub struct Chassis {
    /// Pose of the vehicle body. Mutated only by `integrate`.
    pub pose: VehiclePose,

    /// Offset of the traction point (the midpoint of the drive axle at
    /// ground level) from the vehicle origin, in the body frame.
    ///
    /// Units: meters
    pub traction_offset_m: Vector3<f64>,

    /// Distance between the two drive wheels.
    ///
    /// Units: meters
    pub axle_width_m: f64,

    /// Left drive wheel state.
    pub left_wheel: WheelState,

    /// Right drive wheel state.
    pub right_wheel: WheelState,

    /// Derived instrumentation, fully recomputed by every `integrate`.
    pub instruments: ChassisInstruments,
}

/// Instrumentation derived from the chassis motion, for external display
/// layers. Never partially stale: every field is recomputed each tick.
#[derive(Clone, Copy, Debug, Default)]
pub struct ChassisInstruments {
    /// World position of the instantaneous turn centre, or `None` when
    /// travelling straight.
    ///
    /// Units: meters
    pub turn_centre_m: Option<Vector3<f64>>,

    /// Angular velocity of the body about the up axis.
    ///
    /// Units: radians/second
    pub omega_rads: f64,

    /// Centripetal acceleration vector, pointing from the traction point
    /// towards the turn centre.
    ///
    /// Units: meters/second^2
    pub lat_accel_mss: Vector3<f64>,

    /// Forward acceleration vector estimated from the tick-to-tick change
    /// of the body velocity.
    ///
    /// Units: meters/second^2
    pub accel_mss: Vector3<f64>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Chassis {
    fn default() -> Self {
        Self {
            pose: VehiclePose::default(),
            traction_offset_m: Vector3::new(-0.05, 0.0, -0.2),
            axle_width_m: 0.55,
            left_wheel: WheelState::default(),
            right_wheel: WheelState::default(),
            instruments: ChassisInstruments::default(),
        }
    }
}

impl Chassis {
    /// Replace the chassis geometry. Part of the atomic vehicle swap.
    pub fn set_geometry(
        &mut self,
        axle_width_m: f64,
        traction_offset_m: Vector3<f64>,
        wheel_radius_m: f64,
        wheel_width_m: f64,
    ) {
        self.axle_width_m = axle_width_m;
        self.traction_offset_m = traction_offset_m;
        self.left_wheel.radius_m = wheel_radius_m;
        self.right_wheel.radius_m = wheel_radius_m;
        self.left_wheel.width_m = wheel_width_m;
        self.right_wheel.width_m = wheel_width_m;

        // Keep the body at wheel-contact height
        self.pose.position_m[2] = -self.traction_offset_m[2];
    }

    /// Place the vehicle at a position and/or heading, leaving the rest of
    /// the state untouched.
    pub fn plonk(&mut self, position_m: Option<[f64; 2]>, heading_rad: Option<f64>) {
        if let Some(h) = heading_rad {
            self.pose.set_heading(h);
        }
        if let Some(p) = position_m {
            self.pose.position_m[0] = p[0];
            self.pose.position_m[1] = p[1];
            self.pose.position_m[2] = -self.traction_offset_m[2];
        }
    }

    /// World position of the traction point.
    pub fn traction_point_m(&self) -> Vector3<f64> {
        self.pose.position_m + self.pose.to_world(&self.traction_offset_m)
    }

    /// Integrate one tick of wheel motion into the vehicle pose.
    ///
    /// The wheel displacements are exact integrals over the tick, so the
    /// distance travelled is reproduced exactly even under non-constant
    /// wheel speed. Three epsilon-guarded branches select the limiting
    /// formula: straight translation, pure rotation about the traction
    /// point, and the general circular arc.
    pub fn integrate(&mut self, left: WheelMotion, right: WheelMotion, delta_time_s: f64) {
        // Body velocity before the update, for the forward-acceleration
        // estimate.
        let speed_before = 0.5 * (self.left_wheel.speed_ms + self.right_wheel.speed_ms);
        let vel_before = self.pose.forward * speed_before;

        // Wheels spin by exactly the distance they rolled
        self.left_wheel.roll(left.displacement_m);
        self.right_wheel.roll(right.displacement_m);

        let mid = 0.5 * (right.displacement_m + left.displacement_m);
        let diff = right.displacement_m - left.displacement_m;

        let beta_rad;
        let chord_fwd_m;
        let chord_left_m;
        let mut turn_radius_m = None;

        if diff.abs() > DIFF_EPSILON_M {
            let r = self.axle_width_m * mid / diff;
            if r.abs() > RADIUS_EPSILON_M {
                // Circular arc: translate by the exact chord in the local
                // frame. The chord keeps the turn centre at `traction +
                // r * left` stationary, so circles are preserved exactly
                // at any tick size.
                beta_rad = mid / r;
                chord_fwd_m = r * beta_rad.sin();
                chord_left_m = r * (1.0 - beta_rad.cos());
                turn_radius_m = Some(r);
            } else {
                // Turning on the spot about the traction point
                beta_rad = diff / self.axle_width_m;
                chord_fwd_m = 0.0;
                chord_left_m = 0.0;
                turn_radius_m = Some(0.0);
            }
        } else {
            // Very straight
            beta_rad = diff / self.axle_width_m;
            chord_fwd_m = mid;
            chord_left_m = 0.0;
        }

        // Move the traction point by the chord, expressed with the current
        // basis
        let mut traction_m = self.traction_point_m();
        traction_m += self.pose.forward * chord_fwd_m + self.pose.left * chord_left_m;

        // Rotate the heading and rebuild the basis from scratch
        let heading = self.pose.heading_rad() + beta_rad;
        self.pose.set_heading(heading);

        // Recover the vehicle origin from the moved traction point
        self.pose.position_m = traction_m - self.pose.to_world(&self.traction_offset_m);

        // New wheel ground speeds
        self.left_wheel.speed_ms = left.speed_ms;
        self.right_wheel.speed_ms = right.speed_ms;

        // Instrumentation, fully recomputed
        self.instruments.turn_centre_m = None;
        self.instruments.omega_rads = 0.0;
        self.instruments.lat_accel_mss = Vector3::zeros();

        if let Some(r) = turn_radius_m {
            let radius_vect = self.pose.left * r;
            self.instruments.turn_centre_m = Some(traction_m + radius_vect);

            let diff_speed = right.speed_ms - left.speed_ms;
            self.instruments.omega_rads = diff_speed / self.axle_width_m;
            self.instruments.lat_accel_mss =
                radius_vect * self.instruments.omega_rads.powi(2);
        }

        if delta_time_s > 0.0 {
            let speed_after = 0.5 * (left.speed_ms + right.speed_ms);
            let vel_after = self.pose.forward * speed_after;
            self.instruments.accel_mss = (vel_after - vel_before) / delta_time_s;
        }

        // Tyre scrub estimate
        let twist = WheelState::twist_increment(self.instruments.omega_rads, delta_time_s);
        self.left_wheel.scrub(twist, delta_time_s);
        self.right_wheel.scrub(twist, delta_time_s);
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    /// A chassis with the traction point at the vehicle origin, so that
    /// pose positions can be checked directly.
    fn chassis(axle_width_m: f64) -> Chassis {
        let mut c = Chassis::default();
        c.set_geometry(axle_width_m, Vector3::zeros(), 0.25, 0.2);
        c
    }

    fn motion(displacement_m: f64, speed_ms: f64) -> WheelMotion {
        WheelMotion {
            displacement_m,
            speed_ms,
        }
    }

    #[test]
    fn test_straight_translation() {
        let mut c = chassis(2.5);
        c.plonk(Some([0.0, 0.0]), Some(0.0));

        c.integrate(motion(1.0, 1.0), motion(1.0, 1.0), 1.0);

        assert!((c.pose.position_m[0] - 1.0).abs() < 1e-12);
        assert!(c.pose.position_m[1].abs() < 1e-12);
        assert!(c.pose.heading_rad().abs() < 1e-12);
        assert!(c.instruments.turn_centre_m.is_none());
        assert_eq!(c.instruments.omega_rads, 0.0);
    }

    #[test]
    fn test_straight_translation_follows_heading() {
        let mut c = chassis(2.5);
        let heading = 30f64.to_radians();
        c.plonk(Some([2.0, -1.0]), Some(heading));

        c.integrate(motion(1.0, 1.0), motion(1.0, 1.0), 1.0);

        assert!((c.pose.position_m[0] - (2.0 + heading.cos())).abs() < 1e-12);
        assert!((c.pose.position_m[1] - (-1.0 + heading.sin())).abs() < 1e-12);
        assert!((c.pose.heading_rad() - heading).abs() < 1e-12);
    }

    #[test]
    fn test_spin_on_the_spot() {
        let mut c = chassis(2.0);
        c.plonk(Some([0.5, 0.5]), Some(0.0));

        c.integrate(motion(-1.0, -1.0), motion(1.0, 1.0), 1.0);

        assert!((c.pose.heading_rad() - 1.0).abs() < 1e-12);
        assert!((c.pose.position_m[0] - 0.5).abs() < 1e-12);
        assert!((c.pose.position_m[1] - 0.5).abs() < 1e-12);

        // The turn centre is the traction point itself
        let tc = c.instruments.turn_centre_m.expect("no turn centre");
        assert!((tc - c.traction_point_m()).norm() < 1e-12);
        assert!((c.instruments.omega_rads - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_arc_turn_geometry() {
        let mut c = chassis(0.5);
        c.plonk(Some([0.0, 0.0]), Some(0.0));

        // mid = 1.0, diff = 0.2 -> r = 0.5 * 1.0 / 0.2 = 2.5, beta = 0.4
        c.integrate(motion(0.9, 0.9), motion(1.1, 1.1), 1.0);

        let beta: f64 = 0.4;
        let r = 2.5;
        assert!((c.pose.heading_rad() - beta).abs() < 1e-12);
        assert!((c.pose.position_m[0] - r * beta.sin()).abs() < 1e-12);
        assert!((c.pose.position_m[1] - r * (1.0 - beta.cos())).abs() < 1e-12);

        // omega = (1.1 - 0.9) / 0.5 = 0.4 rad/s, lateral accel = omega^2*r
        assert!((c.instruments.omega_rads - 0.4).abs() < 1e-12);
        let lat = c.instruments.lat_accel_mss;
        assert!((lat.norm() - 0.4f64.powi(2) * r).abs() < 1e-9);

        // The turn centre sits a radius away from the traction point, on
        // the left for a left turn
        let tc = c.instruments.turn_centre_m.expect("no turn centre");
        assert!(((tc - c.traction_point_m()).norm() - r).abs() < 1e-9);
        // The lateral acceleration points at the turn centre
        let to_centre = tc - c.traction_point_m();
        assert!((to_centre.normalize() - lat.normalize()).norm() < 1e-9);
    }

    #[test]
    fn test_turn_centre_stationary_on_steady_arc() {
        let mut c = chassis(0.5);
        c.plonk(Some([0.0, 0.0]), Some(0.0));

        c.integrate(motion(0.009, 0.9), motion(0.011, 1.1), 0.01);
        let first = c.instruments.turn_centre_m.expect("no turn centre");

        // Tick size must not matter: the same wheel ratio with coarse
        // ticks keeps the same centre.
        for _ in 0..100 {
            c.integrate(motion(0.09, 0.9), motion(0.11, 1.1), 0.1);
        }
        let last = c.instruments.turn_centre_m.expect("no turn centre");

        assert!(
            (first - last).norm() < 1e-9,
            "turn centre drifted by {}",
            (first - last).norm()
        );
    }

    #[test]
    fn test_basis_stays_orthonormal() {
        let mut c = chassis(0.55);
        c.plonk(Some([0.0, 0.0]), Some(0.3));

        for i in 0..5_000 {
            let ld = 0.01 + 0.005 * ((i % 7) as f64 - 3.0);
            let rd = 0.01 - 0.003 * ((i % 5) as f64 - 2.0);
            c.integrate(motion(ld, ld * 100.0), motion(rd, rd * 100.0), 0.01);
        }

        let p = &c.pose;
        assert!((p.forward.norm() - 1.0).abs() < 1e-12);
        assert!((p.left.norm() - 1.0).abs() < 1e-12);
        assert!((p.up.norm() - 1.0).abs() < 1e-12);
        assert!(p.forward.dot(&p.left).abs() < 1e-12);
        assert!(p.forward.dot(&p.up).abs() < 1e-12);
        assert!(p.left.dot(&p.up).abs() < 1e-12);
    }

    #[test]
    fn test_wheel_spin_angle_from_displacement() {
        let mut c = chassis(2.0);
        c.integrate(motion(0.5, 0.5), motion(0.5, 0.5), 1.0);

        // 0.5 m on a 0.25 m radius wheel = 2 rad of spin
        assert!((c.left_wheel.angle_rad - 2.0).abs() < 1e-12);
        assert!((c.right_wheel.angle_rad - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_twist_builds_and_decays() {
        let mut c = chassis(0.5);

        // Spinning in place builds twist
        for _ in 0..50 {
            c.integrate(motion(-0.01, -1.0), motion(0.01, 1.0), 0.01);
        }
        let twist_after_spin = c.left_wheel.twist;
        assert!(twist_after_spin > 0.1);

        // Rolling straight decays it
        for _ in 0..200 {
            c.integrate(motion(0.02, 2.0), motion(0.02, 2.0), 0.01);
        }
        assert!(c.left_wheel.twist.abs() < 0.05 * twist_after_spin.abs() + 1e-6);
    }
}
