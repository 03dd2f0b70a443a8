//! Implementations for the DriveCtrl state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info, trace};
use nalgebra::Vector3;
use serde::Serialize;

// Internal
use super::{
    DriveCtrlError, InputData, KnobTravel, BRAKING_FACTOR_THRESHOLD,
    REVERSING_SPEED_THRESHOLD_MS,
};
use crate::chassis::{Chassis, WheelMotion};
use crate::motion::MotionProfile;
use crate::profile::{VehicleConfig, VehicleProfile, VehicleProfiles};
use crate::speed_ctrl::{DriveSpeedCtrl, JoyBrakeState};
use crate::turn_caps::TurnCaps;
use crate::wheel_ctrl::WheelCtrl;
use util::{
    archive::{Archived, Archiver},
    maths::clamp,
    module::State,
    params,
    session::Session,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Drive control module state
#[derive(Default)]
pub struct DriveCtrl {
    /// Vehicle profiles available for selection.
    profiles: Vec<VehicleProfile>,

    /// The active validated vehicle configuration.
    config: Option<VehicleConfig>,

    /// Turn capability of the active vehicle.
    turn_caps: TurnCaps,

    /// Softened turn knob. Position-domain profile: value is the unitless
    /// knob deflection in [-1, 1].
    knob_ctrl: MotionProfile<KnobTravel>,

    /// Body speed controller.
    speed_ctrl: DriveSpeedCtrl,

    /// Left wheel controller.
    left_wheel_ctrl: WheelCtrl,

    /// Right wheel controller.
    right_wheel_ctrl: WheelCtrl,

    /// Pose integrator and instrumentation.
    chassis: Chassis,

    /// Braking flag with hysteresis (the stop-lamp signal).
    braking_active: bool,

    report: StatusReport,
    output: Option<DriveSnapshot>,

    arch_snapshot: Archiver,
    arch_report: Archiver,
}

/// Read-only per-tick snapshot of the vehicle state, consumed by the
/// external renderer and instrumentation layers. No field feeds back into
/// the controllers.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct DriveSnapshot {
    /// Vehicle origin position in the world frame.
    ///
    /// Units: meters
    pub position_m: [f64; 3],

    /// Heading of the forward axis, anticlockwise from world +x.
    ///
    /// Units: radians
    pub heading_rad: f64,

    /// Orientation basis vectors in the world frame.
    pub forward: [f64; 3],
    pub left: [f64; 3],
    pub up: [f64; 3],

    /// Jerk-limited body speed.
    ///
    /// Units: meters/second
    pub body_speed_ms: f64,

    /// Jerk-limited body acceleration.
    ///
    /// Units: meters/second^2
    pub body_accel_mss: f64,

    /// Wheel snapshots, left then right.
    pub wheels: [WheelSnapshot; 2],

    /// World position of the turn centre, or `None` when travelling
    /// straight.
    ///
    /// Units: meters
    pub turn_centre_m: Option<[f64; 3]>,

    /// Angular velocity of the body about the up axis.
    ///
    /// Units: radians/second
    pub omega_rads: f64,

    /// Centripetal acceleration vector.
    ///
    /// Units: meters/second^2
    pub lat_accel_mss: [f64; 3],

    /// Forward acceleration vector.
    ///
    /// Units: meters/second^2
    pub accel_mss: [f64; 3],

    /// Braking factor in force this tick, 0 to 1.
    pub effective_braking_factor: f64,

    /// Braking flag with hysteresis (drives the stop lamps).
    pub braking_active: bool,

    /// True while the vehicle is moving backwards.
    pub reversing: bool,
}

/// Snapshot of one wheel.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct WheelSnapshot {
    /// Spin angle about the axle, wrapped to [0, 2*pi).
    ///
    /// Units: radians
    pub angle_rad: f64,

    /// Linear ground speed.
    ///
    /// Units: meters/second
    pub speed_ms: f64,

    /// Scrubbing stress estimate, -1 to +1.
    pub twist: f64,
}

/// Status report for DriveCtrl processing.
#[derive(Clone, Copy, Debug, Default, Serialize)]
pub struct StatusReport {
    /// True while the joystick brake is engaged.
    pub joy_brake_engaged: bool,

    /// True while the braking flag is lit.
    pub braking_active: bool,

    /// True while the vehicle is moving backwards.
    pub reversing: bool,

    /// True when an external wheel-speed override was applied this tick.
    pub wheel_override_active: bool,

    /// True when jog input replaced the operator vector this tick.
    pub jogging: bool,
}

/// Flat record of a snapshot for the CSV archive.
#[derive(Serialize)]
struct SnapshotRecord {
    pos_x_m: f64,
    pos_y_m: f64,
    pos_z_m: f64,
    heading_rad: f64,
    body_speed_ms: f64,
    body_accel_mss: f64,
    left_wheel_speed_ms: f64,
    right_wheel_speed_ms: f64,
    left_wheel_angle_rad: f64,
    right_wheel_angle_rad: f64,
    left_wheel_twist: f64,
    right_wheel_twist: f64,
    turn_centre_valid: bool,
    turn_centre_x_m: f64,
    turn_centre_y_m: f64,
    omega_rads: f64,
    lat_accel_mss: f64,
    accel_mss: f64,
    braking_factor: f64,
    braking_active: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl State for DriveCtrl {
    type InitData = &'static str;
    type InitError = DriveCtrlError;

    type InputData = InputData;
    type OutputData = DriveSnapshot;
    type StatusReport = StatusReport;
    type ProcError = DriveCtrlError;

    /// Initialise the DriveCtrl module.
    ///
    /// Expected init data is the path to the vehicle profiles parameter
    /// file. The first profile in the file becomes the active vehicle.
    fn init(&mut self, init_data: Self::InitData, session: &Session)
        -> Result<(), Self::InitError>
    {
        // Load the vehicle profiles
        let profiles: VehicleProfiles =
            params::load(init_data).map_err(DriveCtrlError::ParamLoadError)?;

        if profiles.vehicles.is_empty() {
            return Err(DriveCtrlError::NoVehicles);
        }
        self.profiles = profiles.vehicles;

        // Create the arch folder for drive_ctrl
        let mut arch_path = session.arch_root.clone();
        arch_path.push("drive_ctrl");
        std::fs::create_dir_all(arch_path)
            .map_err(|e| DriveCtrlError::ArchiveInitError(e.to_string()))?;

        // Initialise the archivers
        self.arch_snapshot = Archiver::from_path(session, "drive_ctrl/snapshot.csv")
            .map_err(|e| DriveCtrlError::ArchiveInitError(e.to_string()))?;
        self.arch_report = Archiver::from_path(session, "drive_ctrl/status_report.csv")
            .map_err(|e| DriveCtrlError::ArchiveInitError(e.to_string()))?;

        // Select the default vehicle
        let first = self.profiles[0].name.clone();
        self.set_vehicle(&first)?;

        Ok(())
    }

    /// Perform one tick of drive control.
    fn proc(&mut self, input_data: &Self::InputData)
        -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError>
    {
        // Clear the status report
        self.report = StatusReport::default();

        let config = match self.config {
            Some(ref c) => c,
            None => return Err(DriveCtrlError::NoVehicle),
        };
        let dt = input_data.delta_time_s;
        if dt < 0.0 {
            return Err(DriveCtrlError::NegativeDeltaTime(dt));
        }

        let axle_width_m = config.profile.axle_width_m;
        let jog_factor = config.profile.jog_factor;
        let turn_jog_factor = config.profile.turn_jog_factor;
        let throttle_factor = config.profile.throttle_factor;
        let max_body_speed_ms = config.max_body_speed_ms;
        let switches = input_data.switches;

        // ---- OPERATOR VECTOR ----

        let mut joy = input_data.operator_xy;
        let mut joy_brake_allowed = switches.enable_joy_brake;
        let mut turn_caps = self.turn_caps;

        // Jog input replaces the operator vector with small fixed
        // deflections, with braking and car-like reversal out of the way.
        if input_data.jog_xy != [0, 0] {
            joy = [
                turn_jog_factor * input_data.jog_xy[0] as f64,
                jog_factor * input_data.jog_xy[1] as f64,
            ];
            joy_brake_allowed = false;
            turn_caps.reverse_turns = false;
            self.report.jogging = true;
        }

        // ---- TURN SOFTENING ----

        self.knob_ctrl.target_x = joy[0];
        if !switches.soften_turns {
            self.knob_ctrl.x = self.knob_ctrl.target_x;
            self.knob_ctrl.v = 0.0;
        }
        let soft_x = self.knob_ctrl.x;

        // ---- TURN RATE AND WHEEL TARGETS ----

        // Body speed as the wheels see it, from the previous tick
        let actual_speed_ms = 0.5
            * (self.left_wheel_ctrl.ctrl.current_speed_ms
                + self.right_wheel_ctrl.ctrl.current_speed_ms);

        let max_omega_for_speed = if switches.limit_turn_rate {
            turn_caps.max_turn_rate_for_speed(actual_speed_ms)
        } else {
            turn_caps.max_turn_rate_rads
        };

        // Positive knob deflection turns right, i.e. a negative heading
        // rate in this anticlockwise-positive frame
        let omega_rads = -max_omega_for_speed * soft_x;
        let half_diff_speed_ms = 0.5 * omega_rads * axle_width_m;

        // ---- SPEED CONTROL ----

        let ext_braking_factor = clamp(input_data.braking_factor, 0.0, 1.0);
        self.speed_ctrl.enable_joy_brake = joy_brake_allowed;
        self.speed_ctrl.enable_throttle = switches.enable_throttle;
        self.speed_ctrl.throttle_factor = throttle_factor;
        self.speed_ctrl.max_speed_ms = max_body_speed_ms;
        self.speed_ctrl.lever_pos = joy[1];
        self.speed_ctrl.input_braking_factor = ext_braking_factor;
        self.speed_ctrl.animate();
        if !switches.soften_speed {
            self.speed_ctrl
                .ctrl
                .force_speed(joy[1] * max_body_speed_ms * (1.0 - ext_braking_factor));
        }

        // ---- WHEEL TARGETS ----

        let mut left_target_ms = self.speed_ctrl.ctrl.current_speed_ms - half_diff_speed_ms;
        let mut right_target_ms = self.speed_ctrl.ctrl.current_speed_ms + half_diff_speed_ms;
        if let Some(ov) = input_data.wheel_override {
            left_target_ms = ov.left_ms;
            right_target_ms = ov.right_ms;
            self.report.wheel_override_active = true;
        }
        self.left_wheel_ctrl.set_target(left_target_ms);
        self.right_wheel_ctrl.set_target(right_target_ms);
        self.left_wheel_ctrl.animate();
        self.right_wheel_ctrl.animate();

        // ---- BRAKING FLAG ----

        // Hysteresis on the pre-advance acceleration, reinterpreted as
        // "slowing down" while reversing
        let mut decel_signal = self.speed_ctrl.ctrl.current_accel_mss;
        if actual_speed_ms < 0.0 {
            decel_signal = -decel_signal;
        }
        let braking_factor = self.speed_ctrl.effective_braking_factor();
        if decel_signal < -0.5
            || self.speed_ctrl.joy_brake_engaged()
            || braking_factor >= BRAKING_FACTOR_THRESHOLD
        {
            self.braking_active = true;
        }
        if decel_signal >= -0.01
            && !self.speed_ctrl.joy_brake_engaged()
            && braking_factor < BRAKING_FACTOR_THRESHOLD
        {
            self.braking_active = false;
        }

        // ---- ADVANCE ----

        self.knob_ctrl.advance(dt)?;
        self.speed_ctrl.advance(dt)?;

        self.left_wheel_ctrl.set_trim(input_data.wheel_trim[0]);
        self.right_wheel_ctrl.set_trim(input_data.wheel_trim[1]);
        self.left_wheel_ctrl.advance(dt, switches.motors_are_magic)?;
        self.right_wheel_ctrl.advance(dt, switches.motors_are_magic)?;

        // ---- POSE INTEGRATION ----

        self.chassis.integrate(
            WheelMotion {
                displacement_m: self.left_wheel_ctrl.displacement_m(),
                speed_ms: self.left_wheel_ctrl.speed_ms(),
            },
            WheelMotion {
                displacement_m: self.right_wheel_ctrl.displacement_m(),
                speed_ms: self.right_wheel_ctrl.speed_ms(),
            },
            dt,
        );

        // ---- OUTPUT ----

        let ground_speed_ms =
            0.5 * (self.chassis.left_wheel.speed_ms + self.chassis.right_wheel.speed_ms);
        let reversing = ground_speed_ms < REVERSING_SPEED_THRESHOLD_MS;

        self.report.joy_brake_engaged = self.speed_ctrl.joy_brake_engaged();
        self.report.braking_active = self.braking_active;
        self.report.reversing = reversing;

        let output = self.build_snapshot(reversing);

        trace!(
            "DriveCtrl output:\n    pos: {:?}\n    speed: {:.3} m/s\n    omega: {:.3} rad/s",
            output.position_m,
            output.body_speed_ms,
            output.omega_rads
        );

        self.output = Some(output);

        Ok((output, self.report))
    }
}

impl Archived for DriveCtrl {
    fn write(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(ref snapshot) = self.output {
            let tc = snapshot.turn_centre_m;
            self.arch_snapshot.serialise(SnapshotRecord {
                pos_x_m: snapshot.position_m[0],
                pos_y_m: snapshot.position_m[1],
                pos_z_m: snapshot.position_m[2],
                heading_rad: snapshot.heading_rad,
                body_speed_ms: snapshot.body_speed_ms,
                body_accel_mss: snapshot.body_accel_mss,
                left_wheel_speed_ms: snapshot.wheels[0].speed_ms,
                right_wheel_speed_ms: snapshot.wheels[1].speed_ms,
                left_wheel_angle_rad: snapshot.wheels[0].angle_rad,
                right_wheel_angle_rad: snapshot.wheels[1].angle_rad,
                left_wheel_twist: snapshot.wheels[0].twist,
                right_wheel_twist: snapshot.wheels[1].twist,
                turn_centre_valid: tc.is_some(),
                turn_centre_x_m: tc.map(|c| c[0]).unwrap_or(0.0),
                turn_centre_y_m: tc.map(|c| c[1]).unwrap_or(0.0),
                omega_rads: snapshot.omega_rads,
                lat_accel_mss: Vector3::from(snapshot.lat_accel_mss).norm(),
                accel_mss: Vector3::from(snapshot.accel_mss).norm(),
                braking_factor: snapshot.effective_braking_factor,
                braking_active: snapshot.braking_active,
            })?;
        }

        self.arch_report.serialise(self.report)?;

        Ok(())
    }
}

impl DriveCtrl {
    /// Vehicle profiles available for selection.
    pub fn profiles(&self) -> &[VehicleProfile] {
        &self.profiles
    }

    /// Name of the active vehicle, if one is configured.
    pub fn vehicle_name(&self) -> Option<&str> {
        self.config.as_ref().map(|c| c.profile.name.as_str())
    }

    /// Place the vehicle at a position and/or heading.
    pub fn plonk(&mut self, position_m: Option<[f64; 2]>, heading_rad: Option<f64>) {
        self.chassis.plonk(position_m, heading_rad);
    }

    /// Select a vehicle by name, validating and applying its profile as a
    /// single atomic swap. Must be called between ticks, never within one.
    pub fn set_vehicle(&mut self, name: &str) -> Result<(), DriveCtrlError> {
        let profile = self
            .profiles
            .iter()
            .find(|p| p.name == name)
            .ok_or_else(|| DriveCtrlError::UnknownVehicle(String::from(name)))?
            .clone();

        let config = profile.validate()?;
        self.apply_config(config);

        Ok(())
    }

    /// Apply a validated vehicle configuration.
    ///
    /// All limits and geometry are replaced together; the dynamic state
    /// (speeds, pose) carries over so a vehicle change does not teleport
    /// the vehicle.
    pub fn apply_config(&mut self, config: VehicleConfig) {
        let p = &config.profile;

        self.turn_caps = config.turn_caps;

        self.knob_ctrl.max_fwd_v = p.max_knob_vel;
        self.knob_ctrl.max_rev_v = p.max_knob_vel;
        self.knob_ctrl.max_a = p.max_knob_acc;

        self.speed_ctrl
            .set_limits(p.cruise_accel_limits, p.braking_accel_limits);
        self.speed_ctrl.throttle_factor = p.throttle_factor;
        self.speed_ctrl.joy_brake_speed_threshold_ms = p.joy_brake_speed_threshold_ms;
        self.speed_ctrl.max_speed_ms = config.max_body_speed_ms;
        self.speed_ctrl.reset_joy_brake();

        self.left_wheel_ctrl.ctrl.mal = p.wheel_accel_limits;
        self.right_wheel_ctrl.ctrl.mal = p.wheel_accel_limits;

        self.chassis.set_geometry(
            p.axle_width_m,
            Vector3::new(
                p.traction_offset_m[0],
                p.traction_offset_m[1],
                p.traction_offset_m[2],
            ),
            p.wheel_radius_m,
            p.wheel_width_m,
        );

        info!(
            "Vehicle set: {} (max body speed {:.2} m/s)",
            p.name, config.max_body_speed_ms
        );
        debug!(
            "    turn rate ceiling {:.3} rad/s, axle width {:.2} m",
            config.turn_caps.max_turn_rate_rads, p.axle_width_m
        );

        self.config = Some(config);
    }

    /// Build the output snapshot from the current state.
    fn build_snapshot(&self, reversing: bool) -> DriveSnapshot {
        let pose = &self.chassis.pose;
        let instr = &self.chassis.instruments;

        DriveSnapshot {
            position_m: pose.position_m.into(),
            heading_rad: pose.heading_rad(),
            forward: pose.forward.into(),
            left: pose.left.into(),
            up: pose.up.into(),
            body_speed_ms: self.speed_ctrl.ctrl.current_speed_ms,
            body_accel_mss: self.speed_ctrl.ctrl.current_accel_mss,
            wheels: [
                WheelSnapshot {
                    angle_rad: self.chassis.left_wheel.angle_rad,
                    speed_ms: self.chassis.left_wheel.speed_ms,
                    twist: self.chassis.left_wheel.twist,
                },
                WheelSnapshot {
                    angle_rad: self.chassis.right_wheel.angle_rad,
                    speed_ms: self.chassis.right_wheel.speed_ms,
                    twist: self.chassis.right_wheel.twist,
                },
            ],
            turn_centre_m: instr.turn_centre_m.map(|c| c.into()),
            omega_rads: instr.omega_rads,
            lat_accel_mss: instr.lat_accel_mss.into(),
            accel_mss: instr.accel_mss.into(),
            effective_braking_factor: self.speed_ctrl.effective_braking_factor(),
            braking_active: self.braking_active,
            reversing,
        }
    }

    /// Current state of the joystick brake.
    pub fn joy_brake_state(&self) -> JoyBrakeState {
        self.speed_ctrl.joy_brake_state()
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
