//! # Drive control library.
//!
//! The real-time motion-control stack for a skid-steer (differential
//! drive) vehicle: a jerk-limited trajectory primitive, the speed and
//! per-wheel controllers built on it, a speed-dependent turn-rate limiter
//! and the differential-drive pose integrator. The library holds the whole
//! stack so binaries and benchmarks can drive it directly.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Chassis module - integrates wheel motion into the vehicle pose and
/// derives instrumentation
pub mod chassis;

/// Global data store for the executable
pub mod data_store;

/// Drive control module - the complete per-tick control pipeline
pub mod drive_ctrl;

/// Limited motion profile - the jerk/accel/velocity-limited trajectory
/// primitive
pub mod motion;

/// Vehicle profile module - validated vehicle configuration records
pub mod profile;

/// Drive script interpreter - scripted operator input for batch replays
pub mod script;

/// Speed control module - filters the operator lever into a jerk-limited
/// body speed
pub mod speed_ctrl;

/// Turn capability - the speed-dependent turn-rate limiter
pub mod turn_caps;

/// Wheel control module - per-wheel speed controllers and exact odometry
pub mod wheel_ctrl;
