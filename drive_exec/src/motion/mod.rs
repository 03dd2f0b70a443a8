//! # Limited motion profile
//!
//! A single-axis trajectory primitive which drives a value toward a target
//! under a symmetric acceleration limit and separate forward/reverse rate
//! limits. The trajectory is a piecewise quadratic function of time, solved
//! in closed form on every call, so a profile may be advanced by an
//! arbitrary time step without accumulating integration error.
//!
//! The same primitive serves three roles in this executable, selected by a
//! marker type implementing [`MotionQuantity`]:
//!
//! - turn-knob deflection (a position-like quantity),
//! - vehicle speed (the profile's value is a speed, its rate an
//!   acceleration, and its acceleration limit a jerk limit),
//! - individual wheel speed (as above, with motor-specific limits).

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod segment;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub(crate) use segment::*;
pub use state::*;

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// A labelled physical quantity profiled by a [`MotionProfile`].
///
/// The label names the quantity held in the profile's `x` field. Each
/// instantiation site documents its own unit interpretation of `x`, `v` and
/// `max_a`.
pub trait MotionQuantity {
    /// Human-readable label of the profiled quantity, used in errors and
    /// logs.
    const LABEL: &'static str;
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors raised when advancing a motion profile.
#[derive(Debug, thiserror::Error)]
pub enum MotionError {
    /// The profile was advanced with a non-positive acceleration limit.
    ///
    /// This signals a configuration bug: profile data must be validated
    /// before limits are constructed, so it is never substituted with a
    /// default.
    #[error("Non-positive acceleration limit ({max_a}) on the {quantity} profile")]
    NonPositiveMaxAccel {
        quantity: &'static str,
        max_a: f64,
    },
}
