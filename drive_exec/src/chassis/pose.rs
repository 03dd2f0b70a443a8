//! Vehicle pose structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use nalgebra::Vector3;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Position and orientation of the vehicle body in the world frame.
///
/// The orientation is held as an orthonormal basis. After every
/// integration step the basis is re-derived from the heading via cross
/// products rather than accumulated by composing incremental rotations,
/// which would drift off orthonormal.
#[derive(Clone, Copy, Debug)]
pub struct VehiclePose {
    /// Vehicle origin position in the world frame.
    ///
    /// Units: meters
    pub position_m: Vector3<f64>,

    /// Unit vector along the vehicle's forward (+x) axis.
    pub forward: Vector3<f64>,

    /// Unit vector along the vehicle's left (+y) axis.
    pub left: Vector3<f64>,

    /// Unit vector along the vehicle's up (+z) axis.
    pub up: Vector3<f64>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for VehiclePose {
    fn default() -> Self {
        Self {
            position_m: Vector3::zeros(),
            forward: Vector3::x(),
            left: Vector3::y(),
            up: Vector3::z(),
        }
    }
}

impl VehiclePose {
    /// Heading of the forward axis, anticlockwise from world +x.
    ///
    /// Units: radians
    pub fn heading_rad(&self) -> f64 {
        self.forward[1].atan2(self.forward[0])
    }

    /// Rebuild the orthonormal basis for the given heading.
    ///
    /// The vehicle stays level: forward is placed in the world XY plane,
    /// up is world +z, and left completes the basis by cross product.
    pub fn set_heading(&mut self, heading_rad: f64) {
        self.forward = Vector3::new(heading_rad.cos(), heading_rad.sin(), 0.0);
        self.up = Vector3::z();
        self.left = self.up.cross(&self.forward);
    }

    /// Express a body-frame vector in the world frame.
    pub fn to_world(&self, local: &Vector3<f64>) -> Vector3<f64> {
        self.forward * local[0] + self.left * local[1] + self.up * local[2]
    }
}
