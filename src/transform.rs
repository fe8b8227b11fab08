//! Rigid placement of the overlay in scene space.

use nalgebra::{Point3, UnitQuaternion, Vector3};

/// Position, orientation and scale of a scene node
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RigidTransform {
    pub position: Point3<f64>,
    pub orientation: UnitQuaternion<f64>,
    pub scale: Vector3<f64>,
}

impl Default for RigidTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl RigidTransform {
    #[must_use]
    pub fn identity() -> Self {
        Self {
            position: Point3::origin(),
            orientation: UnitQuaternion::identity(),
            scale: Vector3::repeat(1.0),
        }
    }

    /// Transform with the same scale factor on all three axes
    #[must_use]
    pub fn uniform(position: Point3<f64>, orientation: UnitQuaternion<f64>, scale: f64) -> Self {
        Self {
            position,
            orientation,
            scale: Vector3::repeat(scale),
        }
    }

    /// Whether every component is finite and the scale strictly positive
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.position.coords.iter().all(|v| v.is_finite())
            && self.orientation.coords.iter().all(|v| v.is_finite())
            && self.scale.iter().all(|v| v.is_finite() && *v > 0.0)
    }

    /// Euler angles in degrees as (pitch, yaw, roll)
    ///
    /// Pitch rotates about x, yaw about y and roll about z.
    #[must_use]
    pub fn euler_degrees(&self) -> Vector3<f64> {
        let (about_x, about_y, about_z) = self.orientation.euler_angles();
        Vector3::new(about_x.to_degrees(), about_y.to_degrees(), about_z.to_degrees())
    }
}
